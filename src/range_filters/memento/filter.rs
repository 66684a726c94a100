//! The public `MementoFilter` type (spec §6) — assembles the slot array,
//! keepsake-box codec, run engine, hash layer, resize driver and iterators
//! behind one API surface, the way the teacher's other dynamic filters
//! (`membership/vacuum_filter.rs`, `membership/cuckoo.rs`) expose a single
//! struct over their internal tables.

use std::cell::Cell;

use crate::common::{RangeFilter, Result};

use super::config::MementoConfig;
use super::error::{QueryResult, StatusCode};
use super::hashing::{hash_key, invert_prefix, HashMode, HashedKey};
use super::iter::{HashIterator, KeyRangeIterator};
use super::resize;
use super::run_engine::Core;
use super::serialize;

/// Operation flags (spec §6 bitfield): `NO_LOCK | TRY_ONCE | WAIT_FOR_LOCK |
/// KEY_IS_HASH`. Combine with `|`, e.g. `OperationFlags::TRY_ONCE |
/// OperationFlags::KEY_IS_HASH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationFlags(u32);

impl OperationFlags {
    /// Caller guarantees exclusive access; no latch is taken.
    pub const NO_LOCK: OperationFlags = OperationFlags(1 << 0);
    /// Attempt a single non-blocking latch acquisition; `COULDNT_LOCK` on
    /// failure.
    pub const TRY_ONCE: OperationFlags = OperationFlags(1 << 1);
    /// Spin until the latch is acquired.
    pub const WAIT_FOR_LOCK: OperationFlags = OperationFlags(1 << 2);
    /// The `key` argument is already a combined `home << fingerprint_bits |
    /// fingerprint | ... memento` hash; bypass the configured hash mode
    /// (only valid together with a compatible hash mode, per spec §6).
    pub const KEY_IS_HASH: OperationFlags = OperationFlags(1 << 3);

    /// True if `self` has every bit of `other` set.
    pub fn contains(self, other: OperationFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for OperationFlags {
    fn default() -> Self {
        OperationFlags::NO_LOCK
    }
}

impl std::ops::BitOr for OperationFlags {
    type Output = OperationFlags;
    fn bitor(self, rhs: Self) -> Self {
        OperationFlags(self.0 | rhs.0)
    }
}

/// Approximate-membership filter over 64-bit keys supporting point and
/// range queries with no false negatives (spec §1).
///
/// A key is split into a high-order prefix (hashed to a home slot plus
/// fingerprint) and a low-order memento (the range-query coordinate). See
/// the crate-level `memento` module docs for the component breakdown.
#[derive(Debug, Clone)]
pub struct MementoFilter {
    core: Core,
    hash_mode: HashMode,
    seed: u32,
    auto_resize: bool,
    expandable: bool,
    original_quotient_bits: u32,
    // Single advisory latch standing in for per-block latches; see
    // `DESIGN.md` for why a per-instance `Cell<bool>` satisfies spec §5 for
    // a crate whose mutating API already requires `&mut self`.
    lock: Cell<bool>,
}

impl MementoFilter {
    /// Builds a filter from a validated [`MementoConfig`].
    pub fn with_config(config: MementoConfig) -> Self {
        let original_quotient_bits = config.n_slots().trailing_zeros();
        MementoFilter {
            core: Core::new(config.n_slots(), config.fingerprint_bits(), config.memento_bits()),
            hash_mode: config.hash_mode(),
            seed: config.seed,
            auto_resize: config.auto_resize,
            expandable: config.expandable,
            original_quotient_bits,
            lock: Cell::new(false),
        }
    }

    /// Convenience constructor validating `(n_slots, fingerprint_bits,
    /// memento_bits)` directly, with `hash_mode = Default`, `auto_resize =
    /// true`, `expandable = false` — equivalent to `MementoConfig::new(..)`
    /// followed by `with_config`.
    pub fn new(n_slots: u64, fingerprint_bits: u32, memento_bits: u32) -> Result<Self> {
        let config = MementoConfig::new(n_slots, fingerprint_bits, memento_bits)?;
        Ok(Self::with_config(config))
    }

    /// Sizes a filter from a target point false-positive rate and expected
    /// element count, per `MementoConfig::from_target_fpr`.
    pub fn with_target_fpr(expected_elements: u64, fpr: f64, memento_bits: u32) -> Result<Self> {
        let config = MementoConfig::from_target_fpr(expected_elements, fpr, memento_bits)?;
        Ok(Self::with_config(config))
    }

    fn hash(&self, key: u64, flags: OperationFlags) -> HashedKey {
        let mode = if flags.contains(OperationFlags::KEY_IS_HASH) {
            HashMode::None
        } else {
            self.hash_mode
        };
        hash_key(
            mode,
            key,
            self.core.slots.n_slots(),
            self.core.fingerprint_bits,
            self.core.memento_bits,
            self.seed,
        )
    }

    fn acquire(&self, flags: OperationFlags) -> std::result::Result<(), StatusCode> {
        if flags.contains(OperationFlags::TRY_ONCE) {
            if self.lock.get() {
                return Err(StatusCode::CouldntLock);
            }
            self.lock.set(true);
        }
        // WAIT_FOR_LOCK has nothing to spin on: `&mut self` already
        // serializes mutation within a thread (see `DESIGN.md`).
        Ok(())
    }

    fn release(&self, flags: OperationFlags) {
        if flags.contains(OperationFlags::TRY_ONCE) {
            self.lock.set(false);
        }
    }

    fn grow(&mut self) -> std::result::Result<(), StatusCode> {
        if self.expandable {
            resize::grow_expandable(&mut self.core, self.hash_mode)
        } else {
            resize::grow_fixed_width(&mut self.core, self.hash_mode, self.seed)
        }
    }

    /// Checks the load factor against
    /// [`MementoConfig::DEFAULT_AUTO_RESIZE_THRESHOLD`] and grows
    /// pre-emptively if `auto_resize` is set (spec §4.5).
    fn maybe_auto_resize(&mut self) -> std::result::Result<(), StatusCode> {
        if !self.auto_resize {
            return Ok(());
        }
        let occ = self.core.n_occupied_slots() as f64;
        let n = self.core.slots.n_slots() as f64;
        if occ / n >= MementoConfig::DEFAULT_AUTO_RESIZE_THRESHOLD {
            self.grow()?;
        }
        Ok(())
    }

    /// Runs `op`, and if it fails with `NoSpace` and `auto_resize` is set,
    /// doubles capacity once and retries — a second `NoSpace` is returned
    /// to the caller (spec §7: "Auto-resize intercepts NO_SPACE
    /// internally... a second NO_SPACE is returned to the caller").
    fn with_capacity_retry<F>(&mut self, mut op: F) -> std::result::Result<u64, StatusCode>
    where
        F: FnMut(&mut Self) -> std::result::Result<u64, StatusCode>,
    {
        match op(self) {
            Err(StatusCode::NoSpace) if self.auto_resize => {
                self.grow()?;
                op(self)
            }
            other => other,
        }
    }

    /// Inserts `key` (spec §4.3 `insert_mementos`/`insert_single` via the
    /// hash layer). Returns the slot distance from home to the inserted
    /// box on success.
    pub fn insert(&mut self, key: u64, flags: OperationFlags) -> StatusCode {
        if let Err(e) = self.acquire(flags) {
            return e;
        }
        let h = self.hash(key, flags);
        let result = self.with_capacity_retry(|f| f.core.insert_single(h.home, h.fingerprint, h.memento));
        let result = result.and_then(|d| self.maybe_auto_resize().map(|()| d));
        self.release(flags);
        match result {
            Ok(distance) => StatusCode::Success(distance),
            Err(e) => e,
        }
    }

    /// Deletes `key` (spec §4.3 `delete_single`). `DoesntExist` if absent.
    pub fn delete(&mut self, key: u64, flags: OperationFlags) -> StatusCode {
        if let Err(e) = self.acquire(flags) {
            return e;
        }
        let h = self.hash(key, flags);
        let result = self.core.delete_single(h.home, h.fingerprint, h.memento);
        self.release(flags);
        match result {
            Ok(()) => StatusCode::Success(0),
            Err(e) => e,
        }
    }

    /// Replaces `old_key` with `new_key` (spec §4.3 `update_single`). When
    /// both keys hash to the same `(home, fingerprint)`, this is the fast
    /// path that only re-sorts mementos within one box; otherwise it falls
    /// back to delete-then-insert across two runs.
    pub fn update(&mut self, old_key: u64, new_key: u64, flags: OperationFlags) -> StatusCode {
        if let Err(e) = self.acquire(flags) {
            return e;
        }
        let old_h = self.hash(old_key, flags);
        let new_h = self.hash(new_key, flags);
        let result = if old_h.home == new_h.home && old_h.fingerprint == new_h.fingerprint {
            self.core
                .update_single(old_h.home, old_h.fingerprint, old_h.memento, new_h.memento)
                .map(|()| 0)
        } else {
            self.core
                .delete_single(old_h.home, old_h.fingerprint, old_h.memento)
                .and_then(|()| self.core.insert_single(new_h.home, new_h.fingerprint, new_h.memento))
        };
        self.release(flags);
        match result {
            Ok(distance) => StatusCode::Success(distance),
            Err(e) => e,
        }
    }

    /// Point query: is `key` present (spec §4.3 `point_lookup`)?
    pub fn point_query(&self, key: u64, flags: OperationFlags) -> QueryResult {
        let h = self.hash(key, flags);
        self.core.point_lookup(h.home, h.fingerprint, h.memento)
    }

    /// Range query: does any stored key fall in `[low, high]` (spec §4.3
    /// `range_lookup`)? `low > high` is always negative.
    pub fn range_query(&self, low: u64, high: u64, flags: OperationFlags) -> QueryResult {
        if low > high {
            return QueryResult::Negative;
        }
        let l = self.hash(low, flags);
        let r = self.hash(high, flags);
        self.core
            .range_lookup(l.home, l.fingerprint, l.memento, r.home, r.fingerprint, r.memento)
    }

    /// Re-sorts/re-merges the keepsake boxes sharing `key`'s home without
    /// changing stored mementos (spec §4.3 `rejuvenate`).
    pub fn rejuvenate(&mut self, key: u64, flags: OperationFlags) -> StatusCode {
        let h = self.hash(key, flags);
        match self.core.rejuvenate(h.home) {
            Ok(()) => StatusCode::Success(0),
            Err(e) => e,
        }
    }

    /// Loads `keys` into an **empty** filter in one left-to-right pass, no
    /// shifting (spec §4.3 `bulk_load`). `Invalid` if the filter already
    /// holds entries.
    pub fn bulk_load(&mut self, keys: &[u64]) -> StatusCode {
        if self.core.n_distinct_prefixes() != 0 {
            return StatusCode::Invalid;
        }
        let mut hashed: Vec<HashedKey> = keys.iter().map(|&k| self.hash(k, OperationFlags::NO_LOCK)).collect();
        hashed.sort_by_key(|h| (h.home, h.fingerprint, h.memento));
        self.core.bulk_load(&hashed);
        StatusCode::Success(0)
    }

    /// Manually triggers a resize (fixed-width or expandable, depending on
    /// configuration) regardless of current load factor.
    pub fn resize(&mut self) -> StatusCode {
        match self.grow() {
            Ok(()) => StatusCode::Success(0),
            Err(e) => e,
        }
    }

    /// Recovers the original prefix from `(home, fingerprint)` under
    /// [`HashMode::Invertible`]; `None` for other modes (spec §4.4).
    pub fn invert(&self, key: u64, flags: OperationFlags) -> Option<u64> {
        let h = self.hash(key, flags);
        invert_prefix(
            self.hash_mode,
            h.home,
            h.fingerprint,
            self.core.slots.n_slots().trailing_zeros(),
            self.core.fingerprint_bits,
        )
    }

    /// Iterates every stored `(home, fingerprint, memento)` triple in
    /// ascending slot order (spec §4.6).
    pub fn iter(&self) -> HashIterator<'_> {
        HashIterator::from_position(&self.core, 0)
    }

    /// Iterates stored triples whose reconstructed key falls in
    /// `[low, high]` (spec §4.6 key-range iterator).
    pub fn range_iter(&self, low: u64, high: u64) -> KeyRangeIterator<'_> {
        let l = self.hash(low, OperationFlags::NO_LOCK);
        let r = self.hash(high, OperationFlags::NO_LOCK);
        KeyRangeIterator::new(&self.core, l.home, l.fingerprint, l.memento, r.home, r.fingerprint, r.memento)
    }

    /// Serializes the filter to the on-disk format (spec §6).
    pub fn serialize(&self) -> Vec<u8> {
        serialize::serialize(self)
    }

    /// Deserializes a filter previously produced by
    /// [`MementoFilter::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        serialize::deserialize(bytes)
    }

    pub(crate) fn from_parts(
        core: Core,
        hash_mode: HashMode,
        seed: u32,
        auto_resize: bool,
        expandable: bool,
        original_quotient_bits: u32,
    ) -> Self {
        MementoFilter {
            core,
            hash_mode,
            seed,
            auto_resize,
            expandable,
            original_quotient_bits,
            lock: Cell::new(false),
        }
    }

    pub(crate) fn core(&self) -> &Core {
        &self.core
    }

    pub(crate) fn hash_mode(&self) -> HashMode {
        self.hash_mode
    }

    pub(crate) fn seed(&self) -> u32 {
        self.seed
    }

    pub(crate) fn auto_resize_enabled(&self) -> bool {
        self.auto_resize
    }

    pub(crate) fn expandable_enabled(&self) -> bool {
        self.expandable
    }

    /// The quotient width (`n_slots.trailing_zeros()`) this filter was
    /// originally constructed with, before any resize. Recorded at
    /// construction and round-tripped through serialization; current
    /// resize math recomputes quotient bits fresh from `n_slots` at each
    /// step rather than consulting this, so it's purely informational.
    pub fn original_quotient_bits(&self) -> u32 {
        self.original_quotient_bits
    }

    /// Number of slots currently allocated.
    pub fn n_slots(&self) -> u64 {
        self.core.slots.n_slots()
    }

    /// Configured fingerprint width in bits.
    pub fn fingerprint_bits(&self) -> u32 {
        self.core.fingerprint_bits
    }

    /// Configured memento width in bits.
    pub fn memento_bits(&self) -> u32 {
        self.core.memento_bits
    }

    /// Total slots currently part of some keepsake box (spec §3
    /// `n_occupied_slots`).
    pub fn n_occupied_slots(&self) -> u64 {
        self.core.n_occupied_slots()
    }

    /// Number of distinct stored prefixes (spec §3 `n_distinct_prefixes`).
    pub fn n_distinct_prefixes(&self) -> u64 {
        self.core.n_distinct_prefixes()
    }

    /// `true` if no prefix has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.n_distinct_prefixes() == 0
    }

    /// Current load factor (`n_occupied_slots / n_slots`).
    pub fn load_factor(&self) -> f64 {
        self.n_occupied_slots() as f64 / self.n_slots() as f64
    }

    /// Summary statistics, mirroring the teacher's `*Stats` structs
    /// (e.g. `VacuumFilterStats`).
    pub fn stats(&self) -> MementoStats {
        MementoStats {
            n_slots: self.n_slots(),
            fingerprint_bits: self.fingerprint_bits(),
            memento_bits: self.memento_bits(),
            n_occupied_slots: self.n_occupied_slots(),
            n_distinct_prefixes: self.n_distinct_prefixes(),
            load_factor: self.load_factor(),
            expandable: self.expandable,
            original_quotient_bits: self.original_quotient_bits,
        }
    }
}

impl RangeFilter for MementoFilter {
    fn may_contain_range(&self, low: u64, high: u64) -> bool {
        self.range_query(low, high, OperationFlags::NO_LOCK).is_positive()
    }
}

/// Summary statistics about a [`MementoFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MementoStats {
    /// Current slot count.
    pub n_slots: u64,
    /// Current fingerprint width in bits.
    pub fingerprint_bits: u32,
    /// Memento width in bits (range-query precision).
    pub memento_bits: u32,
    /// Slots currently part of some keepsake box.
    pub n_occupied_slots: u64,
    /// Number of distinct stored prefixes.
    pub n_distinct_prefixes: u64,
    /// `n_occupied_slots / n_slots`.
    pub load_factor: f64,
    /// Whether resizes consume a fingerprint bit per doubling.
    pub expandable: bool,
    /// Quotient width the filter was originally constructed with.
    pub original_quotient_bits: u32,
}
