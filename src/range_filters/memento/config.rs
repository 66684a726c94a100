//! Constructor options (spec §6) — `MementoConfig` validates and bundles
//! every key the spec's "Constructor options" list recognizes, mirroring
//! the teacher's builder-ish sizing pattern in `membership/vacuum_filter.rs`
//! (`VacuumFilter::new` plus chained `with_*` tuning calls) rather than a
//! single giant constructor argument list.

use crate::common::validation::{validate_fingerprint_bits, validate_memento_bits, validate_n_slots_pow2};
use crate::common::{Result, SketchError};
use crate::range_filters::memento::hashing::HashMode;

/// Validated constructor options for a [`crate::range_filters::MementoFilter`].
///
/// Build one with [`MementoConfig::new`], tune it with the `with_*`
/// methods, then pass it to `MementoFilter::with_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MementoConfig {
    pub(crate) n_slots: u64,
    pub(crate) fingerprint_bits: u32,
    pub(crate) memento_bits: u32,
    pub(crate) hash_mode: HashMode,
    pub(crate) seed: u32,
    pub(crate) auto_resize: bool,
    pub(crate) expandable: bool,
}

impl MementoConfig {
    /// Default load factor at which [`MementoConfig::auto_resize`] fires
    /// (spec §3/§4.5: "typical 0.95").
    pub const DEFAULT_AUTO_RESIZE_THRESHOLD: f64 = 0.95;

    /// Validates `(n_slots, fingerprint_bits, memento_bits)` and returns a
    /// config with `hash_mode = Default`, a zero seed, `auto_resize = true`,
    /// `expandable = false` — tune further with the `with_*` methods.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] if `n_slots` isn't a
    /// power of two and a multiple of 64, or if the bit widths don't fit
    /// together in a `u64` slot (spec §3's `slot_bits = fingerprint_bits +
    /// memento_bits`).
    pub fn new(n_slots: u64, fingerprint_bits: u32, memento_bits: u32) -> Result<Self> {
        validate_n_slots_pow2(n_slots)?;
        validate_fingerprint_bits(fingerprint_bits, memento_bits)?;
        validate_memento_bits(memento_bits)?;
        Ok(MementoConfig {
            n_slots,
            fingerprint_bits,
            memento_bits,
            hash_mode: HashMode::Default,
            seed: 0,
            auto_resize: true,
            expandable: false,
        })
    }

    /// Derives a config from a target point-FPR (`fingerprint_bits =
    /// ceil(-log2(fpr))`, per spec §4.4: "Fingerprint width limits the
    /// FPR to ≈ 2^-fingerprint_bits") and an expected element count
    /// (`n_slots` rounded up to the next power of two covering
    /// `expected_elements / 0.95`, so the initial load factor is below the
    /// default auto-resize threshold).
    pub fn from_target_fpr(expected_elements: u64, fpr: f64, memento_bits: u32) -> Result<Self> {
        if !(0.0 < fpr && fpr < 1.0) {
            return Err(SketchError::InvalidParameter {
                param: "fpr".to_string(),
                value: fpr.to_string(),
                constraint: "must be in range (0.0, 1.0)".to_string(),
            });
        }
        if expected_elements == 0 {
            return Err(SketchError::InvalidParameter {
                param: "expected_elements".to_string(),
                value: expected_elements.to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }
        let fingerprint_bits = (-fpr.log2()).ceil().max(1.0) as u32;
        let headroom = (expected_elements as f64 / Self::DEFAULT_AUTO_RESIZE_THRESHOLD).ceil() as u64;
        let n_slots = headroom.max(64).next_power_of_two();
        Self::new(n_slots, fingerprint_bits, memento_bits)
    }

    /// Sets the hash mode (spec §4.4 / §6). Default: [`HashMode::Default`].
    pub fn with_hash_mode(mut self, hash_mode: HashMode) -> Self {
        self.hash_mode = hash_mode;
        self
    }

    /// Sets the 32-bit hash seed consumed by [`HashMode::Default`].
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Enables or disables automatic capacity-doubling resize when the
    /// load factor crosses [`MementoConfig::DEFAULT_AUTO_RESIZE_THRESHOLD`]
    /// (spec §3 `auto_resize`).
    pub fn with_auto_resize(mut self, auto_resize: bool) -> Self {
        self.auto_resize = auto_resize;
        self
    }

    /// Fixes whether resizes are "expandable" (consume a fingerprint bit
    /// per doubling, spec §4.5) for the lifetime of the instance.
    pub fn with_expandable(mut self, expandable: bool) -> Self {
        self.expandable = expandable;
        self
    }

    /// Number of slots the filter will start with.
    pub fn n_slots(&self) -> u64 {
        self.n_slots
    }

    /// Configured fingerprint width in bits.
    pub fn fingerprint_bits(&self) -> u32 {
        self.fingerprint_bits
    }

    /// Configured memento width in bits.
    pub fn memento_bits(&self) -> u32 {
        self.memento_bits
    }

    /// Configured hash mode.
    pub fn hash_mode(&self) -> HashMode {
        self.hash_mode
    }
}
