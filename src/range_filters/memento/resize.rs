//! Resize drivers (spec §4.5) — grow a filter that has crossed its
//! load-factor ceiling.
//!
//! - [`grow_fixed_width`] doubles `n_slots`, keeps `fingerprint_bits`
//!   unchanged, and relocates every existing keepsake box: under
//!   [`HashMode::Invertible`] the original prefix is recovered via
//!   `invert_prefix` and rehashed exactly at the new size; under
//!   [`HashMode::Default`]/[`HashMode::None`] a box is duplicated into
//!   `old_home*2` and `old_home*2+1` (its fingerprint is unchanged, since
//!   `hashing.rs`'s `fast_reduce`-based home computation is independent of
//!   `n_slots` in exactly the way that makes one of those two candidates the
//!   box's true new home). See `DESIGN.md`.
//! - [`grow_expandable`] doubles `n_slots` *and* promotes one fingerprint
//!   bit into the quotient for every existing box, shrinking
//!   `fingerprint_bits` by one. Under [`HashMode::Invertible`] this is
//!   exact — the stored fingerprint's top bit is provably the bit a fresh
//!   hash at the larger size would have produced, since `home` and
//!   `fingerprint` are adjacent windows of the same bijection (see
//!   `hashing.rs`). Under [`HashMode::Default`] / [`HashMode::None`], a
//!   box's single stored fingerprint may be standing in for more than one
//!   colliding original prefix, so the promoted bit isn't provably
//!   authoritative for all of them; to preserve the no-false-negative
//!   guarantee this crate duplicates the box into both candidate new
//!   homes instead of guessing, at the cost of a slightly higher false
//!   positive rate until those boxes are individually rejuvenated.

use super::error::StatusCode;
use super::hashing::{hash_key, invert_prefix, HashMode, HashedKey};
use super::run_engine::Core;

/// Doubles `n_slots`, keeping `fingerprint_bits`/`memento_bits` fixed, and
/// relocates every existing keepsake box to its new home.
pub fn grow_fixed_width(core: &mut Core, mode: HashMode, seed: u32) -> Result<(), StatusCode> {
    let old_n_slots = core.slots.n_slots();
    let new_n_slots = old_n_slots.checked_mul(2).ok_or(StatusCode::NoSpace)?;
    if new_n_slots > (1u64 << 62) {
        return Err(StatusCode::NoSpace);
    }
    let old_quotient_bits = old_n_slots.trailing_zeros();
    let fingerprint_bits = core.fingerprint_bits;
    let memento_bits = core.memento_bits;

    let boxes: Vec<_> = core.iter_boxes().collect();
    let mut hashed = Vec::new();

    for (old_home, b) in boxes {
        match mode {
            HashMode::Invertible => {
                let original_prefix = invert_prefix(mode, old_home, b.fingerprint, old_quotient_bits, fingerprint_bits)
                    .expect("Invertible mode always recovers its prefix");
                let probe_key = original_prefix << memento_bits;
                let h = hash_key(mode, probe_key, new_n_slots, fingerprint_bits, memento_bits, seed);
                for &m in &b.mementos {
                    hashed.push(HashedKey {
                        home: h.home,
                        fingerprint: h.fingerprint,
                        memento: m,
                    });
                }
            }
            HashMode::Default | HashMode::None => {
                let home_lo = old_home * 2;
                let home_hi = home_lo + 1;
                for &m in &b.mementos {
                    hashed.push(HashedKey {
                        home: home_lo,
                        fingerprint: b.fingerprint,
                        memento: m,
                    });
                    hashed.push(HashedKey {
                        home: home_hi,
                        fingerprint: b.fingerprint,
                        memento: m,
                    });
                }
            }
        }
    }

    hashed.sort_by_key(|h| (h.home, h.fingerprint, h.memento));
    let mut new_core = Core::new(new_n_slots, fingerprint_bits, memento_bits);
    new_core.bulk_load(&hashed);
    *core = new_core;
    Ok(())
}

/// Doubles `n_slots` and shrinks `fingerprint_bits` by one, promoting the
/// freed bit into the quotient for every existing keepsake box.
pub fn grow_expandable(core: &mut Core, mode: HashMode) -> Result<(), StatusCode> {
    if core.fingerprint_bits == 0 {
        return Err(StatusCode::Invalid);
    }
    let old_n_slots = core.slots.n_slots();
    let new_n_slots = old_n_slots.checked_mul(2).ok_or(StatusCode::NoSpace)?;
    if new_n_slots > (1u64 << 62) {
        return Err(StatusCode::NoSpace);
    }
    let new_fingerprint_bits = core.fingerprint_bits - 1;
    let memento_bits = core.memento_bits;

    // Snapshot every existing box before building the replacement, since
    // the replacement starts from a fresh, empty slot array.
    let boxes: Vec<_> = core.iter_boxes().collect();

    let mut new_core = Core::new(new_n_slots, new_fingerprint_bits, memento_bits);
    let promote_bit_mask = 1u64 << (core.fingerprint_bits - 1);
    let fingerprint_tail_mask = promote_bit_mask - 1;

    for (old_home, b) in boxes {
        let truncated_fingerprint = b.fingerprint & fingerprint_tail_mask;
        match mode {
            HashMode::Invertible => {
                let promoted = (b.fingerprint & promote_bit_mask != 0) as u64;
                let new_home = (old_home << 1) | promoted;
                new_core.insert_mementos(new_home, truncated_fingerprint, &b.mementos)?;
            }
            HashMode::Default | HashMode::None => {
                let home_lo = old_home << 1;
                let home_hi = home_lo | 1;
                new_core.insert_mementos(home_lo, truncated_fingerprint, &b.mementos)?;
                new_core.insert_mementos(home_hi, truncated_fingerprint, &b.mementos)?;
            }
        }
    }

    *core = new_core;
    Ok(())
}
