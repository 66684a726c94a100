//! Hash layer — maps an input key to `(home_slot, fingerprint, memento)`.
//!
//! Three modes, per spec §4.4 / §6:
//! - [`HashMode::Default`] hashes the key's prefix with a seeded mixer built
//!   on the teacher crate's [`crate::common::hash`] primitives. Lossy: the
//!   original prefix cannot be recovered from the stored fingerprint.
//! - [`HashMode::Invertible`] is a fixed bijection of the prefix's own
//!   width, so the original prefix is always recoverable.
//! - [`HashMode::None`] takes a caller-supplied, already-combined
//!   `home << fingerprint_bits | fingerprint` value (`KEY_IS_HASH`).

use crate::common::hash::murmur3_hash64;

/// Hashing mode selected at construction time (spec §4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMode {
    /// Seeded Murmur-like mixer over the key's prefix bits. May introduce
    /// false positives from fingerprint collisions but works for any
    /// prefix width, since the mixer absorbs it down to `fingerprint_bits`.
    Default,
    /// Fixed bijection; prefix width must equal `quotient_bits +
    /// fingerprint_bits`. Recoverable, no additional false positives from
    /// the hash step itself.
    Invertible,
    /// Caller has already computed `home << fingerprint_bits | fingerprint`
    /// and passes it directly (`KEY_IS_HASH` in the C API).
    None,
}

/// A decomposed `(home slot, fingerprint, memento)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashedKey {
    /// Home slot index, in `[0, n_slots)`.
    pub home: u64,
    /// Fingerprint value, in `[0, 2^fingerprint_bits)`.
    pub fingerprint: u64,
    /// Memento (range-query coordinate), in `[0, 2^memento_bits)`.
    pub memento: u64,
}

/// `fast_reduce(x, n) = (x * n) >> 32`, per spec §4.4 — maps a 32-bit hash
/// value onto `[0, n)` without a division.
#[inline]
pub fn fast_reduce(x: u32, n: u64) -> u64 {
    ((x as u64) * n) >> 32
}

/// Splits a 64-bit key into `(prefix, memento)` given `memento_bits`.
#[inline]
fn split_key(key: u64, memento_bits: u32) -> (u64, u64) {
    if memento_bits == 0 {
        (key, 0)
    } else {
        let memento_mask = (1u64 << memento_bits) - 1;
        (key >> memento_bits, key & memento_mask)
    }
}

/// Hashes `key` into `(home, fingerprint, memento)` under the given mode.
///
/// `n_slots` must be a power of two; `fingerprint_bits`/`memento_bits` come
/// from the filter's metadata record. `seed` is only consumed by
/// [`HashMode::Default`].
pub fn hash_key(
    mode: HashMode,
    key: u64,
    n_slots: u64,
    fingerprint_bits: u32,
    memento_bits: u32,
    seed: u32,
) -> HashedKey {
    let (prefix, memento) = split_key(key, memento_bits);
    match mode {
        HashMode::Default => {
            let mixed = murmur3_hash64(&prefix.to_le_bytes(), seed as u64);
            let fingerprint_mask = if fingerprint_bits == 0 {
                0
            } else {
                (1u64 << fingerprint_bits) - 1
            };
            // Fingerprint is the mix's low bits, fixed width regardless of
            // `n_slots` — unlike the old top-window scheme, it never shifts
            // when the table is resized, so a box's stored fingerprint stays
            // valid for every home it's relocated to. See `resize.rs`.
            let fingerprint = mixed & fingerprint_mask;
            let remainder = mixed >> fingerprint_bits;
            let remainder_bits = 64 - fingerprint_bits;
            // `fast_reduce` wants a 32-bit input; take the top 32 bits of
            // whatever's left after peeling off the fingerprint so `home`'s
            // distribution doesn't depend on `n_slots` either.
            let prequotient: u32 = if remainder_bits >= 32 {
                (remainder >> (remainder_bits - 32)) as u32
            } else {
                remainder as u32
            };
            let home = fast_reduce(prequotient, n_slots);
            HashedKey {
                home,
                fingerprint,
                memento,
            }
        }
        HashMode::Invertible => {
            let quotient_bits = n_slots.trailing_zeros();
            let total_bits = quotient_bits + fingerprint_bits;
            let inverted = invertible_bijection(prefix, total_bits);
            let home = inverted & (n_slots - 1);
            let fingerprint_mask = if fingerprint_bits == 0 {
                0
            } else {
                (1u64 << fingerprint_bits) - 1
            };
            let fingerprint = (inverted >> quotient_bits) & fingerprint_mask;
            HashedKey {
                home,
                fingerprint,
                memento,
            }
        }
        HashMode::None => {
            // Caller already supplied home<<fingerprint_bits|fingerprint as
            // `prefix` (via KEY_IS_HASH); just split it back apart.
            let fingerprint_mask = if fingerprint_bits == 0 {
                0
            } else {
                (1u64 << fingerprint_bits) - 1
            };
            let fingerprint = prefix & fingerprint_mask;
            let home = prefix >> fingerprint_bits;
            HashedKey {
                home,
                fingerprint,
                memento,
            }
        }
    }
}

/// Reconstructs the original prefix from `(home, fingerprint)` under
/// [`HashMode::Invertible`]. Returns `None` for other modes, matching
/// `qf_invalid` semantics for hash-mode-incompatible calls.
pub fn invert_prefix(
    mode: HashMode,
    home: u64,
    fingerprint: u64,
    quotient_bits: u32,
    fingerprint_bits: u32,
) -> Option<u64> {
    match mode {
        HashMode::Invertible => {
            let combined = (fingerprint << quotient_bits) | home;
            Some(invertible_bijection_inverse(
                combined,
                quotient_bits + fingerprint_bits,
            ))
        }
        _ => None,
    }
}

/// A width-preserving involution used as the `INVERTIBLE` bijection: a
/// Feistel-like XOR-rotate mix over exactly `bits` bits. Self-inverse, so
/// `invertible_bijection` doubles as its own inverse when `bits` matches.
fn invertible_bijection(x: u64, bits: u32) -> u64 {
    if bits == 0 || bits >= 64 {
        return x;
    }
    let mask = (1u64 << bits) - 1;
    let half = bits / 2;
    let lo_mask = (1u64 << half) - 1;
    let hi = (x >> half) & (mask >> half);
    let lo = x & lo_mask;
    // Mix lo into hi with a cheap odd multiplier so the map is a bijection
    // on `bits`-wide inputs (odd multiplier mod 2^k is invertible).
    let mixed_hi = hi ^ (lo.wrapping_mul(0x9E37_79B1).rotate_left(half.max(1)) & (mask >> half));
    (mixed_hi << half) | lo
}

fn invertible_bijection_inverse(x: u64, bits: u32) -> u64 {
    // The map above is its own inverse: reapplying it with the same `lo`
    // (unchanged by the transform) undoes the XOR.
    invertible_bijection(x, bits)
}
