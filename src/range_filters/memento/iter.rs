//! Iterators (spec §4.3 / §6) — walk stored `(home, fingerprint, memento)`
//! triples in ascending slot order, one at a time, mirroring the original
//! `qfi_*` cursor API (`qf_iterator_from_position`, `qf_iterator_by_key`,
//! `qfi_get_hash`, `qfi_next`, `qfi_end`).
//!
//! A cursor buffers the *current run's* decoded boxes and walks them
//! memento-by-memento before advancing to the next occupied home — runs
//! themselves are decoded lazily, one at a time, so a full scan costs one
//! `decode_run` per distinct prefix rather than one up front.

use super::hashing::{hash_key, HashMode};
use super::run_engine::{Core, KeepsakeBox};

/// One position yielded by [`HashIterator`]: the home slot, fingerprint and
/// a single memento from that keepsake box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterItem {
    pub home: u64,
    pub fingerprint: u64,
    pub memento: u64,
}

/// Cursor over every stored `(home, fingerprint, memento)` triple, in
/// ascending slot order.
pub struct HashIterator<'a> {
    core: &'a Core,
    next_home: u64,
    current_home: u64,
    current_boxes: std::vec::IntoIter<KeepsakeBox>,
    current_box: Option<(u64, std::vec::IntoIter<u64>)>,
}

impl<'a> HashIterator<'a> {
    /// Starts at the first occupied home at or after `start_home`
    /// (`qf_iterator_from_position`).
    pub fn from_position(core: &'a Core, start_home: u64) -> Self {
        HashIterator {
            core,
            next_home: start_home,
            current_home: start_home,
            current_boxes: Vec::new().into_iter(),
            current_box: None,
        }
    }

    /// Starts at the first occupied home at or after the home that `key`
    /// hashes to (`qf_iterator_by_key`) — useful for resuming a scan right
    /// before re-querying a specific key's neighborhood.
    pub fn from_key(
        core: &'a Core,
        mode: HashMode,
        key: u64,
        fingerprint_bits: u32,
        memento_bits: u32,
        seed: u32,
    ) -> Self {
        let hashed = hash_key(mode, key, core.slots.n_slots(), fingerprint_bits, memento_bits, seed);
        Self::from_position(core, hashed.home)
    }

    fn advance_run(&mut self) -> bool {
        while self.next_home < self.core.slots.n_slots() {
            let h = self.next_home;
            self.next_home += 1;
            if self.core.slots.is_occupied(h) {
                self.current_home = h;
                self.current_boxes = self.core.decode_run(h).into_iter();
                return true;
            }
        }
        false
    }

    fn advance_box(&mut self) -> bool {
        loop {
            if let Some(b) = self.current_boxes.next() {
                let fingerprint = b.fingerprint;
                self.current_box = Some((fingerprint, b.mementos.into_iter()));
                return true;
            }
            if !self.advance_run() {
                return false;
            }
        }
    }
}

impl<'a> Iterator for HashIterator<'a> {
    type Item = IterItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((fingerprint, mementos)) = &mut self.current_box {
                if let Some(memento) = mementos.next() {
                    return Some(IterItem {
                        home: self.current_home,
                        fingerprint: *fingerprint,
                        memento,
                    });
                }
                self.current_box = None;
            }
            if !self.advance_box() {
                return None;
            }
        }
    }
}

/// Cursor restricted to keys whose `(home, fingerprint, memento)` falls
/// within `[l_home:l_fp:l_memento, r_home:r_fp:r_memento]` inclusive — the
/// per-query equivalent of [`HashIterator`] used to enumerate (rather than
/// just test) a range match.
///
/// At a boundary home, only the box whose fingerprint equals that
/// boundary's fingerprint gets the tightened memento bound; any other box
/// sharing that home is either fully in range (an interior home's box) or
/// must be excluded outright, exactly mirroring
/// [`Core::range_lookup`](super::run_engine::Core::range_lookup)'s `fp_ok`
/// gating — a box with an unrelated fingerprint at a boundary home isn't
/// actually inside `[low, high]` just because one of its own mementos
/// happens to fall within the boundary's memento window.
pub struct KeyRangeIterator<'a> {
    inner: HashIterator<'a>,
    l_home: u64,
    l_fp: u64,
    l_memento: u64,
    r_home: u64,
    r_fp: u64,
    r_memento: u64,
}

impl<'a> KeyRangeIterator<'a> {
    pub fn new(core: &'a Core, l_home: u64, l_fp: u64, l_memento: u64, r_home: u64, r_fp: u64, r_memento: u64) -> Self {
        KeyRangeIterator {
            inner: HashIterator::from_position(core, l_home),
            l_home,
            l_fp,
            l_memento,
            r_home,
            r_fp,
            r_memento,
        }
    }
}

impl<'a> Iterator for KeyRangeIterator<'a> {
    type Item = IterItem;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.inner.by_ref() {
            if item.home > self.r_home {
                return None;
            }
            let is_left = item.home == self.l_home;
            let is_right = item.home == self.r_home;
            let fp_ok = match (is_left, is_right) {
                (true, true) => item.fingerprint == self.l_fp || item.fingerprint == self.r_fp,
                (true, false) => item.fingerprint == self.l_fp,
                (false, true) => item.fingerprint == self.r_fp,
                (false, false) => true,
            };
            if !fp_ok {
                continue;
            }
            let lo = if is_left && item.fingerprint == self.l_fp {
                self.l_memento
            } else {
                0
            };
            let hi = if is_right && item.fingerprint == self.r_fp {
                self.r_memento
            } else {
                u64::MAX
            };
            if item.memento >= lo && item.memento <= hi {
                return Some(item);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_iterator_visits_every_memento_in_order() {
        let mut core = Core::new(256, 8, 4);
        core.insert_mementos(3, 1, &[1, 2]).unwrap();
        core.insert_mementos(10, 5, &[7]).unwrap();
        core.insert_mementos(200, 2, &[0, 3, 9]).unwrap();

        let items: Vec<_> = HashIterator::from_position(&core, 0).collect();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].home, 3);
        assert_eq!(items.last().unwrap().home, 200);
    }

    #[test]
    fn from_position_skips_earlier_homes() {
        let mut core = Core::new(256, 8, 4);
        core.insert_mementos(3, 1, &[1]).unwrap();
        core.insert_mementos(10, 5, &[7]).unwrap();

        let items: Vec<_> = HashIterator::from_position(&core, 5).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].home, 10);
    }

    #[test]
    fn key_range_iterator_bounds_at_both_ends() {
        let mut core = Core::new(256, 8, 4);
        core.insert_mementos(10, 1, &[2, 8]).unwrap();
        core.insert_mementos(11, 2, &[3]).unwrap();
        core.insert_mementos(12, 3, &[0, 9]).unwrap();

        let items: Vec<_> = KeyRangeIterator::new(&core, 10, 1, 5, 12, 3, 4).collect();
        // home 10: only memento 8 (>=5); home 11: memento 3 unconstrained; home 12: only memento 0 (<=4)
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].memento, 8);
        assert_eq!(items[1].memento, 3);
        assert_eq!(items[2].memento, 0);
    }

    #[test]
    fn key_range_iterator_excludes_unrelated_fingerprint_at_boundary_home() {
        // Two distinct prefixes collide on home 100: fp=5 with memento 20
        // (outside the query window) and fp=9 with memento 3 (numerically
        // inside the window, but under an unrelated fingerprint). Only a
        // box whose fingerprint matches the boundary's own fingerprint may
        // be tightened by that boundary's memento bound; box fp=9 must not
        // leak through just because 3 falls inside [0, 10].
        let mut core = Core::new(256, 8, 4);
        core.insert_mementos(100, 5, &[20]).unwrap();
        core.insert_mementos(100, 9, &[3]).unwrap();

        let items: Vec<_> = KeyRangeIterator::new(&core, 100, 5, 0, 100, 5, 10).collect();
        assert!(items.is_empty());
    }
}
