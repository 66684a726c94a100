//! On-disk / serialized format (spec §6): a fixed header, then the block
//! metadata array, then the packed slot payload — all little-endian, no
//! external serialization crate. This matches the teacher codebase's
//! general pattern of hand-rolled byte layouts for sketch internals
//! (see e.g. `membership/binary_fuse.rs`'s own `serialize`/`deserialize`
//! pair) rather than pulling in `serde`.

use crate::common::{Result, SketchError};

use super::filter::MementoFilter;
use super::hashing::HashMode;
use super::run_engine::Core;
use super::slots::{Block, SlotArray, SLOTS_PER_BLOCK};

const MAGIC: &[u8; 8] = b"MMNTFLT1";
const VERSION: u32 = 1;

fn hash_mode_tag(mode: HashMode) -> u8 {
    match mode {
        HashMode::Default => 0,
        HashMode::Invertible => 1,
        HashMode::None => 2,
    }
}

fn hash_mode_from_tag(tag: u8) -> Result<HashMode> {
    match tag {
        0 => Ok(HashMode::Default),
        1 => Ok(HashMode::Invertible),
        2 => Ok(HashMode::None),
        other => Err(SketchError::DeserializationError(format!(
            "unknown hash mode tag {other}"
        ))),
    }
}

/// Serializes `filter` to the spec §6 byte format.
pub fn serialize(filter: &MementoFilter) -> Vec<u8> {
    let core = filter.core();
    let slots = &core.slots;
    let n_blocks = slots.n_blocks() as u64;

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&slots.n_slots().to_le_bytes());
    out.extend_from_slice(&core.fingerprint_bits.to_le_bytes());
    out.extend_from_slice(&core.memento_bits.to_le_bytes());
    out.extend_from_slice(&filter.original_quotient_bits().to_le_bytes());
    out.push(hash_mode_tag(filter.hash_mode()));
    out.extend_from_slice(&filter.seed().to_le_bytes());
    out.extend_from_slice(&core.n_occupied_slots().to_le_bytes());
    out.extend_from_slice(&core.n_distinct_prefixes().to_le_bytes());
    out.push(u8::from(filter.auto_resize_enabled()));
    out.push(u8::from(filter.expandable_enabled()));

    for b in slots.raw_blocks() {
        out.extend_from_slice(&b.offset.to_le_bytes());
        out.extend_from_slice(&b.occupieds.to_le_bytes());
        out.extend_from_slice(&b.runends.to_le_bytes());
    }
    debug_assert_eq!(slots.raw_blocks().len() as u64, n_blocks);

    for w in slots.raw_words() {
        out.extend_from_slice(&w.to_le_bytes());
    }

    out
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < self.pos + n {
            return Err(SketchError::DeserializationError(
                "unexpected end of input".to_string(),
            ));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }
}

/// Deserializes a filter previously produced by [`serialize`]. Validates
/// `magic`, `version`, and that `n_slots` is a power of two (spec §6).
pub fn deserialize(bytes: &[u8]) -> Result<MementoFilter> {
    let mut r = Reader::new(bytes);
    let magic = r.take(8)?;
    if magic != MAGIC {
        return Err(SketchError::DeserializationError(
            "bad magic: not a Memento Filter byte stream".to_string(),
        ));
    }
    let version = r.u32()?;
    if version != VERSION {
        return Err(SketchError::DeserializationError(format!(
            "unsupported version {version}"
        )));
    }
    let n_slots = r.u64()?;
    if !n_slots.is_power_of_two() || n_slots % SLOTS_PER_BLOCK as u64 != 0 {
        return Err(SketchError::DeserializationError(
            "n_slots is not a power of two multiple of the block size".to_string(),
        ));
    }
    let fingerprint_bits = r.u32()?;
    let memento_bits = r.u32()?;
    let original_quotient_bits = r.u32()?;
    let hash_mode = hash_mode_from_tag(r.u8()?)?;
    let seed = r.u32()?;
    let _n_occupied_slots = r.u64()?;
    let _n_distinct_prefixes = r.u64()?;
    let auto_resize = r.u8()? != 0;
    let expandable = r.u8()? != 0;

    let n_blocks = (n_slots / SLOTS_PER_BLOCK as u64) as usize;
    let mut blocks = Vec::with_capacity(n_blocks);
    for _ in 0..n_blocks {
        let offset = r.u64()?;
        let occupieds = r.u64()?;
        let runends = r.u64()?;
        blocks.push(Block {
            offset,
            occupieds,
            runends,
        });
    }

    let slot_bits = fingerprint_bits + memento_bits;
    let total_bits = n_slots as usize * slot_bits as usize;
    let n_words = total_bits.div_ceil(64);
    let mut words = Vec::with_capacity(n_words);
    for _ in 0..n_words {
        words.push(r.u64()?);
    }

    let slots = SlotArray::from_raw_parts(n_slots, slot_bits, words, blocks);
    let core = Core::from_slots(slots, fingerprint_bits, memento_bits);
    Ok(MementoFilter::from_parts(
        core,
        hash_mode,
        seed,
        auto_resize,
        expandable,
        original_quotient_bits,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range_filters::memento::filter::OperationFlags;

    #[test]
    fn round_trip_is_bitwise_equal_and_behaviorally_identical() {
        let mut f = MementoFilter::new(256, 8, 4).unwrap();
        for k in [10u64, 20, 30, 12345, 999] {
            f.insert(k, OperationFlags::NO_LOCK);
        }
        let bytes = serialize(&f);
        let restored = deserialize(&bytes).unwrap();

        assert_eq!(restored.n_slots(), f.n_slots());
        assert_eq!(restored.fingerprint_bits(), f.fingerprint_bits());
        assert_eq!(restored.memento_bits(), f.memento_bits());
        assert_eq!(restored.n_distinct_prefixes(), f.n_distinct_prefixes());
        for k in [10u64, 20, 30, 12345, 999, 7, 888] {
            assert_eq!(
                restored.point_query(k, OperationFlags::NO_LOCK).is_positive(),
                f.point_query(k, OperationFlags::NO_LOCK).is_positive(),
            );
        }
        assert_eq!(serialize(&restored), bytes);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = serialize(&MementoFilter::new(64, 8, 4).unwrap());
        bytes[0] = b'X';
        assert!(deserialize(&bytes).is_err());
    }

    #[test]
    fn rejects_non_power_of_two_n_slots() {
        let mut bytes = serialize(&MementoFilter::new(128, 8, 4).unwrap());
        // n_slots field starts right after 8-byte magic + 4-byte version.
        bytes[12..20].copy_from_slice(&100u64.to_le_bytes());
        assert!(deserialize(&bytes).is_err());
    }
}
