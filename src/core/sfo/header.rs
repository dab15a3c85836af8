// ─── PARAM.SFO Layout ───
// Fixed-size header and index-table records. Every offset is relative to
// the position of the signature inside the file, not to the file start.

use crate::core::error::{NexusError, NexusResult};

/// Marker that opens the header region.
pub const PSF_SIGNATURE: &[u8; 4] = b"PSF\x01";

/// signature(4) + version(2) + key table(2) + data table(4) + entry count(4)
pub const HEADER_LEN: usize = 16;

/// The index table starts right after the header.
pub const ENTRY_TABLE_BASE: usize = HEADER_LEN;

/// key offset(2) + type(2) + length(4) + total length(4) + data offset(4)
pub const ENTRY_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfoHeader {
    pub version: u16,
    pub key_table_offset: u16,
    pub data_table_offset: u32,
    pub entry_count: u32,
}

impl SfoHeader {
    /// Parse the header from a region that starts at the signature.
    pub fn parse(region: &[u8]) -> NexusResult<Self> {
        if region.len() < HEADER_LEN {
            return Err(NexusError::Truncated {
                needed: HEADER_LEN,
                available: region.len(),
            });
        }
        if &region[..4] != PSF_SIGNATURE {
            return Err(NexusError::InvalidSignature);
        }

        let truncated = || NexusError::Truncated {
            needed: HEADER_LEN,
            available: region.len(),
        };

        Ok(Self {
            version: read_u16_at(region, 4).ok_or_else(truncated)?,
            key_table_offset: read_u16_at(region, 6).ok_or_else(truncated)?,
            data_table_offset: read_u32_at(region, 8).ok_or_else(truncated)?,
            entry_count: read_u32_at(region, 12).ok_or_else(truncated)?,
        })
    }

    /// Number of index records that fit completely inside `region_len` bytes.
    pub fn entries_in_bounds(&self, region_len: usize) -> u32 {
        let available = region_len.saturating_sub(ENTRY_TABLE_BASE) / ENTRY_LEN;
        u32::try_from(available).unwrap_or(u32::MAX).min(self.entry_count)
    }
}

/// One index-table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfoEntry {
    pub key_offset: u16,
    pub type_tag: u16,
    pub data_len: u32,
    pub data_max_len: u32,
    pub data_offset: u32,
}

impl SfoEntry {
    /// Byte offset of record `index`, relative to the signature.
    pub fn offset_of(index: u32) -> Option<usize> {
        (index as usize)
            .checked_mul(ENTRY_LEN)?
            .checked_add(ENTRY_TABLE_BASE)
    }

    pub fn parse(region: &[u8], index: u32) -> NexusResult<Self> {
        let out_of_range = || NexusError::EntryOutOfRange {
            index,
            detail: format!("record does not fit in {} bytes", region.len()),
        };
        let base = Self::offset_of(index).ok_or_else(out_of_range)?;
        let end = base.checked_add(ENTRY_LEN).ok_or_else(out_of_range)?;
        let record = region.get(base..end).ok_or_else(out_of_range)?;

        Ok(Self {
            key_offset: read_u16_at(record, 0).ok_or_else(out_of_range)?,
            type_tag: read_u16_at(record, 2).ok_or_else(out_of_range)?,
            data_len: read_u32_at(record, 4).ok_or_else(out_of_range)?,
            data_max_len: read_u32_at(record, 8).ok_or_else(out_of_range)?,
            data_offset: read_u32_at(record, 12).ok_or_else(out_of_range)?,
        })
    }
}

pub(crate) fn read_u16_at(bytes: &[u8], at: usize) -> Option<u16> {
    let end = at.checked_add(2)?;
    let array: [u8; 2] = bytes.get(at..end)?.try_into().ok()?;
    Some(u16::from_le_bytes(array))
}

pub(crate) fn read_u32_at(bytes: &[u8], at: usize) -> Option<u32> {
    let end = at.checked_add(4)?;
    let array: [u8; 4] = bytes.get(at..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(array))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(entry_count: u32) -> Vec<u8> {
        let mut out = PSF_SIGNATURE.to_vec();
        out.extend_from_slice(&0x0101u16.to_le_bytes());
        out.extend_from_slice(&0x0030u16.to_le_bytes());
        out.extend_from_slice(&0x0040u32.to_le_bytes());
        out.extend_from_slice(&entry_count.to_le_bytes());
        out
    }

    #[test]
    fn parses_little_endian_fields() {
        let header = SfoHeader::parse(&header_bytes(3)).unwrap();
        assert_eq!(
            header,
            SfoHeader {
                version: 0x0101,
                key_table_offset: 0x30,
                data_table_offset: 0x40,
                entry_count: 3,
            }
        );
    }

    #[test]
    fn short_region_is_truncated() {
        let bytes = header_bytes(1);
        let err = SfoHeader::parse(&bytes[..HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(
            err,
            NexusError::Truncated {
                needed: HEADER_LEN,
                available: 15
            }
        ));
    }

    #[test]
    fn entries_in_bounds_caps_declared_count() {
        let header = SfoHeader::parse(&header_bytes(u32::MAX)).unwrap();
        assert_eq!(header.entries_in_bounds(HEADER_LEN + 2 * ENTRY_LEN + 3), 2);
        assert_eq!(header.entries_in_bounds(HEADER_LEN), 0);
    }

    #[test]
    fn first_entry_starts_right_after_header() {
        assert_eq!(SfoEntry::offset_of(0), Some(16));
        assert_eq!(SfoEntry::offset_of(2), Some(48));
    }
}
