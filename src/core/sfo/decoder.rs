use std::collections::BTreeMap;

use tracing::debug;

use crate::core::error::{NexusError, NexusResult};

use super::header::{SfoEntry, SfoHeader, PSF_SIGNATURE};
use super::value::SfoValue;

pub const KEY_TITLE: &str = "TITLE";
pub const KEY_SAVEDATA_TITLE: &str = "SAVEDATA_TITLE";
pub const KEY_TITLE_ID: &str = "TITLE_ID";
pub const KEY_DISC_ID: &str = "DISC_ID";
pub const KEY_VERSION: &str = "VERSION";
pub const KEY_SYSTEM_VER: &str = "SYSTEM_VER";
pub const KEY_CATEGORY: &str = "CATEGORY";
pub const KEY_PARENTAL_LEVEL: &str = "PARENTAL_LEVEL";

pub const UNKNOWN_TITLE: &str = "Unknown Game";

/// Decoded contents of one PARAM.SFO blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSfo {
    pub header: SfoHeader,
    /// Offset of the signature inside the input buffer.
    pub signature_offset: usize,
    pub entries: BTreeMap<String, SfoValue>,
    /// Declared entries that were dropped because they pointed outside the buffer.
    pub skipped: u32,
}

/// Metadata fields the library cares about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamSummary {
    pub title: String,
    pub disc_id: Option<String>,
    pub version: Option<String>,
    pub system_version: Option<String>,
    pub save_title: Option<String>,
    pub category: Option<String>,
    pub parental_level: Option<u32>,
}

/// Decode a PARAM.SFO buffer.
///
/// Fails only when the signature is missing or the header is cut short.
/// Individual entries that reference bytes outside the buffer are skipped.
pub fn decode(buf: &[u8]) -> NexusResult<ParamSfo> {
    let signature_offset = find_signature(buf).ok_or(NexusError::InvalidSignature)?;
    let region = &buf[signature_offset..];
    let header = SfoHeader::parse(region)?;

    let in_bounds = header.entries_in_bounds(region.len());
    let mut skipped = header.entry_count - in_bounds;
    if skipped > 0 {
        debug!(
            "SFO declares {} entries, only {} fit in {} bytes",
            header.entry_count,
            in_bounds,
            region.len()
        );
    }

    let mut entries = BTreeMap::new();
    for index in 0..in_bounds {
        match decode_entry(region, &header, index) {
            Ok((key, value)) => {
                entries.insert(key, value);
            }
            Err(err) => {
                debug!("Skipping SFO entry: {err}");
                skipped += 1;
            }
        }
    }

    Ok(ParamSfo {
        header,
        signature_offset,
        entries,
        skipped,
    })
}

fn find_signature(buf: &[u8]) -> Option<usize> {
    buf.windows(PSF_SIGNATURE.len())
        .position(|window| window == PSF_SIGNATURE)
}

fn decode_entry(
    region: &[u8],
    header: &SfoHeader,
    index: u32,
) -> NexusResult<(String, SfoValue)> {
    let entry = SfoEntry::parse(region, index)?;

    let key_start = header.key_table_offset as usize + entry.key_offset as usize;
    if key_start >= region.len() {
        return Err(NexusError::EntryOutOfRange {
            index,
            detail: format!("key offset {key_start} past end ({})", region.len()),
        });
    }
    let key_bytes = &region[key_start..];
    let key_len = key_bytes
        .iter()
        .position(|b| *b == 0)
        .unwrap_or(key_bytes.len());
    let key = String::from_utf8_lossy(&key_bytes[..key_len]).into_owned();

    let value_range = (header.data_table_offset as usize)
        .checked_add(entry.data_offset as usize)
        .and_then(|start| Some(start..start.checked_add(entry.data_len as usize)?));
    let raw = value_range
        .clone()
        .and_then(|range| region.get(range))
        .ok_or_else(|| NexusError::EntryOutOfRange {
            index,
            detail: format!(
                "value {:?} for key {key:?} past end ({})",
                value_range,
                region.len()
            ),
        })?;

    Ok((key, SfoValue::decode(entry.type_tag, raw)))
}

impl ParamSfo {
    pub fn get(&self, key: &str) -> Option<&SfoValue> {
        self.entries.get(key)
    }

    /// Value rendered as a string, `None` when absent or empty.
    pub fn text(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .map(ToString::to_string)
            .filter(|s| !s.trim().is_empty())
    }

    /// Title fallback: `TITLE` → `SAVEDATA_TITLE` → `TITLE_ID` → "Unknown Game".
    pub fn title(&self) -> String {
        self.text(KEY_TITLE)
            .or_else(|| self.text(KEY_SAVEDATA_TITLE))
            .or_else(|| self.text(KEY_TITLE_ID))
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
    }

    pub fn summary(&self) -> ParamSummary {
        ParamSummary {
            title: self.title(),
            disc_id: self.text(KEY_DISC_ID),
            version: self.text(KEY_VERSION),
            system_version: self.text(KEY_SYSTEM_VER),
            save_title: self.text(KEY_SAVEDATA_TITLE),
            category: self.text(KEY_CATEGORY),
            parental_level: self.get(KEY_PARENTAL_LEVEL).and_then(SfoValue::as_u32),
        }
    }
}
