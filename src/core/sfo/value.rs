use std::fmt;

use serde::{Serialize, Serializer};

/// `utf8` format tag: NUL-terminated UTF-8 text.
pub const TYPE_UTF8: u16 = 0x0204;
/// `int32` format tag: little-endian unsigned 32-bit integer.
pub const TYPE_U32: u16 = 0x0404;

/// A single decoded PARAM.SFO value.
///
/// Anything that is not recognised as text or a 4-byte integer is kept as raw
/// bytes and rendered as lowercase hex so nothing is lost on the way to JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SfoValue {
    Text(String),
    U32(u32),
    Raw(Vec<u8>),
}

impl SfoValue {
    /// Decode `raw` according to the entry's type tag.
    pub fn decode(type_tag: u16, raw: &[u8]) -> Self {
        match type_tag {
            TYPE_UTF8 => {
                let text = raw.split(|b| *b == 0).next().unwrap_or_default();
                SfoValue::Text(String::from_utf8_lossy(text).into_owned())
            }
            TYPE_U32 if raw.len() == 4 => {
                SfoValue::U32(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            }
            _ => SfoValue::Raw(raw.to_vec()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SfoValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            SfoValue::U32(v) => Some(*v),
            SfoValue::Text(s) => s.trim().parse().ok(),
            SfoValue::Raw(_) => None,
        }
    }
}

impl fmt::Display for SfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SfoValue::Text(s) => f.write_str(s),
            SfoValue::U32(v) => write!(f, "{v}"),
            SfoValue::Raw(bytes) => f.write_str(&hex::encode(bytes)),
        }
    }
}

impl Serialize for SfoValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            SfoValue::Text(s) => serializer.serialize_str(s),
            SfoValue::U32(v) => serializer.serialize_u32(*v),
            SfoValue::Raw(bytes) => serializer.serialize_str(&hex::encode(bytes)),
        }
    }
}
