use std::sync::OnceLock;

use regex::Regex;

/// Product-code prefixes of PSP UMD and PSN titles, each followed by five digits.
const DISC_ID_PATTERN: &str =
    r"^(?:ULUS|ULES|ULJM|ULJS|ULKS|UCUS|UCES|UCJS|UCKS|NPJH|NPUH|NPUG|NPEH|NPEG|NPPA|NPEZ|NPJG)[0-9]{5}";

fn disc_id_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(DISC_ID_PATTERN).expect("disc id pattern is valid"))
}

/// Identifier derived from a save directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscId {
    /// Recognised product code, e.g. `ULUS10565`.
    Canonical(String),
    /// No known prefix matched; the raw directory name is used as-is and will
    /// not correlate with the game map.
    Fallback(String),
}

impl DiscId {
    pub fn as_str(&self) -> &str {
        match self {
            DiscId::Canonical(id) | DiscId::Fallback(id) => id,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, DiscId::Canonical(_))
    }

    pub fn into_string(self) -> String {
        match self {
            DiscId::Canonical(id) | DiscId::Fallback(id) => id,
        }
    }
}

/// Derive the disc identifier from a PSP save folder name such as
/// `ULUS10565DATA00`.
pub fn derive_disc_id(dir_name: &str) -> DiscId {
    let upper = dir_name.to_uppercase();
    match disc_id_regex().find(&upper) {
        Some(m) => DiscId::Canonical(m.as_str().to_string()),
        None => DiscId::Fallback(dir_name.to_string()),
    }
}
