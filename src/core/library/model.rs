use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One emulator save state (`<discID>_<slot>.ppst`).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SaveStateRecord {
    pub filename: String,
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
    pub size: u64,
}

/// A game discovered under the save-data root.
///
/// Records only live inside a [`LibrarySnapshot`] and are never mutated
/// after the snapshot is published.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    #[serde(rename = "discID")]
    pub disc_id: String,
    pub title: String,
    pub save_title: Option<String>,
    pub icon_path: Option<PathBuf>,
    pub save_path: PathBuf,
    /// Whether the game map knows an image path for this disc.
    pub has_iso: bool,
    /// Newest first.
    pub save_states: Vec<SaveStateRecord>,

    // ── Extra PARAM.SFO fields ──
    pub version: Option<String>,
    pub system_version: Option<String>,
    pub category: Option<String>,
    pub parental_level: Option<u32>,
    /// `DISC_ID` as written in the descriptor, which may differ from the folder.
    #[serde(rename = "sfoDiscID")]
    pub sfo_disc_id: Option<String>,
}

/// One complete publication of the game library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySnapshot {
    pub games: BTreeMap<String, GameRecord>,
    /// `None` until the first scan completes.
    pub scanned_at: Option<DateTime<Utc>>,
}

impl LibrarySnapshot {
    pub fn get(&self, disc_id: &str) -> Option<&GameRecord> {
        self.games.get(disc_id)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Games ordered by disc identifier.
    pub fn games(&self) -> impl Iterator<Item = &GameRecord> {
        self.games.values()
    }
}
