use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::model::SaveStateRecord;

/// File extensions PPSSPP uses for save states.
pub const SAVE_STATE_EXTENSIONS: &[&str] = &["ppst"];

/// Listing of the flat save-state directory, read once per scan.
#[derive(Debug, Clone, Default)]
pub struct SaveStateDir {
    states: Vec<SaveStateRecord>,
}

impl SaveStateDir {
    /// Read every recognised save state in `dir`. A missing directory is empty.
    pub async fn load(dir: &Path) -> Self {
        let mut states = Vec::new();

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Save-state directory {:?} does not exist", dir);
                return Self { states };
            }
            Err(e) => {
                warn!("Cannot read save-state directory {:?}: {}", dir, e);
                return Self { states };
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Error listing {:?}: {}", dir, e);
                    break;
                }
            };

            let filename = entry.file_name().to_string_lossy().to_string();
            if !has_save_state_extension(&filename) {
                continue;
            }

            let path = entry.path();
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    states.push(SaveStateRecord {
                        filename,
                        path,
                        modified: DateTime::<Utc>::from(modified),
                        size: meta.len(),
                    });
                }
                Ok(_) => {}
                Err(e) => warn!("Cannot stat save state {:?}: {}", path, e),
            }
        }

        Self { states }
    }

    pub fn from_records(states: Vec<SaveStateRecord>) -> Self {
        Self { states }
    }

    /// States whose filename starts with `disc_id`, newest first.
    /// Equal timestamps are ordered by filename so repeated scans agree.
    pub fn for_disc(&self, disc_id: &str) -> Vec<SaveStateRecord> {
        let mut matching: Vec<SaveStateRecord> = self
            .states
            .iter()
            .filter(|s| s.filename.starts_with(disc_id))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        matching
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

fn has_save_state_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SAVE_STATE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Resolve a save state given either a filename from the game's list or a path.
pub fn resolve_save_state(states: &[SaveStateRecord], requested: &str) -> PathBuf {
    states
        .iter()
        .find(|s| s.filename == requested)
        .map(|s| s.path.clone())
        .unwrap_or_else(|| PathBuf::from(requested))
}
