// ─── Game Map ───
// Disc identifier → disc image (ISO/CSO) path, persisted as a JSON object.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::core::error::NexusResult;
use crate::core::persist::{load_json_or_default, save_json_pretty};

pub type GameMap = BTreeMap<String, PathBuf>;

#[async_trait]
pub trait IsoMap: Send + Sync {
    async fn list_all(&self) -> NexusResult<GameMap>;

    /// Replace the whole mapping and return what was stored.
    async fn set_all(&self, map: GameMap) -> NexusResult<GameMap>;

    /// Mapped image path. An empty path counts as cleared.
    async fn resolve(&self, disc_id: &str) -> NexusResult<Option<PathBuf>> {
        Ok(self
            .list_all()
            .await?
            .remove(disc_id)
            .filter(|iso| !iso.as_os_str().is_empty()))
    }
}

/// `game_map.json` on disk. Every call re-reads the file so edits made by
/// other tools are picked up.
pub struct JsonGameMap {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonGameMap {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl IsoMap for JsonGameMap {
    async fn list_all(&self) -> NexusResult<GameMap> {
        load_json_or_default(&self.path).await
    }

    async fn set_all(&self, map: GameMap) -> NexusResult<GameMap> {
        let _guard = self.write_lock.lock().await;
        save_json_pretty(&self.path, &map).await?;
        info!("Saved {} game map entries to {:?}", map.len(), self.path);
        Ok(map)
    }
}
