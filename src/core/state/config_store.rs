use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::info;

use crate::core::error::NexusResult;
use crate::core::persist::{load_json_or_default, save_json_pretty};

/// Key holding the PPSSPP executable path.
pub const EMULATOR_PATH_KEY: &str = "ppsspp_path";

/// Free-form user settings as stored and served to the dashboard.
pub type Settings = Map<String, Value>;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self) -> NexusResult<Settings>;

    /// Replace the stored settings and return them.
    async fn set(&self, settings: Settings) -> NexusResult<Settings>;

    /// Configured emulator executable, `None` when unset or blank.
    async fn emulator_path(&self) -> NexusResult<Option<PathBuf>> {
        let settings = self.get().await?;
        Ok(settings
            .get(EMULATOR_PATH_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from))
    }
}

/// Settings persisted as a pretty-printed JSON object.
pub struct JsonConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn get(&self) -> NexusResult<Settings> {
        load_json_or_default(&self.path).await
    }

    async fn set(&self, settings: Settings) -> NexusResult<Settings> {
        let _guard = self.write_lock.lock().await;
        save_json_pretty(&self.path, &settings).await?;
        info!("Saved settings to {:?}", self.path);
        Ok(settings)
    }
}
