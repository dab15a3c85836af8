// ─── Service Configuration ───
// Where the agent looks for PPSSPP data and keeps its own files.
// Every location can be overridden through environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{NexusError, NexusResult};

const APP_DIR_NAME: &str = "SaveNexus";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8765";
pub const DEFAULT_REFRESH_SECS: u64 = 5;

pub const ENV_LISTEN_ADDR: &str = "SAVENEXUS_LISTEN_ADDR";
pub const ENV_SAVEDATA_DIR: &str = "SAVENEXUS_SAVEDATA_DIR";
pub const ENV_SAVESTATE_DIR: &str = "SAVENEXUS_SAVESTATE_DIR";
pub const ENV_GAME_MAP: &str = "SAVENEXUS_GAME_MAP";
pub const ENV_CONFIG: &str = "SAVENEXUS_CONFIG";
pub const ENV_REFRESH_SECS: &str = "SAVENEXUS_REFRESH_SECS";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    /// `PSP/SAVEDATA`: one folder per game.
    pub savedata_dir: PathBuf,
    /// `PSP/SYSTEM/savestates`: flat directory of `.ppst` files.
    pub savestate_dir: PathBuf,
    pub game_map_path: PathBuf,
    pub config_path: PathBuf,
    /// `None` disables the periodic rescan.
    pub refresh_interval: Option<Duration>,
}

impl ServiceConfig {
    /// Defaults rooted at `~/Documents/PPSSPP` and the platform data dirs.
    pub fn defaults() -> Self {
        let ppsspp_psp = documents_dir().join("PPSSPP").join("PSP");
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8765)),
            savedata_dir: ppsspp_psp.join("SAVEDATA"),
            savestate_dir: ppsspp_psp.join("SYSTEM").join("savestates"),
            game_map_path: app_data_dir().join("game_map.json"),
            config_path: app_config_dir().join("config.json"),
            refresh_interval: Some(Duration::from_secs(DEFAULT_REFRESH_SECS)),
        }
    }

    pub fn from_env() -> NexusResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to [`Self::defaults`].
    pub fn from_lookup<F>(lookup: F) -> NexusResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::defaults();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = value(ENV_LISTEN_ADDR) {
            config.listen_addr = addr.trim().parse().map_err(|e| {
                NexusError::Config(format!("{ENV_LISTEN_ADDR}={addr:?} is not an address: {e}"))
            })?;
        }
        if let Some(dir) = value(ENV_SAVEDATA_DIR) {
            config.savedata_dir = PathBuf::from(dir);
        }
        if let Some(dir) = value(ENV_SAVESTATE_DIR) {
            config.savestate_dir = PathBuf::from(dir);
        }
        if let Some(path) = value(ENV_GAME_MAP) {
            config.game_map_path = PathBuf::from(path);
        }
        if let Some(path) = value(ENV_CONFIG) {
            config.config_path = PathBuf::from(path);
        }
        if let Some(secs) = value(ENV_REFRESH_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                NexusError::Config(format!("{ENV_REFRESH_SECS}={secs:?} is not a number: {e}"))
            })?;
            config.refresh_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn documents_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn app_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
