use std::sync::Arc;

use crate::core::game_map::{IsoMap, JsonGameMap};
use crate::core::launch::{Launcher, PpssppLauncher};
use crate::core::library::LibraryIndex;
use crate::core::paths::ServiceConfig;

use super::config_store::{ConfigStore, JsonConfigStore};

/// Everything the request handlers need. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<LibraryIndex>,
    pub game_map: Arc<dyn IsoMap>,
    pub config: Arc<dyn ConfigStore>,
    pub launcher: Arc<dyn Launcher>,
}

impl AppState {
    pub fn new(
        library: Arc<LibraryIndex>,
        game_map: Arc<dyn IsoMap>,
        config: Arc<dyn ConfigStore>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            library,
            game_map,
            config,
            launcher,
        }
    }

    /// File-backed collaborators and the PPSSPP launcher for `service`.
    pub fn from_config(service: &ServiceConfig) -> Self {
        let game_map: Arc<dyn IsoMap> = Arc::new(JsonGameMap::new(service.game_map_path.clone()));
        let config: Arc<dyn ConfigStore> =
            Arc::new(JsonConfigStore::new(service.config_path.clone()));
        let launcher: Arc<dyn Launcher> = Arc::new(PpssppLauncher::new(Arc::clone(&config)));
        let library = Arc::new(LibraryIndex::new(
            service.savedata_dir.clone(),
            service.savestate_dir.clone(),
            Arc::clone(&game_map),
        ));

        Self::new(library, game_map, config, launcher)
    }

    /// Replace the launcher, e.g. with one that records calls.
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }
}
