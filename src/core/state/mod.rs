pub mod app_state;
pub mod config_store;

pub use app_state::AppState;
pub use config_store::{ConfigStore, JsonConfigStore, Settings, EMULATOR_PATH_KEY};
