pub mod disc_id;
pub mod index;
pub mod model;
pub mod save_states;

pub use disc_id::{derive_disc_id, DiscId};
pub use index::{spawn_periodic_refresh, LibraryIndex, DESCRIPTOR_FILE, ICON_FILE};
pub use model::{GameRecord, LibrarySnapshot, SaveStateRecord};
pub use save_states::{resolve_save_state, SaveStateDir};
