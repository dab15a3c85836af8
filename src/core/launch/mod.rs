pub mod task;

pub use task::{build_command, Launcher, PpssppLauncher};
