// ─── Launch Task ───
// Spawns PPSSPP with a disc image and an optional save state.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::error::{NexusError, NexusResult};
use crate::core::state::ConfigStore;

#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start the emulator and return as soon as the process is spawned.
    async fn launch(&self, iso_path: &Path, save_state: Option<&Path>) -> NexusResult<()>;
}

/// Launches the PPSSPP executable configured in the settings store.
pub struct PpssppLauncher {
    config: Arc<dyn ConfigStore>,
}

impl PpssppLauncher {
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Launcher for PpssppLauncher {
    async fn launch(&self, iso_path: &Path, save_state: Option<&Path>) -> NexusResult<()> {
        let exe_path = match self.config.emulator_path().await? {
            Some(path) => path,
            None => {
                return Err(NexusError::LaunchFailure(
                    "PPSSPP executable path not set".into(),
                ))
            }
        };
        if !path_exists(&exe_path).await {
            return Err(NexusError::LaunchFailure(format!(
                "PPSSPP executable {:?} does not exist",
                exe_path
            )));
        }

        if !path_exists(iso_path).await {
            return Err(NexusError::LaunchFailure(format!(
                "Game image {:?} does not exist",
                iso_path
            )));
        }

        let state = existing_save_state(save_state).await;
        let mut cmd = build_command(&exe_path, iso_path, state);
        debug!("Command (copy/paste): {}", format_command_for_logs(cmd.as_std()));

        // The child is not awaited; tokio reaps it in the background once it exits.
        let child = cmd
            .spawn()
            .map_err(|e| NexusError::LaunchFailure(format!("Failed to launch PPSSPP: {e}")))?;

        info!(
            "Launched PPSSPP (pid {:?}) with {:?}",
            child.id(),
            iso_path
        );
        Ok(())
    }
}

/// `<exe> <iso> [--state=<path>]`
pub fn build_command(
    exe_path: &Path,
    iso_path: &Path,
    save_state: Option<&Path>,
) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(exe_path);
    cmd.arg(iso_path);
    if let Some(state) = save_state {
        let mut flag = std::ffi::OsString::from("--state=");
        flag.push(state);
        cmd.arg(flag);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(false);
    cmd
}

/// The requested state if it exists on disk. A missing one is dropped.
async fn existing_save_state(save_state: Option<&Path>) -> Option<&Path> {
    let path = save_state?;
    if path_exists(path).await {
        Some(path)
    } else {
        warn!("Save state not found, launching without it: {:?}", path);
        None
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

fn format_command_for_logs(cmd: &std::process::Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
