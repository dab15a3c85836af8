use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::disc_id::derive_disc_id;
use super::model::{GameRecord, LibrarySnapshot};
use super::save_states::SaveStateDir;
use crate::core::error::{NexusError, NexusResult};
use crate::core::game_map::{GameMap, IsoMap};
use crate::core::sfo;

pub const DESCRIPTOR_FILE: &str = "PARAM.SFO";
pub const ICON_FILE: &str = "ICON0.PNG";

/// The game catalog built from the PSP `SAVEDATA` tree.
///
/// Readers get an `Arc` to the last published snapshot and never wait for a
/// scan. Scans are serialized on `scan_lock`, which is held until the new
/// snapshot has been swapped in.
pub struct LibraryIndex {
    savedata_dir: PathBuf,
    savestate_dir: PathBuf,
    game_map: Arc<dyn IsoMap>,
    current: RwLock<Arc<LibrarySnapshot>>,
    scan_lock: Mutex<()>,
}

impl LibraryIndex {
    pub fn new(savedata_dir: PathBuf, savestate_dir: PathBuf, game_map: Arc<dyn IsoMap>) -> Self {
        Self {
            savedata_dir,
            savestate_dir,
            game_map,
            current: RwLock::new(Arc::new(LibrarySnapshot::default())),
            scan_lock: Mutex::new(()),
        }
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<LibrarySnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Rebuild the catalog from disk and publish it.
    pub async fn rescan(&self) -> Arc<LibrarySnapshot> {
        let _scan = self.scan_lock.lock().await;

        let snapshot = Arc::new(self.scan().await);
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = Arc::clone(&snapshot);
        }

        info!(
            "Library rescan published {} games from {:?}",
            snapshot.len(),
            self.savedata_dir
        );
        snapshot
    }

    async fn scan(&self) -> LibrarySnapshot {
        let mut snapshot = LibrarySnapshot::default();

        let dirs = match list_subdirectories(&self.savedata_dir).await {
            Ok(dirs) => dirs,
            Err(NexusError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!("Save-data directory {:?} does not exist", self.savedata_dir);
                Vec::new()
            }
            Err(e) => {
                warn!("Cannot scan save-data directory: {}", e);
                Vec::new()
            }
        };

        let game_map = match self.game_map.list_all().await {
            Ok(map) => map,
            Err(e) => {
                warn!("Game map unavailable, no ISO paths will be reported: {}", e);
                GameMap::new()
            }
        };
        let save_states = SaveStateDir::load(&self.savestate_dir).await;
        if save_states.is_empty() {
            debug!("No save states in {:?}", self.savestate_dir);
        } else {
            debug!("{} save states in {:?}", save_states.len(), self.savestate_dir);
        }

        for (name, path) in dirs {
            match scan_save_directory(&name, &path, &game_map, &save_states).await {
                Ok(Some(game)) => {
                    if let Some(previous) = snapshot.games.get(&game.disc_id) {
                        debug!(
                            "{} also found in {:?}, replacing {:?}",
                            game.disc_id, game.save_path, previous.save_path
                        );
                    }
                    snapshot.games.insert(game.disc_id.clone(), game);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping save directory: {}", e),
            }
        }

        snapshot.scanned_at = Some(Utc::now());
        snapshot
    }
}

/// Immediate subdirectories of `root`, sorted by name.
async fn list_subdirectories(root: &Path) -> NexusResult<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();

    let mut entries = tokio::fs::read_dir(root)
        .await
        .map_err(|e| NexusError::io(root, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| NexusError::io(root, e))?
    {
        let path = entry.path();
        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir {
            dirs.push((entry.file_name().to_string_lossy().to_string(), path));
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Build the record for one save folder. `Ok(None)` when it has no descriptor.
async fn scan_save_directory(
    name: &str,
    dir: &Path,
    game_map: &GameMap,
    save_states: &SaveStateDir,
) -> NexusResult<Option<GameRecord>> {
    let descriptor_path = dir.join(DESCRIPTOR_FILE);
    if !path_exists(&descriptor_path).await {
        return Ok(None);
    }

    let scan_failure = |reason: String| NexusError::DirectoryScanFailure {
        path: dir.to_path_buf(),
        reason,
    };

    let bytes = tokio::fs::read(&descriptor_path)
        .await
        .map_err(|e| scan_failure(format!("cannot read {DESCRIPTOR_FILE}: {e}")))?;
    let param = sfo::decode(&bytes).map_err(|e| scan_failure(e.to_string()))?;
    if param.signature_offset > 0 {
        debug!(
            "{:?}: signature found at byte {}",
            descriptor_path, param.signature_offset
        );
    }
    if param.skipped > 0 {
        debug!(
            "{:?}: {} descriptor entries out of range",
            descriptor_path, param.skipped
        );
    }
    let summary = param.summary();

    let disc_id = derive_disc_id(name);
    if !disc_id.is_canonical() {
        debug!("No product code in folder name, using {:?}", disc_id.as_str());
    }
    let disc_id = disc_id.into_string();

    let icon_path = dir.join(ICON_FILE);
    let has_icon = path_exists(&icon_path).await;
    let icon_path = has_icon.then_some(icon_path);

    Ok(Some(GameRecord {
        has_iso: game_map
            .get(&disc_id)
            .is_some_and(|iso| !iso.as_os_str().is_empty()),
        save_states: save_states.for_disc(&disc_id),
        disc_id,
        title: summary.title,
        save_title: summary.save_title,
        icon_path,
        save_path: dir.to_path_buf(),
        version: summary.version,
        system_version: summary.system_version,
        category: summary.category,
        parental_level: summary.parental_level,
        sfo_disc_id: summary.disc_id,
    }))
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Rescan on a fixed period until the task is aborted.
/// The first rescan happens one period after the call.
pub fn spawn_periodic_refresh(index: Arc<LibraryIndex>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let snapshot = index.rescan().await;
            debug!("Periodic refresh: {} games", snapshot.len());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::game_map::JsonGameMap;
    use crate::core::sfo::decoder::tests::{build_sfo, text};
    use crate::core::sfo::value::TYPE_UTF8;

    struct Fixture {
        _tmp: tempfile::TempDir,
        savedata: PathBuf,
        states: PathBuf,
        map_path: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let savedata = tmp.path().join("SAVEDATA");
            let states = tmp.path().join("savestates");
            std::fs::create_dir_all(&savedata).unwrap();
            std::fs::create_dir_all(&states).unwrap();
            Self {
                map_path: tmp.path().join("game_map.json"),
                _tmp: tmp,
                savedata,
                states,
            }
        }

        fn add_game(&self, folder: &str, title: &str) -> PathBuf {
            let dir = self.savedata.join(folder);
            std::fs::create_dir_all(&dir).unwrap();
            let sfo = build_sfo(&[
                ("TITLE", TYPE_UTF8, text(title)),
                ("SAVEDATA_TITLE", TYPE_UTF8, text("Save Slot")),
            ]);
            std::fs::write(dir.join(DESCRIPTOR_FILE), sfo).unwrap();
            dir
        }

        fn index(&self) -> LibraryIndex {
            LibraryIndex::new(
                self.savedata.clone(),
                self.states.clone(),
                Arc::new(JsonGameMap::new(self.map_path.clone())),
            )
        }
    }

    #[tokio::test]
    async fn scan_builds_records_and_skips_bad_directories() {
        let fx = Fixture::new();
        let game_dir = fx.add_game("ULUS10565DATA00", "Test Game");
        std::fs::write(game_dir.join(ICON_FILE), b"\x89PNG").unwrap();
        fx.add_game("randomfolder", "Homebrew");
        std::fs::create_dir_all(fx.savedata.join("EMPTYDIR")).unwrap();
        let broken = fx.savedata.join("ULES00001DATA00");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join(DESCRIPTOR_FILE), b"not a descriptor").unwrap();
        std::fs::write(fx.savedata.join("stray.txt"), b"file").unwrap();
        std::fs::write(fx.states.join("ULUS10565_1.ppst"), b"123").unwrap();
        std::fs::write(&fx.map_path, r#"{"ULUS10565": "/isos/test.iso"}"#).unwrap();

        let index = fx.index();
        let snapshot = index.rescan().await;

        assert_eq!(snapshot.len(), 2);
        let game = snapshot.get("ULUS10565").unwrap();
        assert_eq!(game.title, "Test Game");
        assert_eq!(game.save_title.as_deref(), Some("Save Slot"));
        assert_eq!(game.icon_path, Some(game_dir.join(ICON_FILE)));
        assert_eq!(game.save_path, game_dir);
        assert!(game.has_iso);
        assert_eq!(game.save_states.len(), 1);
        assert_eq!(game.save_states[0].size, 3);

        let homebrew = snapshot.get("randomfolder").unwrap();
        assert!(!homebrew.has_iso);
        assert_eq!(homebrew.icon_path, None);
        assert!(snapshot.get("ULES00001").is_none());
        assert!(snapshot.scanned_at.is_some());
    }

    #[tokio::test]
    async fn cleared_mapping_is_not_a_known_image() {
        let fx = Fixture::new();
        fx.add_game("ULUS10565DATA00", "Test Game");
        std::fs::write(&fx.map_path, r#"{"ULUS10565": ""}"#).unwrap();

        let index = fx.index();
        let snapshot = index.rescan().await;

        assert!(!snapshot.get("ULUS10565").unwrap().has_iso);
        let map = JsonGameMap::new(fx.map_path.clone());
        assert_eq!(map.resolve("ULUS10565").await.unwrap(), None);
    }

    #[tokio::test]
    async fn later_folder_wins_for_duplicate_disc_ids() {
        let fx = Fixture::new();
        fx.add_game("ULUS10565DATA01", "B");
        fx.add_game("ULUS10565DATA00", "A");

        let snapshot = fx.index().rescan().await;

        assert_eq!(snapshot.len(), 1);
        let game = snapshot.get("ULUS10565").unwrap();
        assert_eq!(game.title, "B");
        assert_eq!(game.save_path, fx.savedata.join("ULUS10565DATA01"));
    }

    #[tokio::test]
    async fn periodic_refresh_waits_one_period() {
        let fx = Fixture::new();
        fx.add_game("ULUS10565DATA00", "One");
        let index = Arc::new(fx.index());
        let handle = spawn_periodic_refresh(Arc::clone(&index), Duration::from_secs(3600));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(index.snapshot().scanned_at.is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn missing_root_yields_empty_snapshot() {
        let fx = Fixture::new();
        let index = LibraryIndex::new(
            fx.savedata.join("does-not-exist"),
            fx.states.clone(),
            Arc::new(JsonGameMap::new(fx.map_path.clone())),
        );
        assert!(index.rescan().await.is_empty());
    }

    #[tokio::test]
    async fn rescan_is_idempotent() {
        let fx = Fixture::new();
        fx.add_game("ULUS10565DATA00", "One");
        fx.add_game("NPJH50505DATA00", "Two");
        for slot in 0..4 {
            std::fs::write(fx.states.join(format!("ULUS10565_{slot}.ppst")), b"s").unwrap();
        }

        let index = fx.index();
        let first = index.rescan().await;
        let second = index.rescan().await;

        assert_eq!(first.games, second.games);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn published_snapshots_are_never_mutated() {
        let fx = Fixture::new();
        fx.add_game("ULUS10565DATA00", "One");
        let index = fx.index();

        assert!(index.snapshot().is_empty());
        let before = index.rescan().await;
        fx.add_game("NPJH50505DATA00", "Two");
        let after = index.rescan().await;

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_eq!(index.snapshot().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refreshes_never_expose_partial_snapshots() {
        let fx = Fixture::new();
        for i in 0..20 {
            fx.add_game(&format!("ULUS{:05}DATA00", 10000 + i), "Game");
        }
        let index = Arc::new(fx.index());
        assert_eq!(index.rescan().await.len(), 20);

        for i in 20..30 {
            fx.add_game(&format!("ULUS{:05}DATA00", 10000 + i), "Game");
        }

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let index = Arc::clone(&index);
            tasks.push(tokio::spawn(async move {
                index.rescan().await;
            }));
        }
        for _ in 0..4 {
            let index = Arc::clone(&index);
            tasks.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let len = index.snapshot().len();
                    assert!(len == 20 || len == 30, "torn snapshot with {len} games");
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(index.snapshot().len(), 30);
    }

    #[tokio::test]
    async fn periodic_refresh_picks_up_new_games() {
        let fx = Fixture::new();
        let index = Arc::new(fx.index());
        let handle = spawn_periodic_refresh(Arc::clone(&index), Duration::from_millis(50));

        fx.add_game("ULUS10565DATA00", "One");
        wait_for_len(&index, 1).await;
        fx.add_game("NPJH50505DATA00", "Two");
        wait_for_len(&index, 2).await;

        handle.abort();
    }

    async fn wait_for_len(index: &LibraryIndex, expected: usize) {
        for _ in 0..200 {
            if index.snapshot().len() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("library never reached {expected} games");
    }
}
