// ─── JSON Persistence ───
// Small helpers shared by the file-backed game map and settings store.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::error::{NexusError, NexusResult};

/// Load a JSON document, returning `T::default()` when the file does not exist.
pub async fn load_json_or_default<T>(path: &Path) -> NexusResult<T>
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read_to_string(path).await {
        Ok(raw) if raw.trim().is_empty() => Ok(T::default()),
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(NexusError::io(path, e)),
    }
}

/// Write `value` as pretty-printed JSON, creating parent directories.
pub async fn save_json_pretty<T>(path: &Path, value: &T) -> NexusResult<()>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| NexusError::io(parent, e))?;
    }

    tokio::fs::write(path, json)
        .await
        .map_err(|e| NexusError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_file_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let map: BTreeMap<String, String> =
            load_json_or_default(&tmp.path().join("absent.json")).await.unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn save_creates_parents_and_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("map.json");
        let mut map = BTreeMap::new();
        map.insert("ULUS10565".to_string(), "/isos/game.iso".to_string());

        save_json_pretty(&path, &map).await.unwrap();
        let loaded: BTreeMap<String, String> = load_json_or_default(&path).await.unwrap();
        assert_eq!(loaded, map);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let result: NexusResult<BTreeMap<String, String>> = load_json_or_default(&path).await;
        assert!(matches!(result, Err(NexusError::Json(_))));
    }
}
