/*!
 * Settings persistence
 *
 * The core treats persisted settings as an opaque key-value store. Values
 * are read once at startup and written after every successful mutation.
 */

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{CodeigestError, Result};

/// Key holding the extension allow-list as a JSON array of strings
pub const EXTENSIONS_KEY: &str = "codeigest-extensions";
/// Key holding the notebook output inclusion flag
pub const NOTEBOOK_OUTPUTS_KEY: &str = "codeigest-notebook-outputs";
/// Key holding the notebook image inclusion flag
pub const NOTEBOOK_IMAGES_KEY: &str = "codeigest-notebook-images";

/// Opaque key-value store for user settings
pub trait SettingsStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Settings kept in memory only
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettings {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| CodeigestError::Settings("settings lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Settings persisted as a flat JSON object on disk
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileSettings {
    /// Open the settings file, starting empty if it does not exist yet
    ///
    /// A file that is not a JSON object of strings is ignored with a
    /// warning and overwritten by the next save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!(path = %path.display(), error = %e, "Ignoring corrupt settings file");
                    BTreeMap::new()
                })
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = values.len(), "Loaded settings");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Default settings location inside the user's config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("codeigest").join("settings.json"))
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| CodeigestError::Settings("settings lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }
}

/// Read a persisted boolean flag, `"true"` being the only truthy value
pub fn read_flag(store: &dyn SettingsStore, key: &str) -> bool {
    store.get(key).as_deref() == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_roundtrip() {
        let store = MemorySettings::new();
        assert_eq!(store.get("missing"), None);
        store.set(NOTEBOOK_OUTPUTS_KEY, "true").unwrap();
        assert!(read_flag(&store, NOTEBOOK_OUTPUTS_KEY));
        assert!(!read_flag(&store, NOTEBOOK_IMAGES_KEY));
    }

    #[test]
    fn test_json_file_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = JsonFileSettings::open(&path).unwrap();
        store.set(EXTENSIONS_KEY, r#"[".rs"]"#).unwrap();
        assert!(path.exists());

        let reopened = JsonFileSettings::open(&path).unwrap();
        assert_eq!(reopened.get(EXTENSIONS_KEY).as_deref(), Some(r#"[".rs"]"#));
    }

    #[test]
    fn test_corrupt_json_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileSettings::open(&path).unwrap();
        assert_eq!(store.get(EXTENSIONS_KEY), None);

        store.set(NOTEBOOK_IMAGES_KEY, "true").unwrap();
        let reopened = JsonFileSettings::open(&path).unwrap();
        assert!(read_flag(&reopened, NOTEBOOK_IMAGES_KEY));
    }
}
