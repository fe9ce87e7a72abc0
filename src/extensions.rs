/*!
 * Extension allow-list deciding which files are relevant
 */

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::CodeigestError;
use crate::settings::{SettingsStore, EXTENSIONS_KEY};

/// Extensions allowed when nothing has been persisted yet
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".tsx", ".css", ".html", ".js", ".py", ".ipynb", ".md", ".txt", ".json",
];

/// Ordered set of allowed extensions
///
/// Order only matters for display. Every successful mutation is written to
/// the attached settings store, if any.
#[derive(Clone)]
pub struct ExtensionPolicy {
    extensions: Vec<String>,
    store: Option<Arc<dyn SettingsStore>>,
}

impl fmt::Debug for ExtensionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionPolicy")
            .field("extensions", &self.extensions)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::from_extensions(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl ExtensionPolicy {
    /// Build an unpersisted policy from a list of extensions
    ///
    /// Entries are normalized; malformed entries and duplicates are dropped.
    pub fn from_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self {
            extensions: Vec::new(),
            store: None,
        };
        for ext in extensions {
            if let Some(ext) = normalize(ext.as_ref()) {
                if !policy.extensions.contains(&ext) {
                    policy.extensions.push(ext);
                }
            }
        }
        policy
    }

    /// Load the allow-list from a settings store and persist future edits to it
    pub fn load(store: Arc<dyn SettingsStore>) -> Self {
        let saved = store.get(EXTENSIONS_KEY).and_then(|raw| {
            serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| warn!(error = %e, "Ignoring malformed saved extensions"))
                .ok()
        });

        let mut policy = match saved {
            Some(list) => Self::from_extensions(list),
            None => Self::default(),
        };
        policy.store = Some(store);
        policy
    }

    /// Whether files with this extension are relevant
    pub fn is_relevant(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }

    /// Allowed extensions in display order
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Add an extension, returning whether it was added
    ///
    /// Input is trimmed and lowercased; empty input, input without a leading
    /// dot and duplicates are rejected without touching the set.
    pub fn add(&mut self, extension: &str) -> bool {
        let Some(ext) = normalize(extension) else {
            return false;
        };
        if self.extensions.contains(&ext) {
            return false;
        }

        info!(extension = %ext, "Adding extension");
        self.extensions.push(ext);
        self.persist();
        true
    }

    /// Remove an extension, returning whether it was present
    pub fn remove(&mut self, extension: &str) -> bool {
        let ext = extension.trim().to_lowercase();
        let Some(index) = self.extensions.iter().position(|e| *e == ext) else {
            return false;
        };

        info!(extension = %ext, "Removing extension");
        self.extensions.remove(index);
        self.persist();
        true
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let result = serde_json::to_string(&self.extensions)
            .map_err(CodeigestError::from)
            .and_then(|json| store.set(EXTENSIONS_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist extensions");
        }
    }
}

fn normalize(extension: &str) -> Option<String> {
    let ext = extension.trim().to_lowercase();
    if !ext.starts_with('.') {
        return None;
    }
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    #[test]
    fn test_add_normalizes_and_rejects() {
        let mut policy = ExtensionPolicy::from_extensions([".js"]);

        assert!(policy.add("  .RS "));
        assert!(policy.is_relevant(".rs"));
        assert!(!policy.add(".rs"), "duplicates are rejected");
        assert!(!policy.add("toml"), "missing leading dot");
        assert!(!policy.add("   "), "empty");
        assert!(policy.add("."), "a bare dot matches names ending in a dot");

        assert_eq!(
            policy.extensions(),
            &[".js".to_string(), ".rs".to_string(), ".".to_string()]
        );
    }

    #[test]
    fn test_remove() {
        let mut policy = ExtensionPolicy::from_extensions([".js", ".py"]);
        assert!(policy.remove(".js"));
        assert!(!policy.remove(".js"));
        assert!(!policy.is_relevant(".js"));
        assert!(policy.is_relevant(".py"));
    }

    #[test]
    fn test_defaults_when_nothing_saved() {
        let store = Arc::new(MemorySettings::new());
        let policy = ExtensionPolicy::load(store);
        assert_eq!(policy.extensions().len(), DEFAULT_EXTENSIONS.len());
        assert!(policy.is_relevant(".ipynb"));
    }

    #[test]
    fn test_mutations_are_persisted() {
        let store = Arc::new(MemorySettings::new());
        let mut policy = ExtensionPolicy::load(store.clone());

        assert!(policy.add(".rs"));
        assert!(policy.remove(".css"));

        let reloaded = ExtensionPolicy::load(store.clone());
        assert!(reloaded.is_relevant(".rs"));
        assert!(!reloaded.is_relevant(".css"));
        assert_eq!(reloaded.extensions(), policy.extensions());
    }

    #[test]
    fn test_rejected_add_does_not_persist() {
        let store = Arc::new(MemorySettings::new());
        let mut policy = ExtensionPolicy::load(store.clone());
        assert!(!policy.add("rs"));
        assert_eq!(store.get(EXTENSIONS_KEY), None);
    }

    #[test]
    fn test_malformed_saved_list_falls_back_to_defaults() {
        let store = Arc::new(MemorySettings::new());
        store.set(EXTENSIONS_KEY, "{oops").unwrap();
        let policy = ExtensionPolicy::load(store);
        assert!(policy.is_relevant(".md"));
    }
}
