/*!
 * Session: extension policy, file repository and settings wired together
 *
 * This is the surface a presentation layer drives. Every policy edit is
 * followed by the matching reclassification sweep, and every notebook
 * option change by a reformat, always in that order.
 */

use std::sync::Arc;

use tracing::{info, warn};

use crate::extensions::ExtensionPolicy;
use crate::notebook::NotebookOptions;
use crate::repository::FileRepository;
use crate::settings::SettingsStore;
use crate::tree::TreeNode;
use crate::types::{AllPaths, IngestEntry, IngestOutcome, Reclassification};

pub struct Session {
    policy: ExtensionPolicy,
    repository: FileRepository,
    settings: Arc<dyn SettingsStore>,
}

impl Session {
    /// Start a session from persisted settings
    pub fn open(settings: Arc<dyn SettingsStore>) -> Self {
        let policy = ExtensionPolicy::load(settings.clone());
        let options = NotebookOptions::load(settings.as_ref());
        info!(
            extensions = policy.extensions().len(),
            include_outputs = options.include_outputs,
            include_images = options.include_images,
            "Session opened"
        );

        Self {
            policy,
            repository: FileRepository::new(options),
            settings,
        }
    }

    pub fn policy(&self) -> &ExtensionPolicy {
        &self.policy
    }

    pub fn repository(&self) -> &FileRepository {
        &self.repository
    }

    pub fn notebook_options(&self) -> NotebookOptions {
        self.repository.notebook_options()
    }

    /// Ingest a batch under the current policy
    pub async fn ingest(&mut self, entries: Vec<IngestEntry>) -> IngestOutcome {
        self.repository.ingest(entries, &self.policy).await
    }

    /// Allow an extension and activate files that now match
    ///
    /// Returns `None` when the extension was rejected, otherwise the paths
    /// that became relevant.
    pub async fn add_extension(&mut self, extension: &str) -> Option<Vec<String>> {
        if !self.policy.add(extension) {
            return None;
        }
        Some(self.repository.activate_newly_relevant(&self.policy).await)
    }

    /// Disallow an extension and deactivate files that no longer match
    ///
    /// Returns `None` when the extension was not in the list, otherwise the
    /// paths that became non-relevant.
    pub fn remove_extension(&mut self, extension: &str) -> Option<Vec<String>> {
        if !self.policy.remove(extension) {
            return None;
        }
        Some(self.repository.deactivate_non_relevant(&self.policy))
    }

    /// Run both reclassification sweeps against the current policy
    pub async fn reclassify(&mut self) -> Reclassification {
        self.repository.reclassify(&self.policy).await
    }

    /// Persist new notebook flags and re-render stored notebooks
    ///
    /// Returns whether any notebook content changed.
    pub fn set_notebook_options(&mut self, options: NotebookOptions) -> bool {
        if let Err(e) = options.save(self.settings.as_ref()) {
            warn!(error = %e, "Failed to persist notebook options");
        }
        self.repository.reformat_notebooks(options)
    }

    pub fn remove_file(&mut self, path: &str) -> bool {
        self.repository.remove_file(path)
    }

    pub fn remove_folder(&mut self, prefix: &str) -> Vec<String> {
        self.repository.remove_folder(prefix)
    }

    pub fn clear(&mut self) {
        self.repository.clear();
    }

    pub fn combined_content(&self) -> String {
        self.repository.combined_content()
    }

    pub fn all_paths(&self) -> AllPaths {
        self.repository.all_paths()
    }

    pub fn tree(&self) -> TreeNode {
        self.repository.tree(&self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemorySettings, EXTENSIONS_KEY, NOTEBOOK_OUTPUTS_KEY};

    fn session_with(extensions: &[&str]) -> (Session, Arc<MemorySettings>) {
        let store = Arc::new(MemorySettings::new());
        let json = serde_json::to_string(extensions).unwrap();
        store.set(EXTENSIONS_KEY, &json).unwrap();
        (Session::open(store.clone()), store)
    }

    #[tokio::test]
    async fn test_add_and_remove_extension_move_files() {
        let (mut session, _) = session_with(&[".js"]);
        session
            .ingest(vec![
                IngestEntry::new("a.js", "x"),
                IngestEntry::new("b.rs", "y"),
            ])
            .await;

        assert_eq!(session.add_extension(".rs").await, Some(vec!["b.rs".to_string()]));
        assert_eq!(session.add_extension(".rs").await, None);
        assert_eq!(session.combined_content(), "a.js:\nx\n\nb.rs:\ny\n\n");

        assert_eq!(session.remove_extension(".js"), Some(vec!["a.js".to_string()]));
        assert_eq!(session.remove_extension(".js"), None);
        assert_eq!(session.combined_content(), "b.rs:\ny\n\n");
    }

    #[tokio::test]
    async fn test_settings_are_persisted() {
        let (mut session, store) = session_with(&[".js"]);
        session.add_extension(".md").await;
        session.set_notebook_options(NotebookOptions::new(true, false));

        assert_eq!(store.get(EXTENSIONS_KEY).as_deref(), Some(r#"[".js",".md"]"#));
        assert_eq!(store.get(NOTEBOOK_OUTPUTS_KEY).as_deref(), Some("true"));

        let reopened = Session::open(store);
        assert!(reopened.policy().is_relevant(".md"));
        assert_eq!(reopened.notebook_options(), NotebookOptions::new(true, false));
    }

    #[tokio::test]
    async fn test_set_notebook_options_without_notebooks() {
        let (mut session, _) = session_with(&[".js"]);
        assert!(!session.set_notebook_options(NotebookOptions::new(true, true)));
        assert_eq!(session.notebook_options(), NotebookOptions::new(true, true));
    }

    #[tokio::test]
    async fn test_tree_reflects_relevance() {
        let (mut session, _) = session_with(&[".js"]);
        session
            .ingest(vec![
                IngestEntry::new("app/a.js", "x"),
                IngestEntry::new("app/b.png", "binary"),
            ])
            .await;

        let tree = session.tree();
        let files = tree.files();
        assert_eq!(files.len(), 2);
        assert!(files[0].relevant);
        assert!(!files[1].relevant);
    }
}
