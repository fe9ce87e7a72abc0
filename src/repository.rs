/*!
 * File repository: the canonical record of ingested files
 *
 * Every ingested path lives in the all-files record and, once its read has
 * settled, in exactly one of the relevant or non-relevant content stores.
 * Notebook documents are kept only for relevant `.ipynb` paths. All
 * mutations take `&mut self`, so two batches can never interleave on the
 * same repository.
 */

use std::collections::HashMap;
use std::io;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::aggregate;
use crate::extensions::ExtensionPolicy;
use crate::notebook::{NotebookDocument, NotebookOptions};
use crate::store::PathStore;
use crate::tree::{build_tree, TreeNode};
use crate::types::{
    extension_of, AllPaths, ContentSource, FileRecord, IngestEntry, IngestOutcome, Origin, Reclassification,
    NOTEBOOK_EXTENSION, READ_ERROR_PLACEHOLDER,
};

/// Owner of every ingested file and its derived content
#[derive(Debug, Default)]
pub struct FileRepository {
    all_files: PathStore<FileRecord>,
    relevant: PathStore<String>,
    non_relevant: PathStore<String>,
    notebooks: PathStore<NotebookDocument>,
    options: NotebookOptions,
}

/// Content destined for the relevant store
struct RelevantContent {
    content: String,
    notebook: Option<NotebookDocument>,
}

impl FileRepository {
    /// Create an empty repository formatting notebooks with `options`
    pub fn new(options: NotebookOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Notebook inclusion flags currently in effect
    pub fn notebook_options(&self) -> NotebookOptions {
        self.options
    }

    /// Ingest a batch of files
    ///
    /// Every entry is recorded and classified by its extension, then all
    /// reads run concurrently and are joined before any store is touched.
    /// Failed reads and corrupt notebooks degrade to placeholders or raw
    /// text; the batch itself never fails.
    pub async fn ingest(
        &mut self,
        entries: Vec<IngestEntry>,
        policy: &ExtensionPolicy,
    ) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();
        if entries.is_empty() {
            return outcome;
        }

        info!(files = entries.len(), "Ingesting batch");

        let records: Vec<FileRecord> = entries
            .into_iter()
            .map(|entry| {
                let extension = extension_of(&entry.path);
                let origin = if policy.is_relevant(&extension) {
                    Origin::Relevant
                } else {
                    Origin::NonRelevant
                };
                FileRecord {
                    path: entry.path,
                    extension,
                    origin,
                    source: entry.source,
                }
            })
            .collect();

        let reads = join_all(records.iter().map(|record| record.source.read())).await;

        for (record, read) in records.into_iter().zip(reads) {
            let path = record.path.clone();
            self.forget_content(&path);

            match record.origin {
                Origin::Relevant => {
                    let content = match read {
                        Ok(raw) => self.prepare_relevant(&path, &record.extension, raw),
                        Err(e) => {
                            warn!(path = %path, error = %e, "Failed to read file");
                            RelevantContent {
                                content: READ_ERROR_PLACEHOLDER.to_string(),
                                notebook: None,
                            }
                        }
                    };
                    self.store_relevant(&path, content);
                    outcome.relevant.push(path.clone());
                }
                Origin::NonRelevant => {
                    let content = read.unwrap_or_else(|e| {
                        warn!(path = %path, error = %e, "Failed to read non-relevant file");
                        READ_ERROR_PLACEHOLDER.to_string()
                    });
                    self.non_relevant.insert(path.clone(), content);
                    outcome.non_relevant.push(path.clone());
                }
            }

            debug!(path = %path, origin = ?record.origin, "Stored file");
            self.all_files.insert(path, record);
        }

        info!(
            relevant = outcome.relevant.len(),
            non_relevant = outcome.non_relevant.len(),
            "Batch ingested"
        );
        outcome
    }

    /// Re-render every stored notebook with new inclusion flags
    ///
    /// Returns whether any notebook was present.
    pub fn reformat_notebooks(&mut self, options: NotebookOptions) -> bool {
        self.options = options;
        if self.notebooks.is_empty() {
            return false;
        }

        let rendered: Vec<(String, String)> = self
            .notebooks
            .iter()
            .map(|(path, doc)| (path.to_string(), doc.format(options)))
            .collect();
        for (path, content) in rendered {
            self.relevant.insert(path, content);
        }

        debug!(notebooks = self.notebooks.len(), "Reformatted notebooks");
        true
    }

    /// Bring the content stores in line with the current policy
    ///
    /// Runs the newly-relevant sweep followed by the newly-non-relevant sweep.
    pub async fn reclassify(&mut self, policy: &ExtensionPolicy) -> Reclassification {
        let newly_relevant = self.activate_newly_relevant(policy).await;
        let newly_non_relevant = self.deactivate_non_relevant(policy);
        Reclassification {
            newly_relevant,
            newly_non_relevant,
        }
    }

    /// Move paths whose extension is now allowed into the relevant store
    ///
    /// Content captured in the non-relevant store is reused; a path with no
    /// captured content is read again from its source. Ingestion always
    /// captures content, so the re-read only serves records whose content
    /// was dropped while the record was kept.
    pub async fn activate_newly_relevant(&mut self, policy: &ExtensionPolicy) -> Vec<String> {
        let candidates: Vec<(String, String)> = self
            .all_files
            .iter()
            .filter(|(path, record)| {
                !self.relevant.contains(path) && policy.is_relevant(&record.extension)
            })
            .map(|(path, record)| (path.to_string(), record.extension.clone()))
            .collect();

        let missing: Vec<(String, ContentSource)> = candidates
            .iter()
            .filter(|(path, _)| !self.non_relevant.contains(path))
            .filter_map(|(path, _)| {
                let record = self.all_files.get(path)?;
                Some((path.clone(), record.source.clone()))
            })
            .collect();
        let reads = join_all(missing.iter().map(|(_, source)| source.read())).await;
        let mut reread: HashMap<String, io::Result<String>> = missing
            .into_iter()
            .map(|(path, _)| path)
            .zip(reads)
            .collect();

        let mut moved = Vec::with_capacity(candidates.len());
        for (path, extension) in candidates {
            let raw = match self.non_relevant.remove(&path) {
                Some(content) => content,
                None => match reread.remove(&path) {
                    Some(Ok(raw)) => raw,
                    Some(Err(e)) => {
                        warn!(path = %path, error = %e, "Failed to re-read file");
                        READ_ERROR_PLACEHOLDER.to_string()
                    }
                    None => READ_ERROR_PLACEHOLDER.to_string(),
                },
            };

            let content = self.prepare_relevant(&path, &extension, raw);
            self.store_relevant(&path, content);
            debug!(path = %path, "File became relevant");
            moved.push(path);
        }

        if !moved.is_empty() {
            info!(files = moved.len(), "Activated newly relevant files");
        }
        moved
    }

    /// Move relevant paths whose extension is no longer allowed out
    ///
    /// A notebook leaves its raw JSON behind rather than the flattened
    /// text, so a later activation parses it again.
    pub fn deactivate_non_relevant(&mut self, policy: &ExtensionPolicy) -> Vec<String> {
        let stale = self
            .relevant
            .remove_where(|path| !policy.is_relevant(&extension_of(path)));

        let mut moved = Vec::with_capacity(stale.len());
        for (path, content) in stale {
            let content = match self.notebooks.remove(&path) {
                Some(doc) => doc.value().to_string(),
                None => content,
            };
            self.non_relevant.insert(path.clone(), content);
            debug!(path = %path, "File became non-relevant");
            moved.push(path);
        }

        if !moved.is_empty() {
            info!(files = moved.len(), "Deactivated files no longer relevant");
        }
        moved
    }

    /// Remove a single file from every store
    ///
    /// Returns whether the path had been ingested.
    pub fn remove_file(&mut self, path: &str) -> bool {
        self.forget_content(path);
        let existed = self.all_files.remove(path).is_some();
        if existed {
            debug!(path = %path, "Removed file");
        }
        existed
    }

    /// Remove every file below `prefix/`, returning the removed paths
    pub fn remove_folder(&mut self, prefix: &str) -> Vec<String> {
        let folder = format!("{}/", prefix.trim_end_matches('/'));
        let removed: Vec<String> = self
            .all_files
            .remove_where(|path| path.starts_with(&folder))
            .into_iter()
            .map(|(path, _)| path)
            .collect();

        for path in &removed {
            self.forget_content(path);
        }

        info!(folder = %prefix, files = removed.len(), "Removed folder");
        removed
    }

    /// Drop every file
    pub fn clear(&mut self) {
        self.all_files.clear();
        self.relevant.clear();
        self.non_relevant.clear();
        self.notebooks.clear();
        info!("Cleared all files");
    }

    /// Flattened content of every relevant file
    pub fn combined_content(&self) -> String {
        aggregate::combined_content(self.relevant.iter())
    }

    /// Ingested paths partitioned by current store membership
    pub fn all_paths(&self) -> AllPaths {
        let mut paths = AllPaths::default();
        for path in self.all_files.keys() {
            if self.relevant.contains(path) {
                paths.relevant.push(path.to_string());
            } else if self.non_relevant.contains(path) {
                paths.non_relevant.push(path.to_string());
            }
        }
        paths
    }

    /// Folder tree of every ingested path
    ///
    /// A file is flagged relevant when the policy allows its extension and
    /// its content sits in the relevant store.
    pub fn tree(&self, policy: &ExtensionPolicy) -> TreeNode {
        let paths = self.all_paths();
        build_tree(paths.all().map(String::as_str), |path| {
            self.relevant.contains(path) && policy.is_relevant(&extension_of(path))
        })
    }

    /// Stored content of a file, from whichever store holds it
    pub fn content_of(&self, path: &str) -> Option<&str> {
        self.relevant
            .get(path)
            .or_else(|| self.non_relevant.get(path))
            .map(String::as_str)
    }

    /// Canonical record of a file
    pub fn record(&self, path: &str) -> Option<&FileRecord> {
        self.all_files.get(path)
    }

    /// Parsed notebook for a relevant `.ipynb` path
    pub fn notebook(&self, path: &str) -> Option<&NotebookDocument> {
        self.notebooks.get(path)
    }

    /// Parsed notebooks in insertion order
    pub fn notebooks(&self) -> impl Iterator<Item = (&str, &NotebookDocument)> {
        self.notebooks.iter()
    }

    pub fn has_notebooks(&self) -> bool {
        !self.notebooks.is_empty()
    }

    /// Whether the path sits in the relevant store
    pub fn is_relevant(&self, path: &str) -> bool {
        self.relevant.contains(path)
    }

    /// Relevant content entries in insertion order
    pub fn relevant_entries(&self) -> impl Iterator<Item = (&str, &String)> {
        self.relevant.iter()
    }

    /// Number of ingested files
    pub fn len(&self) -> usize {
        self.all_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_files.is_empty()
    }

    fn prepare_relevant(&self, path: &str, extension: &str, raw: String) -> RelevantContent {
        if extension != NOTEBOOK_EXTENSION {
            return RelevantContent {
                content: raw,
                notebook: None,
            };
        }

        match NotebookDocument::parse(&raw) {
            Ok(doc) => RelevantContent {
                content: doc.format(self.options),
                notebook: Some(doc),
            },
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to parse notebook, storing raw text");
                RelevantContent {
                    content: raw,
                    notebook: None,
                }
            }
        }
    }

    fn store_relevant(&mut self, path: &str, content: RelevantContent) {
        self.non_relevant.remove(path);
        match content.notebook {
            Some(doc) => {
                self.notebooks.insert(path, doc);
            }
            None => {
                self.notebooks.remove(path);
            }
        }
        self.relevant.insert(path, content.content);
    }

    fn forget_content(&mut self, path: &str) {
        self.relevant.remove(path);
        self.non_relevant.remove(path);
        self.notebooks.remove(path);
    }
}
