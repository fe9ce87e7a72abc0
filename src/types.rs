/*!
 * Core types and data structures for codeigest
 */

use std::borrow::Cow;
use std::io;
use std::path::PathBuf;

/// Extension that marks a notebook document
pub const NOTEBOOK_EXTENSION: &str = ".ipynb";

/// Content stored for a file whose read failed
pub const READ_ERROR_PLACEHOLDER: &str = "Error reading file content";

/// Where the raw bytes of an ingested file come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Text already held in memory
    Text(String),
    /// Raw bytes held in memory, decoded lossily as UTF-8
    Bytes(Vec<u8>),
    /// A file on the local filesystem, read on demand
    File(PathBuf),
}

impl ContentSource {
    /// Read the source as text
    pub async fn read(&self) -> io::Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Self::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}

impl From<&str> for ContentSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ContentSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<PathBuf> for ContentSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// One item of an ingestion batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestEntry {
    /// Forward-slash separated path, unique within a repository
    pub path: String,
    /// Where to read the content from
    pub source: ContentSource,
}

impl IngestEntry {
    /// Create a new ingestion entry
    pub fn new(path: impl Into<String>, source: impl Into<ContentSource>) -> Self {
        Self {
            path: normalize_path(&path.into()).into_owned(),
            source: source.into(),
        }
    }
}

/// Classification a file received when it was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Ingested while its extension was allowed
    Relevant,
    /// Ingested while its extension was not allowed
    NonRelevant,
}

/// Canonical record of an ingested file
///
/// Relevance is not stored; it is recomputed from the current
/// extension policy whenever it is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Normalized path
    pub path: String,
    /// Lowercase extension with leading dot, empty when the name has none
    pub extension: String,
    /// Classification at the time of the first read
    pub origin: Origin,
    /// Content source, kept so the file can be read again
    pub source: ContentSource,
}

/// Paths classified by one ingestion batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Paths classified as relevant, in input order
    pub relevant: Vec<String>,
    /// Paths classified as non-relevant, in input order
    pub non_relevant: Vec<String>,
}

impl IngestOutcome {
    /// Whether the batch classified anything at all
    pub fn is_empty(&self) -> bool {
        self.relevant.is_empty() && self.non_relevant.is_empty()
    }
}

/// Partition of every ingested path by current store membership
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllPaths {
    pub relevant: Vec<String>,
    pub non_relevant: Vec<String>,
}

impl AllPaths {
    /// Relevant paths followed by non-relevant ones
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.relevant.iter().chain(self.non_relevant.iter())
    }
}

/// Paths moved by a reclassification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reclassification {
    /// Paths moved into the relevant store
    pub newly_relevant: Vec<String>,
    /// Paths moved into the non-relevant store
    pub newly_non_relevant: Vec<String>,
}

impl Reclassification {
    /// Whether nothing moved
    pub fn is_empty(&self) -> bool {
        self.newly_relevant.is_empty() && self.newly_non_relevant.is_empty()
    }
}

/// Lowercase extension of the last path segment, including the dot
pub fn extension_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// Turn platform separators into forward slashes
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}
