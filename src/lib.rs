/*!
 * codeigest - Flatten project files into a single text digest for LLM context
 *
 * Files are ingested in batches, classified against an extension
 * allow-list, and kept in a repository that can be reclassified whenever
 * the list changes. Jupyter notebooks are flattened to plain text. The
 * relevant contents are aggregated into one string.
 */

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extensions;
pub mod notebook;
pub mod report;
pub mod repository;
pub mod session;
pub mod settings;
pub mod stats;
pub mod store;
pub mod traversal;
pub mod tree;
pub mod types;
pub mod writer;


// Re-export main components for easier access
pub use aggregate::combined_content;
pub use config::Config;
pub use error::{CodeigestError, Result};
pub use extensions::{ExtensionPolicy, DEFAULT_EXTENSIONS};
pub use notebook::{NotebookDocument, NotebookOptions};
pub use report::{DigestReport, NotebookReportInfo, Reporter};
pub use repository::FileRepository;
pub use session::Session;
pub use settings::{JsonFileSettings, MemorySettings, SettingsStore};
pub use stats::ContentStats;
pub use tree::{build_tree, TreeNode};
pub use types::{ContentSource, IngestEntry};
pub use writer::{DigestWriter, OutputFormat};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
