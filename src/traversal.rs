/*!
 * Asynchronous traversal of local files and directories
 *
 * Produces the flat ingestion batch for a set of dropped items. Every
 * directory lists its children, traverses them concurrently and joins
 * their results before resolving itself. A subtree that cannot be read
 * contributes nothing.
 */

use std::path::{Path, PathBuf};

use futures::future::{join_all, BoxFuture, FutureExt};
use tokio::fs;
use tracing::{debug, warn};

use crate::types::{ContentSource, IngestEntry};

/// Collect ingestion entries for a list of files or directories
///
/// A file is entered under its own name; a directory contributes its
/// files as `<dir name>/<relative path>`. Items are visited in the order
/// given. Symbolic links below a root are not followed.
pub async fn collect_entries<P: AsRef<Path>>(roots: &[P]) -> Vec<IngestEntry> {
    let walks = roots
        .iter()
        .map(|root| visit_root(root.as_ref().to_path_buf()));
    let entries: Vec<IngestEntry> = join_all(walks).await.into_iter().flatten().collect();
    debug!(files = entries.len(), "Traversal finished");
    entries
}

async fn visit_root(root: PathBuf) -> Vec<IngestEntry> {
    let metadata = match fs::metadata(&root).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(path = %root.display(), error = %e, "Skipping unreadable entry");
            return Vec::new();
        }
    };

    let name = root_name(&root).await;
    if metadata.is_file() {
        let name = name.unwrap_or_else(|| root.to_string_lossy().to_string());
        return vec![IngestEntry::new(name, ContentSource::File(root))];
    }
    if !metadata.is_dir() {
        return Vec::new();
    }

    // A root without a name, such as `/`, contributes unprefixed paths
    let prefix = name.map(|name| format!("{}/", name)).unwrap_or_default();
    walk_dir(root, prefix).await
}

fn walk_dir(dir: PathBuf, prefix: String) -> BoxFuture<'static, Vec<IngestEntry>> {
    async move {
        let children = match list_children(&dir).await {
            Ok(children) => children,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Failed to read directory");
                return Vec::new();
            }
        };

        join_all(
            children
                .into_iter()
                .map(|child| visit_child(child, prefix.clone())),
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    }
    .boxed()
}

async fn visit_child(path: PathBuf, prefix: String) -> Vec<IngestEntry> {
    let metadata = match fs::symlink_metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
            return Vec::new();
        }
    };

    if metadata.file_type().is_symlink() {
        debug!(path = %path.display(), "Skipping symbolic link");
        return Vec::new();
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    if metadata.is_file() {
        vec![IngestEntry::new(
            format!("{}{}", prefix, name),
            ContentSource::File(path),
        )]
    } else if metadata.is_dir() {
        walk_dir(path, format!("{}{}/", prefix, name)).await
    } else {
        Vec::new()
    }
}

/// Read a directory until it reports no more entries, sorted by name
async fn list_children(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut children = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        children.push(entry.path());
    }
    children.sort();
    Ok(children)
}

/// Name a root is entered under
///
/// Paths like `.` or `..` have no name of their own and are resolved first;
/// `None` when even the resolved path has none.
async fn root_name(path: &Path) -> Option<String> {
    if let Some(name) = path.file_name() {
        return Some(name.to_string_lossy().to_string());
    }
    let resolved = fs::canonicalize(path).await.ok()?;
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_directory_paths_are_prefixed() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("project");
        std_fs::create_dir_all(root.join("src").join("nested")).unwrap();
        std_fs::write(root.join("README.md"), "readme").unwrap();
        std_fs::write(root.join("src").join("main.js"), "main").unwrap();
        std_fs::write(root.join("src").join("nested").join("deep.py"), "deep").unwrap();
        std_fs::create_dir(root.join("empty")).unwrap();

        let entries = collect_entries(&[&root]).await;
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(
            paths,
            vec!["project/README.md", "project/src/main.js", "project/src/nested/deep.py"]
        );
        assert_eq!(
            entries[1].source,
            ContentSource::File(root.join("src").join("main.js"))
        );
    }

    #[tokio::test]
    async fn test_single_file_uses_its_name() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("solo.txt");
        std_fs::write(&file, "hi").unwrap();

        let entries = collect_entries(&[&file]).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "solo.txt");
    }

    #[tokio::test]
    async fn test_nameless_root_uses_resolved_name() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        std_fs::create_dir_all(root.join("sub")).unwrap();
        std_fs::write(root.join("a.js"), "a").unwrap();

        let entries = collect_entries(&[root.join("sub").join("..")]).await;
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["proj/a.js"]);
    }

    #[tokio::test]
    async fn test_current_dir_is_named_after_itself() {
        let cwd = std::env::current_dir().unwrap();
        let expected = cwd.file_name().map(|n| n.to_string_lossy().to_string());
        assert_eq!(root_name(Path::new(".")).await, expected);
        assert_ne!(root_name(Path::new(".")).await.as_deref(), Some("."));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_not_followed() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        std_fs::create_dir(&root).unwrap();
        std_fs::write(root.join("a.js"), "a").unwrap();
        std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();
        std::os::unix::fs::symlink(root.join("a.js"), root.join("alias.js")).unwrap();

        let entries = collect_entries(&[&root]).await;
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["proj/a.js"]);
    }

    #[tokio::test]
    async fn test_missing_root_contributes_nothing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("kept.txt");
        std_fs::write(&file, "kept").unwrap();
        let missing = dir.path().join("missing");

        let entries = collect_entries(&[missing, file]).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "kept.txt");
    }
}
