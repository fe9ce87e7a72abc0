/*!
 * Folder tree reconstructed from flat paths
 */

use std::cmp::Ordering;
use std::collections::HashMap;

/// A folder in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    /// Folder name, `""` for the root
    pub name: String,
    /// Children, folders first, each group sorted by name
    pub children: Vec<TreeNode>,
}

/// A file leaf in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Last path segment
    pub name: String,
    /// Full path
    pub path: String,
    /// Whether the file counts toward the digest
    pub relevant: bool,
}

/// A node of the folder tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Folder(FolderNode),
    File(FileNode),
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.name,
            Self::File(file) => &file.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    /// Children of a folder; files have none
    pub fn children(&self) -> &[TreeNode] {
        match self {
            Self::Folder(folder) => &folder.children,
            Self::File(_) => &[],
        }
    }

    /// Every file leaf, depth first in display order
    pub fn files(&self) -> Vec<&FileNode> {
        let mut files = Vec::new();
        self.collect_files(&mut files);
        files
    }

    fn collect_files<'a>(&'a self, files: &mut Vec<&'a FileNode>) {
        match self {
            Self::Folder(folder) => folder.children.iter().for_each(|c| c.collect_files(files)),
            Self::File(file) => files.push(file),
        }
    }

    /// Keep only files whose path contains `query`, ignoring case
    ///
    /// Folders survive when any descendant file matches. The root is always
    /// kept; an empty query keeps everything.
    pub fn filter(&self, query: &str) -> TreeNode {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.clone();
        }
        match self {
            Self::Folder(folder) => Self::Folder(FolderNode {
                name: folder.name.clone(),
                children: folder
                    .children
                    .iter()
                    .filter_map(|child| child.filter_matching(&query))
                    .collect(),
            }),
            Self::File(_) => self.filter_matching(&query).unwrap_or_else(|| {
                Self::Folder(FolderNode {
                    name: String::new(),
                    children: Vec::new(),
                })
            }),
        }
    }

    fn filter_matching(&self, query: &str) -> Option<TreeNode> {
        match self {
            Self::File(file) => file
                .path
                .to_lowercase()
                .contains(query)
                .then(|| self.clone()),
            Self::Folder(folder) => {
                let children: Vec<TreeNode> = folder
                    .children
                    .iter()
                    .filter_map(|child| child.filter_matching(query))
                    .collect();
                (!children.is_empty()).then(|| {
                    Self::Folder(FolderNode {
                        name: folder.name.clone(),
                        children,
                    })
                })
            }
        }
    }

    /// Plain text rendering, one node per line
    ///
    /// Non-relevant files are suffixed with `(skipped)`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            child.render_into(&mut out, 0);
        }
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            Self::Folder(folder) => {
                out.push_str(&format!("{}{}/\n", indent, folder.name));
                for child in &folder.children {
                    child.render_into(out, depth + 1);
                }
            }
            Self::File(file) if file.relevant => {
                out.push_str(&format!("{}{}\n", indent, file.name));
            }
            Self::File(file) => {
                out.push_str(&format!("{}{} (skipped)\n", indent, file.name));
            }
        }
    }
}

/// Intermediate folder used while the tree is assembled
#[derive(Default)]
struct Builder {
    folders: HashMap<String, Builder>,
    files: HashMap<String, FileNode>,
}

impl Builder {
    fn finish(self, name: String) -> TreeNode {
        let mut children: Vec<TreeNode> = self
            .folders
            .into_iter()
            .map(|(name, folder)| folder.finish(name))
            .chain(self.files.into_values().map(TreeNode::File))
            .collect();
        children.sort_by(sibling_order);
        TreeNode::Folder(FolderNode { name, children })
    }
}

fn sibling_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_folder()
        .cmp(&a.is_folder())
        .then_with(|| a.name().cmp(b.name()))
}

/// Build a folder tree from flat `/`-separated paths
///
/// Each path's last segment becomes a file leaf flagged with
/// `relevance_of(path)`; every earlier segment becomes a folder. Siblings
/// are ordered folders first, then files, each group by name ascending.
pub fn build_tree<'a, I, F>(paths: I, relevance_of: F) -> TreeNode
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> bool,
{
    let mut root = Builder::default();

    for path in paths {
        let mut segments: Vec<&str> = path.split('/').collect();
        let Some(file_name) = segments.pop() else {
            continue;
        };

        let mut current = &mut root;
        for segment in segments {
            current = current.folders.entry(segment.to_string()).or_default();
        }
        current.files.insert(
            file_name.to_string(),
            FileNode {
                name: file_name.to_string(),
                path: path.to_string(),
                relevant: relevance_of(path),
            },
        );
    }

    root.finish(String::new())
}
