//! Directory tree snapshots and their text rendering.

use bridge_traits::storage::{EntryKind, FileMetadata};
use serde::Serialize;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// One node of a directory tree snapshot.
///
/// Children keep the order in which their directory listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Every file below this node, depth first.
    pub fn files(&self) -> Vec<&TreeNode> {
        let mut found = Vec::new();
        self.visit(&mut |node| {
            if !node.is_directory() {
                found.push(node);
            }
        });
        found
    }

    /// This node (if it is a directory) and every directory below it.
    pub fn directories(&self) -> Vec<&TreeNode> {
        let mut found = Vec::new();
        self.visit(&mut |node| {
            if node.is_directory() {
                found.push(node);
            }
        });
        found
    }

    /// Sum of the file sizes below this node.
    pub fn total_size(&self) -> u64 {
        self.files()
            .iter()
            .filter_map(|node| node.metadata.as_ref())
            .map(|metadata| metadata.size)
            .sum()
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a TreeNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Box-drawing rendering, one entry per line.
    ///
    /// ```text
    /// docs/
    /// ├── drafts/
    /// │   └── intro.md
    /// └── notes.txt
    /// ```
    pub fn render(&self) -> String {
        let mut lines = vec![self.label()];
        render_children(&self.children, "", &mut lines);
        lines.join("\n")
    }

    fn label(&self) -> String {
        match self.kind {
            EntryKind::Directory => format!("{}/", self.name),
            EntryKind::File => self.name.clone(),
        }
    }
}

fn render_children(children: &[TreeNode], prefix: &str, lines: &mut Vec<String>) {
    for (index, child) in children.iter().enumerate() {
        let last = index + 1 == children.len();
        let connector = if last { LAST_BRANCH } else { BRANCH };
        lines.push(format!("{prefix}{connector}{}", child.label()));

        if child.is_directory() {
            let extension = if last { SPACE } else { PIPE };
            render_children(&child.children, &format!("{prefix}{extension}"), lines);
        }
    }
}
