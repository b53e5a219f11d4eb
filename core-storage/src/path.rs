//! # Path Resolver
//!
//! Pure string utilities for slash-delimited storage paths. Nothing here
//! touches the store.
//!
//! - [`normalize`] splits a path into canonical segments: empty and `.`
//!   segments are dropped, `..` pops the previous segment and is a no-op at
//!   the root. A path can never climb above the root.
//! - [`join_path`] is purely textual and does not resolve `.` or `..`.
//!
//! ```
//! use core_storage::path::{normalize, parent_directory, resolve_path};
//!
//! assert_eq!(normalize("a/./b/../c"), vec!["a", "c"]);
//! assert_eq!(resolve_path("//docs/../notes/"), "notes");
//! assert_eq!(parent_directory("notes/2024/todo.txt"), "notes/2024");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Splits `path` into normalized segments.
pub fn normalize(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    push_segments(&mut segments, path);
    segments
}

fn push_segments(segments: &mut Vec<String>, path: &str) {
    for token in path.split('/') {
        match token {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment.to_string()),
        }
    }
}

/// Normalized form of `path`, segments joined with `/`.
pub fn resolve_path(path: &str) -> String {
    normalize(path).join("/")
}

/// Joins path fragments with `/` after trimming their outer slashes.
///
/// Empty fragments are skipped. `.` and `..` are kept as written.
pub fn join_path<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter_map(|part| {
            let trimmed = part.as_ref().trim_matches('/');
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalized parent of `path`; empty when at most one segment remains.
pub fn parent_directory(path: &str) -> String {
    let mut segments = normalize(path);
    segments.pop();
    segments.join("/")
}

/// A normalized storage path. The empty path is the storage root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct StoragePath {
    segments: Vec<String>,
}

impl StoragePath {
    pub fn parse(path: &str) -> Self {
        Self {
            segments: normalize(path),
        }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Final segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<StoragePath> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Resolves `relative` against this path; `..` may climb out of it but
    /// never above the root.
    pub fn join(&self, relative: &str) -> StoragePath {
        let mut segments = self.segments.clone();
        push_segments(&mut segments, relative);
        Self { segments }
    }

    /// Appends a single entry name without interpreting it.
    pub fn child(&self, name: &str) -> StoragePath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn starts_with(&self, base: &StoragePath) -> bool {
        self.segments.starts_with(&base.segments)
    }

    /// Path relative to `base`, or `None` when this path is not under it.
    pub fn strip_prefix(&self, base: &StoragePath) -> Option<StoragePath> {
        self.segments
            .strip_prefix(base.segments.as_slice())
            .map(|rest| Self {
                segments: rest.to_vec(),
            })
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for StoragePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for StoragePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for StoragePath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<StoragePath> for String {
    fn from(path: StoragePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_resolves_dots() {
        assert_eq!(normalize("a/./b/../c"), vec!["a", "c"]);
        assert_eq!(normalize("../a"), vec!["a"]);
        assert_eq!(normalize("a/b/../../.."), Vec::<String>::new());
        assert_eq!(normalize(""), Vec::<String>::new());
        assert_eq!(normalize("/"), Vec::<String>::new());
        assert_eq!(normalize("//x///y/"), vec!["x", "y"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["a/./b/../c", "../../x/y/", "/./", "q//r/../s/./t", "..."] {
            let once = resolve_path(input);
            assert_eq!(resolve_path(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_triple_dot_is_a_name() {
        assert_eq!(normalize("a/.../b"), vec!["a", "...", "b"]);
    }

    #[test]
    fn test_join_path_is_textual() {
        assert_eq!(join_path(["/a/", "", "b", "/c.txt"]), "a/b/c.txt");
        assert_eq!(join_path(["a", "../b"]), "a/../b");
        assert_eq!(join_path(["/", ""]), "");
        assert_eq!(join_path(Vec::<String>::new()), "");
    }

    #[test]
    fn test_parent_directory() {
        assert_eq!(parent_directory("a/b/c.txt"), "a/b");
        assert_eq!(parent_directory("a/b/../c.txt"), "a");
        assert_eq!(parent_directory("c.txt"), "");
        assert_eq!(parent_directory(""), "");
    }

    #[test]
    fn test_storage_path_navigation() {
        let path = StoragePath::parse("docs/2024/report.csv");
        assert_eq!(path.name(), Some("report.csv"));
        assert_eq!(path.depth(), 3);
        assert_eq!(path.parent().unwrap().to_string(), "docs/2024");
        assert_eq!(path.join("../2023/old.csv").to_string(), "docs/2024/2023/old.csv");
        assert_eq!(
            StoragePath::parse("docs/2024").join("../2023").to_string(),
            "docs/2023"
        );

        let root = StoragePath::root();
        assert!(root.is_root());
        assert!(root.name().is_none());
        assert!(root.parent().is_none());
        assert_eq!(root.join("../../x").to_string(), "x");
    }

    #[test]
    fn test_storage_path_prefixes() {
        let base = StoragePath::parse("a/b");
        let nested = StoragePath::parse("a/b/c/d.txt");
        assert!(nested.starts_with(&base));
        assert!(!StoragePath::parse("a/bc").starts_with(&base));
        assert_eq!(nested.strip_prefix(&base).unwrap().to_string(), "c/d.txt");
        assert!(base.strip_prefix(&nested).is_none());
        assert!(nested.starts_with(&StoragePath::root()));
    }

    #[test]
    fn test_storage_path_equality_is_by_segments() {
        assert_eq!(StoragePath::parse("/a//b/"), StoragePath::parse("a/./b"));
        assert_ne!(StoragePath::parse("a/b"), StoragePath::parse("b/a"));
    }

    #[test]
    fn test_storage_path_serde() {
        let path = StoragePath::parse("x/../y/z");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"y/z\"");
        let back: StoragePath = serde_json::from_str("\"/y/./z\"").unwrap();
        assert_eq!(back, path);
    }
}
