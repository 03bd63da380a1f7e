//! Path normalization used for matching files across trees.
//!
//! The normalized form is platform independent: `/` separated, NFC composed
//! and lowercased. Snapshots store it as-is, so changing the fold rule breaks
//! snapshots written by older builds.

use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Folds a tree-relative path into its matching key.
///
/// Both `/` and `\` separate components, empty and `.` components are
/// dropped, `..` collapses its parent where there is one, then the result is
/// NFC composed and lowercased. An empty path normalizes to `.`.
pub fn normalize_relative(path: &str) -> String {
    let composed: String = path.nfc().collect();

    let mut parts: Vec<&str> = Vec::new();
    for part in composed.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return ".".to_string();
    }
    parts.join("/").to_lowercase()
}

/// Joins `relative` onto `root` and collapses `.`/`..` lexically.
///
/// The filesystem is not consulted, so symlinks are left alone.
pub fn resolve(root: &Path, relative: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in root.join(relative).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match resolved.components().next_back() {
                Some(Component::Normal(_)) => {
                    resolved.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => resolved.push(".."),
            },
            other => resolved.push(other.as_os_str()),
        }
    }

    if resolved.as_os_str().is_empty() {
        resolved.push(".");
    }
    resolved
}
