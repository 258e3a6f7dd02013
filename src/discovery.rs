//! CSV file discovery

use std::fs;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::{ImportError, ImportResult};

/// Extension of the files picked up by discovery (matched case-insensitively)
pub const CSV_EXTENSION: &str = "csv";

/// A discovered file to import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path to the file, starting with the source directory
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// Find the CSV files under `root`, optionally descending into subdirectories.
///
/// Results are sorted by path. Every returned path lives under `root`.
pub fn discover_csv_files(root: &Path, recursive: bool) -> ImportResult<Vec<DiscoveredFile>> {
    let discovery_error = |reason: String| ImportError::Discovery {
        path: root.to_path_buf(),
        reason,
    };

    if !root.is_dir() {
        return Err(discovery_error(
            "directory does not exist or is not a directory".to_string(),
        ));
    }
    fs::read_dir(root).map_err(|e| discovery_error(e.to_string()))?;

    let file_pattern = if recursive {
        format!("**/*.{CSV_EXTENSION}")
    } else {
        format!("*.{CSV_EXTENSION}")
    };
    let full_pattern = format!(
        "{}/{}",
        Pattern::escape(&root.to_string_lossy()),
        file_pattern
    );
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let entries = glob::glob_with(&full_pattern, options)
        .map_err(|e| discovery_error(format!("invalid pattern {full_pattern}: {e}")))?;

    let normalized_root = without_cur_dir(root);
    let mut files = Vec::new();
    for entry in entries {
        let found = entry.map_err(|e| discovery_error(e.to_string()))?;
        if !found.is_file() {
            continue;
        }
        let path = anchor_under_root(&found, root, &normalized_root).ok_or_else(|| {
            discovery_error(format!(
                "{} is outside the source directory",
                found.display()
            ))
        })?;
        let metadata = fs::metadata(&path).map_err(|e| ImportError::io(&path, e))?;
        files.push(DiscoveredFile {
            path,
            size: metadata.len(),
        });
    }

    // Sort by path for consistent ordering
    files.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        root = %root.display(),
        recursive,
        count = files.len(),
        "Discovered CSV files"
    );

    Ok(files)
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Re-express a glob result as a path under `root`, spelled the way the caller
/// wrote `root`. Glob drops a leading `./`, so `./data` yields `data/a.csv`.
fn anchor_under_root(found: &Path, root: &Path, normalized_root: &Path) -> Option<PathBuf> {
    if found.starts_with(root) {
        return Some(found.to_path_buf());
    }
    without_cur_dir(found)
        .strip_prefix(normalized_root)
        .ok()
        .map(|relative| root.join(relative))
}
