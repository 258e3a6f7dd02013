//! Table name derivation from file paths

use std::path::{Component, Path, PathBuf};

/// Maximum identifier length accepted by the target database
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Derive the table name for a CSV file.
///
/// The file stem has its spaces replaced by underscores. With
/// `include_directory` set, the directories between `root` and the file are
/// prepended, joined with `_`. Names longer than [`MAX_IDENTIFIER_LENGTH`]
/// keep their trailing characters.
///
/// Two files may derive the same name; nothing here de-duplicates them.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use csv_table_importer::naming::derive_table_name;
///
/// let name = derive_table_name(Path::new("data/reports/q1.csv"), Path::new("data"), true);
/// assert_eq!(name, "reports_q1");
///
/// let name = derive_table_name(Path::new("data/monthly sales.csv"), Path::new("data"), false);
/// assert_eq!(name, "monthly_sales");
/// ```
pub fn derive_table_name(path: &Path, root: &Path, include_directory: bool) -> String {
    let file_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().replace(' ', "_"))
        .unwrap_or_default();

    let name = if include_directory {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        let mut segments = directory_segments(&relative_to(parent, root));
        segments.push(file_name);
        segments.join("_")
    } else {
        file_name
    };

    keep_suffix(name, MAX_IDENTIFIER_LENGTH)
}

/// Keep at most `max` trailing characters of `name`
fn keep_suffix(name: String, max: usize) -> String {
    let count = name.chars().count();
    if count <= max {
        name
    } else {
        name.chars().skip(count - max).collect()
    }
}

fn directory_segments(relative: &Path) -> Vec<String> {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().replace(' ', "_")),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect()
}

/// Path of `dir` relative to `root`. Directories outside the root produce
/// leading `..` segments.
fn relative_to(dir: &Path, root: &Path) -> PathBuf {
    if let Ok(stripped) = dir.strip_prefix(root) {
        return stripped.to_path_buf();
    }

    let dir_parts: Vec<Component> = dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let root_parts: Vec<Component> = root
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = dir_parts
        .iter()
        .zip(root_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..root_parts.len() {
        relative.push("..");
    }
    for part in &dir_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_only() {
        let name = derive_table_name(Path::new("data/sales.csv"), Path::new("data"), false);
        assert_eq!(name, "sales");
    }

    #[test]
    fn test_spaces_become_underscores() {
        let name = derive_table_name(
            Path::new("data/north region/Q1 sales.csv"),
            Path::new("data"),
            true,
        );
        assert_eq!(name, "north_region_Q1_sales");
    }

    #[test]
    fn test_directory_ignored_when_disabled() {
        let name = derive_table_name(Path::new("data/reports/q1.csv"), Path::new("data"), false);
        assert_eq!(name, "q1");
    }

    #[test]
    fn test_file_at_root_has_no_prefix() {
        let name = derive_table_name(Path::new("data/q1.csv"), Path::new("data"), true);
        assert_eq!(name, "q1");

        let name = derive_table_name(Path::new("data/q1.csv"), Path::new("data/"), true);
        assert_eq!(name, "q1");
    }

    #[test]
    fn test_nested_directories_joined_outermost_first() {
        let name = derive_table_name(
            Path::new("/srv/data/2024/emea/orders.csv"),
            Path::new("/srv/data"),
            true,
        );
        assert_eq!(name, "2024_emea_orders");
    }

    #[test]
    fn test_only_last_extension_stripped() {
        let name = derive_table_name(Path::new("data/archive.v2.csv"), Path::new("data"), false);
        assert_eq!(name, "archive.v2");
    }

    #[test]
    fn test_file_outside_root_gets_parent_segments() {
        let name = derive_table_name(Path::new("other/q1.csv"), Path::new("data"), true);
        assert_eq!(name, ".._other_q1");
    }

    #[test]
    fn test_long_names_keep_suffix() {
        let long_dir = "d".repeat(100);
        let path = PathBuf::from("root").join(&long_dir).join(format!("{}.csv", "f".repeat(60)));
        let name = derive_table_name(&path, Path::new("root"), true);

        let full = format!("{}_{}", long_dir, "f".repeat(60));
        assert_eq!(name.chars().count(), MAX_IDENTIFIER_LENGTH);
        assert_eq!(name, full[full.len() - MAX_IDENTIFIER_LENGTH..]);
        assert!(name.ends_with(&"f".repeat(60)));
    }

    #[test]
    fn test_exactly_max_length_untouched() {
        let stem = "x".repeat(MAX_IDENTIFIER_LENGTH);
        let path = PathBuf::from(format!("data/{stem}.csv"));
        assert_eq!(derive_table_name(&path, Path::new("data"), false), stem);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let stem = "é".repeat(MAX_IDENTIFIER_LENGTH + 5);
        let path = PathBuf::from(format!("data/{stem}.csv"));
        let name = derive_table_name(&path, Path::new("data"), false);
        assert_eq!(name.chars().count(), MAX_IDENTIFIER_LENGTH);
    }

    #[test]
    fn test_deterministic() {
        let path = Path::new("data/a b/c d.csv");
        let first = derive_table_name(path, Path::new("data"), true);
        let second = derive_table_name(path, Path::new("data"), true);
        assert_eq!(first, second);
    }
}
