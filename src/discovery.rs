//! Input file discovery.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ConvertError, ConvertResult};

/// Resolve `root` to the ordered list of input files.
///
/// - A file root is returned as-is (extension filter and depth are not applied).
/// - A directory root is walked in file-name order. Sub-directories deeper than `max_depth`
///   below the root are not descended into (`0` means only the root's own entries). Files are
///   kept when their lower-cased extension is one of `extensions`.
///
/// Returned paths are absolute. An unreadable root, a failing walk or an empty result are all
/// [`ConvertError::Discovery`] errors.
pub fn discover(
    root: impl AsRef<Path>,
    extensions: &[String],
    max_depth: usize,
) -> ConvertResult<Vec<PathBuf>> {
    let root = absolute_clean(root.as_ref())?;
    let meta = fs::metadata(&root).map_err(|e| ConvertError::discovery(&root, e.to_string()))?;
    if !meta.is_dir() {
        return Ok(vec![root]);
    }

    let wanted: HashSet<String> = extensions.iter().map(|e| normalize_extension(e)).collect();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.depth() > max_depth));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ConvertError::discovery(&root, e.to_string()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if has_wanted_extension(entry.path(), &wanted) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        let mut exts: Vec<_> = wanted.into_iter().collect();
        exts.sort();
        return Err(ConvertError::discovery(
            &root,
            format!(
                "no input files with extensions [{}] within depth {max_depth}",
                exts.join(",")
            ),
        ));
    }
    Ok(files)
}

/// Split a comma-separated extension list (`"csv, .TSV"`) into normalized extensions.
pub fn parse_extensions(list: &str) -> Vec<String> {
    list.split(',')
        .map(normalize_extension)
        .filter(|e| !e.is_empty())
        .collect()
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn has_wanted_extension(path: &Path, wanted: &HashSet<String>) -> bool {
    path.extension()
        .map(|e| wanted.contains(&e.to_string_lossy().to_lowercase()))
        .unwrap_or(false)
}

/// Make `path` absolute and lexically remove `.` and `..` components.
pub(crate) fn absolute_clean(path: &Path) -> ConvertResult<PathBuf> {
    let abs = std::path::absolute(path).map_err(|e| ConvertError::discovery(path, e.to_string()))?;
    let mut out = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root, matching `/..` == `/`.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{absolute_clean, parse_extensions};

    #[test]
    fn extensions_are_normalized() {
        assert_eq!(parse_extensions("csv, .TSV,,Txt "), vec!["csv", "tsv", "txt"]);
        assert!(parse_extensions("").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn clean_removes_dot_components() {
        let p = absolute_clean(Path::new("/a/./b/../c/")).unwrap();
        assert_eq!(p, Path::new("/a/c"));
        assert_eq!(absolute_clean(Path::new("/../x")).unwrap(), Path::new("/x"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        assert!(absolute_clean(Path::new("some/dir")).unwrap().is_absolute());
    }
}
