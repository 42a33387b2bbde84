//! Exact-path and glob expansion against the local file system

use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Check whether a pattern contains glob metacharacters
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Expand a pattern into the existing paths it names
///
/// A pattern without metacharacters is an exact path and yields itself when
/// it exists. Glob patterns are matched with `*` confined to one path
/// component; `**` crosses directories. Results are sorted.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>, globset::Error> {
    if !is_glob(pattern) {
        let path = Path::new(pattern);
        return Ok(if path.exists() {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    let (base, remaining) = literal_base(pattern);
    let max_depth = if pattern.contains("**") {
        None
    } else {
        Some(remaining)
    };

    let mut found = Vec::new();
    walk(&base, &matcher, max_depth, &mut found);
    found.sort();
    Ok(found)
}

/// Leading components without metacharacters, and how many components follow
fn literal_base(pattern: &str) -> (PathBuf, usize) {
    let components: Vec<Component<'_>> = Path::new(pattern).components().collect();
    let mut base = PathBuf::new();

    for (index, component) in components.iter().enumerate() {
        if is_glob(&component.as_os_str().to_string_lossy()) {
            return (base, components.len() - index);
        }
        base.push(component);
    }

    (base, 0)
}

fn walk(dir: &Path, matcher: &GlobMatcher, max_depth: Option<usize>, found: &mut Vec<PathBuf>) {
    if max_depth == Some(0) {
        return;
    }

    let read_from = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let Ok(entries) = fs::read_dir(read_from) else {
        return;
    };

    for entry in entries.flatten() {
        let path = dir.join(entry.file_name());
        if matcher.is_match(&path) {
            found.push(path.clone());
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            walk(&path, matcher, max_depth.map(|d| d - 1), found);
        }
    }
}
