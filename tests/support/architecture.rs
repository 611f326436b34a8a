//! Source scanning for layering checks.

use std::fs;
use std::path::{Path, PathBuf};

/// A matching source line: path relative to the crate root, 1-based line
/// number, line text.
pub type Hit = (String, usize, String);

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("failed to read dir {}: {e}", dir.display()));
    for entry in entries {
        let path = entry
            .unwrap_or_else(|e| panic!("failed to read dir entry: {e}"))
            .path();
        if path.is_dir() {
            walk(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
}

/// Lines under `relative_dir` containing any of `patterns`.
///
/// Lines inside `#[cfg(test)]` modules are included; test helpers must obey
/// the same layering.
pub fn find_lines_containing(relative_dir: &str, patterns: &[&str]) -> Vec<Hit> {
    let mut files = Vec::new();
    walk(&root().join(relative_dir), &mut files);
    files.sort();

    let mut hits = Vec::new();
    for file in files {
        let content = fs::read_to_string(&file)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", file.display()));
        let relative = file
            .strip_prefix(root())
            .unwrap_or(&file)
            .to_string_lossy()
            .replace('\\', "/");
        for (idx, line) in content.lines().enumerate() {
            if patterns.iter().any(|p| line.contains(p)) {
                hits.push((relative.clone(), idx + 1, line.to_string()));
            }
        }
    }
    hits
}
