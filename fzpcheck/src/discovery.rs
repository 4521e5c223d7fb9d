//! Finding the part files a run should check.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::core::FzpCheckError;

const OBSOLETE: &str = "obsolete";

fn has_obsolete_component(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == OBSOLETE))
}

fn is_fzp(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "fzp")
}

/// All `.fzp` files under `root` whose text contains the file name of
/// `svg_file`.
///
/// Directories named `obsolete` are skipped unless `svg_file` itself lives
/// below one. Matching is a plain substring test on the file contents.
/// Entries that cannot be read (including a missing root) are logged and
/// skipped.
pub fn find_fzp_files_referencing(svg_file: &Path, root: &Path) -> Vec<PathBuf> {
    let Some(svg_name) = svg_file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Vec::new();
    };
    let include_obsolete = has_obsolete_component(svg_file);

    let mut found = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
        include_obsolete
            || entry.depth() == 0
            || !(entry.file_type().is_dir() && entry.file_name() == OBSOLETE)
    });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).display().to_string();
                tracing::warn!(path = %path, "skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_fzp(entry.path()) {
            continue;
        }
        match fs::read(entry.path()) {
            Ok(bytes) => {
                if String::from_utf8_lossy(&bytes).contains(&svg_name) {
                    found.push(entry.into_path());
                }
            }
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), "unable to read part file: {}", e)
            }
        }
    }
    tracing::debug!(svg = %svg_name, matches = found.len(), "searched part files");
    found
}

/// `.fzp` files directly inside `dir`, sorted.
pub fn list_fzp_files(dir: &Path) -> Result<Vec<PathBuf>, FzpCheckError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_fzp(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read a batch list: a JSON array of strings when the file name ends in
/// `.json`, otherwise one entry per line.
pub fn read_batch_list(path: &Path) -> Result<Vec<String>, FzpCheckError> {
    let content = fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content).map_err(|e| FzpCheckError::BatchList {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    } else {
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Where the part files of a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets<'a> {
    /// Entries of a batch list. `.fzp` entries are relative to the root,
    /// `.svg` entries are searched for below it.
    BatchList(&'a Path),
    /// Part files below the root that reference this SVG.
    Svg(&'a Path),
    /// The root itself: a single part file, or the `.fzp` files directly
    /// inside a directory.
    Root,
}

/// Collect the de-duplicated set of part files to check.
///
/// A root that is neither a file nor a directory yields nothing.
pub fn resolve_targets(
    root: &Path,
    targets: Targets<'_>,
) -> Result<BTreeSet<PathBuf>, FzpCheckError> {
    let mut files = BTreeSet::new();
    match targets {
        Targets::BatchList(list) => {
            for entry in read_batch_list(list)? {
                if entry.ends_with(".fzp") {
                    files.insert(root.join(&entry));
                } else if entry.ends_with(".svg") {
                    files.extend(find_fzp_files_referencing(Path::new(&entry), root));
                } else {
                    tracing::debug!(entry = %entry, "ignoring batch entry");
                }
            }
        }
        Targets::Svg(svg) if root.is_dir() => {
            files.extend(find_fzp_files_referencing(svg, root));
        }
        Targets::Svg(_) | Targets::Root => {
            if root.is_file() {
                files.insert(root.to_path_buf());
            } else if root.is_dir() {
                files.extend(list_fzp_files(root)?);
            }
        }
    }
    Ok(files)
}
