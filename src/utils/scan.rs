//! Folder scanning for annotatable audio files.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::AUDIO_EXTENSIONS;

/// Check if a file or directory is hidden (starts with '.')
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// True if the path carries a supported audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.as_str()))
}

/// Collect the audio files directly inside `dir`, sorted by path.
///
/// The annotator presents one folder at a time, so the scan is deliberately
/// non-recursive. Hidden files are skipped.
pub fn collect_audio_files(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if !dir.is_dir() {
        return Err(format!("{} is not a directory", dir.display()).into());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() || is_hidden(&path) {
            continue;
        }
        if is_audio_file(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
