//! Input directory enumeration
//!
//! Lists the WAV files the batch will process. The listing is sorted by path
//! so partition assignment is reproducible across runs regardless of the
//! platform's directory iteration order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::transcode::SOURCE_EXTENSION;

/// List regular files in `dir` carrying the `wav` extension, sorted by path
///
/// Non-matching entries and subdirectories are skipped; the scan does not
/// recurse.
pub fn list_wave_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_file = entry
            .file_type()
            .map(|kind| kind.is_file())
            .unwrap_or(false);
        let path = entry.path();
        if is_file
            && path
                .extension()
                .map_or(false, |ext| ext == SOURCE_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
