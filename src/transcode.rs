//! Per-file transcode pipeline
//!
//! One invocation handles one file: load bytes, parse the WAV container,
//! encode, and write the result next to the source with the codec's
//! extension. Every failure is scoped to the file; nothing here aborts the
//! batch. A parse failure produces no output file at all.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::codec::{Codec, CodecError};
use crate::wave::{self, WaveError};

/// Source extension the pipeline accepts, without the leading dot
pub const SOURCE_EXTENSION: &str = "wav";

/// File-scoped errors from the transcode pipeline
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The source file could not be read
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The container failed to parse
    #[error(transparent)]
    Wave(#[from] WaveError),

    /// The source path carries no `wav` extension to replace
    #[error("no '.wav' extension to replace in {path:?}")]
    InvalidPath { path: PathBuf },

    /// The encoder failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The encoded buffer could not be written
    #[error("unable to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Derive the output path by swapping the source extension for
/// `target_extension`
pub fn derive_output_path(
    path: &Path,
    target_extension: &str,
) -> Result<PathBuf, TranscodeError> {
    match path.extension() {
        Some(ext) if ext == SOURCE_EXTENSION => Ok(path.with_extension(target_extension)),
        _ => Err(TranscodeError::InvalidPath {
            path: path.to_path_buf(),
        }),
    }
}

/// Run the full pipeline for one file, returning the written output path
pub fn transcode_file<C: Codec + ?Sized>(
    path: &Path,
    codec: &C,
) -> Result<PathBuf, TranscodeError> {
    let output_path = derive_output_path(path, codec.target_extension())?;

    let bytes = fs::read(path).map_err(|source| TranscodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let audio = wave::parse(&bytes)?;
    info!(
        "{}: {} channel(s), {} Hz, {} samples ({:.2}s)",
        path.display(),
        audio.format.channels,
        audio.format.sample_rate,
        audio.samples.len(),
        audio.duration_secs()
    );

    let encoded = codec.encode(&audio.samples, &audio.format)?;

    fs::write(&output_path, &encoded).map_err(|source| TranscodeError::Write {
        path: output_path.clone(),
        source,
    })?;
    Ok(output_path)
}
