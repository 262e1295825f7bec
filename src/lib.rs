//! Batch WAV to MP3 converter
//!
//! Library crate behind the `wav2mp3` binary:
//! - `wave` decodes RIFF/WAVE containers into metadata and samples
//! - `codec` is the encoder seam, backed by LAME
//! - `transcode` runs the per-file parse/encode/write pipeline
//! - `batch` partitions the file list over a fixed worker pool
//! - `scan` enumerates the input directory
//! - `cli` defines the command line

pub mod batch;
pub mod cli;
pub mod codec;
pub mod scan;
pub mod transcode;
pub mod wave;

pub use batch::{BatchReport, PartitionPlan, WorkPartition};
pub use cli::Cli;
pub use codec::{Codec, CodecError, Mp3Codec};
pub use transcode::TranscodeError;
pub use wave::{WaveAudio, WaveError, WaveFormat};
