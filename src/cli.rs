use std::path::PathBuf;

use clap::Parser;

/// wav2mp3 - batch WAV to MP3 converter
#[derive(Parser, Debug)]
#[command(name = "wav2mp3")]
#[command(version)]
#[command(about = "Convert every WAV file in a directory to MP3, in parallel", long_about = None)]
pub struct Cli {
    /// Directory containing the .wav files to convert
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,
}
