use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use wav2mp3::batch;
use wav2mp3::cli::Cli;
use wav2mp3::codec::Mp3Codec;
use wav2mp3::scan;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let files = scan::list_wave_files(&cli.directory)
        .with_context(|| format!("failed to list directory {:?}", cli.directory))?;
    if files.is_empty() {
        info!("no .wav files found in {:?}", cli.directory);
        return Ok(());
    }

    let worker_count = thread::available_parallelism()
        .context("failed to determine available parallelism")?
        .get()
        .min(files.len());
    info!(
        "converting {} file(s) on {} worker(s)",
        files.len(),
        worker_count
    );

    let report = batch::run(files, Arc::new(Mp3Codec), worker_count)
        .context("worker pool failed to start")?;

    info!("done: {} converted, {} failed", report.converted, report.failed);
    if report.failed > 0 {
        warn!("{} file(s) could not be converted; see the log above", report.failed);
    }
    Ok(())
}
