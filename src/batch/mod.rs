//! Batch scheduling across a fixed worker pool
//!
//! Partitions an ordered file list into contiguous index ranges, runs the
//! per-file transcode pipeline on one OS thread per partition, and joins all
//! workers before returning. Partitioning is static: there is no queue, no
//! work stealing, and no shared mutable state between workers. The only data
//! workers share is the read-only file list and the partition boundaries,
//! both computed before any thread starts.


use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info};
use thiserror::Error;

use crate::codec::Codec;
use crate::transcode;

/// Error type for worker pool operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// Thread spawn failed
    #[error("failed to spawn thread: {0}")]
    SpawnFailed(String),
    /// The thread panicked or was already joined
    #[error("failed to join thread: {0}")]
    JoinFailed(String),
}

/// Handle to a spawned worker thread
///
/// Wraps a `JoinHandle` so spawn and join failures surface as [`ThreadError`]
/// values instead of panics.
pub struct Thread<T> {
    handle: Option<JoinHandle<T>>,
}

impl<T> Thread<T> {
    /// Spawn a new thread, optionally named for debugging
    pub fn spawn<F>(name: Option<&str>, f: F) -> Result<Self, ThreadError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut builder = thread::Builder::new();
        if let Some(n) = name {
            builder = builder.name(n.to_string());
        }

        let handle = builder
            .spawn(f)
            .map_err(|e| ThreadError::SpawnFailed(e.to_string()))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the thread to finish and return its result
    pub fn join(mut self) -> Result<T, ThreadError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ThreadError::JoinFailed("thread panicked".to_string())),
            None => Err(ThreadError::JoinFailed("thread already joined".to_string())),
        }
    }
}

/// A contiguous index range `[start, end)` over the file list, assigned to
/// one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPartition {
    pub start: usize,
    pub end: usize,
}

impl WorkPartition {
    /// Number of files in this partition
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the partition covers no files
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Immutable partition assignment computed once before workers start
///
/// Invariants: partitions are disjoint, contiguous, in list order, and their
/// union is exactly `0..file_count`. With `C` workers over `N` files, workers
/// `0..C-1` each receive `N / C` files and the last worker absorbs the
/// `N % C` remainder. The resulting imbalance on the final worker is accepted
/// behavior for a roughly uniform per-file cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    partitions: Vec<WorkPartition>,
}

impl PartitionPlan {
    /// Compute the plan for `file_count` files over at most `worker_count`
    /// workers
    ///
    /// A worker count above the file count is clamped down; zero files or
    /// zero workers yields an empty plan.
    pub fn new(file_count: usize, worker_count: usize) -> Self {
        if file_count == 0 || worker_count == 0 {
            return Self {
                partitions: Vec::new(),
            };
        }
        let worker_count = worker_count.min(file_count);

        let mut partitions = Vec::with_capacity(worker_count);
        if worker_count == file_count {
            // 1:1 mapping, one file per worker
            for index in 0..file_count {
                partitions.push(WorkPartition {
                    start: index,
                    end: index + 1,
                });
            }
        } else {
            let base = file_count / worker_count;
            let remainder = file_count % worker_count;
            let mut start = 0;
            for worker in 0..worker_count {
                let count = if worker == worker_count - 1 {
                    base + remainder
                } else {
                    base
                };
                partitions.push(WorkPartition {
                    start,
                    end: start + count,
                });
                start += count;
            }
        }

        Self { partitions }
    }

    /// The computed partitions, in worker order
    pub fn partitions(&self) -> &[WorkPartition] {
        &self.partitions
    }

    /// Number of workers the plan uses
    pub fn worker_count(&self) -> usize {
        self.partitions.len()
    }
}

/// Outcome tally for one batch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Files transcoded and written successfully
    pub converted: usize,
    /// Files that failed at any pipeline stage (or were lost to a worker
    /// panic)
    pub failed: usize,
}

/// Run the transcode pipeline for every file, using at most `worker_count`
/// concurrent workers
///
/// Blocks until every worker has completed. Per-file failures are logged and
/// contained to the failing file; a panicking worker is reported and its
/// whole partition counted as failed. Only a failure to spawn a worker is
/// returned as an error.
pub fn run<C>(
    files: Vec<PathBuf>,
    codec: Arc<C>,
    worker_count: usize,
) -> Result<BatchReport, ThreadError>
where
    C: Codec + Send + Sync + 'static,
{
    let plan = PartitionPlan::new(files.len(), worker_count);
    let files = Arc::new(files);

    let mut workers = Vec::with_capacity(plan.worker_count());
    let mut spawn_error = None;
    for (index, partition) in plan.partitions().iter().copied().enumerate() {
        let files = Arc::clone(&files);
        let codec = Arc::clone(&codec);
        let name = format!("transcode-{index}");
        match Thread::spawn(Some(&name), move || {
            run_partition(&files[partition.start..partition.end], codec.as_ref())
        }) {
            Ok(worker) => workers.push(worker),
            Err(err) => {
                spawn_error = Some(err);
                break;
            }
        }
    }

    // Workers that did start are joined even when a later spawn failed;
    // nothing keeps transcoding detached after run() returns.
    let report = join_workers(plan.partitions(), workers);
    match spawn_error {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

/// Join every spawned worker and tally the results
///
/// `workers` pairs positionally with the leading entries of `partitions`; a
/// worker that panicked has its whole partition counted as failed.
fn join_workers(partitions: &[WorkPartition], workers: Vec<Thread<BatchReport>>) -> BatchReport {
    let mut report = BatchReport::default();
    for (partition, worker) in partitions.iter().zip(workers) {
        match worker.join() {
            Ok(partial) => {
                report.converted += partial.converted;
                report.failed += partial.failed;
            }
            Err(err) => {
                error!("worker lost: {err}");
                report.failed += partition.len();
            }
        }
    }
    report
}

/// Process one partition's files strictly in order
fn run_partition<C: Codec + ?Sized>(files: &[PathBuf], codec: &C) -> BatchReport {
    let mut report = BatchReport::default();
    for path in files {
        match transcode::transcode_file(path, codec) {
            Ok(output) => {
                info!("{} -> {}", path.display(), output.display());
                report.converted += 1;
            }
            Err(err) => {
                error!("{}: {err}", path.display());
                report.failed += 1;
            }
        }
    }
    report
}
