// imgpress/src/core/state.rs
//! Progress reporting for batch compression.
//!
//! The orchestrator never owns progress state. Callers that want to follow
//! a batch pass a [`BatchObserver`]; [`UploadState`] is the stock observer
//! for an upload form (overall flag, percentage, last error, per-file status).

use super::{BatchStats, CompressionResult, Outcome, PassThroughReason};

#[derive(Debug)]
pub enum BatchEvent<'a> {
    Started { total: usize },
    FileStarted { index: usize, name: &'a str },
    FileFinished { index: usize, result: &'a CompressionResult },
    Finished { stats: &'a BatchStats },
}

pub trait BatchObserver {
    fn on_event(&mut self, event: &BatchEvent<'_>);
}

impl<F> BatchObserver for F
where
    F: FnMut(&BatchEvent<'_>),
{
    fn on_event(&mut self, event: &BatchEvent<'_>) {
        self(event)
    }
}

pub struct NoopObserver;

impl BatchObserver for NoopObserver {
    fn on_event(&mut self, _event: &BatchEvent<'_>) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Pending,
    Compressing,
    Compressed {
        original_size: u64,
        compressed_size: u64,
        compression_ratio: f64,
    },
    PassedThrough { size: u64 },
    Failed(String),
}

impl FileStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, FileStatus::Pending | FileStatus::Compressing)
    }

    fn from_result(result: &CompressionResult) -> Self {
        match &result.outcome {
            Outcome::Compressed { .. } => FileStatus::Compressed {
                original_size: result.original_size,
                compressed_size: result.compressed_size,
                compression_ratio: result.compression_ratio,
            },
            Outcome::PassThrough(PassThroughReason::Failed(message)) => {
                FileStatus::Failed(message.clone())
            }
            Outcome::PassThrough(_) => FileStatus::PassedThrough {
                size: result.original_size,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    pub is_uploading: bool,
    /// Percentage of files finished, 0 to 100.
    pub progress: f32,
    /// Most recent per-file failure, if any.
    pub error: Option<String>,
    pub results: Vec<FileStatus>,
}

impl UploadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finished_count(&self) -> usize {
        self.results.iter().filter(|status| status.is_finished()).count()
    }

    fn set_status(&mut self, index: usize, status: FileStatus) {
        if let Some(slot) = self.results.get_mut(index) {
            *slot = status;
        }
    }

    fn update_progress(&mut self) {
        self.progress = if self.results.is_empty() {
            100.0
        } else {
            self.finished_count() as f32 / self.results.len() as f32 * 100.0
        };
    }
}

impl BatchObserver for UploadState {
    fn on_event(&mut self, event: &BatchEvent<'_>) {
        match event {
            BatchEvent::Started { total } => {
                self.is_uploading = true;
                self.progress = 0.0;
                self.error = None;
                self.results = vec![FileStatus::Pending; *total];
            }
            BatchEvent::FileStarted { index, .. } => {
                self.set_status(*index, FileStatus::Compressing);
            }
            BatchEvent::FileFinished { index, result } => {
                let status = FileStatus::from_result(result);
                if let FileStatus::Failed(message) = &status {
                    self.error = Some(format!("{}: {}", result.file.name, message));
                }
                self.set_status(*index, status);
                self.update_progress();
            }
            BatchEvent::Finished { .. } => {
                self.is_uploading = false;
                self.progress = 100.0;
            }
        }
    }
}
