// imgpress/src/processors/batch.rs
use crate::core::pipeline::ImagePipeline;
use crate::core::state::{BatchEvent, BatchObserver, NoopObserver};
use crate::core::{
    BatchStats, CompressError, CompressionOptions, CompressionResult, InputFile,
    PassThroughReason, Result,
};
use crate::utils::mime_from_path;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

enum Source {
    Loaded(InputFile),
    Unreadable(InputFile, String),
}

impl Source {
    fn name(&self) -> &str {
        match self {
            Source::Loaded(file) | Source::Unreadable(file, _) => &file.name,
        }
    }
}

enum Execution {
    Sequential,
    GlobalPool,
    Pool(rayon::ThreadPool),
}

/// Compresses lists of files. One result per input, in input order; a file
/// that fails is returned as its original rather than aborting the batch.
pub struct BatchProcessor {
    pipeline: ImagePipeline,
    execution: Execution,
}

impl BatchProcessor {
    /// Processes files one after another.
    pub fn new(options: CompressionOptions) -> Result<Self> {
        Ok(Self {
            pipeline: ImagePipeline::new(options)?,
            execution: Execution::Sequential,
        })
    }

    /// Processes files in parallel. `max_threads == 0` uses rayon's global
    /// pool, `1` stays sequential.
    pub fn with_threads(options: CompressionOptions, max_threads: usize) -> Result<Self> {
        let pipeline = ImagePipeline::new(options)?;

        let execution = match max_threads {
            0 => Execution::GlobalPool,
            1 => Execution::Sequential,
            n => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| {
                        CompressError::Processing(format!("Failed to create thread pool: {}", e))
                    })?;
                Execution::Pool(pool)
            }
        };

        Ok(Self { pipeline, execution })
    }

    pub fn pipeline(&self) -> &ImagePipeline {
        &self.pipeline
    }

    pub fn compress_batch(&self, files: Vec<InputFile>) -> Vec<CompressionResult> {
        self.compress_batch_observed(files, &mut NoopObserver)
    }

    pub fn compress_batch_observed<O>(
        &self,
        files: Vec<InputFile>,
        observer: &mut O,
    ) -> Vec<CompressionResult>
    where
        O: BatchObserver + Send,
    {
        let sources = files.into_iter().map(Source::Loaded).collect();
        self.run(sources, observer)
    }

    /// Reads `paths` from disk and compresses them. Unreadable paths come
    /// back as failed pass-through entries with no content.
    pub fn compress_paths(&self, paths: &[PathBuf]) -> Vec<CompressionResult> {
        self.compress_paths_observed(paths, &mut NoopObserver)
    }

    pub fn compress_paths_observed<O>(&self, paths: &[PathBuf], observer: &mut O) -> Vec<CompressionResult>
    where
        O: BatchObserver + Send,
    {
        let sources = paths
            .iter()
            .map(|path| match read_input_file(path) {
                Ok(file) => Source::Loaded(file),
                Err(e) => {
                    log::warn!("Failed to read {}: {}", path.display(), e);
                    let placeholder = InputFile::new(display_name(path), mime_from_path(path), Vec::new());
                    Source::Unreadable(placeholder, e.to_string())
                }
            })
            .collect();

        self.run(sources, observer)
    }

    fn run<O>(&self, sources: Vec<Source>, observer: &mut O) -> Vec<CompressionResult>
    where
        O: BatchObserver + Send,
    {
        log::info!("Compressing batch of {} file(s)", sources.len());
        observer.on_event(&BatchEvent::Started { total: sources.len() });

        let results: Vec<CompressionResult> = match &self.execution {
            Execution::Sequential => sources
                .into_iter()
                .enumerate()
                .map(|(index, source)| self.process_one(index, source, observer))
                .collect(),
            Execution::GlobalPool => self.run_parallel(sources, observer),
            Execution::Pool(pool) => pool.install(|| self.run_parallel(sources, observer)),
        };

        let stats = BatchStats::from_results(&results);
        log::info!(
            "Batch done: {} compressed, {} passed through ({} failed), {:.1}% saved",
            stats.compressed_count,
            stats.passed_through_count,
            stats.failed_count,
            stats.overall_savings()
        );
        observer.on_event(&BatchEvent::Finished { stats: &stats });

        results
    }

    fn run_parallel<O>(&self, sources: Vec<Source>, observer: &mut O) -> Vec<CompressionResult>
    where
        O: BatchObserver + Send,
    {
        let observer = Mutex::new(observer);

        sources
            .into_par_iter()
            .enumerate()
            .map(|(index, source)| {
                notify(&observer, &BatchEvent::FileStarted { index, name: source.name() });
                let result = self.process_source(source);
                notify(&observer, &BatchEvent::FileFinished { index, result: &result });
                result
            })
            .collect()
    }

    fn process_one<O>(&self, index: usize, source: Source, observer: &mut O) -> CompressionResult
    where
        O: BatchObserver,
    {
        observer.on_event(&BatchEvent::FileStarted { index, name: source.name() });
        let result = self.process_source(source);
        observer.on_event(&BatchEvent::FileFinished { index, result: &result });
        result
    }

    fn process_source(&self, source: Source) -> CompressionResult {
        match source {
            Source::Loaded(file) => self.pipeline.process(file),
            Source::Unreadable(file, message) => {
                CompressionResult::pass_through(file, PassThroughReason::Failed(message))
            }
        }
    }
}

fn notify<O: BatchObserver>(observer: &Mutex<&mut O>, event: &BatchEvent<'_>) {
    match observer.lock() {
        Ok(mut guard) => guard.on_event(event),
        Err(poisoned) => poisoned.into_inner().on_event(event),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Loads a file from disk, labelling it by extension.
pub fn read_input_file(path: &Path) -> Result<InputFile> {
    let bytes = std::fs::read(path)?;
    Ok(InputFile::new(display_name(path), mime_from_path(path), bytes))
}

/// Lists regular files under `input_dir`, sorted for a stable batch order.
pub fn collect_files(input_dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(CompressError::InvalidOptions(format!(
            "Input path is not a directory: {}",
            input_dir.display()
        )));
    }

    let walker = if recursive {
        WalkDir::new(input_dir)
    } else {
        WalkDir::new(input_dir).max_depth(1)
    };

    let mut paths: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    Ok(paths)
}
