use anyhow::{bail, Context};
use clap::Parser;
use imgpress::{
    collect_files, format_file_size, generate_output_path, read_input_file, BatchEvent,
    BatchObserver, BatchProcessor, BatchReport, Cli, Commands, CompressArgs, CompressionResult,
    ImagePipeline, Loader, MetadataProcessor,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Compress {
            inputs,
            output,
            options,
        } => process_compress(inputs, output, options),
        Commands::Batch {
            input,
            output,
            recursive,
            threads,
            options,
        } => process_batch(input, output, recursive, threads, options),
        Commands::Info { input, options } => process_info(input, options),
    }
}

/// Drives an indicatif bar from batch events.
struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }
}

impl BatchObserver for ProgressReporter {
    fn on_event(&mut self, event: &BatchEvent<'_>) {
        match event {
            BatchEvent::Started { total } => self.bar.set_length(*total as u64),
            BatchEvent::FileStarted { name, .. } => self.bar.set_message(name.to_string()),
            BatchEvent::FileFinished { .. } => self.bar.inc(1),
            BatchEvent::Finished { stats } => self.bar.finish_with_message(format!(
                "{} compressed, {:.1}% smaller",
                stats.compressed_count,
                stats.overall_savings()
            )),
        }
    }
}

fn process_compress(inputs: Vec<PathBuf>, output: PathBuf, args: CompressArgs) -> anyhow::Result<()> {
    let options = args.to_options()?;
    let processor = BatchProcessor::new(options)?;
    run(&processor, &inputs, &output, &args)
}

fn process_batch(
    input: PathBuf,
    output: PathBuf,
    recursive: bool,
    threads: usize,
    args: CompressArgs,
) -> anyhow::Result<()> {
    if output.exists() && !output.is_dir() {
        bail!("Output path exists but is not a directory: {}", output.display());
    }
    if input == output {
        bail!("Input and output directories cannot be the same");
    }

    let options = args.to_options()?;
    let processor = BatchProcessor::with_threads(options, threads)?;

    let paths = collect_files(&input, recursive)?;
    if paths.is_empty() {
        log::warn!("No files found in {}", input.display());
        return Ok(());
    }

    run(&processor, &paths, &output, &args)
}

fn run(
    processor: &BatchProcessor,
    paths: &[PathBuf],
    output: &Path,
    args: &CompressArgs,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut progress = ProgressReporter::new()?;
    let results = processor.compress_paths_observed(paths, &mut progress);

    let written = results
        .iter()
        .map(|result| write_result(result, output))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let report = BatchReport::new(processor.pipeline().options(), paths, &results)
        .with_output_names(&written);
    if let Some(report_path) = &args.report {
        report.write_to(report_path)?;
    }

    println!(
        "Processed {} file(s): {} compressed, {} unchanged, {} failed ({} -> {})",
        report.stats.processed_count,
        report.stats.compressed_count,
        report.stats.passed_through_count - report.stats.failed_count,
        report.stats.failed_count,
        format_file_size(report.stats.total_size_before),
        format_file_size(report.stats.total_size_after),
    );

    Ok(())
}

/// Returns the file name actually written, which differs from the result's
/// name when an earlier output already took it.
fn write_result(result: &CompressionResult, output: &Path) -> anyhow::Result<Option<String>> {
    if result.is_failure() && result.file.bytes.is_empty() {
        return Ok(None);
    }

    let path = generate_output_path(output, &result.file.name);
    std::fs::write(&path, &result.file.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Wrote {}", path.display());

    Ok(path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned()))
}

fn process_info(input: PathBuf, args: CompressArgs) -> anyhow::Result<()> {
    let options = args.to_options()?;
    let pipeline = ImagePipeline::new(options)?;
    let file = read_input_file(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("=== File Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(file.size_bytes()));
    println!("MIME type: {}", file.mime_type);

    if file.is_image() {
        let loader = Loader::new();
        match loader.sniff_format(&file.bytes) {
            Ok(format) => {
                println!("Detected format: {}", format.to_mime_type());
                let (width, height) = loader.read_dimensions(&file.bytes)?;
                println!("Dimensions: {} x {} pixels", width, height);
            }
            Err(e) => println!("Detected format: none ({})", e),
        }

        let metadata = MetadataProcessor::new();
        if let Some(exif) = metadata.read_metadata(&file.bytes) {
            println!("\n=== EXIF Metadata ===");
            for (tag, value) in metadata.extract_common_metadata(&exif) {
                println!("{:25}: {}", tag, value);
            }
            if metadata.has_gps(&exif) {
                println!("{:25}: present (dropped on re-encode)", "GPS");
            }
        }
    }

    let verdict = if pipeline.should_compress(&file) {
        "would be compressed"
    } else {
        "would be uploaded unchanged"
    };
    println!("\nUpload: {}", verdict);

    Ok(())
}
