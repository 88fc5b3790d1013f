// imgpress/src/report.rs
//! Machine-readable summary of a batch run.

use crate::core::{BatchStats, CompressionOptions, CompressionResult, Outcome, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct OptionsSummary {
    pub max_size_mb: f64,
    pub target_size_mb: f64,
    pub max_width_or_height: u32,
    pub quality: f32,
    pub output_format: &'static str,
}

impl From<&CompressionOptions> for OptionsSummary {
    fn from(options: &CompressionOptions) -> Self {
        Self {
            max_size_mb: options.max_size_mb,
            target_size_mb: options.target_size_mb,
            max_width_or_height: options.max_width_or_height,
            quality: options.quality,
            output_format: options.output_format.mime_type(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub output_name: String,
    pub mime_type: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub options: OptionsSummary,
    pub stats: BatchStats,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// `sources[i]` is the input that produced `results[i]`.
    pub fn new(options: &CompressionOptions, sources: &[PathBuf], results: &[CompressionResult]) -> Self {
        let files = sources
            .iter()
            .zip(results)
            .map(|(source, result)| FileReport {
                source: source.clone(),
                output_name: result.file.name.clone(),
                mime_type: result.file.mime_type.clone(),
                original_size: result.original_size,
                compressed_size: result.compressed_size,
                compression_ratio: result.compression_ratio,
                outcome: result.outcome.clone(),
            })
            .collect();

        Self {
            options: OptionsSummary::from(options),
            stats: BatchStats::from_results(results),
            files,
        }
    }

    /// Replaces output names with the ones used on disk. `names[i]` belongs
    /// to `files[i]`; `None` keeps the name from the result.
    pub fn with_output_names(mut self, names: &[Option<String>]) -> Self {
        for (file, name) in self.files.iter_mut().zip(names) {
            if let Some(name) = name {
                file.output_name = name.clone();
            }
        }
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Wrote report to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InputFile, PassThroughReason};
    use serde_json::Value;

    #[test]
    fn report_serializes_outcomes() {
        let results = vec![
            CompressionResult::pass_through(
                InputFile::new("c.pdf", "application/pdf", vec![0; 10]),
                PassThroughReason::NotAnImage,
            ),
            CompressionResult::compressed(
                InputFile::new("a.jpg", "image/jpeg", vec![0; 25]),
                100,
                Outcome::Compressed {
                    width: 1920,
                    height: 960,
                    quality: 0.8,
                    attempts: 2,
                },
            ),
            CompressionResult::pass_through(
                InputFile::new("x.png", "image/png", vec![0; 5]),
                PassThroughReason::Failed("bad data".to_string()),
            ),
        ];
        let sources = vec![
            PathBuf::from("in/c.pdf"),
            PathBuf::from("in/a.png"),
            PathBuf::from("in/x.png"),
        ];

        let report = BatchReport::new(&CompressionOptions::default(), &sources, &results);
        let json: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["options"]["output_format"], "image/jpeg");
        assert_eq!(json["stats"]["processed_count"], 3);
        assert_eq!(json["stats"]["compressed_count"], 1);
        assert_eq!(json["files"][0]["outcome"]["status"], "pass_through");
        assert_eq!(json["files"][0]["outcome"]["detail"]["reason"], "not_an_image");
        assert_eq!(json["files"][1]["source"], "in/a.png");
        assert_eq!(json["files"][1]["output_name"], "a.jpg");
        assert_eq!(json["files"][1]["compression_ratio"], 0.25);
        assert_eq!(json["files"][1]["outcome"]["detail"]["width"], 1920);
        assert_eq!(json["files"][2]["outcome"]["detail"]["message"], "bad data");
    }

    #[test]
    fn written_names_override_result_names() {
        let results = vec![
            CompressionResult::compressed(
                InputFile::new("a.jpg", "image/jpeg", vec![0; 10]),
                40,
                Outcome::Compressed {
                    width: 8,
                    height: 8,
                    quality: 0.8,
                    attempts: 1,
                },
            ),
            CompressionResult::compressed(
                InputFile::new("a.jpg", "image/jpeg", vec![0; 12]),
                40,
                Outcome::Compressed {
                    width: 8,
                    height: 8,
                    quality: 0.8,
                    attempts: 1,
                },
            ),
            CompressionResult::pass_through(
                InputFile::new("gone.png", "image/png", Vec::new()),
                PassThroughReason::Failed("missing".to_string()),
            ),
        ];
        let sources = vec![
            PathBuf::from("in/a.bmp"),
            PathBuf::from("in/a.png"),
            PathBuf::from("in/gone.png"),
        ];
        let written = vec![Some("a.jpg".to_string()), Some("a_1.jpg".to_string()), None];

        let report = BatchReport::new(&CompressionOptions::default(), &sources, &results)
            .with_output_names(&written);

        assert_eq!(report.files[0].output_name, "a.jpg");
        assert_eq!(report.files[1].output_name, "a_1.jpg");
        assert_eq!(report.files[2].output_name, "gone.png");
    }
}
