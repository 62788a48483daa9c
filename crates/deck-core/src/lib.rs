pub mod category;
pub mod classify;
pub mod date;
pub mod deck;
pub mod error;
pub mod extract;
pub mod pptx;
pub mod record;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use category::{Category, CategoryBucket, CategoryCounts};
pub use classify::{Classifier, EncodedImage, OpenAiConfig, OpenAiVision, VisionModel};
pub use error::{ClassificationFailure, ExtractionError, RenderError};
pub use record::{ImageRecord, TimestampSource};

pub const OUTPUT_FILENAME: &str = "treatment_report.pptx";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Photographs in input order
    pub image_paths: Vec<PathBuf>,
    /// Directory that receives the deck
    pub output_dir: PathBuf,
}

impl ProcessOptions {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_FILENAME)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckSummary {
    pub output_path: PathBuf,
    pub categories: CategoryCounts,
    pub images_processed: u64,
    pub images_skipped: u64,
}

/// The single machine-readable line reported to the invoking process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessResult {
    Success {
        output_path: PathBuf,
        categories: CategoryCounts,
    },
    Error {
        error: String,
    },
}

impl ProcessResult {
    pub fn error(e: impl std::fmt::Display) -> Self {
        ProcessResult::Error { error: e.to_string() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessResult::Success { .. })
    }
}

impl From<DeckSummary> for ProcessResult {
    fn from(summary: DeckSummary) -> Self {
        ProcessResult::Success {
            output_path: summary.output_path,
            categories: summary.categories,
        }
    }
}

/// Type alias for progress callback: (stage, current, total, message)
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + Send + Sync + 'a;

/// Run the full pipeline: extract and classify each image in turn, then write the deck.
///
/// Images that cannot be read are logged and skipped; classification failures land in
/// `unknown`. Only failing to write the deck aborts the run.
pub fn process<M: VisionModel>(
    options: &ProcessOptions,
    classifier: &Classifier<M>,
    progress_callback: &ProgressCallback<'_>,
) -> Result<DeckSummary, RenderError> {
    let total = options.image_paths.len() as u64;
    tracing::info!(images = total, output = %options.output_dir.display(), "processing images");

    // Stage 1: Extract and classify, one image at a time
    let mut bucket = CategoryBucket::new();
    let mut skipped = 0u64;
    for (i, path) in options.image_paths.iter().enumerate() {
        let mut record = match extract::extract_metadata(path) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipping image: {}", e);
                skipped += 1;
                progress_callback("classify", i as u64, total, "skipped");
                continue;
            }
        };

        let category = classifier.classify(path);
        record.assign(category);
        tracing::info!(
            "Image {} classified as {} ({})",
            record.filename,
            category.label(),
            category.key()
        );
        progress_callback("classify", i as u64, total, &record.filename);
        bucket.push(record);
    }

    let counts = bucket.counts();
    for category in Category::DISPLAY_ORDER {
        tracing::info!("{}: {} images", category.key(), counts.get(category));
    }

    // Stage 2: Lay out and write the deck
    let deck = deck::build_deck(&bucket, chrono::Local::now().naive_local());
    let output_path = pptx::write_pptx(&deck, &options.output_path())?;
    progress_callback("render", total, total, "presentation written");

    Ok(DeckSummary {
        output_path,
        categories: counts,
        images_processed: bucket.len() as u64,
        images_skipped: skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_line_shape() {
        let result = ProcessResult::from(DeckSummary {
            output_path: PathBuf::from("/out/treatment_report.pptx"),
            categories: CategoryCounts { front_with_teeth: 3, unknown: 2, ..Default::default() },
            images_processed: 5,
            images_skipped: 0,
        });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["output_path"], "/out/treatment_report.pptx");
        assert_eq!(value["categories"]["front_with_teeth"], 3);
        assert_eq!(value["categories"]["side_view"], 0);
        assert_eq!(value["categories"]["unknown"], 2);
        assert!(value.get("images_processed").is_none());
    }

    #[test]
    fn test_error_line_shape() {
        let line = serde_json::to_string(&ProcessResult::error("disk full")).unwrap();
        assert_eq!(line, r#"{"status":"error","error":"disk full"}"#);
    }

    #[test]
    fn test_output_path() {
        let options = ProcessOptions { image_paths: vec![], output_dir: PathBuf::from("/reports") };
        assert_eq!(options.output_path(), PathBuf::from("/reports/treatment_report.pptx"));
    }
}
