//! Image OCR
//!
//! The engine is an injected capability. The production engine drives the
//! `tesseract` CLI inside a scoped temporary directory; tests use a stub.

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::types::ExtractionResult;

/// Below this mean confidence (0-100) the text gets a warning prefix
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 60.0;

pub const EMPTY_OCR_PLACEHOLDER: &str = "[No text could be recognized in this image]";

static EXCESS_NEWLINES: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\n{3,}").ok());
static SPACE_RUNS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r" {2,}").ok());

/// Raw OCR result from the engine
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    /// Mean word confidence, 0-100
    pub confidence: f32,
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine '{0}' is not installed or not on PATH")]
    EngineMissing(String),

    #[error("OCR language data is missing: {0}")]
    LanguageData(String),

    #[error("image could not be decoded: {0}")]
    UnreadableImage(String),

    #[error("OCR timed out after {0}s")]
    TimedOut(u64),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("I/O error during OCR: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// Message shown to the user in place of the engine's raw diagnostics
    pub fn user_message(&self) -> String {
        match self {
            OcrError::EngineMissing(tool) => format!(
                "image text recognition is unavailable: '{}' is not installed on the server",
                tool
            ),
            OcrError::LanguageData(langs) => format!(
                "image text recognition is unavailable: language data '{}' is not installed",
                langs
            ),
            OcrError::UnreadableImage(_) => {
                "the image format is not supported or the file is corrupted".to_string()
            }
            OcrError::TimedOut(secs) => format!(
                "image text recognition took longer than {}s; try a smaller or clearer image",
                secs
            ),
            OcrError::Engine(_) | OcrError::Io(_) => {
                format!("image text recognition failed ({})", self)
            }
        }
    }
}

/// OCR engine capability
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise text in an encoded image (PNG, JPEG, ...)
    ///
    /// `languages` uses Tesseract's `eng+chi_sim` syntax.
    async fn recognize(&self, image: &[u8], languages: &str) -> Result<OcrOutput, OcrError>;
}

/// Run OCR on one image and shape the text for the prompt
pub async fn extract_image(
    engine: &dyn OcrEngine,
    image: &[u8],
    languages: &str,
) -> ExtractionResult {
    let output = match engine.recognize(image, languages).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(error = %e, "OCR failed");
            return match e {
                OcrError::EngineMissing(_) | OcrError::LanguageData(_) => {
                    ExtractionResult::tool_missing(e.user_message())
                }
                _ => ExtractionResult::failed(e.user_message()),
            };
        }
    };

    let text = normalize_ocr_text(&output.text);
    if text.is_empty() {
        return ExtractionResult::Text(EMPTY_OCR_PLACEHOLDER.to_string());
    }

    if output.confidence < LOW_CONFIDENCE_THRESHOLD {
        return ExtractionResult::Text(format!(
            "[Low OCR confidence ({:.0}%): the recognized text may contain errors]\n{}",
            output.confidence, text
        ));
    }

    ExtractionResult::Text(text)
}

/// Collapse 3+ newlines to 2 and runs of spaces to one
pub fn normalize_ocr_text(text: &str) -> String {
    let mut text = text.replace("\r\n", "\n");
    if let Some(re) = EXCESS_NEWLINES.as_ref() {
        text = re.replace_all(&text, "\n\n").into_owned();
    }
    if let Some(re) = SPACE_RUNS.as_ref() {
        text = re.replace_all(&text, " ").into_owned();
    }
    text.trim().to_string()
}

/// Tesseract CLI engine
///
/// Each call gets its own temp directory (the "session"); the process is
/// killed if the call is dropped or times out, and the directory is removed
/// on every path.
pub struct TesseractEngine {
    bin: PathBuf,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn new(bin: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: &[u8], languages: &str) -> Result<OcrOutput, OcrError> {
        let session = tempfile::Builder::new().prefix("ocr-").tempdir()?;
        let input = session.path().join("image");
        let out_base = session.path().join("result");
        tokio::fs::write(&input, image).await?;

        debug!(languages, bytes = image.len(), "running tesseract");
        let mut cmd = Command::new(&self.bin);
        cmd.arg(&input)
            .arg(&out_base)
            .arg("-l")
            .arg(languages)
            .arg("txt")
            .arg("tsv")
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => return Err(OcrError::TimedOut(self.timeout.as_secs())),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::EngineMissing(self.bin.display().to_string()))
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_tesseract_failure(&stderr, languages));
        }

        let text = tokio::fs::read(out_base.with_extension("txt")).await?;
        let tsv = tokio::fs::read(out_base.with_extension("tsv"))
            .await
            .unwrap_or_default();

        Ok(OcrOutput {
            text: String::from_utf8_lossy(&text).into_owned(),
            confidence: mean_word_confidence(&String::from_utf8_lossy(&tsv)),
        })
    }
}

fn classify_tesseract_failure(stderr: &str, languages: &str) -> OcrError {
    if stderr.contains("Failed loading language")
        || stderr.contains("Could not initialize tesseract")
    {
        OcrError::LanguageData(languages.to_string())
    } else if stderr.contains("pixRead")
        || stderr.contains("Unsupported image type")
        || stderr.contains("cannot be read")
    {
        OcrError::UnreadableImage(stderr.to_string())
    } else {
        OcrError::Engine(stderr.to_string())
    }
}

/// Mean confidence over word rows of Tesseract TSV output.
/// TSV columns: level page_num block_num par_num line_num word_num left top width height conf text
/// Level 5 = word. Rows with conf -1 carry no score and are skipped.
pub fn mean_word_confidence(tsv: &str) -> f32 {
    let confidences: Vec<f32> = tsv
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 12 || fields[0] != "5" || fields[11].trim().is_empty() {
                return None;
            }
            fields[10].parse::<f32>().ok().filter(|c| *c >= 0.0)
        })
        .collect();

    if confidences.is_empty() {
        return 0.0;
    }
    confidences.iter().sum::<f32>() / confidences.len() as f32
}
