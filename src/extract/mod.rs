//! Extractor Set
//!
//! One converter per attachment kind, each turning raw bytes into plain text
//! or a typed error. Extractors never panic the caller: parser crashes and
//! helper-process failures all come back as [`ExtractionResult::Error`].

pub mod converter;
pub mod detect;
pub mod docx;
pub mod ocr;
pub mod pdf;
pub mod spreadsheet;
pub mod text;
pub mod types;

pub use converter::{AntiwordConverter, ConversionError, DocumentConverter, SofficeConverter};
pub use detect::detect;
pub use ocr::{OcrEngine, OcrError, OcrOutput, TesseractEngine};
pub use types::{Attachment, AttachmentKind, ExtractionErrorKind, ExtractionResult};

use std::sync::Arc;

use crate::config::ExtractorConfig;

/// Run a CPU-bound parser off the async runtime, turning panics into errors
pub(crate) async fn run_blocking<F>(label: &'static str, f: F) -> ExtractionResult
where
    F: FnOnce() -> Result<String, String> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.into(),
        Err(e) => {
            tracing::error!(kind = label, error = %e, "extractor crashed");
            ExtractionResult::failed(format!(
                "the {} parser crashed on this file; it is probably corrupted",
                label
            ))
        }
    }
}

/// Dispatches each attachment to the extractor for its kind
#[derive(Clone)]
pub struct ExtractorSet {
    doc_converter: Arc<dyn DocumentConverter>,
    wps_converter: Arc<dyn DocumentConverter>,
    ocr_engine: Arc<dyn OcrEngine>,
    ocr_languages: String,
}

impl ExtractorSet {
    pub fn new(
        doc_converter: Arc<dyn DocumentConverter>,
        wps_converter: Arc<dyn DocumentConverter>,
        ocr_engine: Arc<dyn OcrEngine>,
        ocr_languages: impl Into<String>,
    ) -> Self {
        Self {
            doc_converter,
            wps_converter,
            ocr_engine,
            ocr_languages: ocr_languages.into(),
        }
    }

    /// Production wiring: antiword, soffice and the tesseract CLI
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(
            Arc::new(AntiwordConverter::new(
                config.antiword_bin.clone(),
                config.converter_timeout,
            )),
            Arc::new(SofficeConverter::new(
                config.soffice_bin.clone(),
                config.converter_timeout,
            )),
            Arc::new(TesseractEngine::new(
                config.tesseract_bin.clone(),
                config.ocr_timeout,
            )),
            config.ocr_languages.clone(),
        )
    }

    /// Detect the kind and extract. Unmatched attachments are `Unsupported`.
    pub async fn extract(&self, attachment: &Attachment) -> ExtractionResult {
        match detect(&attachment.declared_mime_type, &attachment.filename) {
            Some(kind) => self.extract_as(kind, attachment).await,
            None => unsupported(attachment),
        }
    }

    /// Run the extractor for an already-detected kind
    pub async fn extract_as(
        &self,
        kind: AttachmentKind,
        attachment: &Attachment,
    ) -> ExtractionResult {
        let data = &attachment.data;
        match kind {
            AttachmentKind::Pdf => pdf::extract_pdf(data.clone()).await,
            AttachmentKind::Docx => docx::extract_docx(data.clone()).await,
            AttachmentKind::Spreadsheet => spreadsheet::extract_spreadsheet(data.clone()).await,
            AttachmentKind::Csv => text::extract_csv(data),
            AttachmentKind::Doc => {
                converted(self.doc_converter.convert(data, &attachment.filename).await)
            }
            AttachmentKind::Wps => {
                converted(self.wps_converter.convert(data, &attachment.filename).await)
            }
            AttachmentKind::Image => {
                ocr::extract_image(self.ocr_engine.as_ref(), data, &self.ocr_languages).await
            }
        }
    }
}

fn converted(result: Result<String, ConversionError>) -> ExtractionResult {
    match result {
        Ok(text) => ExtractionResult::Text(text),
        Err(e) => e.into(),
    }
}

fn unsupported(attachment: &Attachment) -> ExtractionResult {
    let mime = attachment.declared_mime_type.trim();
    let ext = detect::extension(&attachment.filename);
    ExtractionResult::unsupported(format!(
        "unsupported file type (MIME type: {}, extension: {})",
        if mime.is_empty() { "none" } else { mime },
        ext.as_deref().unwrap_or("none"),
    ))
}
