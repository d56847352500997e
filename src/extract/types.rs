//! Core types for attachment extraction

/// A decoded client attachment. Filename and MIME type are untrusted hints.
#[derive(Debug, Clone, Default)]
pub struct Attachment {
    pub filename: String,
    pub declared_mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        declared_mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            declared_mime_type: declared_mime_type.into(),
            data: data.into(),
        }
    }
}

/// Attachment kinds with a dedicated extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Pdf,
    /// Legacy binary Word (.doc), converted by an external tool
    Doc,
    /// OOXML Word (.docx)
    Docx,
    /// Legacy WPS, converted by a headless office suite
    Wps,
    Csv,
    /// xls / xlsx workbooks
    Spreadsheet,
    /// Any image, read through OCR
    Image,
}

impl AttachmentKind {
    /// Short label used in file delimiters and error messages
    pub fn label(&self) -> &'static str {
        match self {
            AttachmentKind::Pdf => "PDF",
            AttachmentKind::Doc => "DOC (antiword)",
            AttachmentKind::Docx => "DOCX",
            AttachmentKind::Wps => "WPS (LibreOffice)",
            AttachmentKind::Csv => "CSV",
            AttachmentKind::Spreadsheet => "Excel",
            AttachmentKind::Image => "Image (OCR)",
        }
    }
}

/// Why an extractor produced no text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// The extractor ran and failed (corrupt input, converter error, timeout)
    ExtractionFailed,
    /// A required external converter binary is absent
    ToolMissing,
    /// No extractor matches the declared MIME type or extension
    Unsupported,
}

/// Outcome of extracting one attachment
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Text(String),
    Error {
        kind: ExtractionErrorKind,
        message: String,
    },
}

impl ExtractionResult {
    pub fn failed(message: impl Into<String>) -> Self {
        ExtractionResult::Error {
            kind: ExtractionErrorKind::ExtractionFailed,
            message: message.into(),
        }
    }

    pub fn tool_missing(message: impl Into<String>) -> Self {
        ExtractionResult::Error {
            kind: ExtractionErrorKind::ToolMissing,
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        ExtractionResult::Error {
            kind: ExtractionErrorKind::Unsupported,
            message: message.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ExtractionResult::Text(_))
    }

    pub fn error_kind(&self) -> Option<ExtractionErrorKind> {
        match self {
            ExtractionResult::Text(_) => None,
            ExtractionResult::Error { kind, .. } => Some(*kind),
        }
    }
}

impl From<Result<String, String>> for ExtractionResult {
    fn from(result: Result<String, String>) -> Self {
        match result {
            Ok(text) => ExtractionResult::Text(text),
            Err(message) => ExtractionResult::failed(message),
        }
    }
}
