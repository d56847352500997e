//! Extractor dispatch: declared MIME type first, then filename extension

use std::path::Path;

use super::types::AttachmentKind;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

/// Pick the extractor for an attachment. First match wins.
pub fn detect(declared_mime_type: &str, filename: &str) -> Option<AttachmentKind> {
    let mime = normalize_mime(declared_mime_type);
    kind_from_mime(&mime).or_else(|| extension(filename).and_then(|ext| kind_from_extension(&ext)))
}

/// Lowercase essence of a MIME type, parameters stripped
fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn kind_from_mime(mime: &str) -> Option<AttachmentKind> {
    match mime {
        "application/pdf" => Some(AttachmentKind::Pdf),
        "application/msword" => Some(AttachmentKind::Doc),
        DOCX_MIME => Some(AttachmentKind::Docx),
        "text/csv" => Some(AttachmentKind::Csv),
        XLSX_MIME | XLS_MIME => Some(AttachmentKind::Spreadsheet),
        m if m.starts_with("image/") => Some(AttachmentKind::Image),
        _ => None,
    }
}

fn kind_from_extension(ext: &str) -> Option<AttachmentKind> {
    match ext {
        "pdf" => Some(AttachmentKind::Pdf),
        "doc" => Some(AttachmentKind::Doc),
        "docx" => Some(AttachmentKind::Docx),
        "wps" => Some(AttachmentKind::Wps),
        "csv" => Some(AttachmentKind::Csv),
        "xlsx" | "xls" => Some(AttachmentKind::Spreadsheet),
        e if IMAGE_EXTENSIONS.contains(&e) => Some(AttachmentKind::Image),
        _ => None,
    }
}

/// Lowercased extension of a trimmed filename, if it has one
pub fn extension(filename: &str) -> Option<String> {
    Path::new(filename.trim())
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_match() {
        assert_eq!(detect("application/pdf", "x.bin"), Some(AttachmentKind::Pdf));
        assert_eq!(detect("application/msword", ""), Some(AttachmentKind::Doc));
        assert_eq!(detect(DOCX_MIME, "noext"), Some(AttachmentKind::Docx));
        assert_eq!(detect("text/csv; charset=utf-8", "x"), Some(AttachmentKind::Csv));
        assert_eq!(detect(XLS_MIME, "x"), Some(AttachmentKind::Spreadsheet));
        assert_eq!(detect("image/png", "scan"), Some(AttachmentKind::Image));
    }

    #[test]
    fn test_mime_takes_precedence_over_extension() {
        assert_eq!(detect("application/pdf", "report.docx"), Some(AttachmentKind::Pdf));
        assert_eq!(detect("image/jpeg", "photo.csv"), Some(AttachmentKind::Image));
    }

    #[test]
    fn test_extension_fallback_is_case_insensitive_and_trimmed() {
        assert_eq!(detect("", "  REPORT.PDF "), Some(AttachmentKind::Pdf));
        assert_eq!(detect("", "old.Doc"), Some(AttachmentKind::Doc));
        assert_eq!(detect("application/octet-stream", "a.docx"), Some(AttachmentKind::Docx));
        assert_eq!(detect("", "sheet.XLSX"), Some(AttachmentKind::Spreadsheet));
        assert_eq!(detect("", "legacy.xls"), Some(AttachmentKind::Spreadsheet));
        assert_eq!(detect("", "data.csv"), Some(AttachmentKind::Csv));
        assert_eq!(detect("", "scan.JPEG"), Some(AttachmentKind::Image));
    }

    #[test]
    fn test_wps_is_extension_only() {
        assert_eq!(detect("application/kswps", "memo.wps"), Some(AttachmentKind::Wps));
        assert_eq!(detect("", "memo.WPS"), Some(AttachmentKind::Wps));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(detect("application/zip", "archive.zip"), None);
        assert_eq!(detect("", "README"), None);
        assert_eq!(detect("", ""), None);
    }

    #[test]
    fn test_extension_helper() {
        assert_eq!(extension("a.tar.GZ"), Some("gz".to_string()));
        assert_eq!(extension("noext"), None);
    }
}
