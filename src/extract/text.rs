//! CSV attachments: UTF-8 text, passed through verbatim

use super::types::ExtractionResult;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn extract_csv(data: &[u8]) -> ExtractionResult {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(text) => ExtractionResult::Text(text.to_string()),
        Err(e) => ExtractionResult::failed(format!(
            "file is not valid UTF-8 text (invalid byte at offset {})",
            e.valid_up_to()
        )),
    }
}
