//! PDF text extraction (in-process)

use super::run_blocking;
use super::types::ExtractionResult;

pub async fn extract_pdf(data: Vec<u8>) -> ExtractionResult {
    run_blocking("PDF", move || {
        pdf_extract::extract_text_from_mem(&data)
            .map_err(|e| format!("could not read PDF text: {}", e))
    })
    .await
}
