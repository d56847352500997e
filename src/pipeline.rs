//! Attachment Pipeline
//!
//! Runs every attachment of one request through the extractor set, one at a
//! time and in client order, and folds the results into a single block of
//! prompt text. Any failing attachment fails the whole batch.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, warn};

use crate::extract::{detect, Attachment, ExtractionResult, ExtractorSet};
use crate::models::AttachmentPayload;

/// Result of processing one batch of attachments
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Combined, delimited text of every attachment (empty when there was none)
    Ok(String),
    /// One user-facing message per failing attachment, in batch order
    Fatal(Vec<String>),
}

/// Wraps extracted text in the start/end markers the prompt uses
pub fn file_block(filename: &str, label: &str, text: &str) -> String {
    format!(
        "--- Content from file: {} ({}) ---\n{}\n--- End of file: {} ---\n\n",
        filename, label, text, filename
    )
}

#[derive(Clone)]
pub struct AttachmentPipeline {
    extractors: ExtractorSet,
}

impl AttachmentPipeline {
    pub fn new(extractors: ExtractorSet) -> Self {
        Self { extractors }
    }

    /// Decode wire payloads and process them.
    ///
    /// Payloads without a filename or data, or with data that is not valid
    /// base64, become fatal entries; the rest of the batch is still examined
    /// so the client sees every problem at once.
    pub async fn process_payloads(&self, payloads: &[AttachmentPayload]) -> PipelineOutcome {
        let mut entries = Vec::with_capacity(payloads.len());
        for (index, payload) in payloads.iter().enumerate() {
            entries.push(decode_payload(index, payload));
        }
        self.run(entries).await
    }

    /// Process already-decoded attachments
    pub async fn process(&self, attachments: Vec<Attachment>) -> PipelineOutcome {
        self.run(attachments.into_iter().map(Ok).collect()).await
    }

    async fn run(&self, entries: Vec<Result<Attachment, String>>) -> PipelineOutcome {
        let mut combined = String::new();
        let mut errors = Vec::new();

        // Sequential on purpose: each step may spawn a converter or OCR process
        for entry in entries {
            let attachment = match entry {
                Ok(attachment) => attachment,
                Err(message) => {
                    warn!(error = %message, "rejected malformed attachment");
                    errors.push(message);
                    continue;
                }
            };

            if attachment.filename.trim().is_empty() {
                errors.push("Attachment without a filename was rejected".to_string());
                continue;
            }
            if attachment.data.is_empty() {
                errors.push(format!(
                    "{}: the file is empty or missing its data",
                    attachment.filename
                ));
                continue;
            }

            let kind = detect(&attachment.declared_mime_type, &attachment.filename);
            let result = match kind {
                Some(kind) => self.extractors.extract_as(kind, &attachment).await,
                None => self.extractors.extract(&attachment).await,
            };

            let label = kind.map(|k| k.label()).unwrap_or("unknown type");
            match result {
                ExtractionResult::Text(text) => {
                    let text = text.trim();
                    info!(
                        filename = %attachment.filename,
                        kind = label,
                        bytes = attachment.data.len(),
                        chars = text.chars().count(),
                        "attachment extracted"
                    );
                    if !text.is_empty() {
                        combined.push_str(&file_block(&attachment.filename, label, text));
                    }
                }
                ExtractionResult::Error {
                    kind: error_kind,
                    message,
                } => {
                    warn!(
                        filename = %attachment.filename,
                        bytes = attachment.data.len(),
                        error_kind = ?error_kind,
                        error = %message,
                        "attachment extraction failed"
                    );
                    errors.push(match kind {
                        Some(_) => format!("{} ({}): {}", attachment.filename, label, message),
                        None => format!("{}: {}", attachment.filename, message),
                    });
                }
            }
        }

        if errors.is_empty() {
            PipelineOutcome::Ok(combined)
        } else {
            PipelineOutcome::Fatal(errors)
        }
    }
}

fn decode_payload(index: usize, payload: &AttachmentPayload) -> Result<Attachment, String> {
    let filename = payload
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| format!("Attachment #{} was rejected: missing filename", index + 1))?;

    let data = payload
        .data
        .as_deref()
        .filter(|data| !data.trim().is_empty())
        .ok_or_else(|| format!("{}: the file is empty or missing its data", filename))?;

    let bytes = STANDARD
        .decode(strip_data_url(data))
        .map_err(|e| format!("{}: attachment data is not valid base64 ({})", filename, e))?;

    Ok(Attachment::new(
        filename,
        payload.mime_type.clone().unwrap_or_default(),
        bytes,
    ))
}

/// Accept both bare base64 and `data:<mime>;base64,<payload>` URLs
fn strip_data_url(data: &str) -> String {
    let data = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    data.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ocr::tests::StubOcrEngine;
    use crate::extract::tests::{extractors_with, fake_extractors};
    use crate::extract::ConversionError;

    fn pipeline() -> AttachmentPipeline {
        AttachmentPipeline::new(fake_extractors())
    }

    fn csv(name: &str, body: &str) -> Attachment {
        Attachment::new(name, "text/csv", body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_empty_batch_is_ok_and_empty() {
        assert_eq!(pipeline().process(vec![]).await, PipelineOutcome::Ok(String::new()));
        assert_eq!(
            pipeline().process_payloads(&[]).await,
            PipelineOutcome::Ok(String::new())
        );
    }

    #[tokio::test]
    async fn test_single_csv_is_wrapped() {
        let outcome = pipeline().process(vec![csv("data.csv", "a,b\n1,2")]).await;
        assert_eq!(
            outcome,
            PipelineOutcome::Ok(
                "--- Content from file: data.csv (CSV) ---\na,b\n1,2\n--- End of file: data.csv ---\n\n"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_blocks_keep_client_order() {
        let outcome = pipeline()
            .process(vec![
                csv("a.csv", "first"),
                csv("b.csv", "second"),
                csv("c.csv", "third"),
            ])
            .await;
        let PipelineOutcome::Ok(text) = outcome else {
            panic!("Expected Ok, got {:?}", outcome);
        };

        let a = text.find("file: a.csv").unwrap();
        let b = text.find("file: b.csv").unwrap();
        let c = text.find("file: c.csv").unwrap();
        assert!(a < b && b < c);
    }

    #[tokio::test]
    async fn test_whitespace_only_text_is_skipped() {
        let outcome = pipeline().process(vec![csv("blank.csv", " \n\t ")]).await;
        assert_eq!(outcome, PipelineOutcome::Ok(String::new()));
    }

    #[tokio::test]
    async fn test_one_failure_discards_the_batch() {
        let extractors = extractors_with(
            || {
                Err(ConversionError::Failed {
                    tool: "antiword".to_string(),
                    code: "1".to_string(),
                    stderr: "not a Word document".to_string(),
                })
            },
            StubOcrEngine::text("ok", 90.0),
        );
        let outcome = AttachmentPipeline::new(extractors)
            .process(vec![
                csv("good.csv", "secret context"),
                Attachment::new("bad.doc", "application/msword", b"garbage".to_vec()),
                Attachment::new("blob.bin", "application/octet-stream", b"??".to_vec()),
            ])
            .await;

        match outcome {
            PipelineOutcome::Fatal(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].starts_with("bad.doc (DOC (antiword)):"));
                assert!(errors[0].contains("not a Word document"));
                assert!(errors[1].starts_with("blob.bin:"));
                assert!(errors.iter().all(|e| !e.contains("secret context")));
            }
            other => panic!("Expected Fatal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tool_missing_names_the_tool() {
        let extractors = extractors_with(
            || {
                Err(ConversionError::ToolMissing {
                    tool: "antiword".to_string(),
                })
            },
            StubOcrEngine::text("ok", 90.0),
        );
        let outcome = AttachmentPipeline::new(extractors)
            .process(vec![Attachment::new("old.doc", "", b"x".to_vec())])
            .await;
        match outcome {
            PipelineOutcome::Fatal(errors) => assert!(errors[0].contains("antiword")),
            other => panic!("Expected Fatal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_payloads_are_fatal() {
        let payloads = vec![
            AttachmentPayload {
                filename: None,
                mime_type: Some("text/csv".into()),
                data: Some("YSxi".into()),
            },
            AttachmentPayload {
                filename: Some("nodata.csv".into()),
                mime_type: Some("text/csv".into()),
                data: None,
            },
            AttachmentPayload {
                filename: Some("bad64.csv".into()),
                mime_type: Some("text/csv".into()),
                data: Some("!!not base64!!".into()),
            },
        ];
        match pipeline().process_payloads(&payloads).await {
            PipelineOutcome::Fatal(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors[0].contains("#1"));
                assert!(errors[1].starts_with("nodata.csv:"));
                assert!(errors[2].contains("base64"));
            }
            other => panic!("Expected Fatal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_payload_accepts_data_url() {
        let payload = AttachmentPayload {
            filename: Some("x.csv".into()),
            mime_type: Some("text/csv".into()),
            data: Some("data:text/csv;base64,YSxi\n".into()),
        };
        match pipeline().process_payloads(&[payload]).await {
            PipelineOutcome::Ok(text) => assert!(text.contains("\na,b\n")),
            other => panic!("Expected Ok, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ocr_text_goes_through_image_label() {
        let outcome = pipeline()
            .process(vec![Attachment::new("scan.png", "image/png", b"\x89PNG".to_vec())])
            .await;
        match outcome {
            PipelineOutcome::Ok(text) => assert!(
                text.starts_with("--- Content from file: scan.png (Image (OCR)) ---\nscanned text\n")
            ),
            other => panic!("Expected Ok, got {:?}", other),
        }
    }
}
