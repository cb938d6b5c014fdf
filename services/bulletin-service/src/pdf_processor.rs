//! PDF Processor
//!
//! Turns the downloaded bulletin into plain text.

use cote_models::{ExtractedText, RawDocument};
use cote_utils::ExtractionError;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Converts a fetched document into text. Runs on a blocking thread.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document: &RawDocument) -> Result<ExtractedText, ExtractionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Some servers send `application/octet-stream`, so the magic bytes decide.
    fn looks_like_pdf(bytes: &[u8]) -> bool {
        let start = bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(bytes.len());
        bytes[start..].starts_with(PDF_MAGIC)
    }
}

impl TextExtractor for PdfProcessor {
    fn extract(&self, document: &RawDocument) -> Result<ExtractedText, ExtractionError> {
        if document.is_empty() {
            return Err(ExtractionError::Empty);
        }
        if !Self::looks_like_pdf(&document.bytes) {
            return Err(ExtractionError::NotPdf {
                content_type: document.content_type.clone(),
            });
        }

        let text = pdf_extract::extract_text_from_mem(&document.bytes).map_err(|e| {
            ExtractionError::Decode {
                message: e.to_string(),
            }
        })?;

        let extracted = ExtractedText::from_text(text);
        if extracted.is_blank() {
            return Err(ExtractionError::NoText);
        }

        debug!(
            pages = extracted.page_count(),
            chars = extracted.text.len(),
            "Extracted bulletin text"
        );
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn document(bytes: &[u8], content_type: Option<&str>) -> RawDocument {
        RawDocument::new(bytes.to_vec(), "https://example.test/bhcote.pdf", Utc::now())
            .with_content_type(content_type.map(str::to_string))
    }

    #[test]
    fn test_empty_document() {
        let err = PdfProcessor::new().extract(&document(b"", None)).unwrap_err();
        assert!(matches!(err, ExtractionError::Empty));
    }

    #[test]
    fn test_html_error_page_is_not_pdf() {
        let doc = document(b"<html><body>Maintenance</body></html>", Some("text/html"));
        let err = PdfProcessor::new().extract(&doc).unwrap_err();
        match err {
            ExtractionError::NotPdf { content_type } => {
                assert_eq!(content_type.as_deref(), Some("text/html"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_magic_detection() {
        assert!(PdfProcessor::looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(PdfProcessor::looks_like_pdf(b"\r\n%PDF-1.4"));
        assert!(!PdfProcessor::looks_like_pdf(b"PDF-1.4"));
        assert!(!PdfProcessor::looks_like_pdf(b"   "));
    }
}
