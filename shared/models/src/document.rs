use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Form feed emitted by the PDF text layer between pages.
pub const PAGE_BREAK: char = '\u{c}';

/// Bulletin bytes as downloaded from upstream. Lives for one pipeline run.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub source_url: String,
    pub content_type: Option<String>,
    pub retrieved_at: DateTime<Utc>,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, source_url: impl Into<String>, retrieved_at: DateTime<Utc>) -> Self {
        Self {
            bytes,
            source_url: source_url.into(),
            content_type: None,
            retrieved_at,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Plain text pulled out of a bulletin, with page boundaries when known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub pages: Vec<String>,
}

impl ExtractedText {
    /// Splits on form feeds; text without page breaks is a single page.
    pub fn from_text(text: String) -> Self {
        let pages: Vec<String> = text
            .split(PAGE_BREAK)
            .map(str::to_string)
            .filter(|page| !page.trim().is_empty())
            .collect();

        let pages = if pages.is_empty() { vec![text.clone()] } else { pages };

        Self { text, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
