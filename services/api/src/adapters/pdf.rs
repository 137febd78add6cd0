//! services/api/src/adapters/pdf.rs
//!
//! PDF text extraction adapter backed by `lopdf`. Implements the
//! `TextExtractionService` port from the `core` crate.

use async_trait::async_trait;
use medreport_core::ports::{PortError, PortResult, TextExtractionService};
use tracing::{debug, warn};

/// Extracts plain text from in-memory PDF uploads.
#[derive(Clone, Default)]
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractionService for LopdfExtractor {
    async fn extract_text(&self, data: &[u8]) -> PortResult<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| PortError::Unexpected(format!("Failed to load PDF: {}", e)))?;

        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        debug!(page_count = pages.len(), "Extracting text from PDF");

        let mut text = String::new();
        for page_num in pages {
            match doc.extract_text(&[page_num]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => {
                    warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
                }
            }
        }

        if text.trim().is_empty() {
            return Err(PortError::Unexpected(
                "No text content extracted from PDF".to_string(),
            ));
        }

        Ok(clean_text(&text))
    }
}

/// Collapse the whitespace runs left behind by PDF layout operators.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
