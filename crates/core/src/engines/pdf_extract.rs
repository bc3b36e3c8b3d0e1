//! Fallback engine backed by `pdf-extract`. Returns the whole text only.

use crate::error::EngineError;
use crate::models::ExtractionResult;
use crate::traits::ExtractionEngine;

#[cfg(any(feature = "pdf-extract-engine", test))]
const FORM_FEED: char = '\u{000C}';

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractEngine;

impl ExtractionEngine for PdfExtractEngine {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    #[cfg(feature = "pdf-extract-engine")]
    fn try_extract(&self, bytes: &[u8]) -> Result<ExtractionResult, EngineError> {
        let text = super::guard_panics(self.name(), || {
            ::pdf_extract::extract_text_from_mem(bytes)
                .map_err(|error| EngineError::Failed(error.to_string()))
        })?;

        let page_count = count_form_feed_pages(&text);
        Ok(ExtractionResult::from_text(text, page_count))
    }

    #[cfg(not(feature = "pdf-extract-engine"))]
    fn try_extract(&self, _bytes: &[u8]) -> Result<ExtractionResult, EngineError> {
        Err(super::unavailable("pdf-extract-engine"))
    }
}

/// Page total when the engine separated pages with form feeds, else 0 (unknown).
#[cfg(any(feature = "pdf-extract-engine", test))]
fn count_form_feed_pages(text: &str) -> u32 {
    if !text.contains(FORM_FEED) {
        return 0;
    }

    let pages = text
        .split(FORM_FEED)
        .filter(|chunk| !chunk.trim().is_empty())
        .count();
    u32::try_from(pages).unwrap_or(u32::MAX)
}
