use serde::{Deserialize, Serialize};

/// Separator placed between pages when building `full_text`.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Name given to the single unit a document's segments are grouped under.
pub const DEFAULT_UNIT_NAME: &str = "Unit 1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub full_text: String,
    pub page_count: u32,
    /// Present only when the engine that produced the text is page-aware.
    pub text_by_page: Option<Vec<String>>,
}

impl ExtractionResult {
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self {
            full_text: pages.join(PAGE_SEPARATOR),
            page_count: u32::try_from(pages.len()).unwrap_or(u32::MAX),
            text_by_page: Some(pages),
        }
    }

    pub fn from_text(full_text: String, page_count: u32) -> Self {
        Self {
            full_text,
            page_count,
            text_by_page: None,
        }
    }

    pub fn is_page_aware(&self) -> bool {
        self.text_by_page.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub content: String,
    /// Dense, 1-based position within the document.
    pub order: u32,
    pub page_number: Option<u32>,
    pub external_id: String,
}

impl Segment {
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub order: u32,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub cleaned_text: String,
    pub page_count: u32,
    pub page_aware: bool,
    pub segments: Vec<Segment>,
}

impl ProcessedDocument {
    pub fn word_count(&self) -> usize {
        self.cleaned_text.split_whitespace().count()
    }

    pub fn into_unit(self) -> Unit {
        Unit {
            name: DEFAULT_UNIT_NAME.to_string(),
            order: 1,
            segments: self.segments,
        }
    }
}
