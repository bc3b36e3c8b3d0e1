//! Primary, page-aware engine backed by `lopdf`.

use crate::error::EngineError;
use crate::models::ExtractionResult;
use crate::traits::ExtractionEngine;

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfEngine;

impl ExtractionEngine for LopdfEngine {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    #[cfg(feature = "lopdf-engine")]
    fn try_extract(&self, bytes: &[u8]) -> Result<ExtractionResult, EngineError> {
        super::guard_panics(self.name(), || extract_pages(bytes)).map(ExtractionResult::from_pages)
    }

    #[cfg(not(feature = "lopdf-engine"))]
    fn try_extract(&self, _bytes: &[u8]) -> Result<ExtractionResult, EngineError> {
        Err(super::unavailable("lopdf-engine"))
    }
}

#[cfg(feature = "lopdf-engine")]
fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, EngineError> {
    let document =
        ::lopdf::Document::load_mem(bytes).map_err(|error| EngineError::Failed(error.to_string()))?;

    // lopdf opens empty-password files itself; anything still encrypted needs a real password.
    if document.is_encrypted() {
        return Err(EngineError::Failed(
            "document is encrypted and requires a password".to_string(),
        ));
    }

    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(EngineError::Failed("document page tree is empty".to_string()));
    }

    let mut texts = Vec::with_capacity(pages.len());
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(raw) => texts.push(assemble_lines(&raw)),
            Err(error) => {
                tracing::warn!(page = *page_number, %error, "page text could not be decoded");
                texts.push(String::new());
            }
        }
    }

    Ok(texts)
}

/// Collects text runs and flushes a line at every line end the engine marks.
#[cfg(any(feature = "lopdf-engine", test))]
#[derive(Debug, Default)]
struct LineAccumulator {
    lines: Vec<String>,
    current: String,
}

#[cfg(any(feature = "lopdf-engine", test))]
impl LineAccumulator {
    fn push_run(&mut self, run: &str) {
        self.current.push_str(run);
    }

    fn end_line(&mut self) {
        let line = self.current.trim_end();
        if !line.trim_start().is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.end_line();
        self.lines.join("\n")
    }
}

#[cfg(any(feature = "lopdf-engine", test))]
fn assemble_lines(raw: &str) -> String {
    let mut accumulator = LineAccumulator::default();
    let mut runs = raw.split('\n').peekable();
    while let Some(run) = runs.next() {
        accumulator.push_run(run);
        if runs.peek().is_some() {
            accumulator.end_line();
        }
    }
    accumulator.finish()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use ::lopdf::content::{Content, Operation};
    use ::lopdf::{dictionary, Document, Object, Stream};

    /// Builds a PDF whose pages hold the given lines, one text object per line.
    pub(crate) fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut operations = Vec::new();
            for (index, line) in lines.iter().enumerate() {
                let y = 750 - (index as i64) * 14;
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new("Td", vec![72.into(), y.into()]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let encoded = content.encode().expect("content encodes");
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("pdf saves to memory");
        bytes
    }
}
