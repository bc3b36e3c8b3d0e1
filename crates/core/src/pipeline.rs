use crate::cleaner::{clean_paragraphs, flatten};
use crate::config::PipelineOptions;
use crate::engines::default_engines;
use crate::error::Result;
use crate::extractor::Extractor;
use crate::models::ProcessedDocument;
use crate::segmenter::Segmenter;
use crate::traits::ExtractionEngine;
use crate::validator::validate;
use tracing::{debug, info};

/// Turns raw upload bytes into ordered, page-tagged reading segments.
///
/// A pipeline holds no per-document state, so one instance can be shared
/// behind an `Arc` and used from several threads at once.
pub struct ReadingPipeline {
    options: PipelineOptions,
    extractor: Extractor,
    segmenter: Segmenter,
}

impl ReadingPipeline {
    pub fn new(options: PipelineOptions) -> Result<Self> {
        Self::with_engines(options, default_engines())
    }

    pub fn with_engines(
        options: PipelineOptions,
        engines: Vec<Box<dyn ExtractionEngine>>,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            extractor: Extractor::with_engines(engines, options.extraction),
            segmenter: Segmenter::new(options.segmenting),
            options,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn engine_names(&self) -> Vec<&'static str> {
        self.extractor.engine_names()
    }

    pub fn process(&self, bytes: &[u8]) -> Result<ProcessedDocument> {
        validate(bytes, &self.options.validation)?;
        debug!(bytes = bytes.len(), "upload passed validation");

        let extraction = self.extractor.extract(bytes)?;
        let page_aware = extraction.is_page_aware();
        let page_count = extraction.page_count;

        let paragraphs = clean_paragraphs(&extraction.full_text);
        let estimate_pages = (page_aware && page_count > 0).then_some(page_count);
        let segments = self.segmenter.segment(&paragraphs, estimate_pages);
        let cleaned_text = flatten(&paragraphs);

        info!(
            page_count,
            page_aware,
            words = cleaned_text.split_whitespace().count(),
            segments = segments.len(),
            "document segmented"
        );

        Ok(ProcessedDocument {
            cleaned_text,
            page_count,
            page_aware,
            segments,
        })
    }
}

impl std::fmt::Debug for ReadingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingPipeline")
            .field("options", &self.options)
            .field("engines", &self.engine_names())
            .finish()
    }
}
