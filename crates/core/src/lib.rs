pub mod cleaner;
pub mod config;
pub mod engines;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod segmenter;
pub mod traits;
pub mod validator;

pub use cleaner::{clean, clean_paragraphs, flatten};
pub use config::PipelineOptions;
pub use engines::{default_engines, LopdfEngine, PdfExtractEngine};
pub use error::{EngineError, PipelineError};
pub use extractor::{classify_failure, ExtractionThresholds, Extractor};
pub use ingest::{
    digest_bytes, discover_pdf_files, process_file, BatchReport, ProcessedFile, SkippedPdf,
};
pub use models::{ExtractionResult, ProcessedDocument, Segment, Unit};
pub use pipeline::ReadingPipeline;
pub use segmenter::{Segmenter, SegmentingConfig};
pub use traits::ExtractionEngine;
pub use validator::{validate, ValidationLimits};
