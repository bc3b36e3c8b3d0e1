use crate::error::EngineError;
use crate::models::ExtractionResult;

/// A strategy for turning raw document bytes into text.
///
/// Engines report [`EngineError::Unavailable`] when they cannot run at all in
/// this build, which tells the extractor to try the next candidate. Any other
/// failure ends extraction.
pub trait ExtractionEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_extract(&self, bytes: &[u8]) -> Result<ExtractionResult, EngineError>;
}

impl<E: ExtractionEngine + ?Sized> ExtractionEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn try_extract(&self, bytes: &[u8]) -> Result<ExtractionResult, EngineError> {
        (**self).try_extract(bytes)
    }
}
