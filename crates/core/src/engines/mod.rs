pub mod lopdf;
pub mod pdf_extract;

pub use self::lopdf::LopdfEngine;
pub use self::pdf_extract::PdfExtractEngine;

use crate::error::EngineError;
use crate::traits::ExtractionEngine;

/// Engines in the order the extractor tries them.
pub fn default_engines() -> Vec<Box<dyn ExtractionEngine>> {
    vec![Box::new(LopdfEngine), Box::new(PdfExtractEngine)]
}

/// Runs a third-party parser, turning a panic into an engine failure.
#[cfg(any(feature = "lopdf-engine", feature = "pdf-extract-engine"))]
pub(crate) fn guard_panics<T>(
    engine: &str,
    run: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(run)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|message| (*message).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(EngineError::Failed(format!("{engine} panicked: {detail}")))
        }
    }
}

#[cfg(any(not(feature = "lopdf-engine"), not(feature = "pdf-extract-engine")))]
pub(crate) fn unavailable(feature: &str) -> EngineError {
    EngineError::Unavailable(format!("built without the `{feature}` feature"))
}
