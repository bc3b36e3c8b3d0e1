use crate::engines::default_engines;
use crate::error::{EngineError, PipelineError, Result};
use crate::models::ExtractionResult;
use crate::traits::ExtractionEngine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fewest non-whitespace characters a readable document must yield.
pub const MIN_TEXT_CHARS: usize = 50;
/// Below this many characters a decoded document is treated as image-only.
pub const SCANNED_TEXT_CHARS: usize = 10;

/// Engine message fragments that mean the file needs a password.
const PASSWORD_MARKERS: &[&str] = &["password", "encrypt", "decrypt"];

/// Engine message fragments that mean the file structure is damaged.
const CORRUPTION_MARKERS: &[&str] = &[
    "corrupt",
    "damaged",
    "malformed",
    "xref",
    "trailer",
    "invalid file header",
    "header not found",
    "unexpected end",
    "end of file",
    "eof",
    "invalid object",
    "invalid stream",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionThresholds {
    pub min_text_chars: usize,
    pub scanned_text_chars: usize,
}

impl Default for ExtractionThresholds {
    fn default() -> Self {
        Self {
            min_text_chars: MIN_TEXT_CHARS,
            scanned_text_chars: SCANNED_TEXT_CHARS,
        }
    }
}

/// Tries engines in priority order.
///
/// The next engine runs when the current one is unavailable or fails for an
/// unclassified reason. Password and corruption failures stop the walk. When
/// every engine fails, the first failure is reported.
pub struct Extractor {
    engines: Vec<Box<dyn ExtractionEngine>>,
    thresholds: ExtractionThresholds,
}

impl Extractor {
    pub fn new(thresholds: ExtractionThresholds) -> Self {
        Self::with_engines(default_engines(), thresholds)
    }

    pub fn with_engines(
        engines: Vec<Box<dyn ExtractionEngine>>,
        thresholds: ExtractionThresholds,
    ) -> Self {
        Self {
            engines,
            thresholds,
        }
    }

    pub fn engine_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|engine| engine.name()).collect()
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        let mut first_failure: Option<PipelineError> = None;

        for (position, engine) in self.engines.iter().enumerate() {
            match engine.try_extract(bytes) {
                Ok(result) => {
                    if position > 0 {
                        warn!(engine = engine.name(), "extracted with fallback engine");
                    }
                    info!(
                        engine = engine.name(),
                        page_count = result.page_count,
                        page_aware = result.is_page_aware(),
                        "text extracted"
                    );
                    return check_content(result, &self.thresholds);
                }
                Err(EngineError::Unavailable(reason)) => {
                    debug!(engine = engine.name(), %reason, "engine unavailable, trying next");
                }
                Err(EngineError::Failed(message)) => {
                    let error = classify_failure(&message);
                    if !is_recoverable(&error) {
                        debug!(engine = engine.name(), %message, "engine failed");
                        return Err(first_failure.unwrap_or(error));
                    }
                    warn!(engine = engine.name(), %message, "engine failed, trying next");
                    first_failure.get_or_insert(error);
                }
            }
        }

        Err(first_failure.unwrap_or(PipelineError::NoEnginesAvailable))
    }
}

/// Maps an engine failure message onto the document error taxonomy.
pub fn classify_failure(message: &str) -> PipelineError {
    let lowered = message.to_lowercase();
    if PASSWORD_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        PipelineError::PasswordProtected
    } else if CORRUPTION_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        PipelineError::Corrupted
    } else {
        PipelineError::unreadable(message)
    }
}

/// Failures another engine may still get past.
fn is_recoverable(error: &PipelineError) -> bool {
    matches!(error, PipelineError::Unreadable(_))
}

/// Rejects results that decoded but carry too little text to read.
pub fn check_content(
    result: ExtractionResult,
    thresholds: &ExtractionThresholds,
) -> Result<ExtractionResult> {
    let chars = non_whitespace_char_count(&result.full_text);
    if chars >= thresholds.min_text_chars {
        return Ok(result);
    }

    if chars < thresholds.scanned_text_chars {
        Err(PipelineError::ScannedNoText)
    } else {
        Err(PipelineError::NoExtractableText)
    }
}

fn non_whitespace_char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeEngine {
        name: &'static str,
        outcome: std::result::Result<ExtractionResult, EngineError>,
        calls: Arc<AtomicUsize>,
    }

    impl ExtractionEngine for FakeEngine {
        fn name(&self) -> &'static str {
            self.name
        }

        fn try_extract(&self, _bytes: &[u8]) -> std::result::Result<ExtractionResult, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn fake(
        name: &'static str,
        outcome: std::result::Result<ExtractionResult, EngineError>,
    ) -> (Box<dyn ExtractionEngine>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = FakeEngine {
            name,
            outcome,
            calls: Arc::clone(&calls),
        };
        (Box::new(engine), calls)
    }

    fn prose() -> String {
        "The committee met at dawn to discuss the harvest and the river.".to_string()
    }

    #[test]
    fn failure_messages_are_classified() {
        let cases = [
            ("file is encrypted", "password_protected"),
            ("Decryption error: wrong Password", "password_protected"),
            ("invalid cross-reference table (xref)", "corrupted"),
            ("Invalid file trailer", "corrupted"),
            ("unexpected end of stream", "corrupted"),
            ("unsupported font encoding", "unreadable"),
        ];

        for (message, code) in cases {
            assert_eq!(classify_failure(message).code(), code, "message: {message}");
        }
    }

    #[test]
    fn generic_failures_carry_a_bounded_diagnostic() {
        let message = "unsupported filter ".repeat(40);
        match classify_failure(&message) {
            PipelineError::Unreadable(diagnostic) => {
                assert!(diagnostic.chars().count() <= crate::error::MAX_DIAGNOSTIC_CHARS + 3)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_text_is_scanned_or_empty() {
        let thresholds = ExtractionThresholds::default();

        let empty = ExtractionResult::from_pages(vec![String::new(), "  ".to_string()]);
        assert!(matches!(
            check_content(empty, &thresholds),
            Err(PipelineError::ScannedNoText)
        ));

        let tiny = ExtractionResult::from_text("Fig. 1".to_string(), 1);
        assert!(matches!(
            check_content(tiny, &thresholds),
            Err(PipelineError::ScannedNoText)
        ));

        let short = ExtractionResult::from_text("A caption with a few words".to_string(), 1);
        assert!(matches!(
            check_content(short, &thresholds),
            Err(PipelineError::NoExtractableText)
        ));

        let readable = ExtractionResult::from_text(prose(), 1);
        assert!(check_content(readable, &thresholds).is_ok());
    }

    #[test]
    fn primary_success_skips_fallback() {
        let (primary, primary_calls) = fake("primary", Ok(ExtractionResult::from_pages(vec![prose()])));
        let (fallback, fallback_calls) = fake("fallback", Ok(ExtractionResult::from_text(prose(), 0)));
        let extractor =
            Extractor::with_engines(vec![primary, fallback], ExtractionThresholds::default());

        let result = extractor.extract(b"%PDF").expect("primary should succeed");

        assert!(result.is_page_aware());
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unavailable_primary_falls_back() {
        let (primary, _) = fake("primary", Err(EngineError::Unavailable("missing".to_string())));
        let (fallback, fallback_calls) = fake("fallback", Ok(ExtractionResult::from_text(prose(), 0)));
        let extractor =
            Extractor::with_engines(vec![primary, fallback], ExtractionThresholds::default());

        let result = extractor.extract(b"%PDF").expect("fallback should succeed");

        assert!(!result.is_page_aware());
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn password_and_corruption_failures_skip_fallback() {
        for (message, code) in [
            ("file is encrypted", "password_protected"),
            ("broken xref table", "corrupted"),
        ] {
            let (primary, _) = fake("primary", Err(EngineError::Failed(message.to_string())));
            let (fallback, fallback_calls) =
                fake("fallback", Ok(ExtractionResult::from_text(prose(), 0)));
            let extractor =
                Extractor::with_engines(vec![primary, fallback], ExtractionThresholds::default());

            let error = extractor.extract(b"%PDF").expect_err("primary failure is final");

            assert_eq!(error.code(), code);
            assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn unclassified_primary_failure_falls_back() {
        let (primary, primary_calls) =
            fake("primary", Err(EngineError::Failed("unsupported filter".to_string())));
        let (fallback, fallback_calls) = fake("fallback", Ok(ExtractionResult::from_text(prose(), 0)));
        let extractor =
            Extractor::with_engines(vec![primary, fallback], ExtractionThresholds::default());

        let result = extractor.extract(b"%PDF").expect("fallback should succeed");

        assert!(!result.is_page_aware());
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn all_engines_failing_reports_the_primary_failure() {
        let (primary, _) = fake("primary", Err(EngineError::Failed("unsupported filter".to_string())));
        let (fallback, fallback_calls) =
            fake("fallback", Err(EngineError::Failed("missing glyph table".to_string())));
        let extractor =
            Extractor::with_engines(vec![primary, fallback], ExtractionThresholds::default());

        match extractor.extract(b"%PDF") {
            Err(PipelineError::Unreadable(diagnostic)) => {
                assert_eq!(diagnostic, "unsupported filter")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);

        let (primary, _) = fake("primary", Err(EngineError::Failed("unsupported filter".to_string())));
        let (fallback, _) = fake("fallback", Err(EngineError::Failed("bad trailer".to_string())));
        let extractor =
            Extractor::with_engines(vec![primary, fallback], ExtractionThresholds::default());
        assert!(matches!(
            extractor.extract(b"%PDF"),
            Err(PipelineError::Unreadable(_))
        ));
    }

    #[test]
    fn fallback_failures_use_the_same_classification() {
        let (primary, _) = fake("primary", Err(EngineError::Unavailable("missing".to_string())));
        let (fallback, _) = fake("fallback", Err(EngineError::Failed("broken xref".to_string())));
        let extractor =
            Extractor::with_engines(vec![primary, fallback], ExtractionThresholds::default());

        assert!(matches!(extractor.extract(b"%PDF"), Err(PipelineError::Corrupted)));
    }

    #[test]
    fn no_available_engine_is_an_environment_error() {
        let (primary, _) = fake("primary", Err(EngineError::Unavailable("missing".to_string())));
        let (fallback, _) = fake("fallback", Err(EngineError::Unavailable("missing".to_string())));
        let extractor =
            Extractor::with_engines(vec![primary, fallback], ExtractionThresholds::default());

        assert!(matches!(
            extractor.extract(b"%PDF"),
            Err(PipelineError::NoEnginesAvailable)
        ));

        let empty = Extractor::with_engines(Vec::new(), ExtractionThresholds::default());
        assert!(matches!(empty.extract(b"%PDF"), Err(PipelineError::NoEnginesAvailable)));
    }
}
