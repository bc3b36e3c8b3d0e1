use crate::error::{PipelineError, Result};
use crate::extractor::ExtractionThresholds;
use crate::segmenter::SegmentingConfig;
use crate::validator::ValidationLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every tunable the pipeline reads, grouped by stage.
///
/// Each group is `#[serde(default)]`, so a JSON file only needs the keys it
/// overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub validation: ValidationLimits,
    pub extraction: ExtractionThresholds,
    pub segmenting: SegmentingConfig,
}

impl PipelineOptions {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&raw)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.validation.min_bytes > self.validation.max_bytes {
            return Err(PipelineError::InvalidConfig(format!(
                "min_bytes ({}) exceeds max_bytes ({})",
                self.validation.min_bytes, self.validation.max_bytes
            )));
        }

        if self.extraction.scanned_text_chars >= self.extraction.min_text_chars {
            return Err(PipelineError::InvalidConfig(format!(
                "scanned_text_chars ({}) must be below min_text_chars ({})",
                self.extraction.scanned_text_chars, self.extraction.min_text_chars
            )));
        }

        self.segmenting.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_consistent() {
        let options = PipelineOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.segmenting.min_words, 200);
        assert_eq!(options.segmenting.max_words, 500);
        assert_eq!(options.extraction.min_text_chars, 50);
        assert_eq!(options.validation.min_bytes, 100);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("options.json");
        fs::write(&path, r#"{ "segmenting": { "target_words": 300 } }"#)?;

        let options = PipelineOptions::from_json_file(&path)?;

        assert_eq!(options.segmenting.target_words, 300);
        assert_eq!(options.segmenting.max_words, 500);
        assert_eq!(options.validation, ValidationLimits::default());
        Ok(())
    }

    #[test]
    fn inconsistent_file_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("options.json");
        fs::write(
            &path,
            r#"{ "extraction": { "min_text_chars": 5, "scanned_text_chars": 10 } }"#,
        )?;

        let outcome = PipelineOptions::from_json_file(&path);

        assert!(matches!(outcome, Err(PipelineError::InvalidConfig(_))));
        Ok(())
    }

    #[test]
    fn malformed_json_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("options.json");
        fs::write(&path, "{ not json")?;

        assert!(matches!(
            PipelineOptions::from_json_file(&path),
            Err(PipelineError::Config(_))
        ));
        Ok(())
    }

    #[test]
    fn inverted_byte_bounds_are_rejected() {
        let options = PipelineOptions {
            validation: ValidationLimits {
                min_bytes: 1_000,
                max_bytes: 10,
            },
            ..PipelineOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
