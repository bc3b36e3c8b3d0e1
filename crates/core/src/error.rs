use thiserror::Error;

/// Longest engine diagnostic carried by [`PipelineError::Unreadable`].
pub const MAX_DIAGNOSTIC_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("not a pdf document: leading bytes do not match the %PDF signature")]
    InvalidFormat,

    #[error("document is too small: {size} bytes (minimum {min})")]
    TooSmall { size: usize, min: usize },

    #[error("document is too large: {size} bytes (maximum {max})")]
    TooLarge { size: usize, max: usize },

    #[error("document is password protected")]
    PasswordProtected,

    #[error("document is corrupted")]
    Corrupted,

    #[error("document could not be read: {0}")]
    Unreadable(String),

    #[error("document looks scanned: it decoded but contains no extractable text")]
    ScannedNoText,

    #[error("document has no extractable text")]
    NoExtractableText,

    #[error("no extraction engine is available in this build")]
    NoEnginesAvailable,

    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl PipelineError {
    /// Stable identifier for reports and API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::TooSmall { .. } => "too_small",
            Self::TooLarge { .. } => "too_large",
            Self::PasswordProtected => "password_protected",
            Self::Corrupted => "corrupted",
            Self::Unreadable(_) => "unreadable",
            Self::ScannedNoText => "scanned_no_text",
            Self::NoExtractableText => "no_extractable_text",
            Self::NoEnginesAvailable => "no_engines_available",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
        }
    }

    /// Builds an [`PipelineError::Unreadable`] with the diagnostic cut to
    /// [`MAX_DIAGNOSTIC_CHARS`].
    pub fn unreadable(diagnostic: &str) -> Self {
        Self::Unreadable(truncate_diagnostic(diagnostic))
    }
}

/// Outcome of a single engine attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("engine failed: {0}")]
    Failed(String),
}

pub fn truncate_diagnostic(message: &str) -> String {
    let trimmed = message.trim();
    match trimmed.char_indices().nth(MAX_DIAGNOSTIC_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_are_truncated_on_char_boundary() {
        let long = "é".repeat(MAX_DIAGNOSTIC_CHARS + 40);
        let truncated = truncate_diagnostic(&long);
        assert_eq!(truncated.chars().count(), MAX_DIAGNOSTIC_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn short_diagnostics_are_kept() {
        assert_eq!(truncate_diagnostic("  bad xref  "), "bad xref");
        let error = PipelineError::unreadable("bad xref");
        assert_eq!(error.code(), "unreadable");
        assert_eq!(error.to_string(), "document could not be read: bad xref");
    }
}
