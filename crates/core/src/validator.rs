//! Cheap rejection of uploads that cannot be PDF books.
//!
//! Runs before any extraction engine touches the bytes. Only the length and
//! the leading signature are inspected; nothing is allocated.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

pub const PDF_MAGIC: &[u8; 4] = b"%PDF";
pub const MIN_DOCUMENT_BYTES: usize = 100;
pub const MAX_DOCUMENT_BYTES: usize = 200 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub min_bytes: usize,
    pub max_bytes: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            min_bytes: MIN_DOCUMENT_BYTES,
            max_bytes: MAX_DOCUMENT_BYTES,
        }
    }
}

pub fn validate(bytes: &[u8], limits: &ValidationLimits) -> Result<()> {
    if bytes.len() < limits.min_bytes {
        return Err(PipelineError::TooSmall {
            size: bytes.len(),
            min: limits.min_bytes,
        });
    }

    if bytes.len() > limits.max_bytes {
        return Err(PipelineError::TooLarge {
            size: bytes.len(),
            max: limits.max_bytes,
        });
    }

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(PipelineError::InvalidFormat);
    }

    Ok(())
}
