use crate::error::{PipelineError, Result};
use crate::models::ProcessedDocument;
use crate::pipeline::ReadingPipeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// One document run through the pipeline, with enough provenance to spot
/// a re-upload of the same bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub source_path: String,
    pub file_name: String,
    pub checksum: String,
    pub processed_at: DateTime<Utc>,
    pub document: ProcessedDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedPdf {
    pub path: PathBuf,
    pub code: String,
    pub reason: String,
}

impl SkippedPdf {
    pub fn new(path: PathBuf, error: &PipelineError) -> Self {
        Self {
            path,
            code: error.code().to_string(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: Vec<ProcessedFile>,
    pub skipped: Vec<SkippedPdf>,
}

impl BatchReport {
    pub fn record(&mut self, path: PathBuf, outcome: Result<ProcessedFile>) {
        match outcome {
            Ok(file) => self.processed.push(file),
            Err(error) => self.skipped.push(SkippedPdf::new(path, &error)),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.processed
            .iter()
            .map(|file| file.document.segments.len())
            .sum()
    }
}

pub fn process_file(path: &Path, pipeline: &ReadingPipeline) -> Result<ProcessedFile> {
    let bytes = fs::read(path)?;
    let checksum = digest_bytes(&bytes);
    let document = pipeline.process(&bytes)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(ProcessedFile {
        source_path: path.to_string_lossy().to_string(),
        file_name,
        checksum,
        processed_at: Utc::now(),
        document,
    })
}
