use anyhow::Context;
use book_segmenter_core::{
    clean, discover_pdf_files, process_file, BatchReport, PipelineError, PipelineOptions,
    ProcessedFile, ReadingPipeline,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "book-segmenter", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON file overriding pipeline defaults.
    #[arg(long, global = true, env = "BOOK_SEGMENTER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Segment one PDF and print the result as JSON.
    Process {
        #[arg(long)]
        file: PathBuf,
        /// Indent the JSON output.
        #[arg(long, default_value_t = false)]
        pretty: bool,
        /// Print segments grouped under a single unit.
        #[arg(long, default_value_t = false)]
        as_unit: bool,
    },
    /// Segment every PDF under a folder, recursively.
    Batch {
        #[arg(long)]
        folder: PathBuf,
        /// Documents processed at the same time.
        #[arg(long, default_value = "4")]
        jobs: usize,
    },
    /// Run only the text cleaner on a UTF-8 text file.
    Clean {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "book-segmenter boot"
    );

    match cli.command {
        Command::Process {
            file,
            pretty,
            as_unit,
        } => {
            let pipeline = load_pipeline(cli.config.as_deref())?;
            let outcome =
                tokio::task::spawn_blocking(move || process_file(&file, &pipeline)).await?;

            match outcome {
                Ok(processed) => {
                    print_json(&render_processed(processed, as_unit)?, pretty)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    print_json(&render_error(&error), pretty)?;
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Batch { folder, jobs } => {
            let pipeline = Arc::new(load_pipeline(cli.config.as_deref())?);
            let report = run_batch(&folder, pipeline, jobs).await?;

            info!(
                folder = %folder.display(),
                processed = report.processed.len(),
                skipped = report.skipped.len(),
                segments = report.segment_count(),
                "batch finished"
            );

            if report.processed.is_empty() {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Command::Clean { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            println!("{}", clean(&text));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_pipeline(config: Option<&Path>) -> anyhow::Result<ReadingPipeline> {
    let options = match config {
        Some(path) => PipelineOptions::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineOptions::default(),
    };

    let pipeline = ReadingPipeline::new(options)?;
    info!(engines = ?pipeline.engine_names(), "pipeline ready");
    Ok(pipeline)
}

async fn run_batch(
    folder: &Path,
    pipeline: Arc<ReadingPipeline>,
    jobs: usize,
) -> anyhow::Result<BatchReport> {
    let files = discover_pdf_files(folder);
    if files.is_empty() {
        anyhow::bail!("no pdf files found in {}", folder.display());
    }
    info!(folder = %folder.display(), files = files.len(), jobs, "batch started");

    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();
    let total = files.len();

    for (index, path) in files.into_iter().enumerate() {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let pipeline = Arc::clone(&pipeline);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let outcome = process_file(&path, &pipeline);
            (index, path, outcome)
        });
    }

    let mut slots: Vec<Option<(PathBuf, Result<ProcessedFile, PipelineError>)>> =
        (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (index, path, outcome) = joined?;
        slots[index] = Some((path, outcome));
    }

    let mut report = BatchReport::default();
    for (path, outcome) in slots.into_iter().flatten() {
        match &outcome {
            Ok(file) => println!(
                "{} segments={} pages={} sha256={}",
                path.display(),
                file.document.segments.len(),
                file.document.page_count,
                file.checksum
            ),
            Err(error) => {
                warn!(path = %path.display(), code = error.code(), %error, "skipped pdf");
                println!("{} skipped error={}", path.display(), error.code());
            }
        }
        report.record(path, outcome);
    }

    Ok(report)
}

fn render_processed(processed: ProcessedFile, as_unit: bool) -> anyhow::Result<serde_json::Value> {
    if !as_unit {
        return Ok(serde_json::to_value(processed)?);
    }

    let ProcessedFile {
        source_path,
        file_name,
        checksum,
        processed_at,
        document,
    } = processed;
    Ok(json!({
        "source_path": source_path,
        "file_name": file_name,
        "checksum": checksum,
        "processed_at": processed_at,
        "page_count": document.page_count,
        "page_aware": document.page_aware,
        "unit": document.into_unit(),
    }))
}

fn render_error(error: &PipelineError) -> serde_json::Value {
    json!({
        "error": error.code(),
        "message": error.to_string(),
    })
}

fn print_json(value: &serde_json::Value, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
