mod config;
mod drive;
mod error;
mod fetch;
mod ocr;
mod parser;
mod sidra;
mod sink;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::ocr::OcrEngine;
use crate::parser::{AnchoredExtractor, NumberExtractor, PositionalExtractor};
use crate::sidra::{PeriodParsing, SidraTable};
use crate::sink::spreadsheet::{self, ExportMeta};
use crate::sink::supabase::{self, SupabaseSink};

#[derive(Parser)]
#[command(name = "indicator_ingest", about = "CUB / SIDRA indicator ingestion pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a SIDRA table and write data/raw/meta sheets
    Export {
        /// Dataset YAML (name, url, output_dir)
        #[arg(short, long)]
        config: PathBuf,
        /// Keep rows with unparsable period codes (blank year/month) instead of failing
        #[arg(long)]
        best_effort: bool,
    },
    /// Fetch SIDRA periods and upsert raw rows into the remote store
    Ingest {
        /// Dataset YAML (name, url)
        #[arg(short, long)]
        config: PathBuf,
        /// initial = full backfill, current = latest period only
        #[arg(short, long, value_enum)]
        action: IngestAction,
        /// Remote table name
        #[arg(short, long, default_value = "ipca_1737_raw")]
        table: String,
    },
    /// Extract the monthly bulletin measurement and write data/raw sheets
    Measure {
        /// Pre-recognized text file (skips OCR)
        #[arg(long, conflicts_with_all = ["image", "capture_log"])]
        ocr_text: Option<PathBuf>,
        /// Local bulletin image to OCR
        #[arg(long, conflicts_with = "capture_log")]
        image: Option<PathBuf>,
        /// Browser network-capture log to mine for the bulletin image URL
        #[arg(long)]
        capture_log: Option<PathBuf>,
        /// Year the bulletin sheet is declared for
        #[arg(short, long)]
        year: i32,
        #[arg(short, long, default_value = "out/cub_residencial_medio")]
        output_dir: PathBuf,
        /// Locate each quantity by its printed label instead of token position
        #[arg(long)]
        anchored: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum IngestAction {
    Initial,
    Current,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export { config, best_effort } => run_export(&config, best_effort).await,
        Commands::Ingest { config, action, table } => run_ingest(&config, action, &table).await,
        Commands::Measure {
            ocr_text,
            image,
            capture_log,
            year,
            output_dir,
            anchored,
        } => run_measure(ocr_text, image, capture_log, year, &output_dir, anchored).await,
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

// ── Export ──

async fn run_export(config_path: &Path, best_effort: bool) -> Result<()> {
    let job = config::load_job(config_path)?;
    let client = fetch::client()?;

    let payload = fetch::fetch_payload(&client, &job.url).await?;
    let table = decode_table(&payload.text)?;

    let mode = if best_effort {
        PeriodParsing::BestEffort
    } else {
        PeriodParsing::Strict
    };
    let wide = sidra::reshape(&table, mode)?;

    let out_dir = output_dir_for(&job);
    let dataset_path = config_path.display().to_string();
    let meta = ExportMeta {
        name: &job.name,
        dataset_path: &dataset_path,
        url: &job.url,
        content_type: &payload.content_type,
    };
    spreadsheet::write_sidra_sheets(&out_dir, &meta, &table, &wide)?;

    println!(
        "OK: {} (raw={}, data={})",
        out_dir.display(),
        table.raw_rows.len(),
        wide.len()
    );
    Ok(())
}

fn output_dir_for(job: &config::Job) -> PathBuf {
    job.output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("out").join(&job.name))
}

// ── Ingest ──

async fn run_ingest(config_path: &Path, action: IngestAction, table_name: &str) -> Result<()> {
    let job = config::load_job(config_path)?;
    let credentials = config::supabase_from_env()?;
    let client = fetch::client()?;
    let sink = SupabaseSink::new(&credentials, table_name, client.clone());

    match action {
        IngestAction::Current => {
            let period = match boundary_period(&client, &job.url, "last").await {
                Ok(p) => p,
                Err(e) => {
                    warn!("Falling back to the configured URL period: {}", e);
                    fetch::period_from_url(&job.url)?
                }
            };
            let count = ingest_period(&client, &sink, &job.url, &period).await?;
            println!(
                "OK: upserted {} records into {} ({}/{})",
                count, table_name, job.name, period
            );
        }
        IngestAction::Initial => {
            let first = boundary_period(&client, &job.url, "first")
                .await
                .context("full backfill needs the /p/first endpoint")?;
            let last = boundary_period(&client, &job.url, "last")
                .await
                .context("full backfill needs the /p/last endpoint")?;
            let periods = sidra::period::build_periods(&first, &last)?;

            let pb = ProgressBar::new(periods.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                    .progress_chars("=> "),
            );

            let mut total = 0usize;
            for period in &periods {
                let count = ingest_period(&client, &sink, &job.url, period).await?;
                total += count;
                pb.println(format!("Period {}: {} records", period, count));
                pb.inc(1);
            }
            pb.finish_and_clear();

            println!("Periods processed: {}", periods.len());
            println!(
                "OK: upserted {} records into {} ({})",
                total, table_name, job.name
            );
        }
    }
    Ok(())
}

/// Resolve a boundary period by fetching the `first`/`last` selector and
/// taking the table's maximum period code.
async fn boundary_period(
    client: &reqwest::Client,
    base_url: &str,
    selector: &str,
) -> Result<String> {
    let url = fetch::with_period(base_url, selector)?;
    let payload = fetch::fetch_payload(client, &url).await?;
    let table = decode_table(&payload.text)?;
    Ok(table.max_period()?)
}

/// Fetch one period and upsert its raw rows. An empty response aborts the
/// run; a silent gap would be indistinguishable from a successful load.
async fn ingest_period(
    client: &reqwest::Client,
    sink: &SupabaseSink,
    base_url: &str,
    period: &str,
) -> Result<usize> {
    let url = fetch::with_period(base_url, period)?;
    let payload = fetch::fetch_payload(client, &url).await?;
    let table = decode_table(&payload.text)?;

    if table.is_empty() {
        bail!("no records returned for period {}", period);
    }
    let mut records = supabase::to_records(&table, &url);
    supabase::sanitize(&mut records);
    sink.upsert(&records).await?;
    Ok(records.len())
}

fn decode_table(body: &str) -> Result<SidraTable> {
    let decoded = sidra::decode_payload(body)?;
    Ok(SidraTable::from_raw(decoded.columns, decoded.rows))
}

// ── Measure ──

async fn run_measure(
    ocr_text: Option<PathBuf>,
    image: Option<PathBuf>,
    capture_log: Option<PathBuf>,
    year: i32,
    output_dir: &Path,
    anchored: bool,
) -> Result<()> {
    let client = fetch::client()?;

    let (text, checksum, source) = if let Some(path) = ocr_text {
        let bytes = fs::read(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        (text, hash_hex(&bytes), "Sinduscon GF - CUB M2 Residencial Médio (texto reconhecido)".to_string())
    } else if let Some(path) = image {
        let bytes = fs::read(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let text = ocr::TesseractCli::default().recognize(&bytes)?;
        (text, hash_hex(&bytes), "Sinduscon GF - CUB M2 Residencial Médio (OCR de imagem local)".to_string())
    } else if let Some(path) = capture_log {
        let blob = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let url = drive::best_image_url(&blob).with_context(|| {
            format!("no usable image URL in {}; inspect the automation logs", path.display())
        })?;
        let bytes = fetch::download_bytes(&client, &url).await?;
        let text = ocr::TesseractCli::default().recognize(&bytes)?;
        (text, hash_hex(&bytes), format!("Sinduscon GF - CUB M2 Residencial Médio (OCR de {})", url))
    } else {
        bail!("provide one of --ocr-text, --image or --capture-log");
    };

    // Recognized text goes to disk before extraction, so a failed run still
    // leaves something to inspect.
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let ocr_dump = output_dir.join("ocr.txt");
    fs::write(&ocr_dump, &text)
        .with_context(|| format!("failed to write {}", ocr_dump.display()))?;

    let strategy: &dyn NumberExtractor = if anchored {
        &AnchoredExtractor
    } else {
        &PositionalExtractor
    };
    let measurement = parser::extract_measurement_with(strategy, &text, year, checksum)
        .with_context(|| {
            format!("extraction failed; recognized text saved to {}", ocr_dump.display())
        })?;

    spreadsheet::write_measurement_sheets(output_dir, &measurement, &source, &text)?;

    println!(
        "OK: reporting={} reference={} index={} month={}% year={}% 12m={}%",
        measurement.reporting_period,
        measurement.reference_period,
        measurement.index_value,
        measurement.pct_change_month,
        measurement.pct_change_year,
        measurement.pct_change_12m
    );
    println!("sheets={}", output_dir.display());
    Ok(())
}

fn hash_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
