//! `extract` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use assembler::{scan_directory, CaptureSetAssembler};
use contracts::{dedup_first_wins, CanonicalMetric, DeviceConfig, IngestBlueprint, TextRecognizer};
use extraction::CaptureAnalyzer;
use recognition::RecognizerBackend;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::ExtractArgs;
use crate::error::CliError;

#[derive(Serialize)]
struct ExtractOutput<'a> {
    device: &'a str,
    analyzer: &'static str,
    input: String,
    metrics: Vec<CanonicalMetric>,
}

/// Execute the `extract` command: analyze one capture, touch nothing
pub async fn run_extract(args: &ExtractArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;
    let device = blueprint.device(&args.device).ok_or_else(|| {
        CliError::unknown_device(
            &args.device,
            blueprint.devices.iter().map(|d| d.id.as_str()),
        )
    })?;

    let analyzer = CaptureAnalyzer::build(device, &blueprint)
        .with_context(|| format!("Failed to build analyzer for device '{}'", device.id))?;
    info!(device = %device.id, analyzer = analyzer.kind(), input = %args.input.display(), "Extracting");

    let metrics = if analyzer.needs_recognition() {
        let text = read_text(args, device, &blueprint).await?;
        analyzer.analyze_text(&text)?
    } else {
        extract_from_set(&analyzer, device, &args.input)?
    };
    let metrics = dedup_first_wins(metrics);

    if args.json {
        let output = ExtractOutput {
            device: device.id.as_str(),
            analyzer: analyzer.kind(),
            input: args.input.display().to_string(),
            metrics,
        };
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialize metrics")?;
        println!("{}", json);
    } else {
        print_metrics(&args.input, &metrics);
    }
    Ok(())
}

/// Recognized text of the input, or its contents with `--text`
async fn read_text(
    args: &ExtractArgs,
    device: &DeviceConfig,
    blueprint: &IngestBlueprint,
) -> Result<String> {
    if args.text {
        return tokio::fs::read_to_string(&args.input)
            .await
            .with_context(|| format!("Failed to read {}", args.input.display()));
    }
    let recognizer = RecognizerBackend::from_config(&blueprint.recognition);
    let hint = device.recognition_hint(&blueprint.recognition);
    let text = recognizer.recognize(&args.input, &hint).await?;
    Ok(text)
}

/// Metrics of the complete export set `input` belongs to
fn extract_from_set(
    analyzer: &CaptureAnalyzer,
    device: &DeviceConfig,
    input: &Path,
) -> Result<Vec<CanonicalMetric>> {
    let dir = input
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let files = scan_directory(dir, &device.id, &device.extensions)?;

    let mut assembler = CaptureSetAssembler::new(device.id.clone(), device.grouping.clone());
    assembler.rescan(files);
    let group = assembler
        .ready_groups()
        .into_iter()
        .find(|group| group.members().any(|m| m.path() == input))
        .ok_or_else(|| CliError::IncompleteCaptureSet {
            path: input.to_path_buf(),
        })?;

    info!(key = %group.key, members = group.len(), "Capture set assembled");
    Ok(analyzer.analyze_files(&group)?)
}

fn print_metrics(input: &Path, metrics: &[CanonicalMetric]) {
    println!("\n=== {} ===\n", input.display());
    if metrics.is_empty() {
        println!("  (no metrics found)");
    }
    for metric in metrics {
        println!("  {:<32} {:>12.2}", metric.display_name(), metric.value);
    }
    println!();
}
