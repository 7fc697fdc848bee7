//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{AnalyzerConfig, DeviceConfig, GroupingPolicy, IngestBlueprint};
use serde::Serialize;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo<'a> {
    version: String,
    paths: PathsInfo,
    store: StoreInfo<'a>,
    recognition: RecognitionInfo<'a>,
    watch: WatchInfo,
    devices: Vec<DeviceInfo<'a>>,
}

#[derive(Serialize)]
struct PathsInfo {
    root: String,
    incoming: String,
    processed: String,
}

#[derive(Serialize)]
struct StoreInfo<'a> {
    backend: String,
    table: &'a str,
    path: String,
}

#[derive(Serialize)]
struct RecognitionInfo<'a> {
    engine: String,
    binary: &'a str,
    language: &'a str,
}

#[derive(Serialize)]
struct WatchInfo {
    poll_interval_ms: u64,
    rescan_interval_secs: u64,
}

#[derive(Serialize)]
struct DeviceInfo<'a> {
    id: &'a str,
    incoming_dir: String,
    grouping: String,
    analyzer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a DeviceConfig>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn grouping_label(policy: &GroupingPolicy) -> String {
    match policy {
        GroupingPolicy::Triplet { sub_kinds } => format!("triplet ({})", sub_kinds.join("/")),
        GroupingPolicy::MultiPhoto { min_members } => format!("multi-photo (>= {min_members})"),
        GroupingPolicy::Single => "single".to_string(),
    }
}

fn analyzer_label(analyzer: &AnalyzerConfig) -> String {
    match analyzer {
        AnalyzerConfig::TokenStream {
            dictionary: Some(path),
        } => format!("token-stream ({})", path.display()),
        AnalyzerConfig::TokenStream { dictionary: None } => "token-stream (no dictionary)".to_string(),
        AnalyzerConfig::FixedFormat { patterns } => {
            format!("fixed-format ({} labels)", patterns.len())
        }
        AnalyzerConfig::PolarHrv { rest_threshold } => {
            format!("polar-hrv (rest < {rest_threshold} m/s2)")
        }
    }
}

fn build_config_info<'a>(blueprint: &'a IngestBlueprint, args: &InfoArgs) -> ConfigInfo<'a> {
    let devices = blueprint
        .devices
        .iter()
        .map(|d| DeviceInfo {
            id: d.id.as_str(),
            incoming_dir: blueprint.incoming_dir(d).display().to_string(),
            grouping: grouping_label(&d.grouping),
            analyzer: analyzer_label(&d.analyzer),
            details: args.devices.then_some(d),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        paths: PathsInfo {
            root: blueprint.paths.root.display().to_string(),
            incoming: blueprint.incoming_root().display().to_string(),
            processed: blueprint.processed_root().display().to_string(),
        },
        store: StoreInfo {
            backend: format!("{:?}", blueprint.store.backend),
            table: &blueprint.store.table,
            path: blueprint.resolve(&blueprint.store.path).display().to_string(),
        },
        recognition: RecognitionInfo {
            engine: format!("{:?}", blueprint.recognition.engine),
            binary: &blueprint.recognition.binary,
            language: &blueprint.recognition.language,
        },
        watch: WatchInfo {
            poll_interval_ms: blueprint.watch.poll_interval_ms,
            rescan_interval_secs: blueprint.watch.rescan_interval_secs,
        },
        devices,
    }
}

fn print_config_info(blueprint: &IngestBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               healthsync Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📁 Paths");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Root: {}", blueprint.paths.root.display());
    println!("   ├─ Incoming: {}", blueprint.incoming_root().display());
    println!("   └─ Processed: {}", blueprint.processed_root().display());

    println!("\n📤 Store");
    println!("   ├─ Backend: {:?}", blueprint.store.backend);
    println!("   ├─ Table: {}", blueprint.store.table);
    println!(
        "   └─ Path: {}",
        blueprint.resolve(&blueprint.store.path).display()
    );

    println!("\n🔎 Recognition");
    println!("   ├─ Engine: {:?}", blueprint.recognition.engine);
    println!("   ├─ Binary: {}", blueprint.recognition.binary);
    println!("   └─ Language: {}", blueprint.recognition.language);

    println!("\n⏱  Watch");
    println!("   ├─ Poll interval: {} ms", blueprint.watch.poll_interval_ms);
    match blueprint.watch.rescan_interval_secs {
        0 => println!("   └─ Rescan: off"),
        secs => println!("   └─ Rescan: every {secs} s"),
    }

    println!("\n📱 Devices ({})", blueprint.devices.len());
    for (i, device) in blueprint.devices.iter().enumerate() {
        let is_last = i == blueprint.devices.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({})",
            prefix,
            device.id,
            blueprint.incoming_dir(device).display()
        );
        if args.devices {
            println!("   {}  ├─ Extensions: {}", child_prefix, device.extensions.join(", "));
            println!("   {}  ├─ Grouping: {}", child_prefix, grouping_label(&device.grouping));
            println!("   {}  ├─ Analyzer: {}", child_prefix, analyzer_label(&device.analyzer));
            println!("   {}  └─ Page segmentation: {}", child_prefix, device.page_segmentation);
        } else {
            println!("   {}  └─ {}", child_prefix, analyzer_label(&device.analyzer));
        }
    }

    println!();
}
