//! # Integration Tests
//!
//! Cross-crate tests without a recognition engine or a real store.
//!
//! Covers:
//! - the shipped sample configuration
//! - watcher -> assembler -> extraction -> publisher end to end
//! - sensor export sets picked up by a directory rescan

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{AnalyzerConfig, GroupingPolicy, StoreBackendKind};
    use extraction::LabelDictionary;

    const SAMPLE_CONFIG: &str = include_str!("../../../config/healthsync.toml");

    #[test]
    fn test_sample_config_loads() {
        let bp = ConfigLoader::load_from_str(SAMPLE_CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.store.backend, StoreBackendKind::Jsonl);
        assert_eq!(bp.store.table, "CAPTURAS");
        assert_eq!(bp.watch.rescan_interval_secs, 900);

        let ids: Vec<_> = bp.devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["polar", "starfit", "amazfit", "laboratorio"]);
        assert_eq!(
            bp.device("starfit").unwrap().grouping,
            GroupingPolicy::MultiPhoto { min_members: 2 }
        );
        assert!(matches!(
            bp.device("polar").unwrap().analyzer,
            AnalyzerConfig::PolarHrv { .. }
        ));
    }

    #[test]
    fn test_sample_dictionaries_parse() {
        for content in [
            include_str!("../../../config/dictionaries/starfit.json"),
            include_str!("../../../config/dictionaries/laboratorio.json"),
        ] {
            let dictionary = LabelDictionary::from_json_str(content).unwrap();
            assert!(dictionary.len() >= 10);
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use assembler::{scan_directory, CaptureSetAssembler, Observation};
    use chrono::NaiveDate;
    use contracts::{
        dedup_first_wins, resolve_capture_date, CaptureGroup, IngestBlueprint, TextRecognizer,
        UploadRow, WatchConfig,
    };
    use extraction::CaptureAnalyzer;
    use publisher::{upload_new_rows, Archiver, JsonlStore, MemoryStore, RecordStore};
    use recognition::MockRecognizer;
    use watcher::{PollingWatcher, WatcherConfig};

    const STARFIT_DICTIONARY: &str =
        r#"{"Peso (kg)": ["peso"], "Grasa Corporal (%)": ["grasa corporal"], "IMC": ["imc"]}"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    }

    fn rows_for(group: &CaptureGroup, metrics: &[contracts::CanonicalMetric]) -> Vec<UploadRow> {
        let first = group.first_member().unwrap();
        let date = resolve_capture_date(first.date_token.as_deref(), today());
        metrics
            .iter()
            .map(|m| UploadRow::from_metric(date, m, &first.file_name()))
            .collect()
    }

    /// Recognize every member, analyze, dedup, render
    async fn starfit_rows(
        analyzer: &CaptureAnalyzer,
        recognizer: &MockRecognizer,
        blueprint: &IngestBlueprint,
        group: &CaptureGroup,
    ) -> Vec<UploadRow> {
        let device = blueprint.device("starfit").unwrap();
        let hint = device.recognition_hint(&blueprint.recognition);
        let mut metrics = Vec::new();
        for member in group.members() {
            let text = recognizer.recognize(member.path(), &hint).await.unwrap();
            metrics.extend(analyzer.analyze_text(&text).unwrap());
        }
        rows_for(group, &dedup_first_wins(metrics))
    }

    /// End-to-end: PollingWatcher -> CaptureSetAssembler -> CaptureAnalyzer
    /// -> JsonlStore -> Archiver
    ///
    /// 1. two dashboard photos land in the starfit hot folder
    /// 2. the second one completes the capture set
    /// 3. rows are appended once, sources move to processed/
    #[tokio::test]
    async fn test_e2e_watch_to_store() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("dictionaries")).unwrap();
        std::fs::write(root.path().join("dictionaries/starfit.json"), STARFIT_DICTIONARY).unwrap();

        let blueprint = IngestBlueprint::with_root(root.path());
        let device = blueprint.device("starfit").unwrap().clone();
        let incoming = blueprint.incoming_dir(&device);
        std::fs::create_dir_all(&incoming).unwrap();

        let watch = WatchConfig {
            poll_interval_ms: 20,
            ..Default::default()
        };
        let mut watcher = PollingWatcher::new(WatcherConfig::new(blueprint.incoming_root(), &watch));
        let events = watcher.take_receiver().unwrap();
        let handle = watcher.start().await.unwrap();

        let photos: Vec<PathBuf> = ["IMG_20240101_a.jpg", "IMG_20240101_b.jpg"]
            .iter()
            .map(|name| incoming.join(name))
            .collect();
        for photo in &photos {
            std::fs::write(photo, b"jpeg").unwrap();
        }

        let mut assembler = CaptureSetAssembler::new(device.id.clone(), device.grouping.clone());
        let fired = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = events.recv().await.unwrap();
                let file = contracts::RawFile::new(event.path, device.id.clone());
                if let Observation::Fired(key) = assembler.observe(file) {
                    break key;
                }
            }
        })
        .await
        .expect("capture set completes");
        watcher.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        let group = assembler.ready_groups().remove(0);
        assert_eq!(group.key, fired);
        assert_eq!(group.len(), 2);

        let recognizer = MockRecognizer::new()
            .with_text("IMG_20240101_a.jpg", "81.9\nPeso\n22.9%\nGrasa Corporal\n")
            .with_text("IMG_20240101_b.jpg", "26.1\nIMC\n");
        let analyzer = CaptureAnalyzer::build(&device, &blueprint).unwrap();
        let rows = starfit_rows(&analyzer, &recognizer, &blueprint, &group).await;

        let store_path = root.path().join("captures.jsonl");
        let mut store = JsonlStore::new("CAPTURAS", &store_path);
        let report = upload_new_rows(&mut store, rows.clone()).await.unwrap();
        assert_eq!(report.appended, 3);

        let archiver = Archiver::new(blueprint.incoming_root(), blueprint.processed_root());
        let archived = archiver
            .archive_all(group.members().map(|m| m.path()))
            .await;
        assert!(archived.is_complete());
        assert!(photos.iter().all(|p| !p.exists()));
        assert!(blueprint.processed_dir(&device).join("IMG_20240101_b.jpg").exists());
        assert!(assembler.consume(&group.key).is_some());

        // a second store handle sees the same rows; re-upload is a no-op
        let mut reopened = JsonlStore::new("CAPTURAS", &store_path);
        let stored = reopened.read_rows().await.unwrap();
        assert_eq!(stored, rows);
        assert_eq!(stored[0].to_record(), ["2024-01-01", "Peso (kg)", "81.90", "IMG_20240101_a.jpg"]);
        let again = upload_new_rows(&mut reopened, rows).await.unwrap();
        assert!(again.only_duplicates());
        assert_eq!(reopened.read_rows().await.unwrap().len(), 3);
    }

    fn write_export(path: &Path, header: &str, rows: impl Iterator<Item = String>) {
        let mut content = format!("{header}\n");
        for row in rows {
            content.push_str(&row);
            content.push('\n');
        }
        std::fs::write(path, content).unwrap();
    }

    /// Sensor export triplet: incomplete until the third file, then
    /// analyzed straight from the files
    #[tokio::test]
    async fn test_e2e_polar_triplet_rescan() {
        let root = tempfile::tempdir().unwrap();
        let blueprint = IngestBlueprint::with_root(root.path());
        let device = blueprint.device("polar").unwrap().clone();
        let incoming = blueprint.incoming_dir(&device);
        std::fs::create_dir_all(&incoming).unwrap();
        let stamp = "20240105_0730";

        let mut t = 0.0;
        let rr: Vec<f64> = (0..300)
            .map(|_| {
                let v = 800.0 + 50.0 * (2.0 * std::f64::consts::PI * 0.25 * t).sin();
                t += v / 1000.0;
                v
            })
            .collect();
        write_export(
            &incoming.join(format!("polar_{stamp}_RR.txt")),
            "Phone timestamp;RR-interval [ms]",
            rr.iter().enumerate().map(|(i, v)| format!("{i};{v:.0}")),
        );
        write_export(
            &incoming.join(format!("polar_{stamp}_ACC.txt")),
            "Phone timestamp;sensor timestamp;X;Y;Z",
            (0..300).map(|i| format!("{i};{i};0;0;1000")),
        );

        let mut assembler = CaptureSetAssembler::new(device.id.clone(), device.grouping.clone());
        let files = scan_directory(&incoming, &device.id, &device.extensions).unwrap();
        assert_eq!(assembler.rescan(files), 0);
        assert_eq!(assembler.pending_len(), 1);

        write_export(
            &incoming.join(format!("polar_{stamp}_HR.txt")),
            "Phone timestamp;HR [bpm]",
            [62, 64, 66].iter().map(|v| format!("t;{v}")),
        );
        let files = scan_directory(&incoming, &device.id, &device.extensions).unwrap();
        assert_eq!(assembler.rescan(files), 1);

        let group = assembler.ready_groups().remove(0);
        let analyzer = CaptureAnalyzer::build(&device, &blueprint).unwrap();
        assert!(!analyzer.needs_recognition());
        let metrics = dedup_first_wins(analyzer.analyze_files(&group).unwrap());
        let rows = rows_for(&group, &metrics);
        assert!(rows.iter().all(|r| r.date == "2024-01-05"));
        assert!(rows.iter().any(|r| r.metric == "POLAR_HR_PROMEDIO" && r.value == "64.00"));

        let mut store = MemoryStore::new("CAPTURAS");
        let report = upload_new_rows(&mut store, rows).await.unwrap();
        assert_eq!(report.appended, metrics.len());
        assert_eq!(store.rows().len(), metrics.len());
    }
}
