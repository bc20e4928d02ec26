// ABOUTME: End-to-end pipeline tests against the SQLite reference store
// ABOUTME: Idempotent re-import, dedup boundaries, partial failure, feature queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use rackline::config::EtlConfig;
use rackline::models::{Metric, SeriesType};
use rackline::parser::InputFormat;
use rackline::{
    EtlPipeline, FeatureCalculator, ImportOptions, SqliteWorkoutStore, WorkoutStore,
};

const HEADER: &str = "Date,Entraînement,Heure,Exercice,Région,Groupes musculaires (Primaires),Groupes musculaires (Secondaires),Série / Série d'échauffement / Série de récupération,Répétitions / Temps,Poids / Distance,Notes,Sautée";

async fn sqlite_store(dir: &TempDir) -> Arc<SqliteWorkoutStore> {
    let db_path: PathBuf = dir.path().join("rackline-test.db");
    let url = format!("sqlite:{}", db_path.display());
    Arc::new(SqliteWorkoutStore::connect(&url).await.unwrap())
}

fn csv_row(date: &str, training: &str, exercise: &str, reps: &str, weight: &str, skipped: &str) -> String {
    format!("{date},{training},18:30,{exercise},,,,,\"{reps}\",\"{weight}\",,{skipped}\n")
}

#[tokio::test]
async fn csv_file_import_is_idempotent_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    let pipeline = EtlPipeline::new(EtlConfig::default(), store.clone());

    let mut csv = format!("{HEADER}\n");
    csv.push_str(&csv_row("27/03/2025", "Push A", "Développé couché", "10", "40,0 kg", "Non"));
    csv.push_str(&csv_row("27/03/2025", "Push A", "Développé couché", "8", "60,0 kg", "Non"));
    csv.push_str(&csv_row("27/03/2025", "Push A", "Développé couché", "5", "80,5 kg", "Non"));
    csv.push_str(&csv_row("27/03/2025", "Push A", "Développé couché", "5", "80,5 kg", "Non"));

    let file = dir.path().join("export.csv");
    tokio::fs::write(&file, &csv).await.unwrap();

    let first = pipeline
        .import_file(&file, ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(first.inserted, 4);
    assert_eq!(first.sessions_created, 1);
    assert!(first.is_clean());

    // second run of the same file: zero inserts, everything a duplicate
    let second = pipeline
        .import_file(&file, ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_duplicate, 4);
    assert_eq!(second.sessions_created, 0);

    let sessions = store.list_session_sets(None, None).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].sets.len(), 4);

    // the ramp classification survived the round trip through SQLite
    let types: Vec<SeriesType> = sessions[0].sets.iter().map(|s| s.series_type).collect();
    assert_eq!(
        types,
        vec![
            SeriesType::Warmup,
            SeriesType::Warmup,
            SeriesType::Working,
            SeriesType::Working,
        ]
    );
    // locale-normalized weight
    assert_eq!(sessions[0].sets[2].weight_kg, Some(80.5));
}

#[tokio::test]
async fn identical_sets_in_different_sessions_both_persist() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    let pipeline = EtlPipeline::new(EtlConfig::default(), store.clone());

    let csv = format!(
        "{HEADER}\n{}{}",
        csv_row("27/03/2025", "Legs", "Squat", "5", "100 kg", "Non"),
        csv_row("29/03/2025", "Legs", "Squat", "5", "100 kg", "Non"),
    );
    let report = pipeline
        .import_bytes(InputFormat::Csv, csv.as_bytes(), ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped_duplicate, 0);
    assert_eq!(report.sessions_created, 2);
    assert_eq!(store.list_session_dates().await.unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_rows_are_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    let pipeline = EtlPipeline::new(EtlConfig::default(), store);

    let mut csv = format!("{HEADER}\n");
    for i in 0..9 {
        csv.push_str(&csv_row("27/03/2025", "Pull", "Rowing barre", "8", &format!("6{i} kg"), "Non"));
    }
    csv.push_str(&csv_row("27/03/2025", "Pull", "Rowing barre", "8", "lourd kg", "Non"));

    let report = pipeline
        .import_bytes(InputFormat::Csv, csv.as_bytes(), ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(report.inserted, 9);
    assert_eq!(report.rejected_malformed, 1);
    assert_eq!(report.row_errors.len(), 1);
}

#[tokio::test]
async fn skipped_sets_are_persisted_for_audit_but_excluded_from_features() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    let pipeline = EtlPipeline::new(EtlConfig::default(), store.clone());

    let csv = format!(
        "{HEADER}\n{}{}",
        csv_row("27/03/2025", "Legs", "Squat", "5", "100 kg", "Non"),
        csv_row("27/03/2025", "Legs", "Squat", "5", "200 kg", "Oui"),
    );
    pipeline
        .import_bytes(InputFormat::Csv, csv.as_bytes(), ImportOptions::default())
        .await
        .unwrap();

    let sessions = store.list_session_sets(Some("squat"), None).await.unwrap();
    // both sets visible in the audit listing
    assert_eq!(sessions[0].sets.len(), 2);
    assert!(sessions[0].sets[1].skipped);

    let calculator = FeatureCalculator::default();
    let records = calculator.exercise_features(&sessions, "squat");
    let volume = records
        .iter()
        .find(|r| r.metric == Metric::SessionVolume)
        .unwrap();
    assert!((volume.value - 500.0).abs() < f64::EPSILON);
    let best = records.iter().find(|r| r.metric == Metric::BestOneRm).unwrap();
    assert!(best.value < 150.0, "skipped 200kg set leaked into 1RM");
}

#[tokio::test]
async fn xml_import_converges_and_registers_catalog_entries() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    let pipeline = EtlPipeline::new(EtlConfig::default(), store.clone());

    let xml = "<logs>\
        <log><date>27/03/2025</date><workout>Pull A</workout><time>18h30</time>\
             <exercise>Traction</exercise><reps>10</reps><weight>0,00 kg</weight></log>\
        <log><date>27/03/2025</date><workout>Pull A</workout><time>18h30</time>\
             <exercise>Face pull</exercise><reps>15</reps><weight>25 kg</weight></log>\
      </logs>";
    let report = pipeline
        .import_bytes(InputFormat::Xml, xml.as_bytes(), ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(report.inserted, 2);

    // alias resolution hit the seed catalog; the unknown name was registered
    let pull_up = store.find_exercise("pull-up").await.unwrap().unwrap();
    assert_eq!(pull_up.main_region.as_deref(), Some("Back"));
    let face_pull = store.find_exercise("face-pull").await.unwrap().unwrap();
    assert_eq!(face_pull.main_region, None);

    // body-weight zero stays distinct from missing
    let sessions = store.list_session_sets(Some("pull-up"), None).await.unwrap();
    assert_eq!(sessions[0].sets[0].weight_kg, Some(0.0));
}

#[tokio::test]
async fn rolling_features_from_persisted_history() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    let pipeline = EtlPipeline::new(EtlConfig::default(), store.clone());

    let csv = format!(
        "{HEADER}\n{}{}{}",
        csv_row("01/03/2025", "Push", "Développé couché", "8", "80 kg", "Non"),
        csv_row("05/03/2025", "Push", "Développé couché", "8", "82,5 kg", "Non"),
        csv_row("20/03/2025", "Push", "Développé couché", "8", "85 kg", "Non"),
    );
    pipeline
        .import_bytes(InputFormat::Csv, csv.as_bytes(), ImportOptions::default())
        .await
        .unwrap();

    let sessions = store
        .list_session_sets(
            Some("bench-press"),
            Some((
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            )),
        )
        .await
        .unwrap();
    assert_eq!(sessions.len(), 3);

    let calculator = FeatureCalculator::default();
    let records = calculator.exercise_features(&sessions, "bench-press");

    let rolling: Vec<_> = records
        .iter()
        .filter(|r| r.metric == Metric::RollingVolume7d)
        .collect();
    assert_eq!(rolling.len(), 3);
    // 05/03 window covers both early sessions; 20/03 stands alone
    assert!((rolling[1].value - (640.0 + 660.0)).abs() < f64::EPSILON);
    assert!((rolling[2].value - 680.0).abs() < f64::EPSILON);

    let best = records.iter().find(|r| r.metric == Metric::BestOneRm).unwrap();
    let current = records
        .iter()
        .find(|r| r.metric == Metric::CurrentOneRm)
        .unwrap();
    // monotonic progression: the newest session holds the best estimate
    assert!((best.value - current.value).abs() < f64::EPSILON);
}

#[tokio::test]
async fn incremental_import_skips_known_dates_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    let pipeline = EtlPipeline::new(EtlConfig::default(), store.clone());

    let seed = format!(
        "{HEADER}\n{}",
        csv_row("27/03/2025", "Push", "Squat", "5", "100 kg", "Non")
    );
    pipeline
        .import_bytes(InputFormat::Csv, seed.as_bytes(), ImportOptions::default())
        .await
        .unwrap();

    let update = format!(
        "{HEADER}\n{}{}",
        csv_row("27/03/2025", "Push", "Squat", "5", "100 kg", "Non"),
        csv_row("29/03/2025", "Push", "Squat", "5", "102,5 kg", "Non"),
    );
    let report = pipeline
        .import_bytes(
            InputFormat::Csv,
            update.as_bytes(),
            ImportOptions {
                incremental: true,
                reference_date: NaiveDate::from_ymd_opt(2025, 3, 30),
            },
        )
        .await
        .unwrap();

    assert_eq!(report.filtered_incremental, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(store.list_session_dates().await.unwrap().len(), 2);
}
