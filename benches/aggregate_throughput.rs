use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use encoding_rs::UTF_8;
use survey_inclusion::aggregate::{proportions_by_group, value_counts};
use survey_inclusion::analysis;
use survey_inclusion::config::SurveyConfig;
use survey_inclusion::dataset::Dataset;
use tempfile::TempDir;

fn generate_respondents(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("respondents.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "CH04,CH06,NIVEL_ED,IP_III_04,IP_III_05,IP_III_06,IH_II_02,ITF,PONDERA")
        .expect("header");
    for i in 0..rows {
        let sex = (i % 2) + 1;
        let age = i % 90;
        let education = (i % 7) + 1;
        let computer = if i % 3 == 0 { 2 } else { 1 };
        let internet = if i % 5 == 0 { 2 } else { 1 };
        let household = if i % 4 == 0 { 2 } else { 1 };
        let income = (i * 37) % 250_000;
        let weight = (i % 400) + 50;
        writeln!(
            file,
            "{sex},{age},{education},{computer},1,{internet},{household},{income},{weight}"
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_aggregation(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_respondents(50_000);
    let dataset = Dataset::from_csv_path(&csv_path, b',', UTF_8).expect("load dataset");
    let config = SurveyConfig::default();

    let groups = (0..50_000)
        .map(|i| Some(format!("group-{}", i % 12)))
        .collect::<Vec<_>>();
    let flags = (0..50_000).map(|i| i % 3 == 0).collect::<Vec<_>>();
    let weights = (0..50_000)
        .map(|i| Some(((i % 400) + 50) as f64))
        .collect::<Vec<_>>();

    let mut group = c.benchmark_group("aggregate");

    group.bench_function("weighted_value_counts", |b| {
        b.iter(|| value_counts(&groups, Some(weights.as_slice())));
    });

    group.bench_function("weighted_proportions_by_group", |b| {
        b.iter(|| proportions_by_group(&groups, &flags, Some(weights.as_slice())));
    });

    group.bench_function("full_analysis", |b| {
        b.iter_batched(
            || (),
            |_| {
                analysis::analyze(&dataset, &config).expect("analysis");
            },
            BatchSize::SmallInput,
        );
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_aggregation);
criterion_main!(benches);
