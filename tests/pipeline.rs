use proptest::prelude::*;

use survey_tidy::aggregate::{Denominator, aggregate};
use survey_tidy::chart::{ChartData, ChartSpec};
use survey_tidy::frame::SurveyFrame;
use survey_tidy::gender::GenderCache;
use survey_tidy::io_utils;
use survey_tidy::metadata::MetadataStore;
use survey_tidy::pipeline::{QuestionOutcome, run_question};

mod common;

use common::{TestWorkspace, sample_export};

fn load_sample() -> SurveyFrame {
    let ws = TestWorkspace::new();
    let input = ws.write("export.csv", &sample_export());
    let encoding = io_utils::resolve_encoding(None).expect("utf-8");
    SurveyFrame::load(&input, b',', encoding, "ResponseId").expect("load sample export")
}

fn chart_for(question: &str, cache: &mut GenderCache) -> ChartSpec {
    let frame = load_sample();
    let store = MetadataStore::builtin();
    match run_question(&frame, &store, cache, question, 2025).expect("run question") {
        QuestionOutcome::Chart(spec) => spec,
        QuestionOutcome::NoData => panic!("expected chart data for {question}"),
    }
}

#[test]
fn leave_durations_bin_per_career_stage() {
    let spec = chart_for("PL2", &mut GenderCache::new());
    let ChartData::Grouped {
        x_labels, series, ..
    } = &spec.data
    else {
        panic!("expected grouped chart");
    };

    // 12 weeks -> 2.76 months, 6 months, 4 weeks -> 0.92 months.
    assert_eq!(x_labels, &["0–1", "2–3", "4–6"]);
    let names: Vec<_> = series.iter().filter_map(|s| s.name.as_deref()).collect();
    assert_eq!(names, ["PhD students", "Postdocs"]);

    let phd = &series[0];
    assert_eq!(phd.counts, vec![1, 1, 0]);
    let postdocs = &series[1];
    assert_eq!(postdocs.counts, vec![0, 0, 1]);
}

#[test]
fn parent_gender_anchor_reports_all_configured_levels() {
    let spec = chart_for("DE14", &mut GenderCache::new());
    let ChartData::Categorical {
        labels,
        counts,
        percentages,
    } = &spec.data
    else {
        panic!("expected flat categorical chart");
    };

    assert_eq!(labels, &["Woman", "Man", "Non-binary person"]);
    assert_eq!(counts, &[3, 1, 0]);
    assert!((percentages[0] - 75.0).abs() < 1e-9);
    assert!((percentages[2] - 0.0).abs() < 1e-9);
}

#[test]
fn dependent_question_groups_by_resolved_parent_gender() {
    let mut cache = GenderCache::new();
    // Anchor first, as the batch runner does; the cache carries over.
    let _ = chart_for("DE14", &mut cache);
    let spec = chart_for("DE15", &mut cache);

    let ChartData::Grouped { series, .. } = &spec.data else {
        panic!("expected grouped chart");
    };
    let woman = series
        .iter()
        .find(|s| s.name.as_deref() == Some("Woman"))
        .expect("Woman series");
    let man = series
        .iter()
        .find(|s| s.name.as_deref() == Some("Man"))
        .expect("Man series");

    assert_eq!(woman.counts.iter().sum::<u64>(), 2);
    assert_eq!(man.counts.iter().sum::<u64>(), 1);
    // Shares of all answers, not within-gender shares.
    let total: f64 = series
        .iter()
        .flat_map(|s| s.percentages.iter())
        .sum();
    assert!((total - 100.0).abs() < 1e-6);
}

#[test]
fn birth_matrix_groups_decades_by_region() {
    let spec = chart_for("DE23", &mut GenderCache::new());
    let ChartData::Grouped {
        x_labels, series, ..
    } = &spec.data
    else {
        panic!("expected grouped chart");
    };

    assert_eq!(x_labels, &["2010–2019", "2020–2029"]);
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].name.as_deref(), Some("Europe"));
    assert_eq!(series[0].counts, vec![1, 1]);
    // Each decade bucket is its own denominator.
    assert!((series[0].percentages[0] - 100.0).abs() < 1e-9);
    assert!((series[0].percentages[1] - 100.0).abs() < 1e-9);
}

proptest! {
    /// Within every partition the percentage shares close to 100.
    #[test]
    fn partition_percentages_close(
        entries in proptest::collection::vec(
            ("[a-c]", "[a-e]{1,2}", 1u64..50),
            1..40,
        )
    ) {
        let rows: Vec<(Vec<String>, u64)> = entries
            .into_iter()
            .map(|(partition, label, count)| (vec![partition, label], count))
            .collect();
        let buckets = aggregate(&rows, Denominator::WithinPartition);

        let mut partition_totals: std::collections::BTreeMap<String, f64> =
            std::collections::BTreeMap::new();
        for bucket in &buckets {
            *partition_totals.entry(bucket.keys[0].clone()).or_default() += bucket.percentage;
        }
        for total in partition_totals.values() {
            prop_assert!((total - 100.0).abs() < 1e-6);
        }
    }
}
