//! End-to-end pipeline tests over the bundled sample dataset.

use std::io::Write;
use std::path::Path;

use lexnet::config::DEFAULT_SEED;
use lexnet::data::{load_dataset, DataError};
use lexnet::ergm::{attribute_model, structural_model, FitConfig, NetState};
use lexnet::gof::{goodness_of_fit, GofConfig};
use lexnet::report::{render_markdown, write_report, ErgmSection, ReportData};
use lexnet::{
    assortativity_report, build_aggregate, build_layers, collapse_undirected, describe_networks,
    detect_communities,
};

fn sample_dir() -> &'static Path {
    Path::new("demos/sample-firm")
}

#[test]
fn sample_dataset_loads_and_validates() {
    let dataset = load_dataset(sample_dir()).unwrap();
    assert_eq!(dataset.roster.len(), 12);
    assert_eq!(dataset.layers.len(), 3);
    for layer in &dataset.layers {
        assert!(!layer.edges.is_empty());
        for &(u, v) in &layer.edges {
            assert!(u < 12 && v < 12 && u != v);
        }
    }
}

#[test]
fn aggregate_weights_count_distinct_layers() {
    let dataset = load_dataset(sample_dir()).unwrap();
    let aggregate = build_aggregate(&dataset);
    for edge in &aggregate.edges {
        assert!((1..=3).contains(&edge.weight));
        assert_eq!(edge.weight as usize, edge.layers.len());
    }
    // 1 -> 2 appears in advice, cowork and friendship
    let dataset_idx = |id: u32| dataset.roster.index_of(id).unwrap();
    let shared = aggregate
        .edges
        .iter()
        .find(|e| e.from == dataset_idx(1) && e.to == dataset_idx(2))
        .unwrap();
    assert_eq!(shared.weight, 3);
}

#[test]
fn descriptives_stay_in_bounds() {
    let dataset = load_dataset(sample_dir()).unwrap();
    let layers = build_layers(&dataset);
    let aggregate = build_aggregate(&dataset);
    let rows = describe_networks(&layers, &aggregate, 25, DEFAULT_SEED).unwrap();
    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert!(row.observed.density > 0.0 && row.observed.density <= 1.0);
        assert!(row.observed.reciprocity >= 0.0 && row.observed.reciprocity <= 1.0);
        assert!(row.observed.transitivity >= 0.0 && row.observed.transitivity <= 1.0);
        if let Some(null) = &row.null_mean {
            assert!((null.density - row.observed.density).abs() < 1e-12);
            assert!(null.reciprocity >= 0.0 && null.reciprocity <= 1.0);
            assert!(null.transitivity >= 0.0 && null.transitivity <= 1.0);
        }
    }
    // friendship is mostly reciprocal in the sample data
    let friendship = rows.iter().find(|r| r.network == "friendship").unwrap();
    assert!(friendship.observed.reciprocity > 0.8);
}

#[test]
fn community_partition_covers_every_lawyer() {
    let dataset = load_dataset(sample_dir()).unwrap();
    let aggregate = build_aggregate(&dataset);
    let undirected = collapse_undirected(&aggregate, dataset.roster.len());
    let report = detect_communities(&dataset.roster, &aggregate.view, &undirected, DEFAULT_SEED);

    assert_eq!(report.labels.len(), 12);
    assert_eq!(report.community_sizes.iter().sum::<usize>(), 12);
    for alignment in &report.alignment {
        assert!(alignment.purity > 0.0 && alignment.purity <= 1.0);
    }
    // crosstab cells sum to the node count
    assert_eq!(report.crosstab.iter().flatten().sum::<usize>(), 12);
}

#[test]
fn assortativity_respects_direction_and_bounds() {
    let dataset = load_dataset(sample_dir()).unwrap();
    let layers = build_layers(&dataset);
    let report = assortativity_report(&dataset.roster, &layers);
    for row in report.nominal.iter().chain(report.numeric.iter()) {
        for &c in &row.coefficients {
            assert!(c.is_nan() || (-1.0 - 1e-9..=1.0 + 1e-9).contains(&c));
        }
    }
}

#[test]
fn full_report_renders_with_fitted_or_failed_models() {
    let dataset = load_dataset(sample_dir()).unwrap();
    let layers = build_layers(&dataset);
    let aggregate = build_aggregate(&dataset);
    let undirected = collapse_undirected(&aggregate, dataset.roster.len());

    let descriptives = describe_networks(&layers, &aggregate, 10, DEFAULT_SEED).unwrap();
    let assortativity = assortativity_report(&dataset.roster, &layers);
    let community = detect_communities(&dataset.roster, &aggregate.view, &undirected, DEFAULT_SEED);

    // Small simulation sizes keep the test quick; a failed fit is an
    // acceptable outcome and must flow into the report as a failure
    let config = FitConfig {
        burn_in: 1_000,
        interval: 30,
        sample_size: 200,
        max_iterations: 10,
        tolerance: 0.3,
        seed: DEFAULT_SEED,
    };
    let friendship = layers.iter().find(|l| l.relation.name() == "friendship").unwrap();
    let observed = NetState::from_view(&friendship.view);
    let model = structural_model("attributes + structure", &dataset.roster);
    let (fit, failure, gof) = match lexnet::ergm::fit(&model, "friendship", &observed, &config) {
        Ok(fit) => {
            let estimates: Vec<f64> = fit.coefficients.iter().map(|c| c.estimate).collect();
            let gof = goodness_of_fit(
                &model,
                "friendship",
                &estimates,
                &observed,
                &GofConfig {
                    simulations: 20,
                    burn_in: 1_000,
                    interval: 200,
                    seed: DEFAULT_SEED,
                },
            );
            (Some(fit), None, Some(gof))
        }
        Err(err) => (None, Some(err.to_string()), None),
    };

    let data = ReportData {
        generated_at: "2026-08-06 12:00:00".to_string(),
        seed: DEFAULT_SEED,
        lawyer_count: dataset.roster.len(),
        layer_tie_counts: dataset
            .layers
            .iter()
            .map(|l| (l.relation.name().to_string(), l.edges.len()))
            .collect(),
        null_replicates: 10,
        descriptives,
        assortativity,
        community,
        ergm: vec![ErgmSection {
            network: "friendship".to_string(),
            model: model.label.clone(),
            fit,
            failure,
        }],
        gof,
    };

    let doc = render_markdown(&data);
    assert!(doc.contains("## Descriptive statistics"));
    assert!(doc.contains("friendship"));

    let dir = tempfile::tempdir().unwrap();
    write_report(&data, dir.path()).unwrap();
    assert!(dir.path().join("report.md").exists());
    if data.gof.is_some() {
        assert!(dir.path().join("figures").join("gof-in-degree.svg").exists());
    }
}

#[test]
fn attribute_model_mple_runs_on_sample_data() {
    let dataset = load_dataset(sample_dir()).unwrap();
    let layers = build_layers(&dataset);
    let advice = &layers[0];
    let observed = NetState::from_view(&advice.view);
    let model = attribute_model("attributes", &dataset.roster);
    let theta = lexnet::ergm::mple(&model, &observed).unwrap();
    assert_eq!(theta.len(), model.dim());
    assert!(theta.iter().all(|t| t.is_finite()));
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

#[test]
fn edge_referencing_unknown_lawyer_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "attributes.csv",
        "id,status,gender,office,age,practice,seniority\n1,1,1,1,40,1,10\n2,2,2,2,30,2,3\n",
    );
    write_file(dir.path(), "advice.csv", "from,to\n1,2\n1,99\n");
    write_file(dir.path(), "cowork.csv", "from,to\n");
    write_file(dir.path(), "friendship.csv", "from,to\n");

    let err = load_dataset(dir.path()).unwrap_err();
    match err {
        DataError::UnknownNode { row, id, .. } => {
            assert_eq!(id, 99);
            assert_eq!(row, 3);
        }
        other => panic!("expected UnknownNode, got {other}"),
    }
}

#[test]
fn self_loop_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "attributes.csv",
        "id,status,gender,office,age,practice,seniority\n1,1,1,1,40,1,10\n",
    );
    write_file(dir.path(), "advice.csv", "from,to\n1,1\n");
    write_file(dir.path(), "cowork.csv", "from,to\n");
    write_file(dir.path(), "friendship.csv", "from,to\n");

    assert!(matches!(
        load_dataset(dir.path()).unwrap_err(),
        DataError::SelfLoop { id: 1, .. }
    ));
}

#[test]
fn malformed_attribute_code_is_reported_with_row() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "attributes.csv",
        "id,status,gender,office,age,practice,seniority\n1,1,1,1,40,1,10\n2,9,1,1,30,1,2\n",
    );
    write_file(dir.path(), "advice.csv", "from,to\n");
    write_file(dir.path(), "cowork.csv", "from,to\n");
    write_file(dir.path(), "friendship.csv", "from,to\n");

    match load_dataset(dir.path()).unwrap_err() {
        DataError::UnknownCode { row, column, code } => {
            assert_eq!(row, 3);
            assert_eq!(column, "status");
            assert_eq!(code, 9);
        }
        other => panic!("expected UnknownCode, got {other}"),
    }
}

#[test]
fn duplicate_edge_rows_collapse_to_one_tie() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "attributes.csv",
        "id,status,gender,office,age,practice,seniority\n1,1,1,1,40,1,10\n2,2,2,2,30,2,3\n",
    );
    write_file(dir.path(), "advice.csv", "from,to\n1,2\n1,2\n1,2\n");
    write_file(dir.path(), "cowork.csv", "from,to\n");
    write_file(dir.path(), "friendship.csv", "from,to\n");

    let dataset = load_dataset(dir.path()).unwrap();
    assert_eq!(dataset.layers[0].edges, vec![(0, 1)]);
}
