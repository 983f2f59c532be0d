//! The report runner: load the tables, work through the analysis
//! stages in order, render the document.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lexnet::config::Args;
use lexnet::ergm::{attribute_model, structural_model, NetState};
use lexnet::gof::goodness_of_fit;
use lexnet::report::{self, ErgmSection, ReportData};
use lexnet::{
    assortativity_report, build_aggregate, build_layers, collapse_undirected, describe_networks,
    detect_communities, load_dataset, Relation,
};

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!(version = lexnet::version(), seed = args.seed, "lexnet report run");

    // Stage 1: inputs
    let dataset = load_dataset(&args.data_dir)
        .with_context(|| format!("loading input tables from {}", args.data_dir.display()))?;
    info!(lawyers = dataset.roster.len(), "dataset loaded");

    // Stage 2: graphs
    let layers = build_layers(&dataset);
    let aggregate = build_aggregate(&dataset);
    let undirected = collapse_undirected(&aggregate, dataset.roster.len());

    // Stage 3: descriptives with configuration-model baselines
    let descriptives = describe_networks(&layers, &aggregate, args.null_replicates, args.seed)
        .context("configuration-model baselines")?;

    // Stage 4: assortative mixing
    let assortativity = assortativity_report(&dataset.roster, &layers);

    // Stage 5: communities on the aggregate
    let community = detect_communities(&dataset.roster, &aggregate.view, &undirected, args.seed);

    // Stage 6: ERGMs. Attribute models on every layer; the friendship
    // layer also gets the structural model with reciprocity and triadic
    // closure. A non-converged or degenerate fit is carried into the
    // report as a failure, never as coefficients.
    let mut ergm_sections = Vec::new();
    let mut structural_fit = None;
    for (stage, layer) in layers.iter().enumerate() {
        let observed = NetState::from_view(&layer.view);
        let model = attribute_model("attributes", &dataset.roster);
        let section = match lexnet::ergm::fit(
            &model,
            layer.relation.name(),
            &observed,
            &args.fit_config(stage as u64),
        ) {
            Ok(fit) => ErgmSection {
                network: layer.relation.name().to_string(),
                model: model.label.clone(),
                fit: Some(fit),
                failure: None,
            },
            Err(err) => ErgmSection {
                network: layer.relation.name().to_string(),
                model: model.label.clone(),
                fit: None,
                failure: Some(err.to_string()),
            },
        };
        ergm_sections.push(section);

        if layer.relation == Relation::Friendship {
            let model = structural_model("attributes + structure", &dataset.roster);
            match lexnet::ergm::fit(
                &model,
                layer.relation.name(),
                &observed,
                &args.fit_config(100 + stage as u64),
            ) {
                Ok(fit) => {
                    let estimates: Vec<f64> =
                        fit.coefficients.iter().map(|c| c.estimate).collect();
                    structural_fit = Some((model.clone(), fit, estimates, observed.clone()));
                    ergm_sections.push(ErgmSection {
                        network: layer.relation.name().to_string(),
                        model: model.label.clone(),
                        fit: structural_fit.as_ref().map(|(_, f, _, _)| f.clone()),
                        failure: None,
                    });
                }
                Err(err) => ergm_sections.push(ErgmSection {
                    network: layer.relation.name().to_string(),
                    model: model.label.clone(),
                    fit: None,
                    failure: Some(err.to_string()),
                }),
            }
        }
    }

    // Stage 7: goodness-of-fit for the structural model, when it fit
    let gof = structural_fit.map(|(model, fit, estimates, observed)| {
        goodness_of_fit(
            &model,
            &fit.network,
            &estimates,
            &observed,
            &args.gof_config(),
        )
    });

    // Stage 8: render
    let data = ReportData {
        generated_at: ReportData::timestamp_now(),
        seed: args.seed,
        lawyer_count: dataset.roster.len(),
        layer_tie_counts: dataset
            .layers
            .iter()
            .map(|l| (l.relation.name().to_string(), l.edges.len()))
            .collect(),
        null_replicates: args.null_replicates,
        descriptives,
        assortativity,
        community,
        ergm: ergm_sections,
        gof,
    };
    report::write_report(&data, &args.out_dir)?;
    if args.json {
        report::write_json(&data, &args.out_dir)?;
    }
    report::console_summary(&data);

    Ok(())
}
