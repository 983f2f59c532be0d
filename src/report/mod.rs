//! Report assembly: one Markdown document with tables, narrative, and
//! links to the SVG figures, plus a console summary and an optional
//! machine-readable JSON dump.

pub mod plots;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use tracing::info;

use crate::assort::AssortativityReport;
use crate::community::CommunityReport;
use crate::descriptives::NetworkDescriptives;
use crate::ergm::Fit;
use crate::gof::GofReport;

/// One network's model fit, or the failure that prevented it
#[derive(Debug, Clone, Serialize)]
pub struct ErgmSection {
    pub network: String,
    pub model: String,
    pub fit: Option<Fit>,
    pub failure: Option<String>,
}

/// Everything the rendered document needs, in presentation order
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub generated_at: String,
    pub seed: u64,
    pub lawyer_count: usize,
    pub layer_tie_counts: Vec<(String, usize)>,
    pub null_replicates: usize,
    pub descriptives: Vec<NetworkDescriptives>,
    pub assortativity: AssortativityReport,
    pub community: CommunityReport,
    pub ergm: Vec<ErgmSection>,
    pub gof: Option<GofReport>,
}

impl ReportData {
    pub fn timestamp_now() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn fmt(value: f64) -> String {
    if value.is_nan() {
        "NA".to_string()
    } else {
        format!("{value:.3}")
    }
}

fn md_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!(
        "|{}\n",
        header.iter().map(|_| "---|").collect::<String>()
    ));
    for row in rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out
}

fn metric_row(name: &str, d: &NetworkDescriptives) -> Vec<String> {
    let mut row = vec![
        name.to_string(),
        fmt(d.observed.density),
        fmt(d.observed.mean_path_length),
        fmt(d.observed.reciprocity),
        fmt(d.observed.transitivity),
    ];
    match &d.null_mean {
        Some(null) => row.extend([
            fmt(null.mean_path_length),
            fmt(null.reciprocity),
            fmt(null.transitivity),
        ]),
        None => row.extend(["NA".to_string(), "NA".to_string(), "NA".to_string()]),
    }
    row
}

/// Render the full Markdown document
pub fn render_markdown(data: &ReportData) -> String {
    let mut doc = String::new();

    doc.push_str("# Collegial ties in a corporate law firm\n\n");
    doc.push_str(&format!(
        "Generated {} with base seed {}. All Monte Carlo quantities \
         (configuration-model baselines, MCMC fits, goodness-of-fit \
         envelopes) derive from this seed and reproduce exactly.\n\n",
        data.generated_at, data.seed
    ));

    doc.push_str("## Data\n\n");
    doc.push_str(&format!(
        "{} lawyers observed on three directed tie layers: {}.\n\n",
        data.lawyer_count,
        data.layer_tie_counts
            .iter()
            .map(|(name, ties)| format!("{name} ({ties} ties)"))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    doc.push_str("## Descriptive statistics\n\n");
    doc.push_str(&format!(
        "Null columns are means over {} degree-preserving randomizations \
         per layer (configuration model); density is fixed by the degree \
         sequence and omitted from the null columns.\n\n",
        data.null_replicates
    ));
    let header: Vec<String> = [
        "network",
        "density",
        "mean path",
        "reciprocity",
        "transitivity",
        "null path",
        "null recip.",
        "null trans.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let rows: Vec<Vec<String>> = data
        .descriptives
        .iter()
        .map(|d| metric_row(&d.network, d))
        .collect();
    doc.push_str(&md_table(&header, &rows));
    doc.push('\n');
    for d in &data.descriptives {
        if let Some(null) = &d.null_mean {
            if d.observed.reciprocity > 2.0 * null.reciprocity {
                doc.push_str(&format!(
                    "The {} layer reciprocates far more than its degree \
                     sequence predicts ({} observed against {} under the \
                     null), a first sign of genuinely dyadic exchange.\n\n",
                    d.network,
                    fmt(d.observed.reciprocity),
                    fmt(null.reciprocity)
                ));
            }
        }
    }

    doc.push_str("## Assortative mixing\n\n");
    doc.push_str(
        "Nominal coefficients for categorical attributes, Pearson \
         coefficients across edge endpoints for numeric ones; positive \
         values mean ties form preferentially between similar lawyers.\n\n",
    );
    let mut header: Vec<String> = vec!["attribute".to_string()];
    header.extend(data.assortativity.layer_names.iter().cloned());
    let rows: Vec<Vec<String>> = data
        .assortativity
        .nominal
        .iter()
        .chain(data.assortativity.numeric.iter())
        .map(|row| {
            let mut cells = vec![row.attribute.clone()];
            cells.extend(row.coefficients.iter().map(|&c| fmt(c)));
            cells
        })
        .collect();
    doc.push_str(&md_table(&header, &rows));
    doc.push('\n');

    doc.push_str("## Community structure\n\n");
    let header: Vec<String> = ["method", "communities", "modularity"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = data
        .community
        .methods
        .iter()
        .map(|m| vec![m.method.clone(), m.communities.to_string(), fmt(m.modularity)])
        .collect();
    doc.push_str(&md_table(&header, &rows));
    doc.push('\n');
    if data.community.single_community {
        doc.push_str(
            "The final partition collapses to a single community: the \
             aggregate network carries no detectable group structure.\n\n",
        );
    } else {
        doc.push_str(&format!(
            "Final partition ({}): {} communities of sizes {:?}, \
             modularity {}. The refinement step is kept because it \
             guarantees internally connected communities.\n\n",
            data.community.final_method,
            data.community.community_sizes.len(),
            data.community.community_sizes,
            fmt(data.community.modularity)
        ));
    }
    let header: Vec<String> = ["attribute", "purity", "assortativity"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = data
        .community
        .alignment
        .iter()
        .map(|a| vec![a.attribute.clone(), fmt(a.purity), fmt(a.assortativity)])
        .collect();
    doc.push_str(&md_table(&header, &rows));
    doc.push('\n');

    doc.push_str("## Exponential random graph models\n\n");
    doc.push_str(
        "Estimates are log-odds of a tie; the odds ratio column is the \
         exponentiated estimate with a 95% Wald interval.\n\n",
    );
    for section in &data.ergm {
        doc.push_str(&format!("### {} — {}\n\n", section.network, section.model));
        match (&section.fit, &section.failure) {
            (Some(fit), _) => {
                let header: Vec<String> =
                    ["term", "estimate", "s.e.", "z", "p", "odds ratio", "95% CI"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect();
                let rows: Vec<Vec<String>> = fit
                    .coefficients
                    .iter()
                    .map(|c| {
                        vec![
                            c.term.clone(),
                            fmt(c.estimate),
                            fmt(c.std_err),
                            fmt(c.z),
                            fmt(c.p_value),
                            fmt(c.odds_ratio),
                            format!("[{}, {}]", fmt(c.or_ci_low), fmt(c.or_ci_high)),
                        ]
                    })
                    .collect();
                doc.push_str(&md_table(&header, &rows));
                doc.push_str(&format!(
                    "\nConverged after {} MCMLE iterations ({} simulated \
                     networks per iteration).\n\n",
                    fit.iterations, fit.sample_size
                ));
            }
            (None, Some(failure)) => {
                doc.push_str(&format!(
                    "Fit failed: {failure}. The estimates are not usable; \
                     no coefficients are reported for this model.\n\n"
                ));
            }
            (None, None) => doc.push_str("Fit not attempted.\n\n"),
        }
    }

    doc.push_str("## Goodness of fit\n\n");
    match &data.gof {
        Some(gof) => {
            doc.push_str(&format!(
                "{} networks simulated from the fitted {} model on the {} \
                 layer. Each table row gives the observed proportion and \
                 the simulated mean with a central 95% band; observed \
                 values escaping the band mark distributions the model \
                 fails to reproduce.\n\n",
                gof.simulations, gof.model, gof.network
            ));
            for stat in &gof.statistics {
                doc.push_str(&format!("### {}\n\n", stat.name));
                doc.push_str(&format!(
                    "![{}](figures/gof-{}.svg)\n\n",
                    stat.name,
                    plots::slug(&stat.name)
                ));
                let header: Vec<String> = ["bin", "observed", "sim. mean", "2.5%", "97.5%"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                let rows: Vec<Vec<String>> = stat
                    .bins
                    .iter()
                    .enumerate()
                    .map(|(i, bin)| {
                        vec![
                            bin.clone(),
                            fmt(stat.observed[i]),
                            fmt(stat.sim_mean[i]),
                            fmt(stat.sim_lower[i]),
                            fmt(stat.sim_upper[i]),
                        ]
                    })
                    .collect();
                doc.push_str(&md_table(&header, &rows));
                doc.push('\n');
            }
        }
        None => doc.push_str(
            "No goodness-of-fit simulation: the structural model did not \
             produce a usable fit.\n\n",
        ),
    }

    doc
}

/// Write the Markdown document and its figures under `out_dir`
pub fn write_report(data: &ReportData, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    if let Some(gof) = &data.gof {
        let figures = out_dir.join("figures");
        fs::create_dir_all(&figures)
            .with_context(|| format!("creating figures directory {}", figures.display()))?;
        for stat in &gof.statistics {
            let path = figures.join(format!("gof-{}.svg", plots::slug(&stat.name)));
            plots::gof_figure(&path, stat)
                .with_context(|| format!("rendering {}", path.display()))?;
        }
    }

    let path = out_dir.join("report.md");
    fs::write(&path, render_markdown(data))
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

/// Write the machine-readable dump next to the report
pub fn write_json(data: &ReportData, out_dir: &Path) -> Result<()> {
    let path = out_dir.join("results.json");
    let file = fs::File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, data).context("serializing results")?;
    info!(path = %path.display(), "results dumped");
    Ok(())
}

/// Compact console summary of the headline numbers
pub fn console_summary(data: &ReportData) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "network",
        "density",
        "mean path",
        "reciprocity",
        "transitivity",
    ]);
    for d in &data.descriptives {
        table.add_row(vec![
            d.network.clone(),
            fmt(d.observed.density),
            fmt(d.observed.mean_path_length),
            fmt(d.observed.reciprocity),
            fmt(d.observed.transitivity),
        ]);
    }
    println!("{table}");
    println!(
        "communities: {} (modularity {})",
        data.community.community_sizes.len(),
        fmt(data.community.modularity)
    );
    for section in &data.ergm {
        match (&section.fit, &section.failure) {
            (Some(fit), _) => println!(
                "{} {}: converged in {} iterations",
                section.network, section.model, fit.iterations
            ),
            (None, Some(failure)) => {
                println!("{} {}: FAILED ({failure})", section.network, section.model)
            }
            (None, None) => {}
        }
    }
}
