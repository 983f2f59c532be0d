//! Multiplex network analysis of a corporate law firm.
//!
//! One batch pipeline over three directed tie layers (advice, cowork,
//! friendship) and a shared attribute roster:
//!
//! - descriptive statistics per layer, compared against configuration-
//!   model baselines preserving the exact degree sequences
//! - assortative mixing of categorical and numeric attributes
//! - community detection on the multiplex aggregate, with a
//!   connectivity-guaranteed final partition
//! - exponential random graph models per layer (attribute effects, plus
//!   reciprocity and triadic closure on the friendship layer) fit by
//!   MCMC maximum likelihood
//! - simulation-based goodness-of-fit for the structural model
//!
//! The pipeline reads four CSV tables, runs once, and renders a single
//! Markdown report with static figures. Pure topology lives in the
//! `lexnet-graph-algorithms` crate; everything attribute-aware is here.

#![warn(clippy::all)]

pub mod assort;
pub mod community;
pub mod config;
pub mod data;
pub mod descriptives;
pub mod ergm;
pub mod gof;
pub mod graph;
pub mod report;

pub use assort::{assortativity_report, AssortativityReport};
pub use community::{detect_communities, purity, CommunityReport};
pub use data::{load_dataset, DataError, DataResult, Dataset, Lawyer, Relation, Roster};
pub use descriptives::{describe_networks, NetworkDescriptives};
pub use ergm::{attribute_model, structural_model, ErgmError, ErgmResult, Fit, FitConfig};
pub use gof::{goodness_of_fit, GofConfig, GofReport};
pub use graph::{build_aggregate, build_layers, collapse_undirected, AggregateGraph, LayerGraph};
pub use report::{render_markdown, write_report, ReportData};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
