//! Assortative mixing of node attributes within each tie layer.

use serde::Serialize;

use lexnet_graph_algorithms::{nominal_assortativity, numeric_assortativity};

use crate::data::{CategoricalAttr, NumericAttr, Roster};
use crate::graph::LayerGraph;

/// One attribute's coefficient per layer, aligned with `layer_names`
#[derive(Debug, Clone, Serialize)]
pub struct AssortativityRow {
    pub attribute: String,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssortativityReport {
    pub layer_names: Vec<String>,
    pub nominal: Vec<AssortativityRow>,
    pub numeric: Vec<AssortativityRow>,
}

/// Nominal coefficients for the categorical attributes and numeric
/// coefficients for age and seniority, per layer, direction respected.
pub fn assortativity_report(roster: &Roster, layers: &[LayerGraph]) -> AssortativityReport {
    let layer_names = layers
        .iter()
        .map(|l| l.relation.name().to_string())
        .collect();

    let nominal = CategoricalAttr::ALL
        .iter()
        .map(|&attr| {
            let codes = roster.category_codes(attr);
            AssortativityRow {
                attribute: attr.name().to_string(),
                coefficients: layers
                    .iter()
                    .map(|l| nominal_assortativity(&l.view, &codes))
                    .collect(),
            }
        })
        .collect();

    let numeric = NumericAttr::ALL
        .iter()
        .map(|&attr| {
            let values = roster.numeric_values(attr);
            AssortativityRow {
                attribute: attr.name().to_string(),
                coefficients: layers
                    .iter()
                    .map(|l| numeric_assortativity(&l.view, &values))
                    .collect(),
            }
        })
        .collect();

    AssortativityReport {
        layer_names,
        nominal,
        numeric,
    }
}
