//! Exponential random graph models.
//!
//! Tie formation in each layer is modeled as a function of node
//! attributes; the friendship layer additionally gets the structural
//! terms (reciprocity and geometrically-weighted triadic closure). The
//! attribute terms use partner as the status reference level, so the
//! reported sender/receiver effects are those of being an associate.

pub mod fit;
pub mod sampler;
pub mod state;
pub mod terms;

pub use fit::{fit, inference_rows, mple, CoefRow, Fit, FitConfig};
pub use sampler::Sampler;
pub use state::NetState;
pub use terms::{Model, Term};

use thiserror::Error;

use crate::data::{CategoricalAttr, NumericAttr, Roster, Status};

/// Fixed decay for the shared-partner term. 0.5 is the conventional
/// fixed-decay choice; the report records it next to the estimate.
pub const GWESP_DECAY: f64 = 0.5;

#[derive(Error, Debug)]
pub enum ErgmError {
    #[error("model {model}: MCMLE did not converge within {iterations} iterations")]
    NotConverged { model: String, iterations: usize },

    #[error("model {model}: near-degenerate simulation ({reason})")]
    Degenerate { model: String, reason: String },

    #[error("model {model}: singular information matrix")]
    Singular { model: String },

    #[error("model {model}: pseudolikelihood estimation diverged")]
    MpleDiverged { model: String },
}

pub type ErgmResult<T> = Result<T, ErgmError>;

/// Attribute-only model: density baseline, age main effect, associate
/// sender/receiver effects, and homophily on gender, office, practice.
pub fn attribute_model(label: &str, roster: &Roster) -> Model {
    let associate: Vec<bool> = roster.iter().map(|l| l.status == Status::Associate).collect();
    Model::new(
        label,
        vec![
            Term::Edges,
            Term::NodeCov {
                label: NumericAttr::Age.name().to_string(),
                values: roster.numeric_values(NumericAttr::Age),
            },
            Term::NodeInFactor {
                label: "status.associate".to_string(),
                indicator: associate.clone(),
            },
            Term::NodeOutFactor {
                label: "status.associate".to_string(),
                indicator: associate,
            },
            Term::NodeMatch {
                label: CategoricalAttr::Gender.name().to_string(),
                codes: roster.category_codes(CategoricalAttr::Gender),
            },
            Term::NodeMatch {
                label: CategoricalAttr::Office.name().to_string(),
                codes: roster.category_codes(CategoricalAttr::Office),
            },
            Term::NodeMatch {
                label: CategoricalAttr::Practice.name().to_string(),
                codes: roster.category_codes(CategoricalAttr::Practice),
            },
        ],
    )
}

/// Attribute model plus the structural terms: reciprocity and
/// geometrically-weighted edgewise shared partners.
pub fn structural_model(label: &str, roster: &Roster) -> Model {
    let mut terms = attribute_model(label, roster).terms().to_vec();
    terms.push(Term::Mutual);
    terms.push(Term::Gwesp { decay: GWESP_DECAY });
    Model::new(label, terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Gender, Lawyer, Office, Practice, Roster};

    fn roster() -> Roster {
        let lawyers = (0..4)
            .map(|i| Lawyer {
                id: i + 1,
                status: if i < 2 { Status::Partner } else { Status::Associate },
                gender: Gender::Man,
                office: Office::Boston,
                age: 40 + i,
                practice: Practice::Litigation,
                seniority: 5,
            })
            .collect();
        Roster::new(lawyers).unwrap()
    }

    #[test]
    fn attribute_model_has_seven_terms() {
        let model = attribute_model("advice", &roster());
        assert_eq!(model.dim(), 7);
        assert_eq!(model.term_labels()[0], "edges");
        assert!(model.term_labels().contains(&"nodematch.office".to_string()));
    }

    #[test]
    fn structural_model_appends_mutual_and_gwesp() {
        let model = structural_model("friendship", &roster());
        assert_eq!(model.dim(), 9);
        let labels = model.term_labels();
        assert_eq!(labels[7], "mutual");
        assert_eq!(labels[8], format!("gwesp({GWESP_DECAY})"));
    }
}
