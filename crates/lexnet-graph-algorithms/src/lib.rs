pub mod assortativity;
pub mod common;
pub mod community;
pub mod metrics;
pub mod nullmodel;

pub use assortativity::{nominal_assortativity, numeric_assortativity};
pub use common::{DiGraphView, UGraphView};
pub use community::{label_propagation, louvain, modularity, refine_connected, Partition};
pub use metrics::{compute_metrics, density, mean_path_length, reciprocity, transitivity, GraphMetrics};
pub use nullmodel::{configuration_model, null_model_means, NullModelError, NullModelResult};
