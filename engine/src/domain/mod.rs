//! Network-side resolution of global filters

pub mod combine;
pub mod criteria;
pub mod evaluator;
pub mod network;
pub mod service;

pub use combine::combine_filter_results;
pub use evaluator::{FilterRefs, NetworkFilterEvaluator};
pub use service::FilterService;
