pub mod analysis;
pub mod evaluation;
pub mod generation;
pub mod metrics;
pub mod validation;
