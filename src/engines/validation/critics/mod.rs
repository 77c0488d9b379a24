pub mod base;
pub mod compliance;
pub mod data_integrity;
pub mod domain;
pub mod mathematical;
pub mod plausibility;

pub use base::{low_confidence_feedback, CodeText, Critic, Findings};
pub use compliance::RegulatoryComplianceCritic;
pub use data_integrity::DataIntegrityCritic;
pub use domain::DomainPrinciplesCritic;
pub use mathematical::MathematicalConsistencyCritic;
pub use plausibility::PlausibilityCritic;
