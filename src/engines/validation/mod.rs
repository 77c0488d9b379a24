pub mod critics;
pub mod panel;
pub mod scoring;
pub mod verification;

pub use critics::Critic;
pub use panel::CriticPanel;
pub use scoring::{check_convergence, has_blocking_issues, weighted_score};
pub use verification::{merge_suggestion, VerificationLoop, VerificationState};
