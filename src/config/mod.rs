pub mod traits;
pub mod evolution;
pub mod verification;
pub mod oracle;
pub mod analysis;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::EvolutionConfig;
pub use verification::VerificationConfig;
pub use oracle::OracleConfig;
pub use analysis::AnalysisConfig;
pub use traits::ConfigSection;
