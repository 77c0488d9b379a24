pub mod evolution_engine;
pub mod lineage;
pub mod operators;
pub mod population;
pub mod progress;
pub mod seeds;

pub use evolution_engine::{PopulationEngine, ProgressCallback};
pub use lineage::Lineage;
pub use population::{GenerationStats, Population};
pub use progress::{ChannelProgressCallback, LogProgressCallback, ProgressMessage};
pub use seeds::{seed_population, StrategyTemplate, TEMPLATES};
