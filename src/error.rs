use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Preprocessing error: {0}")]
    Preprocessing(String),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Tree search error: {0}")]
    TreeSearch(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
