use thiserror::Error;

use crate::analyzer::AnalyzerError;

#[derive(Error, Debug)]
pub enum TextlensError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing API key: set {0} in the environment or a .env file")]
    MissingApiKey(String),

    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
}
