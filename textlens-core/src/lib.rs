pub mod analyzer;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod parse;

pub use analyzer::{AnalyzerError, OpenAiAnalyzer, TextAnalyzer};
pub use config::TextlensConfig;
pub use error::TextlensError;
pub use history::HistoryStore;
pub use models::{Analysis, ProcessRequest, ProcessedRecord};
pub use parse::parse_completion;
