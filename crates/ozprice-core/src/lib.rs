mod app_config;
pub mod article;
pub mod config;
pub mod outcome;
pub mod record;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, UrlForm};
pub use article::ArticleId;
pub use config::{load_app_config, load_app_config_from_env};
pub use outcome::{ArticleResult, BatchResult, FailureReason, FetchOutcome};
pub use record::PriceRecord;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid article id \"{0}\": must be a positive integer")]
    InvalidArticleId(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
