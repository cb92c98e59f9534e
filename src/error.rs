use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Nothing collected: {0}")]
    NothingCollected(String),

    #[error("Invalid collection record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("General error: {0}")]
    General(String),
}

impl CollectorError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingApiKey => vec![
                "Set TWEET_COLLECTOR_API_KEY in the environment".into(),
                "Or pass --api-key, or set [api].api_key in the config file".into(),
            ],
            Self::Request(_) | Self::HttpError(_) => vec![
                "Check network connectivity".into(),
                "Verify [api].base_url points at the API host".into(),
                "Increase the request timeout with --timeout".into(),
            ],
            Self::NothingCollected(reason) => vec![
                format!("The first page failed: {}", reason),
                "Run with --verbose to see each request".into(),
            ],
            Self::InvalidRecord(_) | Self::JsonError(_) => vec![
                "Make sure the file was written by a collection run".into(),
                "Pass --kind explicitly if auto-detection picks the wrong layout".into(),
            ],
            Self::ConfigError(_) | Self::TomlDeError(_) => vec![
                "Check configuration file syntax".into(),
                "Run 'tweet-collector config show' to inspect the merged config".into(),
                "Use --config to specify a different config file".into(),
            ],
            Self::InvalidUrl(_) => vec![
                "Ensure the URL includes a scheme (http:// or https://)".into(),
            ],
            _ => vec!["Run with --verbose for more details".into()],
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingApiKey => 2,
            Self::Request(_) | Self::HttpError(_) => 3,
            Self::NothingCollected(_) => 4,
            Self::InvalidRecord(_) | Self::JsonError(_) | Self::CsvError(_) => 5,
            Self::IoError(_) => 6,
            Self::ConfigError(_)
            | Self::TomlDeError(_)
            | Self::TomlSerError(_)
            | Self::InvalidUrl(_) => 7,
            Self::General(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_category() {
        assert_eq!(CollectorError::MissingApiKey.exit_code(), 2);
        assert_eq!(CollectorError::NothingCollected("x".into()).exit_code(), 4);
        assert_eq!(CollectorError::ConfigError("x".into()).exit_code(), 7);
        assert_eq!(CollectorError::General("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_missing_key_suggests_env_var() {
        let suggestions = CollectorError::MissingApiKey.suggestions();
        assert!(suggestions.iter().any(|s| s.contains("TWEET_COLLECTOR_API_KEY")));
    }
}
