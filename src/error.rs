use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LaiserError {
    #[error("Network request failed: {url} - {message}")]
    Network { url: String, message: String },

    #[error("Unexpected status from {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Parse error: {input} - {message}")]
    Parse { input: String, message: String },

    #[error("Invalid configuration: {key} - {message}")]
    Config { key: String, message: String },

    #[error("File operation failed: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },
}

impl LaiserError {
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            message: source.to_string(),
        }
    }

    pub fn status(url: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self::Status {
            url: url.into(),
            status: status.as_u16(),
        }
    }

    pub fn parse(input: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            input: input.into(),
            message: message.to_string(),
        }
    }

    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io {
            message: source.to_string(),
            path,
        }
    }

    pub fn to_user_message(&self) -> String {
        match self {
            LaiserError::Network { url, message } => {
                format!("Network request to '{}' failed: {}", url, message)
            }
            LaiserError::Io { message, path } => {
                let path_str = path
                    .as_ref()
                    .map(|p| format!(" ({})", p.display()))
                    .unwrap_or_default();
                format!("File operation failed{}: {}", path_str, message)
            }
            _ => self.to_string(),
        }
    }
}

pub type LaiserResult<T> = Result<T, LaiserError>;
