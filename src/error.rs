use thiserror::Error;

/// Why a source could not produce pull request changes.
///
/// None of these are fatal on their own: the caller logs them and moves on to
/// the next source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{platform}: missing {what}")]
    MissingConfig {
        platform: &'static str,
        what: &'static str,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("no changed files found")]
    NoChanges,
}

impl FetchError {
    pub fn missing(platform: &'static str, what: &'static str) -> Self {
        Self::MissingConfig { platform, what }
    }
}

/// A subprocess that could not be run or exited unsuccessfully
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("error executing {command}: {stderr}")]
    Failed { command: String, stderr: String },
}

/// Conditions that end the run with a failure status
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("no file changes could be obtained from the platform API or from git")]
    NoChanges,

    #[error("failed to write payload to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}
