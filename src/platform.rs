use std::fmt;

use crate::config::Config;

/// CI platform the tool is running under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    GitHub,
    Bitbucket,
    Unknown,
}

impl Platform {
    /// Presence of the platform's marker variable decides, whatever its value
    pub fn detect(config: &Config) -> Self {
        if config.github_actions.is_some() {
            Self::GitHub
        } else if config.bitbucket_pipeline_uuid.is_some() {
            Self::Bitbucket
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GitHub => "github",
            Self::Bitbucket => "bitbucket",
            Self::Unknown => "unknown",
        })
    }
}
