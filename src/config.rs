use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

/// Assemble a pull request payload for automated review
///
/// Every option is normally supplied by the CI environment; flags exist to override them.
#[derive(Parser, Debug, Default)]
#[command(name = "review-payload")]
#[command(about = "Assemble a JSON description of a pull request for automated code review")]
#[command(long_about = r#"review-payload - Assemble a JSON description of a pull request

Detects whether it runs under GitHub Actions or Bitbucket Pipelines, fetches the
changed files and commit messages from the platform API, and falls back to
diffing BASE_REF..HEAD_REF with git when the API is unavailable."#)]
pub struct Config {
    /// Base reference for the git fallback
    #[arg(long, env = "BASE_REF")]
    pub base_ref: Option<String>,

    /// Head reference for the git fallback
    #[arg(long, env = "HEAD_REF")]
    pub head_ref: Option<String>,

    #[arg(long, env = "PR_TITLE")]
    pub pr_title: Option<String>,

    #[arg(long, env = "PR_BODY", default_value = "")]
    pub pr_body: String,

    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: Option<String>,

    #[arg(long, env = "PR_URL")]
    pub pr_url: Option<String>,

    #[arg(long, env = "BRANCH_NAME")]
    pub branch_name: Option<String>,

    #[arg(long, env = "CREATOR")]
    pub creator: Option<String>,

    #[arg(long, env = "COMMIT_SHA")]
    pub commit_sha: Option<String>,

    /// Language the review should be written in
    #[arg(long, env = "OUTPUT_LANG", default_value = "en")]
    pub output_lang: String,

    /// JSON array of reviewer objects carrying `login` or `nickname`
    #[arg(long, env = "REVIEWERS_JSON")]
    pub reviewers_json: Option<String>,

    #[arg(long, env = "CUSTOM_INSTRUCTIONS")]
    pub custom_instructions: Option<String>,

    #[arg(long = "output", env = "PAYLOAD_OUTPUT_PATH", default_value = "payload.json")]
    pub output_path: PathBuf,

    /// Also print the payload to stdout
    #[arg(long)]
    pub print: bool,

    // GitHub
    #[arg(long, env = "GITHUB_ACTIONS", hide = true)]
    pub github_actions: Option<String>,

    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    pub gh_token: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// `owner/repo`
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub github_repository: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api_url: String,

    #[arg(long, env = "GITHUB_REF", hide = true)]
    pub github_ref: Option<String>,

    #[arg(long, env = "GITHUB_SHA", hide = true)]
    pub github_sha: Option<String>,

    // Bitbucket
    #[arg(long, env = "BITBUCKET_PIPELINE_UUID", hide = true)]
    pub bitbucket_pipeline_uuid: Option<String>,

    #[arg(long, env = "BITBUCKET_WORKSPACE")]
    pub bitbucket_workspace: Option<String>,

    #[arg(long, env = "BITBUCKET_REPO_SLUG")]
    pub bitbucket_repo_slug: Option<String>,

    #[arg(long, env = "BITBUCKET_PR_ID")]
    pub bitbucket_pr_id: Option<String>,

    #[arg(long, env = "BITBUCKET_ACCESS_TOKEN", hide_env_values = true)]
    pub bitbucket_access_token: Option<String>,

    #[arg(long, env = "BITBUCKET_USERNAME")]
    pub bitbucket_username: Option<String>,

    #[arg(long, env = "BITBUCKET_APP_PASSWORD", hide_env_values = true)]
    pub bitbucket_app_password: Option<String>,

    #[arg(long, env = "BITBUCKET_API_URL", default_value = "https://api.bitbucket.org/2.0")]
    pub bitbucket_api_url: String,

    #[arg(long, env = "BITBUCKET_COMMIT", hide = true)]
    pub bitbucket_commit: Option<String>,
}

/// How to authenticate against the Bitbucket API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitbucketAuth<'a> {
    Bearer(&'a str),
    Basic {
        username: &'a str,
        app_password: &'a str,
    },
}

impl Config {
    /// `GH_TOKEN` wins over `GITHUB_TOKEN`
    pub fn github_token(&self) -> Option<&str> {
        non_empty(&self.gh_token).or_else(|| non_empty(&self.github_token))
    }

    /// PR number, falling back to the Bitbucket PR id or a `refs/pull/<n>/merge` ref
    pub fn pr_number(&self) -> Option<String> {
        non_empty(&self.pr_number)
            .or_else(|| non_empty(&self.bitbucket_pr_id))
            .map(str::to_owned)
            .or_else(|| self.github_ref.as_deref().and_then(pr_number_from_ref))
    }

    pub fn commit_sha(&self) -> Option<&str> {
        non_empty(&self.commit_sha)
            .or_else(|| non_empty(&self.github_sha))
            .or_else(|| non_empty(&self.bitbucket_commit))
    }

    pub fn bitbucket_auth(&self) -> Option<BitbucketAuth<'_>> {
        if let Some(token) = non_empty(&self.bitbucket_access_token) {
            return Some(BitbucketAuth::Bearer(token));
        }
        match (
            non_empty(&self.bitbucket_username),
            non_empty(&self.bitbucket_app_password),
        ) {
            (Some(username), Some(app_password)) => Some(BitbucketAuth::Basic {
                username,
                app_password,
            }),
            _ => None,
        }
    }

    /// Reviewer names from `REVIEWERS_JSON`; anything unparseable yields no reviewers
    pub fn reviewers(&self) -> Vec<String> {
        self.reviewers_json
            .as_deref()
            .map(parse_reviewers)
            .unwrap_or_default()
    }
}

pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn pr_number_from_ref(git_ref: &str) -> Option<String> {
    let number = git_ref.strip_prefix("refs/pull/")?.split('/').next()?;
    number
        .chars()
        .all(|c| c.is_ascii_digit())
        .then(|| number.to_owned())
        .filter(|n| !n.is_empty())
}

/// GitHub reviewers carry `login`, Bitbucket reviewers carry `nickname`
#[derive(Deserialize)]
struct Reviewer {
    login: Option<String>,
    nickname: Option<String>,
}

pub fn parse_reviewers(json: &str) -> Vec<String> {
    let Ok(reviewers) = serde_json::from_str::<Vec<Reviewer>>(json) else {
        return Vec::new();
    };
    reviewers
        .into_iter()
        .filter_map(|r| r.login.or(r.nickname))
        .filter(|name| !name.is_empty())
        .collect()
}
