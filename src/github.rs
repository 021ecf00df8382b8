use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::{Config, non_empty};
use crate::data::{FileChange, FileStatus, PrChanges, subject_line};
use crate::error::FetchError;
use crate::output;

const PER_PAGE: usize = 100;

/// The files endpoint stops at 3000 entries
const MAX_PAGES: usize = 30;

const USER_AGENT: &str = concat!("review-payload/", env!("CARGO_PKG_VERSION"));

/// Entry of `GET /repos/{repo}/pulls/{n}/files`
#[derive(Deserialize)]
struct PrFile {
    filename: String,
    status: String,
    #[serde(default)]
    patch: Option<String>,
}

impl From<PrFile> for FileChange {
    fn from(file: PrFile) -> Self {
        Self {
            status: FileStatus::from_github(&file.status),
            filename: file.filename,
            patch: file.patch.unwrap_or_default(),
        }
    }
}

/// Entry of `GET /repos/{repo}/pulls/{n}/commits`
#[derive(Deserialize)]
struct PrCommit {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
}

struct GitHubClient<'a> {
    http: Client,
    api_url: &'a str,
    token: &'a str,
    repository: &'a str,
    pr_number: String,
}

impl GitHubClient<'_> {
    fn get(&self, url: &str) -> RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn get_all<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, FetchError> {
        let url = format!(
            "{}/repos/{}/pulls/{}/{endpoint}",
            self.api_url.trim_end_matches('/'),
            self.repository,
            self.pr_number
        );

        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let response = self
                .get(&url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()?;
            if !response.status().is_success() {
                return Err(FetchError::Status {
                    url,
                    status: response.status(),
                });
            }

            let batch: Vec<T> = response.json()?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }
}

/// Fetch changed files and commit messages through the GitHub REST API
pub fn fetch(config: &Config) -> Result<PrChanges, FetchError> {
    fetch_with(config, Client::builder().user_agent(USER_AGENT).build()?)
}

pub fn fetch_with(config: &Config, http: Client) -> Result<PrChanges, FetchError> {
    let token = config
        .github_token()
        .ok_or(FetchError::missing("github", "GH_TOKEN or GITHUB_TOKEN"))?;
    let repository = non_empty(&config.github_repository)
        .ok_or(FetchError::missing("github", "GITHUB_REPOSITORY"))?;
    let pr_number = config
        .pr_number()
        .ok_or(FetchError::missing("github", "PR_NUMBER"))?;

    let client = GitHubClient {
        http,
        api_url: &config.github_api_url,
        token,
        repository,
        pr_number,
    };

    output::info(&format!(
        "Fetching PR #{} of {repository} from the GitHub API...",
        client.pr_number
    ));

    let files: Vec<PrFile> = client.get_all("files")?;
    let commits: Vec<PrCommit> = client.get_all("commits")?;

    Ok(PrChanges {
        files: files.into_iter().map(FileChange::from).collect(),
        commit_messages: commit_subjects(commits),
    })
}

fn commit_subjects(commits: Vec<PrCommit>) -> Vec<String> {
    commits
        .iter()
        .map(|c| subject_line(&c.commit.message))
        .collect()
}
