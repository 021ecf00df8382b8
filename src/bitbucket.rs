use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::{BitbucketAuth, Config, non_empty};
use crate::data::{FileChange, FileStatus, PrChanges, subject_line};
use crate::error::FetchError;
use crate::output;

const USER_AGENT: &str = concat!("review-payload/", env!("CARGO_PKG_VERSION"));

/// One page of a paginated Bitbucket collection
#[derive(Deserialize)]
struct Page<T> {
    values: Vec<T>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct PathRecord {
    path: String,
}

/// Entry of the pull request diffstat
#[derive(Deserialize)]
struct DiffStat {
    old: Option<PathRecord>,
    new: Option<PathRecord>,
}

impl DiffStat {
    /// Filename and status derived from which sides of the change exist
    fn classify(&self) -> Option<(&str, FileStatus)> {
        match (&self.old, &self.new) {
            (Some(old), None) => Some((old.path.as_str(), FileStatus::Deleted)),
            (None, Some(new)) => Some((new.path.as_str(), FileStatus::Added)),
            (Some(old), Some(new)) if old.path != new.path => {
                Some((new.path.as_str(), FileStatus::Renamed))
            }
            (Some(_), Some(new)) => Some((new.path.as_str(), FileStatus::Modified)),
            (None, None) => None,
        }
    }
}

#[derive(Deserialize)]
struct Commit {
    message: String,
}

struct BitbucketClient<'a> {
    http: Client,
    auth: BitbucketAuth<'a>,
    pr_url: String,
}

impl BitbucketClient<'_> {
    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.http.get(url);
        match self.auth {
            BitbucketAuth::Bearer(token) => request.bearer_auth(token),
            BitbucketAuth::Basic {
                username,
                app_password,
            } => request.basic_auth(username, Some(app_password)),
        }
    }

    /// Follow `next` links until the collection is exhausted
    fn get_all<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, FetchError> {
        let mut url = Some(format!("{}/{endpoint}", self.pr_url));
        let mut items = Vec::new();

        while let Some(current) = url {
            let response = self.get(&current).send()?;
            if !response.status().is_success() {
                return Err(FetchError::Status {
                    url: current,
                    status: response.status(),
                });
            }
            let page: Page<T> = response.json()?;
            items.extend(page.values);
            url = page.next;
        }
        Ok(items)
    }

    /// Patch of a single file; failures only cost that file its patch
    fn file_patch(&self, path: &str) -> String {
        let result = self
            .get(&format!("{}/diff", self.pr_url))
            .query(&[("path", path)])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text());

        result.unwrap_or_else(|err| {
            output::warn(&format!("Could not fetch diff for {path}: {err}"));
            String::new()
        })
    }
}

/// Fetch changed files and commit messages through the Bitbucket Cloud API
pub fn fetch(config: &Config) -> Result<PrChanges, FetchError> {
    fetch_with(config, Client::builder().user_agent(USER_AGENT).build()?)
}

pub fn fetch_with(config: &Config, http: Client) -> Result<PrChanges, FetchError> {
    let workspace = non_empty(&config.bitbucket_workspace)
        .ok_or(FetchError::missing("bitbucket", "BITBUCKET_WORKSPACE"))?;
    let repo_slug = non_empty(&config.bitbucket_repo_slug)
        .ok_or(FetchError::missing("bitbucket", "BITBUCKET_REPO_SLUG"))?;
    // The pipeline's own PR id wins over the generic PR_NUMBER
    let pr_id = non_empty(&config.bitbucket_pr_id)
        .map(str::to_owned)
        .or_else(|| config.pr_number())
        .ok_or(FetchError::missing("bitbucket", "BITBUCKET_PR_ID"))?;
    let auth = config.bitbucket_auth().ok_or(FetchError::missing(
        "bitbucket",
        "BITBUCKET_ACCESS_TOKEN or BITBUCKET_USERNAME + BITBUCKET_APP_PASSWORD",
    ))?;

    let client = BitbucketClient {
        http,
        auth,
        pr_url: format!(
            "{}/repositories/{workspace}/{repo_slug}/pullrequests/{pr_id}",
            config.bitbucket_api_url.trim_end_matches('/')
        ),
    };

    output::info(&format!(
        "Fetching PR #{pr_id} of {workspace}/{repo_slug} from the Bitbucket API..."
    ));

    let diffstat: Vec<DiffStat> = client.get_all("diffstat")?;
    let files = diffstat
        .iter()
        .filter_map(DiffStat::classify)
        .map(|(filename, status)| FileChange {
            filename: filename.to_owned(),
            status,
            patch: client.file_patch(filename),
        })
        .collect();

    let commits: Vec<Commit> = client.get_all("commits")?;
    let commit_messages = commits.iter().map(|c| subject_line(&c.message)).collect();

    Ok(PrChanges {
        files,
        commit_messages,
    })
}
