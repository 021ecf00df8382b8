use std::path::Path;

use crate::command::Runner;
use crate::config::{Config, non_empty};
use crate::data::{Payload, PrChanges};
use crate::error::{FetchError, PayloadError};
use crate::platform::Platform;
use crate::{bitbucket, git, github, inspect, issues, output};

/// Where the changes in the payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Platform(Platform),
    Git,
}

/// Detect the platform, try its API, then fall back to git.
///
/// Fails only when no source produced at least one changed file.
pub fn collect_changes(
    config: &Config,
    repo: &Path,
) -> Result<(Source, PrChanges), PayloadError> {
    let platform = Platform::detect(config);
    output::info(&format!("Detected platform: {platform}"));

    let primary = match platform {
        Platform::GitHub => Some(github::fetch(config)),
        Platform::Bitbucket => Some(bitbucket::fetch(config)),
        Platform::Unknown => None,
    };

    match primary.map(non_empty_changes) {
        Some(Ok(changes)) => return Ok((Source::Platform(platform), changes)),
        Some(Err(err)) => output::warn(&format!(
            "{platform} API unavailable ({err}), falling back to git"
        )),
        None => {}
    }

    match non_empty_changes(git::fetch(config, &Runner::git(repo))) {
        Ok(changes) => Ok((Source::Git, changes)),
        Err(err) => {
            output::error(&format!("git fallback failed: {err}"));
            Err(PayloadError::NoChanges)
        }
    }
}

fn non_empty_changes(result: Result<PrChanges, FetchError>) -> Result<PrChanges, FetchError> {
    result.and_then(|changes| {
        if changes.files.is_empty() {
            Err(FetchError::NoChanges)
        } else {
            Ok(changes)
        }
    })
}

/// Combine the changes with PR metadata and repository context
pub fn build(config: &Config, changes: PrChanges, repo: &Path) -> Payload {
    let pr_url = non_empty(&config.pr_url).map(str::to_owned);
    let linked_issues = issues::linked_issues(&config.pr_body, pr_url.as_deref());

    Payload {
        pr_title: config.pr_title.clone(),
        pr_number: config.pr_number(),
        commit_sha: config.commit_sha().map(str::to_owned),
        pr_description: config.pr_body.clone(),
        branch_name: config.branch_name.clone(),
        pr_url,
        creator: config.creator.clone(),
        output_lang: config.output_lang.clone(),
        reviewers: config.reviewers(),
        files: changes.files,
        commit_messages: changes.commit_messages,
        linked_issues,
        repo_structure: Some(inspect::repo_structure(repo)),
        dependencies: inspect::dependencies(repo),
        custom_instructions: non_empty(&config.custom_instructions).map(str::to_owned),
    }
}

/// Collect, build and write the payload to the configured path.
///
/// With `--print` the payload goes to stdout first, so a failure there leaves no file behind.
pub fn generate(config: &Config, repo: &Path) -> Result<Payload, PayloadError> {
    let (source, changes) = collect_changes(config, repo)?;
    output::info(&format!(
        "Collected {} changed files from {}",
        changes.files.len(),
        match source {
            Source::Platform(platform) => platform.to_string(),
            Source::Git => "git".to_owned(),
        }
    ));

    let payload = build(config, changes, repo);
    if config.print {
        output::print_payload(&payload)?;
    }
    output::write_payload(&payload, &config.output_path)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::data::{FileChange, FileStatus};
    use crate::testing::{StubServer, git, git_available};

    /// Repository with tags `base` and `head` two commits apart
    fn repo_with_changes() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        git(root, &["init", "-q"]);
        std::fs::write(root.join("main.go"), "package main\n").unwrap();
        git(root, &["add", "."]);
        git(root, &["commit", "-q", "-m", "Initial commit"]);
        git(root, &["tag", "base"]);

        std::fs::write(root.join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        std::fs::write(root.join("util.go"), "package main\n").unwrap();
        git(root, &["add", "-A"]);
        git(root, &["commit", "-q", "-m", "Add entry point"]);
        git(root, &["tag", "head"]);
        dir
    }

    #[test]
    fn unknown_platform_uses_git_for_the_whole_payload() {
        if !git_available() {
            return;
        }
        let repo = repo_with_changes();
        let out = tempfile::tempdir().unwrap();
        let output_path = out.path().join("payload.json");
        let config = Config {
            base_ref: Some("base".to_owned()),
            head_ref: Some("head".to_owned()),
            output_path: output_path.clone(),
            print: true,
            ..Default::default()
        };

        let (source, _) = collect_changes(&config, repo.path()).unwrap();
        assert_eq!(source, Source::Git);

        let payload = generate(&config, repo.path()).unwrap();
        assert!(!payload.files.is_empty());
        assert_eq!(payload.commit_messages, ["Add entry point"]);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        let files = written["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        for file in files {
            assert!(file["filename"].is_string());
            let status = file["status"].as_str().unwrap();
            assert!(["added", "modified", "deleted", "renamed"].contains(&status));
        }
    }

    #[test]
    fn failing_platform_api_falls_back_to_git() {
        if !git_available() {
            return;
        }
        let repo = repo_with_changes();
        let server = StubServer::start(|_, _| (502, "{}".to_owned()));
        let config = Config {
            github_actions: Some("true".to_owned()),
            gh_token: Some("token".to_owned()),
            github_repository: Some("acme/widgets".to_owned()),
            pr_number: Some("17".to_owned()),
            github_api_url: server.base_url.clone(),
            base_ref: Some("base".to_owned()),
            head_ref: Some("head".to_owned()),
            ..Default::default()
        };

        let (source, changes) = collect_changes(&config, repo.path()).unwrap();
        assert_eq!(source, Source::Git);
        assert_eq!(changes.files.len(), 2);
    }

    #[test]
    fn unknown_platform_without_refs_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("payload.json");
        let config = Config {
            head_ref: Some("HEAD".to_owned()),
            output_path: output_path.clone(),
            ..Default::default()
        };

        assert!(matches!(
            generate(&config, dir.path()),
            Err(PayloadError::NoChanges)
        ));
        assert!(!output_path.exists());
    }

    #[test]
    fn github_without_credentials_falls_back_to_git() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            github_actions: Some("true".to_owned()),
            output_path: PathBuf::from("unused.json"),
            ..Default::default()
        };

        // No token means no request, and no refs means the fallback cannot run either
        assert!(matches!(
            collect_changes(&config, dir.path()),
            Err(PayloadError::NoChanges)
        ));
    }

    #[test]
    fn payload_carries_metadata_and_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module x").unwrap();
        let config = Config {
            pr_title: Some("Add widgets".to_owned()),
            pr_body: "Fixes #9".to_owned(),
            pr_url: Some("https://github.com/acme/widgets/pull/17".to_owned()),
            github_ref: Some("refs/pull/17/merge".to_owned()),
            output_lang: "vi".to_owned(),
            reviewers_json: Some(r#"[{"login":"alice"},{"nickname":"bob"},{}]"#.to_owned()),
            custom_instructions: Some("Focus on error handling".to_owned()),
            ..Default::default()
        };
        let changes = PrChanges {
            files: vec![FileChange {
                filename: "src/widget.rs".to_owned(),
                status: FileStatus::Added,
                patch: "+fn widget() {}".to_owned(),
            }],
            commit_messages: vec!["Add widget".to_owned()],
        };

        let payload = build(&config, changes, dir.path());
        assert_eq!(payload.pr_number.as_deref(), Some("17"));
        assert_eq!(payload.reviewers, ["alice", "bob"]);
        assert_eq!(
            payload.linked_issues[0].url,
            "https://github.com/acme/widgets/issues/9"
        );
        assert!(payload.dependencies.as_deref().unwrap().contains("module x"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["files"][0]["status"], "added");
        assert_eq!(json["output_lang"], "vi");
        assert!(json["branch_name"].is_null());
        assert!(json["repo_structure"].as_str().unwrap().contains("go.mod"));
    }

    #[test]
    fn payload_file_is_pretty_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        let config = Config {
            pr_title: Some("Sửa lỗi đăng nhập".to_owned()),
            ..Default::default()
        };
        let changes = PrChanges {
            files: vec![FileChange {
                filename: "a.txt".to_owned(),
                status: FileStatus::Modified,
                patch: String::new(),
            }],
            commit_messages: Vec::new(),
        };

        let payload = build(&config, changes, dir.path());
        output::write_payload(&payload, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Sửa lỗi đăng nhập"));
        assert!(written.contains("\n  \"pr_title\""));
    }
}
