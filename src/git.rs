use crate::command::Runner;
use crate::config::{Config, non_empty};
use crate::data::{FileChange, FileStatus, PrChanges};
use crate::error::FetchError;
use crate::output;

/// Lines of context around each change in a patch
const PATCH_CONTEXT: &str = "-U10";

/// Compute changed files and commit subjects locally from `BASE_REF..HEAD_REF`
pub fn fetch(config: &Config, git: &Runner) -> Result<PrChanges, FetchError> {
    let base = non_empty(&config.base_ref).ok_or(FetchError::missing("git", "BASE_REF"))?;
    let head = non_empty(&config.head_ref).ok_or(FetchError::missing("git", "HEAD_REF"))?;
    fetch_range(git, base, head)
}

pub fn fetch_range(git: &Runner, base: &str, head: &str) -> Result<PrChanges, FetchError> {
    output::info(&format!("Calculating diff between {base} and {head}..."));

    let merge_base = git.run(&["merge-base", base, head]).trim().to_owned();
    let from = if merge_base.is_empty() {
        output::warn(&format!(
            "Could not determine merge-base, diffing against {base} directly; \
             unrelated upstream changes may be included"
        ));
        base.to_owned()
    } else {
        merge_base
    };

    let name_status = git.run(&["diff", "--name-status", "-z", &from, head]);
    let files = parse_name_status(&name_status)
        .into_iter()
        .map(|(filename, status)| {
            let patch = git.run(&[
                "--literal-pathspecs",
                "diff",
                PATCH_CONTEXT,
                &from,
                head,
                "--",
                &filename,
            ]);
            FileChange {
                filename,
                status,
                patch,
            }
        })
        .collect();

    let range = format!("{from}..{head}");
    let commit_messages = git
        .run(&["log", "--format=%s", &range])
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(PrChanges {
        files,
        commit_messages,
    })
}

/// Parse `git diff --name-status -z` output.
///
/// Fields are NUL-separated and paths are not quoted. Renames and copies carry
/// the old and the new path; the new path is kept.
pub fn parse_name_status(output: &str) -> Vec<(String, FileStatus)> {
    let mut fields = output.split('\0').filter(|field| !field.is_empty());
    let mut files = Vec::new();

    while let Some(code) = fields.next() {
        let path = match code.chars().next() {
            Some('R' | 'C') => fields.nth(1),
            _ => fields.next(),
        };
        let Some(path) = path else { break };
        files.push((path.to_owned(), FileStatus::from_git_code(code)));
    }
    files
}
