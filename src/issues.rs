use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::data::LinkedIssue;

static CLOSING_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(close[sd]?|fix(?:e[sd])?|resolve[sd]?)\s+#(\d+)")
        .expect("closing reference pattern is valid")
});

/// Find issues the PR description claims to close.
///
/// Titles are placeholders: issues are not looked up, only linked.
pub fn linked_issues(body: &str, pr_url: Option<&str>) -> Vec<LinkedIssue> {
    if body.trim().is_empty() {
        return Vec::new();
    }

    let base = pr_url.and_then(issue_base_url);
    let mut seen = HashSet::new();
    let mut issues = Vec::new();

    for caps in CLOSING_REFERENCE.captures_iter(body) {
        let keyword = caps[1].to_lowercase();
        let number = &caps[2];
        if !seen.insert(number.to_owned()) {
            continue;
        }

        let url = match &base {
            Some(base) => format!("{base}/{number}"),
            None => format!("#{number}"),
        };
        issues.push(LinkedIssue {
            title: format!("Issue #{number}"),
            body: format!("Referenced with '{keyword}' in the PR description"),
            url,
        });
    }

    issues
}

/// `https://host/owner/repo/pull/17` → `https://host/owner/repo/issues`
fn issue_base_url(pr_url: &str) -> Option<String> {
    let pr_url = pr_url.trim().trim_end_matches('/');
    let (prefix, _) = pr_url
        .split_once("/pull-requests/")
        .or_else(|| pr_url.split_once("/pull/"))?;
    Some(format!("{prefix}/issues"))
}
