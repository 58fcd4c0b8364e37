//! Normalization of the configured repository URL into a machine-queryable
//! git remote.
//!
//! Operators tend to paste whatever they see in the browser, e.g.
//! `https://gitee.com/owner/repo/commits/master`. Git wants
//! `https://gitee.com/owner/repo.git`, and the `master` part tells us which
//! ref to watch.

use crate::error::{Result, WatchError};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

static URL_RE: OnceLock<Regex> = OnceLock::new();

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| {
        Regex::new(r"^(?i)(https?)://([^/?#\s]+)(/[^\s]*)?$").expect("static regex is valid")
    })
}

/// A git remote plus the ref whose target we track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteSpec {
    /// Clone-able address, always ending in `.git`.
    pub url: String,
    /// Branch named by a browsable page URL; `None` tracks `HEAD`.
    pub branch: Option<String>,
}

impl RemoteSpec {
    /// Parse either a bare remote address or a browsable page URL.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(WatchError::ConfigInvalid("repo_url is empty".into()));
        }
        let caps = url_re().captures(input).ok_or_else(|| {
            WatchError::ConfigInvalid(format!("repo_url '{input}' is not an HTTP(S) URL"))
        })?;

        let scheme = caps[1].to_ascii_lowercase();
        let host = &caps[2];
        let path = caps.get(3).map(|m| m.as_str()).unwrap_or("");
        let path = path.split(['?', '#']).next().unwrap_or("");

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(WatchError::ConfigInvalid(format!(
                "repo_url '{input}' does not name an owner and a repository"
            )));
        }

        let (repo_path, page) = segments.split_at(repo_path_len(&segments));
        let (last, parents) = repo_path
            .split_last()
            .ok_or_else(|| WatchError::ConfigInvalid(format!("repo_url '{input}' has no path")))?;
        let repo = last.trim_end_matches(".git");
        if repo.is_empty() {
            return Err(WatchError::ConfigInvalid(format!(
                "repo_url '{input}' has an empty repository name"
            )));
        }

        let branch = branch_from_page(page).map(str::to_string);
        if let Some(b) = &branch {
            if b.starts_with('-') {
                return Err(WatchError::ConfigInvalid(format!(
                    "repo_url '{input}' names an invalid branch '{b}'"
                )));
            }
        }

        Ok(Self {
            url: format!("{scheme}://{host}/{}/{repo}.git", parents.join("/")),
            branch,
        })
    }

    /// The ref asked of `git ls-remote`.
    pub fn probe_ref(&self) -> String {
        match &self.branch {
            Some(b) => format!("refs/heads/{b}"),
            None => "HEAD".to_string(),
        }
    }
}

impl fmt::Display for RemoteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(b) => write!(f, "{} ({b})", self.url),
            None => write!(f, "{}", self.url),
        }
    }
}

/// Number of leading segments that make up the repository path.
///
/// A path ending in `.git` is a bare remote and is kept whole. Otherwise the
/// path runs up to the first page marker after `owner/repo`, so GitLab
/// subgroups and self-hosted prefixes such as `/scm/team/repo` keep every
/// segment.
fn repo_path_len(segments: &[&str]) -> usize {
    if segments.last().is_some_and(|s| s.ends_with(".git")) {
        return segments.len();
    }
    segments
        .iter()
        .enumerate()
        .skip(2)
        .find(|(_, s)| matches!(**s, "-" | "tree" | "commits" | "commit" | "blob" | "src"))
        .map_or(segments.len(), |(i, _)| i)
}

/// Extract a branch from the path segments that follow the repository path.
///
/// Understands the GitHub/Gitee (`tree/<b>`, `commits/<b>`, `blob/<b>`),
/// GitLab (`-/tree/<b>`) and Gitea (`src/branch/<b>`) page shapes. A single
/// commit page (`commit/<sha>`) tracks `HEAD`.
fn branch_from_page<'a>(rest: &[&'a str]) -> Option<&'a str> {
    let rest = match rest.first() {
        Some(&"-") => &rest[1..],
        _ => rest,
    };
    match rest {
        ["src", "branch", b, ..] => Some(*b),
        ["tree" | "commits" | "blob" | "src", b, ..] => Some(*b),
        _ => None,
    }
}
