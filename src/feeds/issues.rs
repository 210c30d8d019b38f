//! Issue-tracker lookup for grant proposal write-ups.
//!
//! Each approved grant has a corresponding issue in the public proposals
//! repository, titled after the project. Search results are memoized per
//! title so reopening a detail view never repeats a round-trip.

use crate::coerce::normalize_key;
use crate::source::SourceUnavailable;
use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::trace;

const API_BASE: &str = "https://api.github.com";
const DEFAULT_REPO: &str = "ZcashCommunityGrants/zcashcommunitygrants";

/// Search queries are retried with this prefix when the bare title finds
/// nothing; many issues are filed as "Grant Application - <title>".
const TITLE_PREFIX: &str = "Grant Application - ";

/// A search hit: enough to fetch the full issue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

/// A full issue with its markdown body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    items: Vec<IssueRef>,
}

/// Client for the issue search and fetch endpoints.
pub struct IssueFeed {
    client: reqwest::Client,
    base_url: String,
    repo: String,
    cache: HashMap<String, Option<IssueRef>>,
}

impl IssueFeed {
    pub fn new() -> Self {
        Self::with_endpoint(API_BASE, DEFAULT_REPO)
    }

    pub fn with_endpoint(base_url: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("grantdash/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            repo: repo.into(),
            cache: HashMap::new(),
        }
    }

    /// Finds the best-matching issue for a project title: exact quoted-title
    /// search first, then the filing-prefix variant; within results an exact
    /// (case-insensitive) title match wins, else the first result is
    /// accepted. Memoized per distinct title, including misses.
    pub async fn find_by_title(&mut self, title: &str) -> Result<Option<IssueRef>> {
        let key = normalize_key(title);
        if let Some(hit) = self.cache.get(&key) {
            trace!("issue cache hit for '{title}'");
            return Ok(hit.clone());
        }

        let mut found = self.search(title).await?;
        if found.is_none() {
            found = self.search(&format!("{TITLE_PREFIX}{title}")).await?;
        }
        self.cache.insert(key, found.clone());
        Ok(found)
    }

    async fn search(&self, title: &str) -> Result<Option<IssueRef>> {
        let query = format!("\"{title}\" repo:{}", self.repo);
        let url = format!("{}/search/issues", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query.as_str())])
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| SourceUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceUnavailable(format!(
                "issue search returned HTTP {}",
                response.status()
            ))
            .into());
        }
        let results: SearchResults = response
            .json()
            .await
            .map_err(|e| SourceUnavailable(e.to_string()))?;
        Ok(pick_best_match(results.items, title))
    }

    /// Fetches one issue by number, body included.
    pub async fn fetch_issue(&self, number: u64) -> Result<Issue> {
        let url = format!("{}/repos/{}/issues/{number}", self.base_url, self.repo);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| SourceUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceUnavailable(format!(
                "issue fetch returned HTTP {}",
                response.status()
            ))
            .into());
        }
        response
            .json()
            .await
            .map_err(|e| SourceUnavailable(e.to_string()).into())
    }
}

impl Default for IssueFeed {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_best_match(items: Vec<IssueRef>, title: &str) -> Option<IssueRef> {
    if items.is_empty() {
        return None;
    }
    let wanted = normalize_key(title);
    items
        .iter()
        .find(|issue| normalize_key(&issue.title) == wanted)
        .cloned()
        .or_else(|| items.into_iter().next())
}

/// Extracts the proposal's summary from its markdown body.
///
/// The section starts at a "Project Summary" (else "Description") marker,
/// which is either a second-level-or-deeper heading or a bold-only line, and
/// runs until the next heading or bold-only line.
pub fn extract_summary(markdown: &str) -> Option<String> {
    extract_section(markdown, "project summary").or_else(|| extract_section(markdown, "description"))
}

fn extract_section(markdown: &str, keyword: &str) -> Option<String> {
    let lines: Vec<&str> = markdown.lines().collect();
    let start = lines
        .iter()
        .position(|line| is_section_marker(line.trim(), keyword))?;

    let mut section = Vec::new();
    for line in &lines[start + 1..] {
        if is_heading(line) || is_bold_only(line.trim()) {
            break;
        }
        section.push(*line);
    }
    let text = section.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn is_section_marker(line: &str, keyword: &str) -> bool {
    let lowered = line.to_lowercase();
    if let Some(rest) = lowered.strip_prefix("##") {
        return rest.trim_start_matches('#').trim().starts_with(keyword);
    }
    if is_bold_only(line) {
        let inner = lowered.trim_matches('*').trim();
        return inner.starts_with(keyword);
    }
    false
}

fn is_heading(line: &str) -> bool {
    let hashes = line.len() - line.trim_start_matches('#').len();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

fn is_bold_only(line: &str) -> bool {
    line.len() > 4 && line.starts_with("**") && line.ends_with("**")
}
