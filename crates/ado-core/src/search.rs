/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! The closed tagged union of search kinds (design note §9: "avoids the need
//! for open subtype hierarchies").

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateKind {
  All,
  Query,
  PullRequests,
  Pipeline,
  MyWorkItems,
}

impl fmt::Display for UpdateKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      UpdateKind::All => "all",
      UpdateKind::Query => "query",
      UpdateKind::PullRequests => "pull-requests",
      UpdateKind::Pipeline => "pipeline",
      UpdateKind::MyWorkItems => "my-work-items",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PullRequestView {
  Mine,
  Assigned,
  All,
}

impl fmt::Display for PullRequestView {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      PullRequestView::Mine => "Mine",
      PullRequestView::Assigned => "Assigned",
      PullRequestView::All => "All",
    };
    f.write_str(s)
  }
}

impl std::str::FromStr for PullRequestView {
  type Err = String;

  /// Accepts the lowercase form `PullRequestSearchDef.view` is persisted in,
  /// case-insensitively.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "mine" => Ok(PullRequestView::Mine),
      "assigned" => Ok(PullRequestView::Assigned),
      "all" => Ok(PullRequestView::All),
      other => Err(format!("unknown pull request view {other:?}")),
    }
  }
}

/// The user-defined (or, for `MyWorkItems`, implicit) search that drives one
/// Updater invocation. `Search::natural_key()` is the identity used for
/// cooldown bookkeeping and for the `getCachedDataForSearch` lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Search {
  Query { id: i64, organization_url: String, project_name: String, external_query_id: String },
  PullRequests {
    id: i64,
    organization_url: String,
    project_name: String,
    repository_name: String,
    view: PullRequestView,
  },
  Pipeline { id: i64, organization_url: String, project_name: String, definition_external_id: i64 },
  MyWorkItems { organization_url: String, project_name: String, username: String },
}

impl Search {
  pub fn kind(&self) -> UpdateKind {
    match self {
      Search::Query { .. } => UpdateKind::Query,
      Search::PullRequests { .. } => UpdateKind::PullRequests,
      Search::Pipeline { .. } => UpdateKind::Pipeline,
      Search::MyWorkItems { .. } => UpdateKind::MyWorkItems,
    }
  }

  pub fn organization_url(&self) -> &str {
    match self {
      Search::Query { organization_url, .. }
      | Search::PullRequests { organization_url, .. }
      | Search::Pipeline { organization_url, .. }
      | Search::MyWorkItems { organization_url, .. } => organization_url,
    }
  }

  pub fn project_name(&self) -> &str {
    match self {
      Search::Query { project_name, .. }
      | Search::PullRequests { project_name, .. }
      | Search::Pipeline { project_name, .. }
      | Search::MyWorkItems { project_name, .. } => project_name,
    }
  }

  /// The key used to scope per-search cooldowns and cancellation; distinct
  /// searches of the same kind never share one even if they target the same
  /// project (§4.5: "For a given search, updates are totally ordered").
  pub fn natural_key(&self) -> String {
    match self {
      Search::Query { id, .. } => format!("query:{id}"),
      Search::PullRequests { id, .. } => format!("pull-requests:{id}"),
      Search::Pipeline { id, .. } => format!("pipeline:{id}"),
      Search::MyWorkItems { organization_url, project_name, username } => {
        format!("my-work-items:{organization_url}|{project_name}|{username}")
      }
    }
  }

  /// The synthesized query key for `MyWorkItems`, per spec §4.3: exactly
  /// `"my-work-items:{org}|{project}"`, scoped further by `username` on the
  /// `Query` row itself rather than folded into the key.
  pub fn my_work_items_query_external_id(organization_url: &str, project_name: &str) -> String {
    format!("my-work-items:{organization_url}|{project_name}")
  }
}

/// Splits a persisted definition's `url` into `(organizationUrl, projectName)`
/// per §3.1's invariant that every definition url is parseable into
/// `(host-kind, organization, project, optional sub-resource)`. Azure DevOps
/// places the organization and project as the first two path segments under
/// the host, e.g. `https://dev.azure.com/{org}/{project}/_queries/query/{id}`,
/// so `organization_url` itself retains the org path segment (matching the
/// format `Search::organization_url()` already uses elsewhere).
pub fn parse_organization_and_project(url: &str) -> Option<(String, String)> {
  let without_scheme = url.split("://").nth(1)?;
  let mut segments = without_scheme.splitn(4, '/');
  let host = segments.next()?;
  let org = segments.next().filter(|s| !s.is_empty())?;
  let project = segments.next().filter(|s| !s.is_empty())?;
  let organization_url = format!("https://{host}/{org}");
  Some((organization_url, project.to_string()))
}

/// Recovers the query external id a `QueryDef.url` encodes — its final path
/// segment, e.g. `https://dev.azure.com/o/p/_queries/q1` → `"q1"`.
pub fn query_external_id_from_url(url: &str) -> Option<String> {
  url.rsplit('/').find(|segment| !segment.is_empty()).map(|segment| segment.to_string())
}

/// Recovers the repository name a `PullRequestSearchDef.url` encodes — the
/// path segment immediately following the `_git/` marker, e.g.
/// `https://dev.azure.com/o/p/_git/widgets-repo/pullrequests` → `"widgets-repo"`.
pub fn repository_name_from_url(url: &str) -> Option<String> {
  let mut segments = url.split('/');
  while let Some(segment) = segments.next() {
    if segment == "_git" {
      return segments.next().filter(|s| !s.is_empty()).map(|s| s.to_string());
    }
  }
  None
}

#[cfg(test)]
mod parse_url_tests {
  use super::parse_organization_and_project;

  #[test]
  fn parses_organization_and_project_from_a_query_url() {
    let parsed = parse_organization_and_project("https://dev.azure.com/contoso/Widgets/_queries/query/abc");
    assert_eq!(parsed, Some(("https://dev.azure.com/contoso".to_string(), "Widgets".to_string())));
  }

  #[test]
  fn returns_none_for_a_url_with_no_project_segment() {
    assert_eq!(parse_organization_and_project("https://dev.azure.com/contoso"), None);
  }

  #[test]
  fn extracts_query_external_id_from_trailing_segment() {
    use super::query_external_id_from_url;
    assert_eq!(query_external_id_from_url("https://dev.azure.com/o/p/_queries/q1").as_deref(), Some("q1"));
  }

  #[test]
  fn extracts_repository_name_following_git_marker() {
    use super::repository_name_from_url;
    assert_eq!(
      repository_name_from_url("https://dev.azure.com/o/p/_git/widgets-repo/pullrequests").as_deref(),
      Some("widgets-repo")
    );
    assert_eq!(repository_name_from_url("https://dev.azure.com/o/p/_queries/q1"), None);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn my_work_items_key_matches_spec_format() {
    let key = Search::my_work_items_query_external_id("https://dev.azure.com/acme", "Widgets");
    assert_eq!(key, "my-work-items:https://dev.azure.com/acme|Widgets");
  }

  #[test]
  fn natural_key_distinguishes_kinds_with_same_id() {
    let q = Search::Query {
      id: 1,
      organization_url: "org".into(),
      project_name: "proj".into(),
      external_query_id: "abc".into(),
    };
    let p = Search::Pipeline {
      id: 1,
      organization_url: "org".into(),
      project_name: "proj".into(),
      definition_external_id: 5,
    };
    assert_ne!(q.natural_key(), p.natural_key());
  }

  #[test]
  fn pull_request_view_parses_case_insensitively() {
    use std::str::FromStr;
    assert_eq!(PullRequestView::from_str("ASSIGNED").unwrap(), PullRequestView::Assigned);
    assert!(PullRequestView::from_str("bogus").is_err());
  }

  #[test]
  fn kind_maps_correctly() {
    let m = Search::MyWorkItems {
      organization_url: "org".into(),
      project_name: "proj".into(),
      username: "me".into(),
    };
    assert_eq!(m.kind(), UpdateKind::MyWorkItems);
  }
}
