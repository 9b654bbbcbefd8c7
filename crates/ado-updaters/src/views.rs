//! Denormalized read models returned by `Updater::get_cached_children` —
//! ordered exactly as the UI renders them, with foreign keys already
//! resolved to display names.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct WorkItemRow {
  pub external_id: i64,
  pub title: String,
  pub html_url: String,
  pub state: String,
  pub work_item_type_name: String,
  pub assigned_to_name: Option<String>,
  pub changed_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestRow {
  pub external_id: i64,
  pub title: String,
  pub html_url: String,
  pub creator_name: String,
  pub status: String,
  pub policy_status: String,
  pub policy_status_reason: String,
  pub target_branch: String,
  pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildRow {
  pub external_id: i64,
  pub build_number: String,
  pub status: String,
  pub result: String,
  pub queue_time: DateTime<Utc>,
  pub url: String,
  pub requester_name: String,
}

/// The type-erased per-kind child collection a caller gets back from
/// `getCachedChildren` — the same tagged-union shape as `Search` itself.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedChildren {
  WorkItems(Vec<WorkItemRow>),
  PullRequests(Vec<PullRequestRow>),
  Builds(Vec<BuildRow>),
}

impl CachedChildren {
  pub fn len(&self) -> usize {
    match self {
      CachedChildren::WorkItems(items) => items.len(),
      CachedChildren::PullRequests(items) => items.len(),
      CachedChildren::Builds(items) => items.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
