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

//! Wire DTOs returned by the remote collaboration service. These are
//! intentionally flat and string/guid-typed — normalization into the cache
//! schema's integer-keyed rows happens in `ado-updaters`, not here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProject {
  pub external_id: String,
  pub name: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
  pub external_id: String,
  pub display_name: String,
  pub unique_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
  pub external_id: String,
  pub name: String,
  pub clone_url: String,
  pub is_private: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteQueryKind {
  Flat,
  Tree,
  OneHop,
  /// An unsaved, ad-hoc query; §4.3 requires the QueryUpdater reject these.
  Temporary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteQueryDefinition {
  pub external_id: String,
  pub name: String,
  pub kind: RemoteQueryKind,
  pub wiql: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWorkItemIdResult {
  pub ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWorkItem {
  pub external_id: i64,
  pub title: String,
  pub html_url: String,
  pub state: String,
  pub reason: String,
  pub assigned_to: Option<RemoteIdentity>,
  pub created_date: DateTime<Utc>,
  pub created_by: RemoteIdentity,
  pub changed_date: DateTime<Utc>,
  pub changed_by: RemoteIdentity,
  pub work_item_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWorkItemType {
  pub name: String,
  pub icon: String,
  pub color: String,
  pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemotePullRequestStatus {
  Active,
  Completed,
  Abandoned,
}

impl fmt::Display for RemotePullRequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      RemotePullRequestStatus::Active => "Active",
      RemotePullRequestStatus::Completed => "Completed",
      RemotePullRequestStatus::Abandoned => "Abandoned",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemotePolicyStatus {
  Approved,
  Running,
  Queued,
  Rejected,
  Broken,
  NotApplicable,
}

impl fmt::Display for RemotePolicyStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      RemotePolicyStatus::Approved => "Approved",
      RemotePolicyStatus::Running => "Running",
      RemotePolicyStatus::Queued => "Queued",
      RemotePolicyStatus::Rejected => "Rejected",
      RemotePolicyStatus::Broken => "Broken",
      RemotePolicyStatus::NotApplicable => "NotApplicable",
    };
    f.write_str(s)
  }
}

impl RemotePolicyStatus {
  /// Worse is defined by the order spec §4.3 lists the outcomes in.
  fn severity_rank(self) -> u8 {
    match self {
      RemotePolicyStatus::Broken => 0,
      RemotePolicyStatus::Rejected => 1,
      RemotePolicyStatus::Queued => 2,
      RemotePolicyStatus::Running => 3,
      RemotePolicyStatus::NotApplicable => 4,
      RemotePolicyStatus::Approved => 5,
    }
  }

  /// Combine individual policy evaluation outcomes into the single
  /// worst-severity status for a pull request, per §4.3.
  pub fn worst(statuses: impl IntoIterator<Item = RemotePolicyStatus>) -> RemotePolicyStatus {
    statuses
      .into_iter()
      .min_by_key(|s| s.severity_rank())
      .unwrap_or(RemotePolicyStatus::NotApplicable)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePolicyEvaluation {
  pub status: RemotePolicyStatus,
  pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePullRequest {
  pub external_id: i64,
  pub title: String,
  pub url: String,
  pub html_url: String,
  pub creator: RemoteIdentity,
  /// Unique names of the reviewers assigned to the pull request; used to
  /// evaluate the `Assigned` view's "self in reviewers" filter.
  pub reviewer_unique_names: Vec<String>,
  pub status: RemotePullRequestStatus,
  pub target_branch: String,
  pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteBuildStatus {
  InProgress,
  Completed,
  Cancelling,
  Postponed,
  NotStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteBuildResult {
  Succeeded,
  PartiallySucceeded,
  Failed,
  Canceled,
  None,
}

impl fmt::Display for RemoteBuildStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      RemoteBuildStatus::InProgress => "InProgress",
      RemoteBuildStatus::Completed => "Completed",
      RemoteBuildStatus::Cancelling => "Cancelling",
      RemoteBuildStatus::Postponed => "Postponed",
      RemoteBuildStatus::NotStarted => "NotStarted",
    };
    f.write_str(s)
  }
}

impl fmt::Display for RemoteBuildResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      RemoteBuildResult::Succeeded => "Succeeded",
      RemoteBuildResult::PartiallySucceeded => "PartiallySucceeded",
      RemoteBuildResult::Failed => "Failed",
      RemoteBuildResult::Canceled => "Canceled",
      RemoteBuildResult::None => "None",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBuildDefinition {
  pub external_id: i64,
  pub name: String,
  pub html_url: String,
  pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBuild {
  pub external_id: i64,
  pub build_number: String,
  pub status: RemoteBuildStatus,
  pub result: RemoteBuildResult,
  pub queue_time: DateTime<Utc>,
  pub start_time: Option<DateTime<Utc>>,
  pub finish_time: Option<DateTime<Utc>>,
  pub url: String,
  pub source_branch: String,
  pub trigger_message: Option<String>,
  pub requested_by: RemoteIdentity,
}
