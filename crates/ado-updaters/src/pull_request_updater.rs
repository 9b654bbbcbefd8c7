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

//! Per-repository pull request search, scoped further by view (`Mine` —
//! created by the signed-in account; `Assigned` — signed-in account listed
//! as a reviewer; `All` — unfiltered). The remote surface has no dedicated
//! repository-fetch call, so the `Repository` row is synthesized from
//! `repository_name` alone, reusing the name as the external id.

use std::time::Duration;

use ado_client::types::RemotePolicyStatus;
use ado_core::{PullRequestView, Search, Ticks, UpdateKind};
use ado_database::repositories::cache_store::{NewRepositoryInput, PullRequestSearchSync, PullRequestSync};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::UpdaterContext;
use crate::error::{UpdaterError, UpdaterResult};
use crate::identity::identity_input;
use crate::updater::{CachedSearchHandle, Updater};
use crate::views::{CachedChildren, PullRequestRow};

pub struct PullRequestUpdater {
  ctx: UpdaterContext,
}

impl PullRequestUpdater {
  pub fn new(ctx: UpdaterContext) -> Self {
    Self { ctx }
  }

  fn unpack<'a>(search: &'a Search) -> UpdaterResult<(i64, &'a str, &'a str, &'a str, PullRequestView)> {
    match search {
      Search::PullRequests { id, organization_url, project_name, repository_name, view } => {
        Ok((*id, organization_url, project_name, repository_name, *view))
      }
      other => Err(UpdaterError::Invariant(format!("PullRequestUpdater received {:?}", other.kind()))),
    }
  }

  fn matches_view(view: PullRequestView, username: &str, pr: &ado_client::types::RemotePullRequest) -> bool {
    match view {
      PullRequestView::All => true,
      PullRequestView::Mine => pr.creator.unique_name.as_deref() == Some(username),
      PullRequestView::Assigned => pr.reviewer_unique_names.iter().any(|name| name == username),
    }
  }
}

#[async_trait]
impl Updater for PullRequestUpdater {
  fn kind(&self) -> UpdateKind {
    UpdateKind::PullRequests
  }

  async fn update_data(&self, search: &Search, cancel: &CancellationToken) -> UpdaterResult<()> {
    let (_, organization_url, project_name, repository_name, view) = Self::unpack(search)?;
    let account = self.ctx.current_account().await?;
    let (_, project_id) = self.ctx.ensure_organization_and_project(organization_url, project_name, cancel).await?;

    let sync_started_at = Ticks::now().0;
    let remote_prs = self.ctx.live_client.get_pull_requests(organization_url, project_name, repository_name, cancel).await?;

    let mut items = Vec::new();
    for remote_pr in remote_prs.into_iter().filter(|pr| Self::matches_view(view, &account.username, pr)) {
      if cancel.is_cancelled() {
        return Err(UpdaterError::Cancelled);
      }
      let evaluations =
        self.ctx.live_client.get_policy_evaluations(organization_url, project_name, remote_pr.external_id, cancel).await?;
      let policy_status = RemotePolicyStatus::worst(evaluations.iter().map(|evaluation| evaluation.status));
      let policy_status_reason = evaluations
        .iter()
        .find(|evaluation| evaluation.status == policy_status)
        .map(|evaluation| evaluation.reason.clone())
        .unwrap_or_default();

      items.push(PullRequestSync {
        remote_id: remote_pr.external_id,
        title: remote_pr.title,
        url: remote_pr.url,
        creator: identity_input(&remote_pr.creator, sync_started_at),
        status: remote_pr.status.to_string(),
        policy_status: policy_status.to_string(),
        policy_status_reason,
        target_branch: remote_pr.target_branch,
        creation_date: Ticks::from_datetime(remote_pr.creation_date).0,
        html_url: remote_pr.html_url,
      });
    }

    self
      .ctx
      .cache
      .sync_pull_request_search(PullRequestSearchSync {
        repository: NewRepositoryInput {
          name: repository_name.to_string(),
          external_id: repository_name.to_string(),
          project_id,
          clone_url: String::new(),
          is_private: false,
          time_updated: sync_started_at,
        },
        username: account.username.clone(),
        view_id: view.to_string(),
        sync_started_at,
        items,
      })
      .await?;

    Ok(())
  }

  async fn get_cached_data_for_search(&self, search: &Search) -> UpdaterResult<Option<CachedSearchHandle>> {
    let (_, organization_url, project_name, repository_name, view) = Self::unpack(search)?;
    let account = self.ctx.current_account().await?;
    let Some(project_id) = self.ctx.resolve_project_id_from_cache(organization_url, project_name).await? else {
      return Ok(None);
    };
    let Some(repository) = self.ctx.cache.find_repository_by_name(project_id, repository_name.to_string()).await? else {
      return Ok(None);
    };
    let row = self
      .ctx
      .cache
      .find_pull_request_search(project_id, repository.id, account.username.clone(), view.to_string())
      .await?;
    Ok(row.map(|row| CachedSearchHandle { row_id: row.id, time_updated: row.time_updated }))
  }

  async fn get_cached_children(&self, search: &Search) -> UpdaterResult<CachedChildren> {
    let Some(handle) = self.get_cached_data_for_search(search).await? else {
      return Ok(CachedChildren::PullRequests(Vec::new()));
    };
    let rows = self.ctx.cache.cached_pull_requests_for_search(handle.row_id).await?;
    let mut views = Vec::with_capacity(rows.len());
    for (pull_request, _) in rows {
      let creator_name = self.ctx.cache.identity_name(pull_request.creator_id).await?.unwrap_or_default();
      views.push(PullRequestRow {
        external_id: pull_request.external_id,
        title: pull_request.title,
        html_url: pull_request.html_url,
        creator_name,
        status: pull_request.status,
        policy_status: pull_request.policy_status,
        policy_status_reason: pull_request.policy_status_reason,
        target_branch: pull_request.target_branch,
        creation_date: Ticks(pull_request.creation_date).to_datetime(),
      });
    }
    Ok(CachedChildren::PullRequests(views))
  }

  async fn is_new_or_stale(&self, search: &Search, cooldown: Duration) -> UpdaterResult<bool> {
    match self.get_cached_data_for_search(search).await? {
      None => Ok(true),
      Some(handle) => Ok(Ticks(handle.time_updated).is_older_than(crate::updater::as_chrono_duration(cooldown))),
    }
  }

  async fn prune_obsolete_data(&self) -> UpdaterResult<()> {
    self.ctx.cache.prune_orphan_pull_requests().await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ado_client::mock::StubLiveClient;
  use ado_client::types::{RemoteIdentity, RemotePolicyEvaluation, RemoteProject, RemotePullRequest, RemotePullRequestStatus};
  use chrono::Utc;

  use crate::testutil::test_context;

  fn identity(name: &str, unique_name: &str) -> RemoteIdentity {
    RemoteIdentity { external_id: format!("guid-{name}"), display_name: name.to_string(), unique_name: Some(unique_name.to_string()) }
  }

  fn seeded_stub() -> StubLiveClient {
    let stub = StubLiveClient::new();
    stub.projects.lock().unwrap().insert(
      "Widgets".into(),
      RemoteProject { external_id: "proj-guid".into(), name: "Widgets".into(), description: None },
    );
    stub.pull_requests.lock().unwrap().insert(
      "widgets-repo".into(),
      vec![
        RemotePullRequest {
          external_id: 100,
          title: "My change".into(),
          url: "https://dev.azure.com/o/p/_apis/git/repositories/r/pullRequests/100".into(),
          html_url: "https://dev.azure.com/o/p/_git/r/pullrequest/100".into(),
          creator: identity("alice", "alice"),
          reviewer_unique_names: vec![],
          status: RemotePullRequestStatus::Active,
          target_branch: "refs/heads/main".into(),
          creation_date: Utc::now(),
        },
        RemotePullRequest {
          external_id: 101,
          title: "Someone else's change".into(),
          url: "https://dev.azure.com/o/p/_apis/git/repositories/r/pullRequests/101".into(),
          html_url: "https://dev.azure.com/o/p/_git/r/pullrequest/101".into(),
          creator: identity("bob", "bob"),
          reviewer_unique_names: vec!["alice".into()],
          status: RemotePullRequestStatus::Active,
          target_branch: "refs/heads/main".into(),
          creation_date: Utc::now() - chrono::Duration::hours(1),
        },
      ],
    );
    stub.policy_evaluations.lock().unwrap().insert(
      100,
      vec![RemotePolicyEvaluation { status: ado_client::types::RemotePolicyStatus::Approved, reason: String::new() }],
    );
    stub.policy_evaluations.lock().unwrap().insert(
      101,
      vec![RemotePolicyEvaluation { status: ado_client::types::RemotePolicyStatus::Rejected, reason: "build failed".into() }],
    );
    stub
  }

  fn search(view: PullRequestView) -> Search {
    Search::PullRequests {
      id: 1,
      organization_url: "https://dev.azure.com/o".into(),
      project_name: "Widgets".into(),
      repository_name: "widgets-repo".into(),
      view,
    }
  }

  #[tokio::test]
  async fn mine_view_keeps_only_self_authored_pull_requests() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = PullRequestUpdater::new(ctx);
    updater.update_data(&search(PullRequestView::Mine), &CancellationToken::new()).await.unwrap();

    let children = updater.get_cached_children(&search(PullRequestView::Mine)).await.unwrap();
    let CachedChildren::PullRequests(items) = children else { panic!("expected pull requests") };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].external_id, 100);
    assert_eq!(items[0].policy_status, "Approved");
  }

  #[tokio::test]
  async fn assigned_view_keeps_only_pull_requests_with_self_as_reviewer() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = PullRequestUpdater::new(ctx);
    updater.update_data(&search(PullRequestView::Assigned), &CancellationToken::new()).await.unwrap();

    let children = updater.get_cached_children(&search(PullRequestView::Assigned)).await.unwrap();
    let CachedChildren::PullRequests(items) = children else { panic!("expected pull requests") };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].external_id, 101);
    assert_eq!(items[0].policy_status, "Rejected");
    assert_eq!(items[0].policy_status_reason, "build failed");
  }

  #[tokio::test]
  async fn all_view_keeps_every_pull_request_ordered_by_creation_date_desc() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = PullRequestUpdater::new(ctx);
    updater.update_data(&search(PullRequestView::All), &CancellationToken::new()).await.unwrap();

    let children = updater.get_cached_children(&search(PullRequestView::All)).await.unwrap();
    let CachedChildren::PullRequests(items) = children else { panic!("expected pull requests") };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].external_id, 100);
    assert_eq!(items[1].external_id, 101);
  }

  #[tokio::test]
  async fn is_new_or_stale_is_true_before_first_sync() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = PullRequestUpdater::new(ctx);
    assert!(updater.is_new_or_stale(&search(PullRequestView::All), Duration::from_secs(60)).await.unwrap());
  }
}
