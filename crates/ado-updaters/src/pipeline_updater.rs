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

//! Build-definition search. The `Definition` row is rate-limited: it is
//! overwritten only once `definitionUpdateThreshold` (4h) has elapsed since
//! its last sync. `Build` rows carry no such throttle and are always
//! refreshed, ordered by queue time descending as the remote service itself
//! returns them.

use std::time::Duration;

use ado_core::{Search, Ticks, UpdateKind};
use ado_database::repositories::cache_store::{BuildSync, NewDefinitionInput, PipelineSync};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::UpdaterContext;
use crate::error::{UpdaterError, UpdaterResult};
use crate::identity::identity_input;
use crate::updater::{CachedSearchHandle, Updater};
use crate::views::{BuildRow, CachedChildren};

pub struct PipelineUpdater {
  ctx: UpdaterContext,
}

impl PipelineUpdater {
  pub fn new(ctx: UpdaterContext) -> Self {
    Self { ctx }
  }

  fn unpack(search: &Search) -> UpdaterResult<(i64, &str, &str, i64)> {
    match search {
      Search::Pipeline { id, organization_url, project_name, definition_external_id } => {
        Ok((*id, organization_url, project_name, *definition_external_id))
      }
      other => Err(UpdaterError::Invariant(format!("PipelineUpdater received {:?}", other.kind()))),
    }
  }
}

#[async_trait]
impl Updater for PipelineUpdater {
  fn kind(&self) -> UpdateKind {
    UpdateKind::Pipeline
  }

  async fn update_data(&self, search: &Search, cancel: &CancellationToken) -> UpdaterResult<()> {
    let (_, organization_url, project_name, definition_external_id) = Self::unpack(search)?;
    let (_, project_id) = self.ctx.ensure_organization_and_project(organization_url, project_name, cancel).await?;

    let now = Ticks::now().0;
    let existing = self.ctx.cache.find_definition_by_external_id(definition_external_id).await?;
    let threshold = crate::query_updater::ticks_for(self.ctx.settings.definition_update_threshold);
    let due_for_refresh = match &existing {
      Some(row) => now - row.time_updated >= threshold,
      None => true,
    };

    let definition = if due_for_refresh {
      let remote_definition =
        self.ctx.live_client.get_build_definitions(organization_url, project_name, definition_external_id, cancel).await?;
      Some(NewDefinitionInput {
        external_id: remote_definition.external_id,
        name: remote_definition.name,
        project_id,
        creation_date: Ticks::from_datetime(remote_definition.creation_date).0,
        html_url: remote_definition.html_url,
        time_updated: now,
      })
    } else {
      None
    };
    let existing_definition_id = existing.map(|row| row.id);

    let remote_builds = self.ctx.live_client.get_builds(organization_url, project_name, definition_external_id, cancel).await?;
    if cancel.is_cancelled() {
      return Err(UpdaterError::Cancelled);
    }

    let builds = remote_builds
      .into_iter()
      .map(|remote_build| BuildSync {
        remote_id: remote_build.external_id,
        build_number: remote_build.build_number,
        status: remote_build.status.to_string(),
        result: remote_build.result.to_string(),
        queue_time: Ticks::from_datetime(remote_build.queue_time).0,
        start_time: remote_build.start_time.map(|time| Ticks::from_datetime(time).0),
        finish_time: remote_build.finish_time.map(|time| Ticks::from_datetime(time).0),
        url: remote_build.url,
        source_branch: remote_build.source_branch,
        trigger_message: remote_build.trigger_message,
        requested_by: identity_input(&remote_build.requested_by, now),
        time_updated: now,
      })
      .collect();

    self.ctx.cache.sync_pipeline(PipelineSync { definition, existing_definition_id, builds }).await?;

    Ok(())
  }

  async fn get_cached_data_for_search(&self, search: &Search) -> UpdaterResult<Option<CachedSearchHandle>> {
    let (_, _, _, definition_external_id) = Self::unpack(search)?;
    let row = self.ctx.cache.find_definition_by_external_id(definition_external_id).await?;
    Ok(row.map(|row| CachedSearchHandle { row_id: row.id, time_updated: row.time_updated }))
  }

  async fn get_cached_children(&self, search: &Search) -> UpdaterResult<CachedChildren> {
    let Some(handle) = self.get_cached_data_for_search(search).await? else {
      return Ok(CachedChildren::Builds(Vec::new()));
    };
    let builds = self.ctx.cache.builds_for_definition_by_queue_time_desc(handle.row_id).await?;
    let mut views = Vec::with_capacity(builds.len());
    for build in builds {
      let requester_name = self.ctx.cache.identity_name(build.requester_id).await?.unwrap_or_default();
      views.push(BuildRow {
        external_id: build.external_id,
        build_number: build.build_number,
        status: build.status,
        result: build.result,
        queue_time: Ticks(build.queue_time).to_datetime(),
        url: build.url,
        requester_name,
      });
    }
    Ok(CachedChildren::Builds(views))
  }

  async fn is_new_or_stale(&self, search: &Search, cooldown: Duration) -> UpdaterResult<bool> {
    match self.get_cached_data_for_search(search).await? {
      None => Ok(true),
      Some(handle) => Ok(Ticks(handle.time_updated).is_older_than(crate::updater::as_chrono_duration(cooldown))),
    }
  }

  async fn prune_obsolete_data(&self) -> UpdaterResult<()> {
    let cutoff = Ticks::now().0 - crate::query_updater::ticks_for(self.ctx.settings.build_retention);
    self.ctx.cache.prune_builds_older_than(cutoff).await?;
    self.ctx.cache.prune_definitions_with_no_builds().await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ado_client::mock::StubLiveClient;
  use ado_client::types::{RemoteBuild, RemoteBuildDefinition, RemoteBuildResult, RemoteBuildStatus, RemoteIdentity, RemoteProject};
  use chrono::Utc;

  use crate::testutil::test_context;

  fn identity(name: &str) -> RemoteIdentity {
    RemoteIdentity { external_id: format!("guid-{name}"), display_name: name.to_string(), unique_name: None }
  }

  fn seeded_stub() -> StubLiveClient {
    let stub = StubLiveClient::new();
    stub.projects.lock().unwrap().insert(
      "Widgets".into(),
      RemoteProject { external_id: "proj-guid".into(), name: "Widgets".into(), description: None },
    );
    stub.build_definitions.lock().unwrap().insert(
      7,
      RemoteBuildDefinition {
        external_id: 7,
        name: "CI".into(),
        html_url: "https://dev.azure.com/o/p/_build?definitionId=7".into(),
        creation_date: Utc::now(),
      },
    );
    stub.builds.lock().unwrap().insert(
      7,
      vec![RemoteBuild {
        external_id: 200,
        build_number: "20260801.1".into(),
        status: RemoteBuildStatus::Completed,
        result: RemoteBuildResult::Succeeded,
        queue_time: Utc::now(),
        start_time: Some(Utc::now()),
        finish_time: Some(Utc::now()),
        url: "https://dev.azure.com/o/p/_apis/build/builds/200".into(),
        source_branch: "refs/heads/main".into(),
        trigger_message: None,
        requested_by: identity("alice"),
      }],
    );
    stub
  }

  fn search() -> Search {
    Search::Pipeline {
      id: 1,
      organization_url: "https://dev.azure.com/o".into(),
      project_name: "Widgets".into(),
      definition_external_id: 7,
    }
  }

  #[tokio::test]
  async fn update_data_populates_definition_and_builds() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = PipelineUpdater::new(ctx);
    updater.update_data(&search(), &CancellationToken::new()).await.unwrap();

    let children = updater.get_cached_children(&search()).await.unwrap();
    let CachedChildren::Builds(items) = children else { panic!("expected builds") };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, "Completed");
    assert_eq!(items[0].requester_name, "alice");
  }

  #[tokio::test]
  async fn second_sync_within_threshold_does_not_touch_definition_row() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = PipelineUpdater::new(ctx);
    updater.update_data(&search(), &CancellationToken::new()).await.unwrap();
    let first = updater.get_cached_data_for_search(&search()).await.unwrap().unwrap();

    updater.update_data(&search(), &CancellationToken::new()).await.unwrap();
    let second = updater.get_cached_data_for_search(&search()).await.unwrap().unwrap();

    assert_eq!(first.row_id, second.row_id);
    assert_eq!(first.time_updated, second.time_updated);
  }

  #[tokio::test]
  async fn is_new_or_stale_is_true_before_first_sync() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = PipelineUpdater::new(ctx);
    assert!(updater.is_new_or_stale(&search(), Duration::from_secs(60)).await.unwrap());
  }
}
