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

//! The implicit "my work items" search: same mechanics as `QueryUpdater` but
//! driven by a synthesized WIQL literal and a tighter, user-local TTL.

use std::collections::HashSet;
use std::time::Duration;

use ado_core::{parse_organization_and_project, Search, Ticks, UpdateKind};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::UpdaterContext;
use crate::error::{UpdaterError, UpdaterResult};
use crate::query_updater::{sync_work_item_query, work_item_type_priority, WorkItemQuerySync};
use crate::updater::{as_chrono_duration, CachedSearchHandle, Updater};
use crate::views::{CachedChildren, WorkItemRow};

const WIQL: &str = "SELECT [System.Id] FROM WorkItems WHERE [System.AssignedTo] = @Me AND [System.State] <> 'Closed' AND [System.State] <> 'Removed' ORDER BY [System.ChangedDate] DESC";

pub struct MyWorkItemsUpdater {
  ctx: UpdaterContext,
}

impl MyWorkItemsUpdater {
  pub fn new(ctx: UpdaterContext) -> Self {
    Self { ctx }
  }

  fn unpack<'a>(search: &'a Search) -> UpdaterResult<(&'a str, &'a str, &'a str)> {
    match search {
      Search::MyWorkItems { organization_url, project_name, username } => Ok((organization_url, project_name, username)),
      other => Err(UpdaterError::Invariant(format!("MyWorkItemsUpdater received {:?}", other.kind()))),
    }
  }

  /// Enumerates the `(organizationUrl, projectName)` pairs an `All`/periodic
  /// cycle should run MyWorkItems for: `ProjectSettings` rows first, falling
  /// back to every distinct pair referenced by any other saved search.
  /// Deduplicated case-insensitively on `"{org}|{project}"`.
  pub async fn discover_targets(&self) -> UpdaterResult<Vec<(String, String)>> {
    let settings = self.ctx.project_settings.get_all().await?;
    if !settings.is_empty() {
      return Ok(dedupe(settings.into_iter().map(|row| (row.organization_url, row.project_name))));
    }

    let mut urls = Vec::new();
    for row in self.ctx.query_defs.get_all(false).await? {
      urls.push(row.url);
    }
    for row in self.ctx.pull_request_search_defs.get_all(false).await? {
      urls.push(row.url);
    }
    for row in self.ctx.definition_search_defs.get_all(false).await? {
      urls.push(row.url);
    }

    let pairs = urls.iter().filter_map(|url| parse_organization_and_project(url));
    Ok(dedupe(pairs))
  }
}

fn dedupe(pairs: impl IntoIterator<Item = (String, String)>) -> Vec<(String, String)> {
  let mut seen = HashSet::new();
  let mut result = Vec::new();
  for (org, project) in pairs {
    let key = format!("{}|{}", org.to_lowercase(), project.to_lowercase());
    if seen.insert(key) {
      result.push((org, project));
    }
  }
  result
}

#[async_trait]
impl Updater for MyWorkItemsUpdater {
  fn kind(&self) -> UpdateKind {
    UpdateKind::MyWorkItems
  }

  async fn update_data(&self, search: &Search, cancel: &CancellationToken) -> UpdaterResult<()> {
    let (organization_url, project_name, username) = Self::unpack(search)?;
    let (_, project_id) = self.ctx.ensure_organization_and_project(organization_url, project_name, cancel).await?;

    let ids = self.ctx.live_client.run_wiql(organization_url, project_name, WIQL, cancel).await?;
    let external_id = Search::my_work_items_query_external_id(organization_url, project_name);

    sync_work_item_query(
      &self.ctx,
      organization_url,
      project_name,
      ids,
      WorkItemQuerySync {
        external_query_id: external_id,
        display_name: "My Work Items".to_string(),
        username: username.to_string(),
        project_id,
        work_item_ttl: self.ctx.settings.my_work_items_ttl,
      },
      cancel,
    )
    .await?;

    Ok(())
  }

  async fn get_cached_data_for_search(&self, search: &Search) -> UpdaterResult<Option<CachedSearchHandle>> {
    let (organization_url, project_name, username) = Self::unpack(search)?;
    let external_id = Search::my_work_items_query_external_id(organization_url, project_name);
    let row = self.ctx.cache.find_query_by_external_id_and_username(external_id, username.to_string()).await?;
    Ok(row.map(|row| CachedSearchHandle { row_id: row.id, time_updated: row.time_updated }))
  }

  async fn get_cached_children(&self, search: &Search) -> UpdaterResult<CachedChildren> {
    let (organization_url, project_name, username) = Self::unpack(search)?;
    let external_id = Search::my_work_items_query_external_id(organization_url, project_name);
    let query_row = self.ctx.cache.find_query_by_external_id_and_username(external_id, username.to_string()).await?;
    let Some(query_row) = query_row else {
      return Ok(CachedChildren::WorkItems(Vec::new()));
    };
    let rows = self.ctx.cache.cached_work_items_for_query(query_row.id).await?;
    let mut views = Vec::with_capacity(rows.len());
    for (work_item, _) in rows {
      let work_item_type_name = self.ctx.cache.work_item_type_name(work_item.work_item_type_id).await?;
      let assigned_to_name = match work_item.assigned_to_id {
        Some(id) => self.ctx.cache.identity_name(id).await?,
        None => None,
      };
      views.push(WorkItemRow {
        external_id: work_item.external_id,
        title: work_item.title,
        html_url: work_item.html_url,
        state: work_item.state,
        work_item_type_name,
        assigned_to_name,
        changed_date: Ticks(work_item.changed_date).to_datetime(),
      });
    }
    views.sort_by(|a, b| {
      work_item_type_priority(&a.work_item_type_name)
        .cmp(&work_item_type_priority(&b.work_item_type_name))
        .then(b.changed_date.cmp(&a.changed_date))
    });
    Ok(CachedChildren::WorkItems(views))
  }

  async fn is_new_or_stale(&self, search: &Search, cooldown: Duration) -> UpdaterResult<bool> {
    match self.get_cached_data_for_search(search).await? {
      None => Ok(true),
      Some(handle) => Ok(Ticks(handle.time_updated).is_older_than(as_chrono_duration(cooldown))),
    }
  }

  async fn prune_obsolete_data(&self) -> UpdaterResult<()> {
    self.ctx.cache.prune_orphan_work_items().await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ado_client::mock::StubLiveClient;
  use ado_client::types::{RemoteIdentity, RemoteProject, RemoteWorkItem, RemoteWorkItemType};
  use chrono::Utc;

  use crate::testutil::test_context;

  fn identity(name: &str) -> RemoteIdentity {
    RemoteIdentity { external_id: format!("guid-{name}"), display_name: name.to_string(), unique_name: None }
  }

  fn search() -> Search {
    Search::MyWorkItems {
      organization_url: "https://dev.azure.com/o".into(),
      project_name: "Widgets".into(),
      username: "alice".into(),
    }
  }

  fn seeded_stub() -> StubLiveClient {
    let stub = StubLiveClient::new();
    stub.projects.lock().unwrap().insert(
      "Widgets".into(),
      RemoteProject { external_id: "proj-guid".into(), name: "Widgets".into(), description: None },
    );
    stub.wiql_results.lock().unwrap().insert(WIQL.into(), vec![42]);
    stub.work_items.lock().unwrap().insert(
      42,
      RemoteWorkItem {
        external_id: 42,
        title: "Mine".into(),
        html_url: "https://dev.azure.com/o/p/_workitems/edit/42".into(),
        state: "Active".into(),
        reason: "New".into(),
        assigned_to: Some(identity("alice")),
        created_date: Utc::now(),
        created_by: identity("alice"),
        changed_date: Utc::now(),
        changed_by: identity("alice"),
        work_item_type: "Task".into(),
      },
    );
    stub.work_item_types.lock().unwrap().push(RemoteWorkItemType {
      name: "Task".into(),
      icon: "task.png".into(),
      color: "yellow".into(),
      description: "A task".into(),
    });
    stub
  }

  #[tokio::test]
  async fn synthesized_query_key_matches_spec_format_and_scopes_by_username() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = MyWorkItemsUpdater::new(ctx);
    updater.update_data(&search(), &CancellationToken::new()).await.unwrap();

    let handle = updater.get_cached_data_for_search(&search()).await.unwrap();
    assert!(handle.is_some());

    let other_user = Search::MyWorkItems {
      organization_url: "https://dev.azure.com/o".into(),
      project_name: "Widgets".into(),
      username: "bob".into(),
    };
    assert!(updater.get_cached_data_for_search(&other_user).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn discovery_falls_back_to_saved_searches_when_no_project_settings() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    ctx.query_defs.add_or_update("My Query".into(), "https://dev.azure.com/o/Widgets/_queries/q1".into(), true).await.unwrap();
    let updater = MyWorkItemsUpdater::new(ctx);
    let targets = updater.discover_targets().await.unwrap();
    assert_eq!(targets, vec![("https://dev.azure.com/o".to_string(), "Widgets".to_string())]);
  }

  #[tokio::test]
  async fn project_settings_take_priority_over_fallback_discovery() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    ctx.query_defs.add_or_update("My Query".into(), "https://dev.azure.com/o/Other/_queries/q1".into(), true).await.unwrap();
    ctx.project_settings.add_or_update("https://dev.azure.com/o".into(), "Widgets".into()).await.unwrap();
    let updater = MyWorkItemsUpdater::new(ctx);
    let targets = updater.discover_targets().await.unwrap();
    assert_eq!(targets, vec![("https://dev.azure.com/o".to_string(), "Widgets".to_string())]);
  }
}
