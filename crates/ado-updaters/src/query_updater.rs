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

//! Supports remote query kinds Flat/Tree/OneHop; rejects Temporary (unsaved)
//! queries. Batches work-item fetches at 200 ids/request, chunks issued
//! concurrently with an omit-failures error policy. Work-item-type lookups
//! are deduped case-insensitively per update cycle.
//!
//! [`sync_work_item_query`] is shared with `MyWorkItemsUpdater`: both
//! updaters differ only in how they resolve the query's ids and display
//! name, and must otherwise apply the exact same transactional sync.

use std::collections::HashMap;
use std::time::Duration;

use ado_client::types::RemoteQueryKind;
use ado_core::{Search, Ticks, UpdateKind};
use ado_database::models::cache::Query;
use ado_database::repositories::cache_store::{NewQueryInput, NewWorkItemTypeInput, QuerySync, WorkItemSync};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::UpdaterContext;
use crate::error::{UpdaterError, UpdaterResult};
use crate::identity::identity_input;
use crate::updater::{CachedSearchHandle, Updater};
use crate::views::{CachedChildren, WorkItemRow};

const MAX_CONCURRENT_BATCHES: usize = 8;

pub(crate) fn work_item_type_priority(name: &str) -> u8 {
  match name {
    "Bug" => 0,
    "Feature" => 1,
    "Product Backlog Item" => 2,
    "User Story" => 3,
    "Task" => 10,
    _ => 5,
  }
}

/// The bits that differ between a saved-query sync and the synthesized
/// MyWorkItems sync; everything else is identical.
pub(crate) struct WorkItemQuerySync {
  pub external_query_id: String,
  pub display_name: String,
  pub username: String,
  pub project_id: i64,
  pub work_item_ttl: Duration,
}

/// Fetches every id in `ids` (concurrently, batched, omitting failures),
/// resolves work item types once up front, then applies the whole result as
/// one `CacheStore::sync_query` transaction. No write happens before the
/// single `sync_query` call, so a failure or cancellation at any point up to
/// there leaves the cache exactly as it was.
pub(crate) async fn sync_work_item_query(
  ctx: &UpdaterContext,
  organization_url: &str,
  project_name: &str,
  ids: Vec<i64>,
  params: WorkItemQuerySync,
  cancel: &CancellationToken,
) -> UpdaterResult<Query> {
  let sync_started_at = Ticks::now().0;

  let chunks = crate::batch::chunk(ids, ctx.settings.work_item_batch_size);
  let ctx_clone = ctx.clone();
  let org = organization_url.to_string();
  let proj = project_name.to_string();
  let cancel_clone = cancel.clone();
  let fetched = crate::batch::fetch_chunks_omitting_failures(chunks, MAX_CONCURRENT_BATCHES, move |chunk| {
    let ctx = ctx_clone.clone();
    let org = org.clone();
    let proj = proj.clone();
    let cancel = cancel_clone.clone();
    Box::pin(async move { ctx.live_client.get_work_items(&org, &proj, &chunk, &cancel).await.map_err(UpdaterError::from) })
  })
  .await;

  if cancel.is_cancelled() {
    return Err(UpdaterError::Cancelled);
  }

  let type_by_name: HashMap<String, NewWorkItemTypeInput> = if fetched.is_empty() {
    HashMap::new()
  } else {
    ctx
      .live_client
      .get_work_item_types(organization_url, project_name, cancel)
      .await?
      .into_iter()
      .map(|remote_type| {
        (
          remote_type.name.to_lowercase(),
          NewWorkItemTypeInput {
            name: remote_type.name,
            icon: remote_type.icon,
            color: remote_type.color,
            description: remote_type.description,
            project_id: params.project_id,
          },
        )
      })
      .collect()
  };

  let mut items = Vec::with_capacity(fetched.len());
  for remote_item in fetched {
    let work_item_type = type_by_name
      .get(&remote_item.work_item_type.to_lowercase())
      .cloned()
      .ok_or_else(|| UpdaterError::Invariant(format!("unknown work item type {}", remote_item.work_item_type)))?;
    items.push(WorkItemSync {
      remote_id: remote_item.external_id,
      title: remote_item.title,
      html_url: remote_item.html_url,
      state: remote_item.state,
      reason: remote_item.reason,
      created_by: identity_input(&remote_item.created_by, sync_started_at),
      changed_by: identity_input(&remote_item.changed_by, sync_started_at),
      assigned_to: remote_item.assigned_to.as_ref().map(|identity| identity_input(identity, sync_started_at)),
      work_item_type,
      created_date: Ticks::from_datetime(remote_item.created_date).0,
      changed_date: Ticks::from_datetime(remote_item.changed_date).0,
    });
  }

  let ttl_cutoff = sync_started_at - ticks_for(params.work_item_ttl);
  ctx
    .cache
    .sync_query(QuerySync {
      query: NewQueryInput {
        external_id: params.external_query_id,
        display_name: params.display_name,
        username: params.username,
        project_id: params.project_id,
        time_updated: sync_started_at,
      },
      items,
      sync_started_at,
      ttl_cutoff,
    })
    .await
    .map_err(UpdaterError::from)
}

pub struct QueryUpdater {
  ctx: UpdaterContext,
}

impl QueryUpdater {
  pub fn new(ctx: UpdaterContext) -> Self {
    Self { ctx }
  }

  fn unpack<'a>(search: &'a Search) -> UpdaterResult<(i64, &'a str, &'a str, &'a str)> {
    match search {
      Search::Query { id, organization_url, project_name, external_query_id } => {
        Ok((*id, organization_url, project_name, external_query_id))
      }
      other => Err(UpdaterError::Invariant(format!("QueryUpdater received {:?}", other.kind()))),
    }
  }
}

#[async_trait]
impl Updater for QueryUpdater {
  fn kind(&self) -> UpdateKind {
    UpdateKind::Query
  }

  async fn update_data(&self, search: &Search, cancel: &CancellationToken) -> UpdaterResult<()> {
    let (_, organization_url, project_name, external_query_id) = Self::unpack(search)?;
    let account = self.ctx.current_account().await?;
    let (_, project_id) = self.ctx.ensure_organization_and_project(organization_url, project_name, cancel).await?;

    let definition = self
      .ctx
      .live_client
      .get_query_definition(organization_url, project_name, external_query_id, cancel)
      .await?;
    if matches!(definition.kind, RemoteQueryKind::Temporary) {
      return Err(UpdaterError::Unsupported("temporary (unsaved) queries are not cached".into()));
    }

    let ids = self.ctx.live_client.run_wiql(organization_url, project_name, &definition.wiql, cancel).await?;

    sync_work_item_query(
      &self.ctx,
      organization_url,
      project_name,
      ids,
      WorkItemQuerySync {
        external_query_id: external_query_id.to_string(),
        display_name: definition.name,
        username: account.username.clone(),
        project_id,
        work_item_ttl: self.ctx.settings.query_work_item_ttl,
      },
      cancel,
    )
    .await?;

    Ok(())
  }

  async fn get_cached_data_for_search(&self, search: &Search) -> UpdaterResult<Option<CachedSearchHandle>> {
    let (_, _, _, external_query_id) = Self::unpack(search)?;
    let account = self.ctx.current_account().await?;
    let row = self.ctx.cache.find_query_by_external_id_and_username(external_query_id.to_string(), account.username.clone()).await?;
    Ok(row.map(|row| CachedSearchHandle { row_id: row.id, time_updated: row.time_updated }))
  }

  async fn get_cached_children(&self, search: &Search) -> UpdaterResult<CachedChildren> {
    let (_, _, _, external_query_id) = Self::unpack(search)?;
    let account = self.ctx.current_account().await?;
    let query_row = self
      .ctx
      .cache
      .find_query_by_external_id_and_username(external_query_id.to_string(), account.username.clone())
      .await?;
    let Some(query_row) = query_row else {
      return Ok(CachedChildren::WorkItems(Vec::new()));
    };
    let mut rows = self.ctx.cache.cached_work_items_for_query(query_row.id).await?;
    let mut views = Vec::with_capacity(rows.len());
    for (work_item, _) in rows.drain(..) {
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
      Some(handle) => Ok(Ticks(handle.time_updated).is_older_than(crate::updater::as_chrono_duration(cooldown))),
    }
  }

  async fn prune_obsolete_data(&self) -> UpdaterResult<()> {
    // TTL prune runs per-search inside `update_data`; here we only handle
    // the orphan pass, which must run after every search's TTL prune.
    self.ctx.cache.prune_orphan_work_items().await?;
    Ok(())
  }
}

pub(crate) fn ticks_for(duration: Duration) -> i64 {
  (duration.as_secs_f64() * ado_core::time::TICKS_PER_SECOND as f64) as i64
}

#[cfg(test)]
mod tests {
  use super::*;
  use ado_client::mock::StubLiveClient;
  use ado_client::types::{RemoteIdentity, RemoteProject, RemoteQueryDefinition, RemoteWorkItem, RemoteWorkItemType};
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
    stub.query_definitions.lock().unwrap().insert(
      "query-1".into(),
      RemoteQueryDefinition {
        external_id: "query-1".into(),
        name: "My Bugs".into(),
        kind: RemoteQueryKind::Flat,
        wiql: "SELECT [System.Id] FROM WorkItems".into(),
      },
    );
    stub.wiql_results.lock().unwrap().insert("SELECT [System.Id] FROM WorkItems".into(), vec![1, 2]);
    stub.work_items.lock().unwrap().insert(
      1,
      RemoteWorkItem {
        external_id: 1,
        title: "Fix crash".into(),
        html_url: "https://dev.azure.com/o/p/_workitems/edit/1".into(),
        state: "Active".into(),
        reason: "New".into(),
        assigned_to: Some(identity("bob")),
        created_date: Utc::now(),
        created_by: identity("alice"),
        changed_date: Utc::now(),
        changed_by: identity("alice"),
        work_item_type: "Bug".into(),
      },
    );
    stub.work_items.lock().unwrap().insert(
      2,
      RemoteWorkItem {
        external_id: 2,
        title: "Add feature".into(),
        html_url: "https://dev.azure.com/o/p/_workitems/edit/2".into(),
        state: "New".into(),
        reason: "New".into(),
        assigned_to: None,
        created_date: Utc::now(),
        created_by: identity("alice"),
        changed_date: Utc::now() - chrono::Duration::hours(1),
        changed_by: identity("alice"),
        work_item_type: "Feature".into(),
      },
    );
    stub.work_item_types.lock().unwrap().push(RemoteWorkItemType {
      name: "Bug".into(),
      icon: "bug.png".into(),
      color: "red".into(),
      description: "A bug".into(),
    });
    stub.work_item_types.lock().unwrap().push(RemoteWorkItemType {
      name: "Feature".into(),
      icon: "feature.png".into(),
      color: "blue".into(),
      description: "A feature".into(),
    });
    stub
  }

  fn search() -> Search {
    Search::Query {
      id: 1,
      organization_url: "https://dev.azure.com/o".into(),
      project_name: "Widgets".into(),
      external_query_id: "query-1".into(),
    }
  }

  #[tokio::test]
  async fn update_data_populates_cache_and_orders_children_by_type_then_recency() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = QueryUpdater::new(ctx);
    let cancel = CancellationToken::new();
    updater.update_data(&search(), &cancel).await.unwrap();

    let handle = updater.get_cached_data_for_search(&search()).await.unwrap();
    assert!(handle.is_some());

    let children = updater.get_cached_children(&search()).await.unwrap();
    let CachedChildren::WorkItems(items) = children else { panic!("expected work items") };
    assert_eq!(items.len(), 2);
    // Bug (priority 0) sorts ahead of Feature (priority 1) regardless of date.
    assert_eq!(items[0].work_item_type_name, "Bug");
    assert_eq!(items[1].work_item_type_name, "Feature");
    assert_eq!(items[0].assigned_to_name.as_deref(), Some("bob"));
  }

  #[tokio::test]
  async fn rejects_temporary_queries() {
    let stub = seeded_stub();
    stub.query_definitions.lock().unwrap().get_mut("query-1").unwrap().kind = RemoteQueryKind::Temporary;
    let (ctx, _cache_dir, _persistent_dir) = test_context(stub);
    let updater = QueryUpdater::new(ctx);
    let result = updater.update_data(&search(), &CancellationToken::new()).await;
    assert!(matches!(result, Err(UpdaterError::Unsupported(_))));
  }

  #[tokio::test]
  async fn is_new_or_stale_is_true_before_first_sync() {
    let (ctx, _cache_dir, _persistent_dir) = test_context(seeded_stub());
    let updater = QueryUpdater::new(ctx);
    assert!(updater.is_new_or_stale(&search(), Duration::from_secs(60)).await.unwrap());
  }

  #[tokio::test]
  async fn unknown_work_item_type_fails_without_writing_the_query_row() {
    let stub = seeded_stub();
    stub.work_item_types.lock().unwrap().clear();
    let (ctx, _cache_dir, _persistent_dir) = test_context(stub);
    let updater = QueryUpdater::new(ctx);
    let result = updater.update_data(&search(), &CancellationToken::new()).await;
    assert!(matches!(result, Err(UpdaterError::Invariant(_))));

    let handle = updater.get_cached_data_for_search(&search()).await.unwrap();
    assert!(handle.is_none(), "a failed sync must not leave a partially-written Query row behind");
  }
}
