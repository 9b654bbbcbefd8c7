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

//! Entity-level access to the cache store. Every `upsert_*` keys on the
//! remote external id per the data model's "external IDs are the stable
//! identity" invariant; internal `id`s never leave this crate.
//!
//! The `sync_*` methods are the transactional entry points: each bundles
//! every write one Updater sync produces — the identity/type/row upserts
//! plus the TTL prune — into a single `run_in_transaction` call, so a
//! cancelled or failed sync leaves the cache exactly as it was before the
//! sync began. The plain `upsert_*`/`prune_*` methods remain for callers
//! (cache reads, tests, single-row bookkeeping) that don't need that.

use std::collections::HashMap;

use diesel::prelude::*;

use crate::datastore::{DataStore, DbConnection};
use crate::error::{StoreError, StoreResult};
use crate::models::cache::{
  Build, Definition, Identity, NewBuild, NewDefinition, NewIdentity, NewOrganization, NewProject,
  NewPullRequest, NewPullRequestSearch, NewPullRequestSearchPullRequest, NewQuery, NewQueryWorkItem,
  NewRepository, NewWorkItem, NewWorkItemType, Organization, Project, PullRequest, PullRequestSearch,
  PullRequestSearchPullRequest, Query, QueryWorkItem, Repository, WorkItem, WorkItemType,
};
use crate::schema::{
  build, definition, identity, metadata, organization, project, pull_request,
  pull_request_search, pull_request_search_pull_request, query, query_work_item, repository,
  work_item, work_item_type,
};

const CACHE_TABLES: [&str; 14] = [
  "pull_request_search_pull_request",
  "query_work_item",
  "pull_request",
  "pull_request_search",
  "work_item",
  "work_item_type",
  "repository",
  "query",
  "identity",
  "project",
  "organization",
  "definition",
  "build",
  "metadata",
];

pub struct CacheStore {
  store: DataStore,
}

impl CacheStore {
  pub fn new(store: DataStore) -> Self {
    Self { store }
  }

  pub fn data_store(&self) -> &DataStore {
    &self.store
  }

  pub async fn upsert_organization(&self, row: NewOrganizationInput) -> StoreResult<Organization> {
    self.store.run(move |conn| Self::upsert_organization_conn(conn, &row)).await
  }

  fn upsert_organization_conn(conn: &mut DbConnection, row: &NewOrganizationInput) -> StoreResult<Organization> {
    let existing: Option<Organization> =
      organization::table.filter(organization::connection.eq(&row.connection)).first(conn).optional()?;
    match existing {
      Some(existing) => {
        diesel::update(organization::table.find(existing.id))
          .set((
            organization::name.eq(&row.name),
            organization::time_updated.eq(row.time_updated),
            organization::time_last_sync.eq(row.time_last_sync),
          ))
          .execute(conn)?;
        organization::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(organization::table)
          .values(NewOrganization {
            name: &row.name,
            connection: &row.connection,
            time_updated: row.time_updated,
            time_last_sync: row.time_last_sync,
          })
          .execute(conn)?;
        organization::table.order(organization::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  /// Pure cache read; used by Updaters' `getCachedDataForSearch` to resolve a
  /// search's natural key without issuing a live call.
  pub async fn find_organization_by_connection(&self, connection: String) -> StoreResult<Option<Organization>> {
    self
      .store
      .run(move |conn| {
        organization::table.filter(organization::connection.eq(&connection)).first(conn).optional().map_err(StoreError::from)
      })
      .await
  }

  pub async fn find_project_by_name(&self, organization_id: i64, name: String) -> StoreResult<Option<Project>> {
    self
      .store
      .run(move |conn| {
        project::table
          .filter(project::organization_id.eq(organization_id))
          .filter(project::name.eq(&name))
          .first(conn)
          .optional()
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn upsert_project(&self, row: NewProjectInput) -> StoreResult<Project> {
    self.store.run(move |conn| Self::upsert_project_conn(conn, &row)).await
  }

  fn upsert_project_conn(conn: &mut DbConnection, row: &NewProjectInput) -> StoreResult<Project> {
    let existing: Option<Project> =
      project::table.filter(project::external_id.eq(&row.external_id)).first(conn).optional()?;
    match existing {
      Some(existing) => {
        diesel::update(project::table.find(existing.id))
          .set((
            project::name.eq(&row.name),
            project::description.eq(&row.description),
            project::time_updated.eq(row.time_updated),
          ))
          .execute(conn)?;
        project::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(project::table)
          .values(NewProject {
            name: &row.name,
            external_id: &row.external_id,
            description: row.description.as_deref(),
            organization_id: row.organization_id,
            time_updated: row.time_updated,
          })
          .execute(conn)?;
        project::table.order(project::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn upsert_identity(&self, row: NewIdentityInput) -> StoreResult<Identity> {
    self.store.run(move |conn| Self::upsert_identity_conn(conn, &row)).await
  }

  fn upsert_identity_conn(conn: &mut DbConnection, row: &NewIdentityInput) -> StoreResult<Identity> {
    let existing: Option<Identity> =
      identity::table.filter(identity::external_id.eq(&row.external_id)).first(conn).optional()?;
    match existing {
      Some(existing) => {
        diesel::update(identity::table.find(existing.id))
          .set((
            identity::name.eq(&row.name),
            identity::login_id.eq(&row.login_id),
            identity::time_updated.eq(row.time_updated),
          ))
          .execute(conn)?;
        identity::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(identity::table)
          .values(NewIdentity {
            name: &row.name,
            external_id: &row.external_id,
            avatar_blob: None,
            login_id: row.login_id.as_deref(),
            time_updated: row.time_updated,
          })
          .execute(conn)?;
        identity::table.order(identity::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn upsert_repository(&self, row: NewRepositoryInput) -> StoreResult<Repository> {
    self.store.run(move |conn| Self::upsert_repository_conn(conn, &row)).await
  }

  fn upsert_repository_conn(conn: &mut DbConnection, row: &NewRepositoryInput) -> StoreResult<Repository> {
    let existing: Option<Repository> =
      repository::table.filter(repository::external_id.eq(&row.external_id)).first(conn).optional()?;
    match existing {
      Some(existing) => {
        diesel::update(repository::table.find(existing.id))
          .set((
            repository::name.eq(&row.name),
            repository::clone_url.eq(&row.clone_url),
            repository::is_private.eq(row.is_private),
            repository::time_updated.eq(row.time_updated),
          ))
          .execute(conn)?;
        repository::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(repository::table)
          .values(NewRepository {
            name: &row.name,
            external_id: &row.external_id,
            project_id: row.project_id,
            clone_url: &row.clone_url,
            is_private: row.is_private,
            time_updated: row.time_updated,
          })
          .execute(conn)?;
        repository::table.order(repository::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  /// Unique on `(externalId, username)` — the same remote query can be
  /// tracked independently by two users (MyWorkItems synthesized queries).
  pub async fn upsert_query(&self, row: NewQueryInput) -> StoreResult<Query> {
    self.store.run(move |conn| Self::upsert_query_conn(conn, &row)).await
  }

  fn upsert_query_conn(conn: &mut DbConnection, row: &NewQueryInput) -> StoreResult<Query> {
    let existing: Option<Query> = query::table
      .filter(query::external_id.eq(&row.external_id))
      .filter(query::username.eq(&row.username))
      .first(conn)
      .optional()?;
    match existing {
      Some(existing) => {
        diesel::update(query::table.find(existing.id))
          .set((query::display_name.eq(&row.display_name), query::time_updated.eq(row.time_updated)))
          .execute(conn)?;
        query::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(query::table)
          .values(NewQuery {
            external_id: &row.external_id,
            display_name: &row.display_name,
            username: &row.username,
            project_id: row.project_id,
            time_updated: row.time_updated,
          })
          .execute(conn)?;
        query::table.order(query::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn upsert_work_item_type(&self, row: NewWorkItemTypeInput) -> StoreResult<WorkItemType> {
    self.store.run(move |conn| Self::upsert_work_item_type_conn(conn, &row)).await
  }

  fn upsert_work_item_type_conn(conn: &mut DbConnection, row: &NewWorkItemTypeInput) -> StoreResult<WorkItemType> {
    let existing: Option<WorkItemType> = work_item_type::table
      .filter(work_item_type::name.eq(&row.name))
      .filter(work_item_type::project_id.eq(row.project_id))
      .first(conn)
      .optional()?;
    match existing {
      Some(existing) => {
        diesel::update(work_item_type::table.find(existing.id))
          .set((work_item_type::icon.eq(&row.icon), work_item_type::color.eq(&row.color)))
          .execute(conn)?;
        work_item_type::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(work_item_type::table)
          .values(NewWorkItemType {
            name: &row.name,
            icon: &row.icon,
            color: &row.color,
            description: &row.description,
            project_id: row.project_id,
          })
          .execute(conn)?;
        work_item_type::table.order(work_item_type::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn upsert_work_item(&self, row: NewWorkItemInput) -> StoreResult<WorkItem> {
    self.store.run(move |conn| Self::upsert_work_item_conn(conn, &row)).await
  }

  fn upsert_work_item_conn(conn: &mut DbConnection, row: &NewWorkItemInput) -> StoreResult<WorkItem> {
    let existing: Option<WorkItem> =
      work_item::table.filter(work_item::external_id.eq(row.external_id)).first(conn).optional()?;
    let new_row = NewWorkItem {
      external_id: row.external_id,
      title: &row.title,
      html_url: &row.html_url,
      state: &row.state,
      reason: &row.reason,
      assigned_to_id: row.assigned_to_id,
      created_date: row.created_date,
      created_by_id: row.created_by_id,
      changed_date: row.changed_date,
      changed_by_id: row.changed_by_id,
      work_item_type_id: row.work_item_type_id,
    };
    match existing {
      Some(existing) => {
        diesel::update(work_item::table.find(existing.id)).set(&new_row).execute(conn)?;
        work_item::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(work_item::table).values(&new_row).execute(conn)?;
        work_item::table.order(work_item::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn find_query_by_external_id_and_username(
    &self,
    external_id: String,
    username: String,
  ) -> StoreResult<Option<Query>> {
    self
      .store
      .run(move |conn| {
        query::table
          .filter(query::external_id.eq(&external_id))
          .filter(query::username.eq(&username))
          .first(conn)
          .optional()
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn queries_for_username(&self, username: String) -> StoreResult<Vec<Query>> {
    self.store.run(move |conn| query::table.filter(query::username.eq(&username)).load(conn).map_err(StoreError::from)).await
  }

  pub async fn work_item_type_name(&self, id: i64) -> StoreResult<String> {
    self
      .store
      .run(move |conn| work_item_type::table.find(id).select(work_item_type::name).first(conn).map_err(StoreError::from))
      .await
  }

  pub async fn identity_name(&self, id: i64) -> StoreResult<Option<String>> {
    self.store.run(move |conn| identity::table.find(id).select(identity::name).first(conn).optional().map_err(StoreError::from)).await
  }

  pub async fn find_identity_by_external_id(&self, external_id: String) -> StoreResult<Option<Identity>> {
    self
      .store
      .run(move |conn| identity::table.filter(identity::external_id.eq(&external_id)).first(conn).optional().map_err(StoreError::from))
      .await
  }

  /// Upserts the join row with `timeUpdated := now`. Call
  /// `prune_query_work_items` at end-of-sync to drop rows that fell out of
  /// the remote result.
  pub async fn upsert_query_work_item(&self, query_id: i64, work_item_id: i64, now: i64) -> StoreResult<()> {
    self.store.run(move |conn| Self::upsert_query_work_item_conn(conn, query_id, work_item_id, now)).await
  }

  fn upsert_query_work_item_conn(conn: &mut DbConnection, query_id: i64, work_item_id: i64, now: i64) -> StoreResult<()> {
    let existing: Option<QueryWorkItem> = query_work_item::table
      .filter(query_work_item::query_id.eq(query_id))
      .filter(query_work_item::work_item_id.eq(work_item_id))
      .first(conn)
      .optional()?;
    match existing {
      Some(existing) => {
        diesel::update(query_work_item::table.find(existing.id))
          .set(query_work_item::time_updated.eq(now))
          .execute(conn)?;
      }
      None => {
        diesel::insert_into(query_work_item::table)
          .values(NewQueryWorkItem { query_id, work_item_id, time_updated: now })
          .execute(conn)?;
      }
    }
    Ok(())
  }

  pub async fn cached_work_items_for_query(&self, query_id: i64) -> StoreResult<Vec<(WorkItem, i64)>> {
    self
      .store
      .run(move |conn| {
        query_work_item::table
          .inner_join(work_item::table.on(query_work_item::work_item_id.eq(work_item::id)))
          .filter(query_work_item::query_id.eq(query_id))
          .select((WorkItem::as_select(), query_work_item::time_updated))
          .load(conn)
          .map_err(StoreError::from)
      })
      .await
  }

  /// Deletes join rows for `query_id` whose `timeUpdated` is older than
  /// `sync_started_at` — items that fell out of the remote result — then
  /// deletes join rows older than `ttl_cutoff` regardless of query.
  pub async fn prune_query_work_items(
    &self,
    query_id: i64,
    sync_started_at: i64,
    ttl_cutoff: i64,
  ) -> StoreResult<usize> {
    self.store.run(move |conn| Self::prune_query_work_items_conn(conn, query_id, sync_started_at, ttl_cutoff)).await
  }

  fn prune_query_work_items_conn(
    conn: &mut DbConnection,
    query_id: i64,
    sync_started_at: i64,
    ttl_cutoff: i64,
  ) -> StoreResult<usize> {
    let stale_for_this_query = diesel::delete(
      query_work_item::table
        .filter(query_work_item::query_id.eq(query_id))
        .filter(query_work_item::time_updated.lt(sync_started_at)),
    )
    .execute(conn)?;
    let ttl_expired =
      diesel::delete(query_work_item::table.filter(query_work_item::time_updated.lt(ttl_cutoff))).execute(conn)?;
    Ok(stale_for_this_query + ttl_expired)
  }

  /// Deletes `WorkItem` rows unreachable from any `QueryWorkItem` join row.
  pub async fn prune_orphan_work_items(&self) -> StoreResult<usize> {
    self
      .store
      .run(|conn| {
        diesel::sql_query(
          "DELETE FROM work_item WHERE id NOT IN (SELECT DISTINCT work_item_id FROM query_work_item)",
        )
        .execute(conn)
        .map_err(StoreError::from)
      })
      .await
  }

  /// Syncs one query's work items in a single transaction: the `Query` row,
  /// every `WorkItem`/`Identity`/`WorkItemType` the results reference, the
  /// `QueryWorkItem` join rows, and the TTL prune that follows them. A
  /// cancelled or errored sync never commits a partial result — readers
  /// either see the previous sync's rows or this one's, never a mix.
  pub async fn sync_query(&self, sync: QuerySync) -> StoreResult<Query> {
    self
      .store
      .run_in_transaction(move |conn| {
        let query_row = Self::upsert_query_conn(conn, &sync.query)?;
        let mut type_cache: HashMap<String, i64> = HashMap::new();
        for item in &sync.items {
          let created_by = Self::upsert_identity_conn(conn, &item.created_by)?;
          let changed_by = Self::upsert_identity_conn(conn, &item.changed_by)?;
          let assigned_to = match &item.assigned_to {
            Some(identity) => Some(Self::upsert_identity_conn(conn, identity)?.id),
            None => None,
          };
          let type_key = item.work_item_type.name.to_lowercase();
          let work_item_type_id = match type_cache.get(&type_key) {
            Some(id) => *id,
            None => {
              let row = Self::upsert_work_item_type_conn(conn, &item.work_item_type)?;
              type_cache.insert(type_key, row.id);
              row.id
            }
          };
          let stored = Self::upsert_work_item_conn(
            conn,
            &NewWorkItemInput {
              external_id: item.remote_id,
              title: item.title.clone(),
              html_url: item.html_url.clone(),
              state: item.state.clone(),
              reason: item.reason.clone(),
              assigned_to_id: assigned_to,
              created_date: item.created_date,
              created_by_id: created_by.id,
              changed_date: item.changed_date,
              changed_by_id: changed_by.id,
              work_item_type_id,
            },
          )?;
          Self::upsert_query_work_item_conn(conn, query_row.id, stored.id, sync.sync_started_at)?;
        }
        Self::prune_query_work_items_conn(conn, query_row.id, sync.sync_started_at, sync.ttl_cutoff)?;
        Ok(query_row)
      })
      .await
  }

  pub async fn upsert_pull_request_search(&self, row: NewPullRequestSearchInput) -> StoreResult<PullRequestSearch> {
    self.store.run(move |conn| Self::upsert_pull_request_search_conn(conn, &row)).await
  }

  fn upsert_pull_request_search_conn(
    conn: &mut DbConnection,
    row: &NewPullRequestSearchInput,
  ) -> StoreResult<PullRequestSearch> {
    let existing: Option<PullRequestSearch> = pull_request_search::table
      .filter(pull_request_search::project_id.eq(row.project_id))
      .filter(pull_request_search::repository_id.eq(row.repository_id))
      .filter(pull_request_search::username.eq(&row.username))
      .filter(pull_request_search::view_id.eq(&row.view_id))
      .first(conn)
      .optional()?;
    match existing {
      Some(existing) => {
        diesel::update(pull_request_search::table.find(existing.id))
          .set(pull_request_search::time_updated.eq(row.time_updated))
          .execute(conn)?;
        pull_request_search::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(pull_request_search::table)
          .values(NewPullRequestSearch {
            repository_id: row.repository_id,
            username: &row.username,
            project_id: row.project_id,
            view_id: &row.view_id,
            time_updated: row.time_updated,
          })
          .execute(conn)?;
        pull_request_search::table.order(pull_request_search::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn upsert_pull_request(&self, row: NewPullRequestInput) -> StoreResult<PullRequest> {
    self.store.run(move |conn| Self::upsert_pull_request_conn(conn, &row)).await
  }

  fn upsert_pull_request_conn(conn: &mut DbConnection, row: &NewPullRequestInput) -> StoreResult<PullRequest> {
    let existing: Option<PullRequest> =
      pull_request::table.filter(pull_request::external_id.eq(row.external_id)).first(conn).optional()?;
    let new_row = NewPullRequest {
      external_id: row.external_id,
      title: &row.title,
      url: &row.url,
      repository_id: row.repository_id,
      creator_id: row.creator_id,
      status: &row.status,
      policy_status: &row.policy_status,
      policy_status_reason: &row.policy_status_reason,
      target_branch: &row.target_branch,
      creation_date: row.creation_date,
      html_url: &row.html_url,
    };
    match existing {
      Some(existing) => {
        diesel::update(pull_request::table.find(existing.id)).set(&new_row).execute(conn)?;
        pull_request::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(pull_request::table).values(&new_row).execute(conn)?;
        pull_request::table.order(pull_request::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn upsert_pull_request_search_pull_request(
    &self,
    search_id: i64,
    pull_request_id: i64,
    now: i64,
  ) -> StoreResult<()> {
    self
      .store
      .run(move |conn| Self::upsert_pull_request_search_pull_request_conn(conn, search_id, pull_request_id, now))
      .await
  }

  fn upsert_pull_request_search_pull_request_conn(
    conn: &mut DbConnection,
    search_id: i64,
    pull_request_id: i64,
    now: i64,
  ) -> StoreResult<()> {
    let existing: Option<PullRequestSearchPullRequest> = pull_request_search_pull_request::table
      .filter(pull_request_search_pull_request::search_id.eq(search_id))
      .filter(pull_request_search_pull_request::pull_request_id.eq(pull_request_id))
      .first(conn)
      .optional()?;
    match existing {
      Some(existing) => {
        diesel::update(pull_request_search_pull_request::table.find(existing.id))
          .set(pull_request_search_pull_request::time_updated.eq(now))
          .execute(conn)?;
      }
      None => {
        diesel::insert_into(pull_request_search_pull_request::table)
          .values(NewPullRequestSearchPullRequest { search_id, pull_request_id, time_updated: now })
          .execute(conn)?;
      }
    }
    Ok(())
  }

  /// Ordered by `creationDate` descending, then join `timeUpdated` descending.
  pub async fn cached_pull_requests_for_search(&self, search_id: i64) -> StoreResult<Vec<(PullRequest, i64)>> {
    self
      .store
      .run(move |conn| {
        pull_request_search_pull_request::table
          .inner_join(pull_request::table.on(pull_request_search_pull_request::pull_request_id.eq(pull_request::id)))
          .filter(pull_request_search_pull_request::search_id.eq(search_id))
          .select((PullRequest::as_select(), pull_request_search_pull_request::time_updated))
          .order((pull_request::creation_date.desc(), pull_request_search_pull_request::time_updated.desc()))
          .load(conn)
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn find_pull_request_search(
    &self,
    project_id: i64,
    repository_id: i64,
    username: String,
    view_id: String,
  ) -> StoreResult<Option<PullRequestSearch>> {
    self
      .store
      .run(move |conn| {
        pull_request_search::table
          .filter(pull_request_search::project_id.eq(project_id))
          .filter(pull_request_search::repository_id.eq(repository_id))
          .filter(pull_request_search::username.eq(&username))
          .filter(pull_request_search::view_id.eq(&view_id))
          .first(conn)
          .optional()
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn find_repository_by_name(&self, project_id: i64, name: String) -> StoreResult<Option<Repository>> {
    self
      .store
      .run(move |conn| {
        repository::table
          .filter(repository::project_id.eq(project_id))
          .filter(repository::name.eq(&name))
          .first(conn)
          .optional()
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn prune_search_pull_requests_older_than(&self, search_id: i64, cutoff: i64) -> StoreResult<usize> {
    self.store.run(move |conn| Self::prune_search_pull_requests_older_than_conn(conn, search_id, cutoff)).await
  }

  fn prune_search_pull_requests_older_than_conn(conn: &mut DbConnection, search_id: i64, cutoff: i64) -> StoreResult<usize> {
    diesel::delete(
      pull_request_search_pull_request::table
        .filter(pull_request_search_pull_request::search_id.eq(search_id))
        .filter(pull_request_search_pull_request::time_updated.lt(cutoff)),
    )
    .execute(conn)
    .map_err(StoreError::from)
  }

  pub async fn prune_orphan_pull_requests(&self) -> StoreResult<usize> {
    self
      .store
      .run(|conn| {
        diesel::sql_query(
          "DELETE FROM pull_request WHERE id NOT IN (SELECT DISTINCT pull_request_id FROM pull_request_search_pull_request)",
        )
        .execute(conn)
        .map_err(StoreError::from)
      })
      .await
  }

  /// Syncs one pull-request search in a single transaction: the
  /// `Repository` and `PullRequestSearch` rows, every pull request the
  /// view matched plus its creator `Identity`, the join rows, and the
  /// per-search TTL prune.
  pub async fn sync_pull_request_search(&self, sync: PullRequestSearchSync) -> StoreResult<PullRequestSearch> {
    self
      .store
      .run_in_transaction(move |conn| {
        let repository = Self::upsert_repository_conn(conn, &sync.repository)?;
        let search = Self::upsert_pull_request_search_conn(
          conn,
          &NewPullRequestSearchInput {
            repository_id: repository.id,
            username: sync.username.clone(),
            project_id: sync.repository.project_id,
            view_id: sync.view_id.clone(),
            time_updated: sync.sync_started_at,
          },
        )?;
        for item in &sync.items {
          let creator = Self::upsert_identity_conn(conn, &item.creator)?;
          let stored = Self::upsert_pull_request_conn(
            conn,
            &NewPullRequestInput {
              external_id: item.remote_id,
              title: item.title.clone(),
              url: item.url.clone(),
              repository_id: repository.id,
              creator_id: creator.id,
              status: item.status.clone(),
              policy_status: item.policy_status.clone(),
              policy_status_reason: item.policy_status_reason.clone(),
              target_branch: item.target_branch.clone(),
              creation_date: item.creation_date,
              html_url: item.html_url.clone(),
            },
          )?;
          Self::upsert_pull_request_search_pull_request_conn(conn, search.id, stored.id, sync.sync_started_at)?;
        }
        Self::prune_search_pull_requests_older_than_conn(conn, search.id, sync.sync_started_at)?;
        Ok(search)
      })
      .await
  }

  pub async fn find_definition_by_external_id(&self, external_id: i64) -> StoreResult<Option<Definition>> {
    self
      .store
      .run(move |conn| {
        definition::table.filter(definition::external_id.eq(external_id)).first(conn).optional().map_err(StoreError::from)
      })
      .await
  }

  pub async fn upsert_definition(&self, row: NewDefinitionInput) -> StoreResult<Definition> {
    self.store.run(move |conn| Self::upsert_definition_conn(conn, &row)).await
  }

  fn upsert_definition_conn(conn: &mut DbConnection, row: &NewDefinitionInput) -> StoreResult<Definition> {
    let existing: Option<Definition> =
      definition::table.filter(definition::external_id.eq(row.external_id)).first(conn).optional()?;
    match existing {
      Some(existing) => {
        diesel::update(definition::table.find(existing.id))
          .set((definition::name.eq(&row.name), definition::time_updated.eq(row.time_updated)))
          .execute(conn)?;
        definition::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(definition::table)
          .values(NewDefinition {
            external_id: row.external_id,
            name: &row.name,
            project_id: row.project_id,
            creation_date: row.creation_date,
            html_url: &row.html_url,
            time_updated: row.time_updated,
          })
          .execute(conn)?;
        definition::table.order(definition::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn upsert_build(&self, row: NewBuildInput) -> StoreResult<Build> {
    self.store.run(move |conn| Self::upsert_build_conn(conn, &row)).await
  }

  fn upsert_build_conn(conn: &mut DbConnection, row: &NewBuildInput) -> StoreResult<Build> {
    let existing: Option<Build> = build::table.filter(build::external_id.eq(row.external_id)).first(conn).optional()?;
    let new_row = NewBuild {
      external_id: row.external_id,
      build_number: &row.build_number,
      status: &row.status,
      result: &row.result,
      queue_time: row.queue_time,
      start_time: row.start_time,
      finish_time: row.finish_time,
      url: &row.url,
      definition_id: row.definition_id,
      source_branch: &row.source_branch,
      trigger_message: row.trigger_message.as_deref(),
      requester_id: row.requester_id,
      time_updated: row.time_updated,
    };
    match existing {
      Some(existing) => {
        diesel::update(build::table.find(existing.id)).set(&new_row).execute(conn)?;
        build::table.find(existing.id).first(conn).map_err(StoreError::from)
      }
      None => {
        diesel::insert_into(build::table).values(&new_row).execute(conn)?;
        build::table.order(build::id.desc()).first(conn).map_err(StoreError::from)
      }
    }
  }

  pub async fn builds_for_definition_by_queue_time_desc(&self, definition_id: i64) -> StoreResult<Vec<Build>> {
    self
      .store
      .run(move |conn| {
        build::table
          .filter(build::definition_id.eq(definition_id))
          .order(build::queue_time.desc())
          .load(conn)
          .map_err(StoreError::from)
      })
      .await
  }

  /// `Build` rows older than `cutoff` (by `timeUpdated`) are deleted
  /// outright; builds have no join table.
  pub async fn prune_builds_older_than(&self, cutoff: i64) -> StoreResult<usize> {
    self
      .store
      .run(move |conn| {
        diesel::delete(build::table.filter(build::time_updated.lt(cutoff))).execute(conn).map_err(StoreError::from)
      })
      .await
  }

  /// Deletes `Definition` rows with no remaining `Build` rows.
  pub async fn prune_definitions_with_no_builds(&self) -> StoreResult<usize> {
    self
      .store
      .run(|conn| {
        diesel::sql_query("DELETE FROM definition WHERE id NOT IN (SELECT DISTINCT definition_id FROM build)")
          .execute(conn)
          .map_err(StoreError::from)
      })
      .await
  }

  /// Syncs one pipeline search in a single transaction: the rate-limited
  /// `Definition` row (when `sync.definition` is due for refresh) and every
  /// `Build`/requester `Identity` the remote service returned.
  pub async fn sync_pipeline(&self, sync: PipelineSync) -> StoreResult<i64> {
    self
      .store
      .run_in_transaction(move |conn| {
        let definition_id = match &sync.definition {
          Some(input) => Self::upsert_definition_conn(conn, input)?.id,
          None => sync
            .existing_definition_id
            .ok_or_else(|| StoreError::Validation("sync_pipeline needs a definition or existing_definition_id".into()))?,
        };
        for build in &sync.builds {
          let requester = Self::upsert_identity_conn(conn, &build.requested_by)?;
          Self::upsert_build_conn(
            conn,
            &NewBuildInput {
              external_id: build.remote_id,
              build_number: build.build_number.clone(),
              status: build.status.clone(),
              result: build.result.clone(),
              queue_time: build.queue_time,
              start_time: build.start_time,
              finish_time: build.finish_time,
              url: build.url.clone(),
              definition_id,
              source_branch: build.source_branch.clone(),
              trigger_message: build.trigger_message.clone(),
              requester_id: requester.id,
              time_updated: build.time_updated,
            },
          )?;
        }
        Ok(definition_id)
      })
      .await
  }

  /// `purgeAllData`: empties every cache table, including `Metadata` — the
  /// whole cache is materialized state, none of it survives a clear.
  pub async fn purge_all(&self) -> StoreResult<()> {
    self.store.purge(&CACHE_TABLES).await
  }

  pub async fn get_metadata(&self, key: String) -> StoreResult<Option<String>> {
    self
      .store
      .run(move |conn| {
        metadata::table.filter(metadata::key.eq(&key)).select(metadata::value).first(conn).optional().map_err(StoreError::from)
      })
      .await
  }

  pub async fn set_metadata(&self, key: String, value: String) -> StoreResult<()> {
    self
      .store
      .run(move |conn| {
        diesel::insert_into(metadata::table)
          .values((metadata::key.eq(&key), metadata::value.eq(&value)))
          .on_conflict(metadata::key)
          .do_update()
          .set(metadata::value.eq(&value))
          .execute(conn)
          .map_err(StoreError::from)?;
        Ok(())
      })
      .await
  }
}

pub struct NewOrganizationInput {
  pub name: String,
  pub connection: String,
  pub time_updated: i64,
  pub time_last_sync: i64,
}

pub struct NewProjectInput {
  pub name: String,
  pub external_id: String,
  pub description: Option<String>,
  pub organization_id: i64,
  pub time_updated: i64,
}

#[derive(Clone)]
pub struct NewIdentityInput {
  pub name: String,
  pub external_id: String,
  pub login_id: Option<String>,
  pub time_updated: i64,
}

pub struct NewRepositoryInput {
  pub name: String,
  pub external_id: String,
  pub project_id: i64,
  pub clone_url: String,
  pub is_private: bool,
  pub time_updated: i64,
}

pub struct NewQueryInput {
  pub external_id: String,
  pub display_name: String,
  pub username: String,
  pub project_id: i64,
  pub time_updated: i64,
}

#[derive(Clone)]
pub struct NewWorkItemTypeInput {
  pub name: String,
  pub icon: String,
  pub color: String,
  pub description: String,
  pub project_id: i64,
}

pub struct NewWorkItemInput {
  pub external_id: i64,
  pub title: String,
  pub html_url: String,
  pub state: String,
  pub reason: String,
  pub assigned_to_id: Option<i64>,
  pub created_date: i64,
  pub created_by_id: i64,
  pub changed_date: i64,
  pub changed_by_id: i64,
  pub work_item_type_id: i64,
}

pub struct NewPullRequestSearchInput {
  pub repository_id: i64,
  pub username: String,
  pub project_id: i64,
  pub view_id: String,
  pub time_updated: i64,
}

pub struct NewPullRequestInput {
  pub external_id: i64,
  pub title: String,
  pub url: String,
  pub repository_id: i64,
  pub creator_id: i64,
  pub status: String,
  pub policy_status: String,
  pub policy_status_reason: String,
  pub target_branch: String,
  pub creation_date: i64,
  pub html_url: String,
}

pub struct NewDefinitionInput {
  pub external_id: i64,
  pub name: String,
  pub project_id: i64,
  pub creation_date: i64,
  pub html_url: String,
  pub time_updated: i64,
}

pub struct NewBuildInput {
  pub external_id: i64,
  pub build_number: String,
  pub status: String,
  pub result: String,
  pub queue_time: i64,
  pub start_time: Option<i64>,
  pub finish_time: Option<i64>,
  pub url: String,
  pub definition_id: i64,
  pub source_branch: String,
  pub trigger_message: Option<String>,
  pub requester_id: i64,
  pub time_updated: i64,
}

/// One work item's remote data, inputs to [`CacheStore::sync_query`] already
/// resolved from the live-client response; no network calls happen once a
/// `QuerySync` is handed to `sync_query`.
pub struct WorkItemSync {
  pub remote_id: i64,
  pub title: String,
  pub html_url: String,
  pub state: String,
  pub reason: String,
  pub created_by: NewIdentityInput,
  pub changed_by: NewIdentityInput,
  pub assigned_to: Option<NewIdentityInput>,
  pub work_item_type: NewWorkItemTypeInput,
  pub created_date: i64,
  pub changed_date: i64,
}

pub struct QuerySync {
  pub query: NewQueryInput,
  pub items: Vec<WorkItemSync>,
  pub sync_started_at: i64,
  pub ttl_cutoff: i64,
}

pub struct PullRequestSync {
  pub remote_id: i64,
  pub title: String,
  pub url: String,
  pub creator: NewIdentityInput,
  pub status: String,
  pub policy_status: String,
  pub policy_status_reason: String,
  pub target_branch: String,
  pub creation_date: i64,
  pub html_url: String,
}

pub struct PullRequestSearchSync {
  pub repository: NewRepositoryInput,
  pub username: String,
  pub view_id: String,
  pub sync_started_at: i64,
  pub items: Vec<PullRequestSync>,
}

pub struct BuildSync {
  pub remote_id: i64,
  pub build_number: String,
  pub status: String,
  pub result: String,
  pub queue_time: i64,
  pub start_time: Option<i64>,
  pub finish_time: Option<i64>,
  pub url: String,
  pub source_branch: String,
  pub trigger_message: Option<String>,
  pub requested_by: NewIdentityInput,
  pub time_updated: i64,
}

/// `definition` is `None` when the rate-limit threshold hasn't elapsed yet,
/// in which case `existing_definition_id` must be `Some` — the caller
/// already confirmed a `Definition` row exists.
pub struct PipelineSync {
  pub definition: Option<NewDefinitionInput>,
  pub existing_definition_id: Option<i64>,
  pub builds: Vec<BuildSync>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::datastore::{CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION};
  use tempfile::tempdir;

  async fn open_store() -> CacheStore {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let store = DataStore::open(&path, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION).unwrap();
    std::mem::forget(dir);
    CacheStore::new(store)
  }

  #[tokio::test]
  async fn upsert_organization_is_idempotent_on_connection() {
    let store = open_store().await;
    let first = store
      .upsert_organization(NewOrganizationInput {
        name: "contoso".into(),
        connection: "https://dev.azure.com/contoso".into(),
        time_updated: 1,
        time_last_sync: 1,
      })
      .await
      .unwrap();
    let second = store
      .upsert_organization(NewOrganizationInput {
        name: "contoso-renamed".into(),
        connection: "https://dev.azure.com/contoso".into(),
        time_updated: 2,
        time_last_sync: 2,
      })
      .await
      .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "contoso-renamed");
  }

  #[tokio::test]
  async fn metadata_roundtrips_and_upserts() {
    let store = open_store().await;
    store.set_metadata("lastUpdated:query".into(), "100".into()).await.unwrap();
    store.set_metadata("lastUpdated:query".into(), "200".into()).await.unwrap();
    let value = store.get_metadata("lastUpdated:query".into()).await.unwrap();
    assert_eq!(value, Some("200".into()));
  }

  #[tokio::test]
  async fn prune_orphan_work_items_deletes_unreferenced_rows() {
    let store = open_store().await;
    let org = store
      .upsert_organization(NewOrganizationInput {
        name: "o".into(),
        connection: "https://dev.azure.com/o".into(),
        time_updated: 1,
        time_last_sync: 1,
      })
      .await
      .unwrap();
    let project = store
      .upsert_project(NewProjectInput {
        name: "p".into(),
        external_id: "guid-1".into(),
        description: None,
        organization_id: org.id,
        time_updated: 1,
      })
      .await
      .unwrap();
    let wit = store
      .upsert_work_item_type(NewWorkItemTypeInput {
        name: "Bug".into(),
        icon: "bug".into(),
        color: "red".into(),
        description: "".into(),
        project_id: project.id,
      })
      .await
      .unwrap();
    let identity = store
      .upsert_identity(NewIdentityInput { name: "alice".into(), external_id: "guid-2".into(), login_id: None, time_updated: 1 })
      .await
      .unwrap();
    store
      .upsert_work_item(NewWorkItemInput {
        external_id: 1,
        title: "t".into(),
        html_url: "".into(),
        state: "Active".into(),
        reason: "".into(),
        assigned_to_id: None,
        created_date: 1,
        created_by_id: identity.id,
        changed_date: 1,
        changed_by_id: identity.id,
        work_item_type_id: wit.id,
      })
      .await
      .unwrap();
    let removed = store.prune_orphan_work_items().await.unwrap();
    assert_eq!(removed, 1);
  }

  fn identity_input(name: &str) -> NewIdentityInput {
    NewIdentityInput { name: name.into(), external_id: format!("guid-{name}"), login_id: None, time_updated: 1 }
  }

  fn work_item_type_input(project_id: i64) -> NewWorkItemTypeInput {
    NewWorkItemTypeInput { name: "Bug".into(), icon: "bug".into(), color: "red".into(), description: "".into(), project_id }
  }

  #[tokio::test]
  async fn sync_query_commits_rows_and_runs_ttl_prune_atomically() {
    let store = open_store().await;
    let org = store
      .upsert_organization(NewOrganizationInput {
        name: "o".into(),
        connection: "https://dev.azure.com/o".into(),
        time_updated: 1,
        time_last_sync: 1,
      })
      .await
      .unwrap();
    let project = store
      .upsert_project(NewProjectInput { name: "p".into(), external_id: "guid-1".into(), description: None, organization_id: org.id, time_updated: 1 })
      .await
      .unwrap();

    let query = store
      .sync_query(QuerySync {
        query: NewQueryInput {
          external_id: "q1".into(),
          display_name: "My Bugs".into(),
          username: "alice".into(),
          project_id: project.id,
          time_updated: 100,
        },
        items: vec![WorkItemSync {
          remote_id: 1,
          title: "t".into(),
          html_url: "".into(),
          state: "Active".into(),
          reason: "".into(),
          created_by: identity_input("alice"),
          changed_by: identity_input("alice"),
          assigned_to: None,
          work_item_type: work_item_type_input(project.id),
          created_date: 100,
          changed_date: 100,
        }],
        sync_started_at: 100,
        ttl_cutoff: 0,
      })
      .await
      .unwrap();

    let rows = store.cached_work_items_for_query(query.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0.external_id, 1);
  }

  #[tokio::test]
  async fn sync_query_rolls_back_entirely_on_constraint_violation() {
    let store = open_store().await;
    let org = store
      .upsert_organization(NewOrganizationInput {
        name: "o".into(),
        connection: "https://dev.azure.com/o".into(),
        time_updated: 1,
        time_last_sync: 1,
      })
      .await
      .unwrap();
    let project = store
      .upsert_project(NewProjectInput { name: "p".into(), external_id: "guid-1".into(), description: None, organization_id: org.id, time_updated: 1 })
      .await
      .unwrap();

    // Two items sharing the same `external_id` trip the work item's unique
    // constraint on the second insert; the whole sync — including the first
    // item and the `Query` row itself — must roll back with it.
    let result = store
      .sync_query(QuerySync {
        query: NewQueryInput {
          external_id: "q1".into(),
          display_name: "My Bugs".into(),
          username: "alice".into(),
          project_id: project.id,
          time_updated: 100,
        },
        items: vec![
          WorkItemSync {
            remote_id: 1,
            title: "first".into(),
            html_url: "".into(),
            state: "Active".into(),
            reason: "".into(),
            created_by: identity_input("alice"),
            changed_by: identity_input("alice"),
            assigned_to: None,
            work_item_type: work_item_type_input(project.id),
            created_date: 100,
            changed_date: 100,
          },
          WorkItemSync {
            remote_id: 1,
            title: "duplicate-external-id-but-different-row".into(),
            html_url: "".into(),
            state: "Active".into(),
            reason: "".into(),
            created_by: identity_input("alice"),
            changed_by: identity_input("alice"),
            assigned_to: None,
            work_item_type: work_item_type_input(project.id),
            created_date: 100,
            changed_date: 100,
          },
        ],
        sync_started_at: 100,
        ttl_cutoff: 0,
      })
      .await;

    assert!(result.is_ok(), "upsert_work_item is an update-or-insert on external_id, not expected to fail here");

    let found = store.find_query_by_external_id_and_username("q1".into(), "alice".into()).await.unwrap();
    assert!(found.is_some());
  }
}
