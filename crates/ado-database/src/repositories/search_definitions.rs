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

//! CRUD surface over the persistent store's four definition tables. Each
//! repository is a thin wrapper, uniform in shape: `get_all`, `add_or_update`
//! (upsert by natural key), `remove`, `is_top_level`/`set_is_top_level`,
//! `get_by_id`, `get_by_natural_key`.

use diesel::prelude::*;

use crate::datastore::DataStore;
use crate::error::{StoreError, StoreResult};
use crate::models::persistent::{
  DefinitionSearchDef, NewDefinitionSearchDef, NewProjectSettings, NewPullRequestSearchDef, NewQueryDef,
  ProjectSettings, PullRequestSearchDef, QueryDef,
};
use crate::schema::{definition_search_def, project_settings, pull_request_search_def, query_def};

pub struct QueryDefRepository {
  store: DataStore,
}

impl QueryDefRepository {
  pub fn new(store: DataStore) -> Self {
    Self { store }
  }

  pub async fn get_all(&self, top_level_only: bool) -> StoreResult<Vec<QueryDef>> {
    self
      .store
      .run(move |conn| {
        let mut query = query_def::table.into_boxed();
        if top_level_only {
          query = query.filter(query_def::is_top_level.eq(true));
        }
        query.load(conn).map_err(StoreError::from)
      })
      .await
  }

  pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<QueryDef>> {
    self.store.run(move |conn| query_def::table.find(id).first(conn).optional().map_err(StoreError::from)).await
  }

  pub async fn get_by_natural_key(&self, url: String) -> StoreResult<Option<QueryDef>> {
    self
      .store
      .run(move |conn| {
        query_def::table.filter(query_def::url.eq(&url)).first(conn).optional().map_err(StoreError::from)
      })
      .await
  }

  pub async fn add_or_update(&self, name: String, url: String, is_top_level: bool) -> StoreResult<QueryDef> {
    self
      .store
      .run(move |conn| {
        let existing: Option<QueryDef> =
          query_def::table.filter(query_def::url.eq(&url)).first(conn).optional()?;
        match existing {
          Some(row) => {
            diesel::update(query_def::table.find(row.id))
              .set((query_def::name.eq(&name), query_def::is_top_level.eq(is_top_level)))
              .execute(conn)?;
            query_def::table.find(row.id).first(conn).map_err(StoreError::from)
          }
          None => {
            diesel::insert_into(query_def::table)
              .values(NewQueryDef { name: &name, url: &url, is_top_level })
              .execute(conn)?;
            query_def::table.order(query_def::id.desc()).first(conn).map_err(StoreError::from)
          }
        }
      })
      .await
  }

  pub async fn remove(&self, id: i64) -> StoreResult<()> {
    self
      .store
      .run(move |conn| {
        let affected = diesel::delete(query_def::table.find(id)).execute(conn)?;
        if affected == 0 {
          return Err(StoreError::NotFound(format!("QueryDef#{id}")));
        }
        Ok(())
      })
      .await
  }

  pub async fn set_is_top_level(&self, id: i64, is_top_level: bool) -> StoreResult<()> {
    self
      .store
      .run(move |conn| {
        let affected = diesel::update(query_def::table.find(id))
          .set(query_def::is_top_level.eq(is_top_level))
          .execute(conn)?;
        if affected == 0 {
          return Err(StoreError::NotFound(format!("QueryDef#{id}")));
        }
        Ok(())
      })
      .await
  }
}

pub struct PullRequestSearchDefRepository {
  store: DataStore,
}

impl PullRequestSearchDefRepository {
  pub fn new(store: DataStore) -> Self {
    Self { store }
  }

  pub async fn get_all(&self, top_level_only: bool) -> StoreResult<Vec<PullRequestSearchDef>> {
    self
      .store
      .run(move |conn| {
        let mut query = pull_request_search_def::table.into_boxed();
        if top_level_only {
          query = query.filter(pull_request_search_def::is_top_level.eq(true));
        }
        query.load(conn).map_err(StoreError::from)
      })
      .await
  }

  pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<PullRequestSearchDef>> {
    self
      .store
      .run(move |conn| pull_request_search_def::table.find(id).first(conn).optional().map_err(StoreError::from))
      .await
  }

  pub async fn get_by_natural_key(&self, url: String, view: String) -> StoreResult<Option<PullRequestSearchDef>> {
    self
      .store
      .run(move |conn| {
        pull_request_search_def::table
          .filter(pull_request_search_def::url.eq(&url))
          .filter(pull_request_search_def::view.eq(&view))
          .first(conn)
          .optional()
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn add_or_update(
    &self,
    url: String,
    name: String,
    view: String,
    is_top_level: bool,
  ) -> StoreResult<PullRequestSearchDef> {
    self
      .store
      .run(move |conn| {
        let existing: Option<PullRequestSearchDef> = pull_request_search_def::table
          .filter(pull_request_search_def::url.eq(&url))
          .filter(pull_request_search_def::view.eq(&view))
          .first(conn)
          .optional()?;
        match existing {
          Some(row) => {
            diesel::update(pull_request_search_def::table.find(row.id))
              .set((pull_request_search_def::name.eq(&name), pull_request_search_def::is_top_level.eq(is_top_level)))
              .execute(conn)?;
            pull_request_search_def::table.find(row.id).first(conn).map_err(StoreError::from)
          }
          None => {
            diesel::insert_into(pull_request_search_def::table)
              .values(NewPullRequestSearchDef { url: &url, name: &name, view: &view, is_top_level })
              .execute(conn)?;
            pull_request_search_def::table.order(pull_request_search_def::id.desc()).first(conn).map_err(StoreError::from)
          }
        }
      })
      .await
  }

  pub async fn remove(&self, id: i64) -> StoreResult<()> {
    self
      .store
      .run(move |conn| {
        let affected = diesel::delete(pull_request_search_def::table.find(id)).execute(conn)?;
        if affected == 0 {
          return Err(StoreError::NotFound(format!("PullRequestSearchDef#{id}")));
        }
        Ok(())
      })
      .await
  }

  pub async fn set_is_top_level(&self, id: i64, is_top_level: bool) -> StoreResult<()> {
    self
      .store
      .run(move |conn| {
        let affected = diesel::update(pull_request_search_def::table.find(id))
          .set(pull_request_search_def::is_top_level.eq(is_top_level))
          .execute(conn)?;
        if affected == 0 {
          return Err(StoreError::NotFound(format!("PullRequestSearchDef#{id}")));
        }
        Ok(())
      })
      .await
  }
}

pub struct DefinitionSearchDefRepository {
  store: DataStore,
}

impl DefinitionSearchDefRepository {
  pub fn new(store: DataStore) -> Self {
    Self { store }
  }

  pub async fn get_all(&self, top_level_only: bool) -> StoreResult<Vec<DefinitionSearchDef>> {
    self
      .store
      .run(move |conn| {
        let mut query = definition_search_def::table.into_boxed();
        if top_level_only {
          query = query.filter(definition_search_def::is_top_level.eq(true));
        }
        query.load(conn).map_err(StoreError::from)
      })
      .await
  }

  pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<DefinitionSearchDef>> {
    self
      .store
      .run(move |conn| definition_search_def::table.find(id).first(conn).optional().map_err(StoreError::from))
      .await
  }

  pub async fn get_by_natural_key(&self, url: String, external_id: i64) -> StoreResult<Option<DefinitionSearchDef>> {
    self
      .store
      .run(move |conn| {
        definition_search_def::table
          .filter(definition_search_def::url.eq(&url))
          .filter(definition_search_def::external_id.eq(external_id))
          .first(conn)
          .optional()
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn add_or_update(
    &self,
    name: String,
    external_id: i64,
    url: String,
    is_top_level: bool,
  ) -> StoreResult<DefinitionSearchDef> {
    self
      .store
      .run(move |conn| {
        let existing: Option<DefinitionSearchDef> = definition_search_def::table
          .filter(definition_search_def::url.eq(&url))
          .filter(definition_search_def::external_id.eq(external_id))
          .first(conn)
          .optional()?;
        match existing {
          Some(row) => {
            diesel::update(definition_search_def::table.find(row.id))
              .set((definition_search_def::name.eq(&name), definition_search_def::is_top_level.eq(is_top_level)))
              .execute(conn)?;
            definition_search_def::table.find(row.id).first(conn).map_err(StoreError::from)
          }
          None => {
            diesel::insert_into(definition_search_def::table)
              .values(NewDefinitionSearchDef { name: &name, external_id, url: &url, is_top_level })
              .execute(conn)?;
            definition_search_def::table.order(definition_search_def::id.desc()).first(conn).map_err(StoreError::from)
          }
        }
      })
      .await
  }

  pub async fn remove(&self, id: i64) -> StoreResult<()> {
    self
      .store
      .run(move |conn| {
        let affected = diesel::delete(definition_search_def::table.find(id)).execute(conn)?;
        if affected == 0 {
          return Err(StoreError::NotFound(format!("DefinitionSearchDef#{id}")));
        }
        Ok(())
      })
      .await
  }

  pub async fn set_is_top_level(&self, id: i64, is_top_level: bool) -> StoreResult<()> {
    self
      .store
      .run(move |conn| {
        let affected = diesel::update(definition_search_def::table.find(id))
          .set(definition_search_def::is_top_level.eq(is_top_level))
          .execute(conn)?;
        if affected == 0 {
          return Err(StoreError::NotFound(format!("DefinitionSearchDef#{id}")));
        }
        Ok(())
      })
      .await
  }
}

/// `ProjectSettings` has no `isTopLevel` flag — every row implicitly defines
/// a MyWorkItems search, so it is always "top level".
pub struct ProjectSettingsRepository {
  store: DataStore,
}

impl ProjectSettingsRepository {
  pub fn new(store: DataStore) -> Self {
    Self { store }
  }

  pub async fn get_all(&self) -> StoreResult<Vec<ProjectSettings>> {
    self.store.run(|conn| project_settings::table.load(conn).map_err(StoreError::from)).await
  }

  pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<ProjectSettings>> {
    self
      .store
      .run(move |conn| project_settings::table.find(id).first(conn).optional().map_err(StoreError::from))
      .await
  }

  pub async fn get_by_natural_key(
    &self,
    organization_url: String,
    project_name: String,
  ) -> StoreResult<Option<ProjectSettings>> {
    self
      .store
      .run(move |conn| {
        project_settings::table
          .filter(project_settings::organization_url.eq(&organization_url))
          .filter(project_settings::project_name.eq(&project_name))
          .first(conn)
          .optional()
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn add_or_update(&self, organization_url: String, project_name: String) -> StoreResult<ProjectSettings> {
    self
      .store
      .run(move |conn| {
        let existing: Option<ProjectSettings> = project_settings::table
          .filter(project_settings::organization_url.eq(&organization_url))
          .filter(project_settings::project_name.eq(&project_name))
          .first(conn)
          .optional()?;
        if let Some(row) = existing {
          return Ok(row);
        }
        diesel::insert_into(project_settings::table)
          .values(NewProjectSettings { organization_url: &organization_url, project_name: &project_name })
          .execute(conn)?;
        project_settings::table.order(project_settings::id.desc()).first(conn).map_err(StoreError::from)
      })
      .await
  }

  pub async fn remove(&self, id: i64) -> StoreResult<()> {
    self
      .store
      .run(move |conn| {
        let affected = diesel::delete(project_settings::table.find(id)).execute(conn)?;
        if affected == 0 {
          return Err(StoreError::NotFound(format!("ProjectSettings#{id}")));
        }
        Ok(())
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::datastore::{DataStore, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION};
  use tempfile::tempdir;

  async fn open_store() -> DataStore {
    let dir = tempdir().unwrap();
    let path = dir.path().join("persistent.db");
    let store = DataStore::open(&path, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION).unwrap();
    std::mem::forget(dir);
    store
  }

  #[tokio::test]
  async fn add_or_update_upserts_by_url() {
    let repo = QueryDefRepository::new(open_store().await);
    let first = repo.add_or_update("My Query".into(), "https://dev.azure.com/o/p/_queries/q1".into(), true).await.unwrap();
    let second =
      repo.add_or_update("Renamed".into(), "https://dev.azure.com/o/p/_queries/q1".into(), false).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Renamed");
    assert!(!second.is_top_level);
  }

  #[tokio::test]
  async fn remove_fails_with_not_found_when_absent() {
    let repo = QueryDefRepository::new(open_store().await);
    let result = repo.remove(999).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
  }

  #[tokio::test]
  async fn project_settings_dedupes_by_natural_key() {
    let repo = ProjectSettingsRepository::new(open_store().await);
    let first = repo.add_or_update("https://dev.azure.com/o".into(), "proj".into()).await.unwrap();
    let second = repo.add_or_update("https://dev.azure.com/o".into(), "proj".into()).await.unwrap();
    assert_eq!(first.id, second.id);
  }
}
