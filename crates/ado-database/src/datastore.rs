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

//! File-backed embedded SQL storage with fail-fast connectivity checks and
//! schema-version bootstrap. Two independent `DataStore`s back the two
//! logical stores (cache and persistent) — no DB-level foreign keys tie
//! them together, so each evolves its schema on its own clock.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};
use r2d2::ManageConnection;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::schema::schema_version;

pub const CACHE_SCHEMA_VERSION: i32 = 1;
pub const PERSISTENT_SCHEMA_VERSION: i32 = 1;

const MAX_POOL_SIZE: u32 = 8;
const CONNECTION_TIMEOUT_SECS: u64 = 10;

pub const CACHE_MIGRATIONS: EmbeddedMigrations = diesel_migrations::embed_migrations!("migrations/cache");
pub const PERSISTENT_MIGRATIONS: EmbeddedMigrations =
  diesel_migrations::embed_migrations!("migrations/persistent");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// One of the two logical stores, opened at a fixed file path.
#[derive(Clone)]
pub struct DataStore {
  pool: Arc<DbPool>,
  path: String,
}

impl DataStore {
  /// Opens (creating if absent) the store at `path`, running `migrations`
  /// if the file is new or recreating it from scratch if the persisted
  /// `SchemaVersion` doesn't match `expected_version`.
  ///
  /// Fails with `StoreError::Inaccessible` if the file cannot be opened
  /// after bootstrap — tested before the pool is built so the pool never
  /// spawns background threads retrying a database that will never appear.
  pub fn open(path: impl AsRef<Path>, migrations: EmbeddedMigrations, expected_version: i32) -> StoreResult<Self> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();

    if Self::needs_rebuild(&path_str, expected_version) {
      if path.exists() {
        warn!(path = %path_str, "schema version mismatch, rebuilding store");
        std::fs::remove_file(path)
          .map_err(|e| StoreError::Inaccessible(format!("could not remove stale store: {e}")))?;
      }
      Self::bootstrap(&path_str, migrations)?;
    }

    let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
    // Probe once, synchronously, before handing the manager to r2d2.
    manager.connect().map_err(|e| StoreError::Inaccessible(e.to_string()))?;

    let pool = Pool::builder()
      .max_size(MAX_POOL_SIZE)
      .connection_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
      .build(manager)
      .map_err(StoreError::from)?;

    info!(path = %path_str, "data store opened");
    Ok(Self { pool: Arc::new(pool), path: path_str })
  }

  fn needs_rebuild(path: &str, expected_version: i32) -> bool {
    if !Path::new(path).exists() {
      return true;
    }
    let mut conn = match SqliteConnection::establish(path) {
      Ok(conn) => conn,
      Err(_) => return true,
    };
    let version: Option<i32> = schema_version::table
      .select(schema_version::version)
      .order(schema_version::id.desc())
      .first(&mut conn)
      .optional()
      .unwrap_or(None);
    version != Some(expected_version)
  }

  fn bootstrap(path: &str, migrations: EmbeddedMigrations) -> StoreResult<()> {
    let mut conn =
      SqliteConnection::establish(path).map_err(|e| StoreError::Inaccessible(e.to_string()))?;
    conn
      .batch_execute("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = OFF;")
      .map_err(|e| StoreError::Query(e.to_string()))?;
    conn
      .run_pending_migrations(migrations)
      .map_err(|e| StoreError::Query(e.to_string()))?;
    Ok(())
  }

  pub fn is_connected(&self) -> bool {
    self.pool.get().is_ok()
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn get_connection(&self) -> StoreResult<DbConnection> {
    self.pool.get().map_err(StoreError::from)
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }

  /// Runs `f` against a pooled connection on a blocking thread, bridging
  /// Diesel's synchronous API into async callers.
  pub async fn run<F, R>(&self, f: F) -> StoreResult<R>
  where
    F: FnOnce(&mut DbConnection) -> StoreResult<R> + Send + 'static,
    R: Send + 'static,
  {
    let pool = Arc::clone(&self.pool);
    tokio::task::spawn_blocking(move || {
      let mut conn = pool.get().map_err(StoreError::from)?;
      f(&mut conn)
    })
    .await
    .map_err(|e| StoreError::Query(format!("task join error: {e}")))?
  }

  /// Runs `f` inside a single SQLite transaction, on a blocking thread.
  pub async fn run_in_transaction<F, R>(&self, f: F) -> StoreResult<R>
  where
    F: FnOnce(&mut DbConnection) -> StoreResult<R> + Send + 'static,
    R: Send + 'static,
  {
    self
      .run(move |conn| conn.transaction(|conn| f(conn)).map_err(|e: StoreError| e))
      .await
  }

  /// Deletes every cache row (used by `ClearCache` and sign-out). No-op on
  /// the persistent store — callers are expected to only call this on a
  /// cache-backed `DataStore`.
  pub async fn purge(&self, tables: &'static [&'static str]) -> StoreResult<()> {
    self
      .run(move |conn| {
        for table in tables {
          conn
            .batch_execute(&format!("DELETE FROM {table}"))
            .map_err(|e| StoreError::Query(e.to_string()))?;
        }
        Ok(())
      })
      .await
  }

  pub async fn vacuum(&self) -> StoreResult<()> {
    self.run(|conn| conn.batch_execute("VACUUM").map_err(|e| StoreError::Query(e.to_string()))).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[tokio::test]
  async fn opens_and_bootstraps_a_fresh_cache_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let store = DataStore::open(&path, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION).unwrap();
    assert!(store.is_connected());
  }

  #[tokio::test]
  async fn rebuilds_on_schema_version_mismatch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.db");
    {
      let _store = DataStore::open(&path, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION).unwrap();
    }
    // Pretend the running code now expects a newer schema.
    let store = DataStore::open(&path, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION + 1).unwrap();
    assert!(store.is_connected());
  }

  #[tokio::test]
  async fn purge_empties_named_tables() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let store = DataStore::open(&path, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION).unwrap();
    store.purge(&["metadata"]).await.unwrap();
  }
}
