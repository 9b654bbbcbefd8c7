//! Builds a real `DataUpdateService` over throwaway SQLite files and a
//! stubbed `LiveClient`/account stack, mirroring `ado-updaters`'s own
//! `testutil` fixture for the integration scenarios of spec §8.

use std::sync::Arc;

use ado_client::mock::StubLiveClient;
use ado_core::{Account, AccountProvider, Connection, ConnectionProvider, CoreResult, Settings};
use ado_database::{
  CacheStore, DataStore, DefinitionSearchDefRepository, ProjectSettingsRepository, PullRequestSearchDefRepository,
  QueryDefRepository, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION,
};
use ado_updaters::{DataUpdateService, UpdaterContext};
use tempfile::TempDir;

pub struct AllowAllAccounts;

#[async_trait::async_trait]
impl AccountProvider for AllowAllAccounts {
  async fn is_signed_in(&self) -> bool {
    true
  }
  async fn default_account(&self) -> Option<Account> {
    Some(Account { display_name: "Alice".into(), username: "alice".into() })
  }
  async fn sign_in(&self) -> CoreResult<Account> {
    Ok(Account { display_name: "Alice".into(), username: "alice".into() })
  }
  async fn sign_out(&self) -> CoreResult<()> {
    Ok(())
  }
}

pub struct FixedConnection;

#[async_trait::async_trait]
impl ConnectionProvider for FixedConnection {
  async fn get_connection(&self, organization_url: &str, _account: &Account) -> CoreResult<Connection> {
    Ok(Connection { organization_url: organization_url.to_string(), bearer_token: "token".into() })
  }
}

/// Keep both temp dirs alive for the duration of the test; dropping them
/// deletes the backing sqlite files.
pub fn test_service(live_client: StubLiveClient, settings: Settings) -> (DataUpdateService, TempDir, TempDir) {
  let cache_dir = TempDir::new().unwrap();
  let cache_path = cache_dir.path().join("cache.sqlite");
  let cache_store = DataStore::open(&cache_path, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION).unwrap();
  let cache = Arc::new(CacheStore::new(cache_store));

  let persistent_dir = TempDir::new().unwrap();
  let persistent_path = persistent_dir.path().join("persistent.sqlite");
  let persistent_store = DataStore::open(&persistent_path, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION).unwrap();

  let ctx = UpdaterContext {
    live_client: Arc::new(live_client),
    cache,
    connections: Arc::new(FixedConnection),
    accounts: Arc::new(AllowAllAccounts),
    settings,
    query_defs: Arc::new(QueryDefRepository::new(persistent_store.clone())),
    pull_request_search_defs: Arc::new(PullRequestSearchDefRepository::new(persistent_store.clone())),
    definition_search_defs: Arc::new(DefinitionSearchDefRepository::new(persistent_store.clone())),
    project_settings: Arc::new(ProjectSettingsRepository::new(persistent_store)),
  };
  (DataUpdateService::new(ctx), cache_dir, persistent_dir)
}
