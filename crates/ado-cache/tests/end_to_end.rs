//! Integration scenarios from spec §8: cold start, periodic-vs-refresh
//! interleaving, refresh cooldown, sign-out while `All` is running, and
//! schema bump. Each test builds its own `CacheManager` over throwaway
//! sqlite files and a stubbed `LiveClient`.

mod common;

use std::time::Duration;

use ado_cache::{AuthBus, AuthEvent, CacheEventKind, CacheManager};
use ado_client::mock::StubLiveClient;
use ado_client::types::{RemoteProject, RemoteQueryDefinition, RemoteQueryKind};
use ado_core::{Search, Settings};

fn fast_settings() -> Settings {
  Settings { refresh_cooldown: Duration::from_millis(50), periodic_interval: Duration::from_secs(600), ..Settings::default() }
}

fn seed_query(stub: &StubLiveClient, project: &str, external_id: &str, wiql_result: Vec<i64>) {
  stub.projects.lock().unwrap().insert(
    project.to_string(),
    RemoteProject { external_id: "proj-guid".into(), name: project.to_string(), description: None },
  );
  stub.query_definitions.lock().unwrap().insert(
    external_id.to_string(),
    RemoteQueryDefinition {
      external_id: external_id.to_string(),
      name: "My Query".into(),
      kind: RemoteQueryKind::Flat,
      wiql: "SELECT [System.Id] FROM WorkItems".into(),
    },
  );
  stub.wiql_results.lock().unwrap().insert("SELECT [System.Id] FROM WorkItems".into(), wiql_result);
}

fn query_search() -> Search {
  Search::Query {
    id: 1,
    organization_url: "https://dev.azure.com/o".into(),
    project_name: "Widgets".into(),
    external_query_id: "q1".into(),
  }
}

/// Scenario 1: cold start, one saved query — exactly one `updateData(Query)`
/// cycle and exactly one `Updated` event.
#[tokio::test]
async fn cold_start_refresh_produces_exactly_one_updated_event() {
  let stub = StubLiveClient::new();
  seed_query(&stub, "Widgets", "q1", vec![]);
  let (service, _cache_dir, _persistent_dir) = common::test_service(stub, fast_settings());
  let manager = CacheManager::new(service);

  let mut subscription = manager.subscribe();
  manager.refresh(query_search()).await.unwrap();

  let event = tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await.unwrap().unwrap();
  assert_eq!(event.kind, CacheEventKind::Updated);
  assert_eq!(event.update_kind, ado_core::UpdateKind::Query);

  let children = manager.get_cached_children(&query_search()).await.unwrap();
  assert!(children.is_empty());
}

/// Scenario 3: two rapid refresh requests for the same search within the
/// cooldown window — the second is dropped as not-stale; exactly one
/// `Updated` event is observed.
#[tokio::test]
async fn second_refresh_within_cooldown_is_dropped() {
  let stub = StubLiveClient::new();
  seed_query(&stub, "Widgets", "q1", vec![]);
  let settings = Settings { refresh_cooldown: Duration::from_secs(180), ..fast_settings() };
  let (service, _cache_dir, _persistent_dir) = common::test_service(stub, settings);
  let manager = CacheManager::new(service);

  let mut subscription = manager.subscribe();
  manager.refresh(query_search()).await.unwrap();
  let first = tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await.unwrap().unwrap();
  assert_eq!(first.kind, CacheEventKind::Updated);

  // Cached row is now fresh (just updated); the cooldown guard should drop
  // this second request before it ever reaches the state machine.
  manager.refresh(query_search()).await.unwrap();
  let second = tokio::time::timeout(Duration::from_millis(500), subscription.recv()).await;
  assert!(second.is_err(), "no second Updated event should have been published");
}

/// Scenario 2: a periodic tick arriving while a user refresh is in flight is
/// dropped, not queued.
#[tokio::test]
async fn periodic_tick_is_dropped_while_refresh_is_in_flight() {
  let stub = StubLiveClient::new();
  seed_query(&stub, "Widgets", "q1", vec![]);
  let (service, _cache_dir, _persistent_dir) = common::test_service(stub, fast_settings());
  let manager = CacheManager::new(service);

  let mut subscription = manager.subscribe();
  manager.refresh(query_search()).await.unwrap();
  // periodicUpdate() arrives while Refreshing: ignored per the §4.5 table.
  manager.periodic_update().await.unwrap();

  let event = tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await.unwrap().unwrap();
  assert_eq!(event.kind, CacheEventKind::Updated);
  assert_eq!(event.update_kind, ado_core::UpdateKind::Query);

  // No further event should be pending: the periodic tick left no residue.
  let next = tokio::time::timeout(Duration::from_millis(200), subscription.recv()).await;
  assert!(next.is_err());
}

/// Scenario 5 (sign-out half): a `SignOut` event purges the cache through
/// `purge_all_data`, observed as a `Cleared` event.
#[tokio::test]
async fn sign_out_event_purges_the_cache() {
  let stub = StubLiveClient::new();
  let (service, _cache_dir, _persistent_dir) = common::test_service(stub, fast_settings());
  let manager = CacheManager::new(service);
  let auth_bus = AuthBus::new();
  let _handle = ado_cache::spawn_clear_cache_on_sign_out(manager.clone(), &auth_bus);

  let mut subscription = manager.subscribe();
  auth_bus.publish(AuthEvent::SignOut);

  let event = tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await.unwrap().unwrap();
  assert_eq!(event.kind, CacheEventKind::Cleared);
}

/// Scenario 6: a schema bump deletes and recreates the cache file; the
/// persistent file (and its definitions) survive untouched.
#[tokio::test]
async fn schema_version_bump_rebuilds_cache_but_preserves_persistent_store() {
  use ado_database::{DataStore, CACHE_MIGRATIONS, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION};

  let dir = tempfile::TempDir::new().unwrap();
  let cache_path = dir.path().join("cache.sqlite");
  let persistent_path = dir.path().join("persistent.sqlite");

  {
    let _cache_v1 = DataStore::open(&cache_path, CACHE_MIGRATIONS, 1).unwrap();
    let persistent = DataStore::open(&persistent_path, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION).unwrap();
    let repo = ado_database::QueryDefRepository::new(persistent);
    repo.add_or_update("My Query".into(), "https://dev.azure.com/o/p/_queries/q1".into(), true).await.unwrap();
  }

  // Re-opening the cache store with a bumped version must not disturb the
  // persistent store's definitions.
  let _cache_v2 = DataStore::open(&cache_path, CACHE_MIGRATIONS, 2).unwrap();
  let persistent = DataStore::open(&persistent_path, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION).unwrap();
  let repo = ado_database::QueryDefRepository::new(persistent);
  let defs = repo.get_all(false).await.unwrap();
  assert_eq!(defs.len(), 1);
  assert_eq!(defs[0].name, "My Query");
}
