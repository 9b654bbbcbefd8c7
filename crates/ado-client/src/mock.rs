//! An in-memory `LiveClient` for updater unit tests: every fixture is seeded
//! directly rather than served over HTTP.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};
use crate::live_client::LiveClient;
use crate::types::{
  RemoteBuild, RemoteBuildDefinition, RemoteIdentity, RemotePolicyEvaluation, RemoteProject,
  RemotePullRequest, RemoteQueryDefinition, RemoteWorkItem, RemoteWorkItemType,
};

#[derive(Default)]
pub struct StubLiveClient {
  pub me: Mutex<Option<RemoteIdentity>>,
  pub projects: Mutex<HashMap<String, RemoteProject>>,
  pub query_definitions: Mutex<HashMap<String, RemoteQueryDefinition>>,
  pub wiql_results: Mutex<HashMap<String, Vec<i64>>>,
  pub work_items: Mutex<HashMap<i64, RemoteWorkItem>>,
  pub work_item_types: Mutex<Vec<RemoteWorkItemType>>,
  pub pull_requests: Mutex<HashMap<String, Vec<RemotePullRequest>>>,
  pub policy_evaluations: Mutex<HashMap<i64, Vec<RemotePolicyEvaluation>>>,
  pub build_definitions: Mutex<HashMap<i64, RemoteBuildDefinition>>,
  pub builds: Mutex<HashMap<i64, Vec<RemoteBuild>>>,
  /// When set, every method returns this error instead of its fixture.
  pub fail_with: Mutex<Option<ClientError>>,
}

impl StubLiveClient {
  pub fn new() -> Self {
    Self::default()
  }

  fn maybe_fail(&self) -> ClientResult<()> {
    if let Some(err) = self.fail_with.lock().unwrap().clone() {
      return Err(err);
    }
    Ok(())
  }
}

#[async_trait]
impl LiveClient for StubLiveClient {
  async fn get_project(
    &self,
    _organization_url: &str,
    project_name: &str,
    _cancel: &CancellationToken,
  ) -> ClientResult<RemoteProject> {
    self.maybe_fail()?;
    self
      .projects
      .lock()
      .unwrap()
      .get(project_name)
      .cloned()
      .ok_or_else(|| ClientError::Request { status: Some(404), detail: "project not found".into() })
  }

  async fn get_me(&self, _organization_url: &str, _cancel: &CancellationToken) -> ClientResult<RemoteIdentity> {
    self.maybe_fail()?;
    self
      .me
      .lock()
      .unwrap()
      .clone()
      .ok_or_else(|| ClientError::Request { status: Some(401), detail: "not signed in".into() })
  }

  async fn get_query_definition(
    &self,
    _organization_url: &str,
    _project_name: &str,
    external_query_id: &str,
    _cancel: &CancellationToken,
  ) -> ClientResult<RemoteQueryDefinition> {
    self.maybe_fail()?;
    self
      .query_definitions
      .lock()
      .unwrap()
      .get(external_query_id)
      .cloned()
      .ok_or_else(|| ClientError::Request { status: Some(404), detail: "query not found".into() })
  }

  async fn run_wiql(
    &self,
    _organization_url: &str,
    _project_name: &str,
    wiql: &str,
    _cancel: &CancellationToken,
  ) -> ClientResult<Vec<i64>> {
    self.maybe_fail()?;
    Ok(self.wiql_results.lock().unwrap().get(wiql).cloned().unwrap_or_default())
  }

  async fn get_work_items(
    &self,
    _organization_url: &str,
    _project_name: &str,
    ids: &[i64],
    _cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteWorkItem>> {
    self.maybe_fail()?;
    let store = self.work_items.lock().unwrap();
    Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
  }

  async fn get_work_item_types(
    &self,
    _organization_url: &str,
    _project_name: &str,
    _cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteWorkItemType>> {
    self.maybe_fail()?;
    Ok(self.work_item_types.lock().unwrap().clone())
  }

  async fn get_pull_requests(
    &self,
    _organization_url: &str,
    _project_name: &str,
    repository_name: &str,
    _cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemotePullRequest>> {
    self.maybe_fail()?;
    Ok(self.pull_requests.lock().unwrap().get(repository_name).cloned().unwrap_or_default())
  }

  async fn get_policy_evaluations(
    &self,
    _organization_url: &str,
    _project_name: &str,
    pull_request_external_id: i64,
    _cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemotePolicyEvaluation>> {
    self.maybe_fail()?;
    Ok(self.policy_evaluations.lock().unwrap().get(&pull_request_external_id).cloned().unwrap_or_default())
  }

  async fn get_build_definitions(
    &self,
    _organization_url: &str,
    _project_name: &str,
    definition_external_id: i64,
    _cancel: &CancellationToken,
  ) -> ClientResult<RemoteBuildDefinition> {
    self.maybe_fail()?;
    self
      .build_definitions
      .lock()
      .unwrap()
      .get(&definition_external_id)
      .cloned()
      .ok_or_else(|| ClientError::Request { status: Some(404), detail: "definition not found".into() })
  }

  async fn get_builds(
    &self,
    _organization_url: &str,
    _project_name: &str,
    definition_external_id: i64,
    _cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteBuild>> {
    self.maybe_fail()?;
    Ok(self.builds.lock().unwrap().get(&definition_external_id).cloned().unwrap_or_default())
  }

  async fn get_avatar(
    &self,
    _organization_url: &str,
    _identity_external_id: &str,
    _cancel: &CancellationToken,
  ) -> ClientResult<Vec<u8>> {
    self.maybe_fail()?;
    Ok(Vec::new())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn returns_seeded_wiql_result() {
    let stub = StubLiveClient::new();
    stub.wiql_results.lock().unwrap().insert("SELECT 1".into(), vec![10, 20]);
    let ids = stub.run_wiql("org", "proj", "SELECT 1", &CancellationToken::new()).await.unwrap();
    assert_eq!(ids, vec![10, 20]);
  }

  #[tokio::test]
  async fn fail_with_overrides_every_method() {
    let stub = StubLiveClient::new();
    *stub.fail_with.lock().unwrap() = Some(ClientError::Cancelled);
    let result = stub.run_wiql("org", "proj", "SELECT 1", &CancellationToken::new()).await;
    assert!(matches!(result, Err(ClientError::Cancelled)));
  }
}
