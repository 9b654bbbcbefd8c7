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

//! The narrow remote-service surface every Updater is written against.
//! `LiveClient` is a trait, not a concrete struct, so updaters can be tested
//! against `mock::StubLiveClient` without a network.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ClientResult;
use crate::transport::Transport;
use crate::types::{
  RemoteBuild, RemoteBuildDefinition, RemoteIdentity, RemotePolicyEvaluation, RemoteProject,
  RemotePullRequest, RemoteQueryDefinition, RemoteWorkItem, RemoteWorkItemType,
};

/// Every method is cancellable and, on transport failure, yields a
/// `ClientError::Request`/`Decode` that bridges to `CoreError::RemoteError`.
#[async_trait]
pub trait LiveClient: Send + Sync {
  async fn get_project(
    &self,
    organization_url: &str,
    project_name: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<RemoteProject>;

  async fn get_me(&self, organization_url: &str, cancel: &CancellationToken) -> ClientResult<RemoteIdentity>;

  async fn get_query_definition(
    &self,
    organization_url: &str,
    project_name: &str,
    external_query_id: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<RemoteQueryDefinition>;

  /// Runs a WIQL query (either a saved definition's stored text, or a literal
  /// such as the MyWorkItems synthesized query) and returns matching ids.
  async fn run_wiql(
    &self,
    organization_url: &str,
    project_name: &str,
    wiql: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<i64>>;

  /// Fetches the given work item ids in one batch. Callers are responsible
  /// for chunking to `workItemBatchSize`; this method issues exactly one
  /// request per call.
  async fn get_work_items(
    &self,
    organization_url: &str,
    project_name: &str,
    ids: &[i64],
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteWorkItem>>;

  async fn get_work_item_types(
    &self,
    organization_url: &str,
    project_name: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteWorkItemType>>;

  async fn get_pull_requests(
    &self,
    organization_url: &str,
    project_name: &str,
    repository_name: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemotePullRequest>>;

  async fn get_policy_evaluations(
    &self,
    organization_url: &str,
    project_name: &str,
    pull_request_external_id: i64,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemotePolicyEvaluation>>;

  async fn get_build_definitions(
    &self,
    organization_url: &str,
    project_name: &str,
    definition_external_id: i64,
    cancel: &CancellationToken,
  ) -> ClientResult<RemoteBuildDefinition>;

  /// Builds for one definition, ordered by queue time descending by the
  /// remote service itself (callers do not re-sort).
  async fn get_builds(
    &self,
    organization_url: &str,
    project_name: &str,
    definition_external_id: i64,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteBuild>>;

  async fn get_avatar(
    &self,
    organization_url: &str,
    identity_external_id: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<u8>>;
}

/// Thin, real `LiveClient` backed by HTTP via [`Transport`].
pub struct HttpLiveClient {
  transport: Transport,
}

impl HttpLiveClient {
  pub fn new(organization_url: Url, connection_token: impl Into<String>) -> ClientResult<Self> {
    Ok(Self { transport: Transport::new(organization_url, connection_token)? })
  }

  fn project_path(project_name: &str, rest: &str) -> String {
    format!("{project_name}/_apis/{rest}")
  }
}

#[derive(Deserialize)]
struct WiqlResult {
  #[serde(rename = "workItems", default)]
  work_items: Vec<WiqlWorkItemRef>,
}

#[derive(Deserialize)]
struct WiqlWorkItemRef {
  id: i64,
}

#[derive(Deserialize)]
struct WorkItemBatchResponse {
  value: Vec<RemoteWorkItem>,
}

#[derive(Deserialize)]
struct ListResponse<T> {
  value: Vec<T>,
}

#[async_trait]
impl LiveClient for HttpLiveClient {
  async fn get_project(
    &self,
    _organization_url: &str,
    project_name: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<RemoteProject> {
    self.transport.get_json(&format!("_apis/projects/{project_name}"), &[], cancel).await
  }

  async fn get_me(&self, _organization_url: &str, cancel: &CancellationToken) -> ClientResult<RemoteIdentity> {
    self.transport.get_json("_apis/connectionData", &[("teamContext", String::new())], cancel).await
  }

  async fn get_query_definition(
    &self,
    _organization_url: &str,
    project_name: &str,
    external_query_id: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<RemoteQueryDefinition> {
    self
      .transport
      .get_json(&Self::project_path(project_name, &format!("wit/queries/{external_query_id}")), &[], cancel)
      .await
  }

  async fn run_wiql(
    &self,
    _organization_url: &str,
    project_name: &str,
    wiql: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<i64>> {
    #[derive(serde::Serialize)]
    struct WiqlBody<'a> {
      query: &'a str,
    }
    let result: WiqlResult = self
      .transport
      .post_json(&Self::project_path(project_name, "wit/wiql"), &WiqlBody { query: wiql }, cancel)
      .await?;
    Ok(result.work_items.into_iter().map(|w| w.id).collect())
  }

  async fn get_work_items(
    &self,
    _organization_url: &str,
    project_name: &str,
    ids: &[i64],
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteWorkItem>> {
    let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
    let response: WorkItemBatchResponse = self
      .transport
      .get_json(&Self::project_path(project_name, "wit/workitems"), &[("ids", joined)], cancel)
      .await?;
    Ok(response.value)
  }

  async fn get_work_item_types(
    &self,
    _organization_url: &str,
    project_name: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteWorkItemType>> {
    let response: ListResponse<RemoteWorkItemType> =
      self.transport.get_json(&Self::project_path(project_name, "wit/workitemtypes"), &[], cancel).await?;
    Ok(response.value)
  }

  async fn get_pull_requests(
    &self,
    _organization_url: &str,
    project_name: &str,
    repository_name: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemotePullRequest>> {
    let response: ListResponse<RemotePullRequest> = self
      .transport
      .get_json(&Self::project_path(project_name, &format!("git/repositories/{repository_name}/pullrequests")), &[], cancel)
      .await?;
    Ok(response.value)
  }

  async fn get_policy_evaluations(
    &self,
    _organization_url: &str,
    project_name: &str,
    pull_request_external_id: i64,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemotePolicyEvaluation>> {
    let response: ListResponse<RemotePolicyEvaluation> = self
      .transport
      .get_json(
        &Self::project_path(project_name, &format!("policy/evaluations?artifactId={pull_request_external_id}")),
        &[],
        cancel,
      )
      .await?;
    Ok(response.value)
  }

  async fn get_build_definitions(
    &self,
    _organization_url: &str,
    project_name: &str,
    definition_external_id: i64,
    cancel: &CancellationToken,
  ) -> ClientResult<RemoteBuildDefinition> {
    self
      .transport
      .get_json(&Self::project_path(project_name, &format!("build/definitions/{definition_external_id}")), &[], cancel)
      .await
  }

  async fn get_builds(
    &self,
    _organization_url: &str,
    project_name: &str,
    definition_external_id: i64,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<RemoteBuild>> {
    let response: ListResponse<RemoteBuild> = self
      .transport
      .get_json(
        &Self::project_path(project_name, "build/builds"),
        &[("definitions", definition_external_id.to_string()), ("$top", "50".to_string())],
        cancel,
      )
      .await?;
    Ok(response.value)
  }

  async fn get_avatar(
    &self,
    _organization_url: &str,
    identity_external_id: &str,
    cancel: &CancellationToken,
  ) -> ClientResult<Vec<u8>> {
    self.transport.get_bytes(&format!("_apis/graph/subjects/{identity_external_id}/avatars"), cancel).await
  }
}
