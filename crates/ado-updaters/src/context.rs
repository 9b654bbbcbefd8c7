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

use std::sync::Arc;

use ado_client::LiveClient;
use ado_core::{Account, AccountProvider, ConnectionProvider, Settings};
use ado_database::repositories::cache_store::{NewOrganizationInput, NewProjectInput};
use ado_database::{
  CacheStore, DefinitionSearchDefRepository, ProjectSettingsRepository, PullRequestSearchDefRepository,
  QueryDefRepository,
};
use ado_core::Ticks;
use tokio_util::sync::CancellationToken;

use crate::error::UpdaterResult;

/// Shared collaborators every Updater is built from. Cheaply `Clone`-able;
/// holds `Arc`s, not owned resources.
#[derive(Clone)]
pub struct UpdaterContext {
  pub live_client: Arc<dyn LiveClient>,
  pub cache: Arc<CacheStore>,
  pub connections: Arc<dyn ConnectionProvider>,
  pub accounts: Arc<dyn AccountProvider>,
  pub settings: Settings,
  /// Persistent-store repositories, needed only by `MyWorkItemsUpdater`'s
  /// discovery fallback (project settings, then every other saved search).
  pub query_defs: Arc<QueryDefRepository>,
  pub pull_request_search_defs: Arc<PullRequestSearchDefRepository>,
  pub definition_search_defs: Arc<DefinitionSearchDefRepository>,
  pub project_settings: Arc<ProjectSettingsRepository>,
}

impl UpdaterContext {
  pub async fn current_account(&self) -> UpdaterResult<Account> {
    self
      .accounts
      .default_account()
      .await
      .ok_or_else(|| crate::error::UpdaterError::Invariant("no signed-in account".into()))
  }

  /// Step 2 of the generic Updater algorithm: locate or create the
  /// `Organization` and `Project` parent rows for a search.
  pub async fn ensure_organization_and_project(
    &self,
    organization_url: &str,
    project_name: &str,
    cancel: &CancellationToken,
  ) -> UpdaterResult<(i64, i64)> {
    let now = Ticks::now().0;
    let organization = self
      .cache
      .upsert_organization(NewOrganizationInput {
        name: organization_name_from_url(organization_url),
        connection: organization_url.to_string(),
        time_updated: now,
        time_last_sync: now,
      })
      .await?;

    let remote_project = self.live_client.get_project(organization_url, project_name, cancel).await?;
    let project = self
      .cache
      .upsert_project(NewProjectInput {
        name: remote_project.name,
        external_id: remote_project.external_id,
        description: remote_project.description,
        organization_id: organization.id,
        time_updated: now,
      })
      .await?;

    Ok((organization.id, project.id))
  }

  /// Pure cache read counterpart to `ensure_organization_and_project`, for
  /// `getCachedDataForSearch`/`getCachedChildren` paths that must not issue a
  /// live call. Returns `None` if either row has never been synced.
  pub async fn resolve_project_id_from_cache(
    &self,
    organization_url: &str,
    project_name: &str,
  ) -> UpdaterResult<Option<i64>> {
    let Some(organization) = self.cache.find_organization_by_connection(organization_url.to_string()).await? else {
      return Ok(None);
    };
    let project = self.cache.find_project_by_name(organization.id, project_name.to_string()).await?;
    Ok(project.map(|project| project.id))
  }
}

fn organization_name_from_url(organization_url: &str) -> String {
  organization_url.trim_end_matches('/').rsplit('/').next().unwrap_or(organization_url).to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_organization_name_from_trailing_path_segment() {
    assert_eq!(organization_name_from_url("https://dev.azure.com/contoso"), "contoso");
    assert_eq!(organization_name_from_url("https://dev.azure.com/contoso/"), "contoso");
  }
}
