use std::sync::Arc;

use ado_cache::CacheManager;
use ado_database::{DefinitionSearchDefRepository, ProjectSettingsRepository, PullRequestSearchDefRepository, QueryDefRepository};
use anyhow::Result;

pub struct StatusContext {
  pub manager: Arc<CacheManager>,
  pub query_defs: Arc<QueryDefRepository>,
  pub pull_request_search_defs: Arc<PullRequestSearchDefRepository>,
  pub definition_search_defs: Arc<DefinitionSearchDefRepository>,
  pub project_settings: Arc<ProjectSettingsRepository>,
}

pub async fn handle_status(ctx: StatusContext) -> Result<()> {
  let last_updated = ctx.manager.last_updated().await?;
  let queries = ctx.query_defs.get_all(false).await?.len();
  let pull_request_searches = ctx.pull_request_search_defs.get_all(false).await?.len();
  let pipelines = ctx.definition_search_defs.get_all(false).await?.len();
  let projects = ctx.project_settings.get_all().await?.len();

  println!("last updated (ticks):  {}", last_updated.map(|t| t.to_string()).unwrap_or_else(|| "never".to_string()));
  println!("saved queries:         {queries}");
  println!("saved pull requests:   {pull_request_searches}");
  println!("saved pipelines:       {pipelines}");
  println!("project settings rows: {projects}");
  Ok(())
}
