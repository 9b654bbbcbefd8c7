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

use ado_cache::{CacheEvent, CacheEventKind, CacheManager};
use ado_core::{parse_organization_and_project, query_external_id_from_url, repository_name_from_url, PullRequestView, Search};
use ado_database::{DefinitionSearchDefRepository, PullRequestSearchDefRepository, QueryDefRepository};
use anyhow::{anyhow, Result};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum RefreshCommand {
  /// Refresh one saved work-item query by its persistent id.
  Query { id: i64 },
  /// Refresh one saved pull-request search by its persistent id.
  PullRequests { id: i64 },
  /// Refresh one saved pipeline/definition search by its persistent id.
  Pipeline { id: i64 },
  /// Refresh the implicit MyWorkItems search for an organization/project.
  MyWorkItems { organization_url: String, project_name: String },
  /// Refresh every saved search of every kind, same as the periodic cycle.
  All,
}

pub struct RefreshContext {
  pub manager: Arc<CacheManager>,
  pub query_defs: Arc<QueryDefRepository>,
  pub pull_request_search_defs: Arc<PullRequestSearchDefRepository>,
  pub definition_search_defs: Arc<DefinitionSearchDefRepository>,
  pub username: String,
}

pub async fn handle_refresh(cmd: RefreshCommand, ctx: RefreshContext) -> Result<()> {
  if matches!(cmd, RefreshCommand::All) {
    ctx.manager.periodic_update().await?;
    println!("dispatched a full refresh cycle");
    return Ok(());
  }

  let search = resolve_search(&cmd, &ctx).await?;
  let mut subscription = ctx.manager.subscribe();
  let update_kind = search.kind();
  ctx.manager.refresh(search).await?;
  while let Some(event) = subscription.recv().await {
    if event.update_kind == update_kind && event.kind != CacheEventKind::Cleared {
      report(&event);
      break;
    }
  }
  Ok(())
}

async fn resolve_search(cmd: &RefreshCommand, ctx: &RefreshContext) -> Result<Search> {
  match cmd {
    RefreshCommand::Query { id } => {
      let def = ctx.query_defs.get_by_id(*id).await?.ok_or_else(|| anyhow!("no saved query with id {id}"))?;
      let (organization_url, project_name) =
        parse_organization_and_project(&def.url).ok_or_else(|| anyhow!("could not parse query url {}", def.url))?;
      let external_query_id =
        query_external_id_from_url(&def.url).ok_or_else(|| anyhow!("could not parse query id from {}", def.url))?;
      Ok(Search::Query { id: def.id, organization_url, project_name, external_query_id })
    }
    RefreshCommand::PullRequests { id } => {
      let def = ctx
        .pull_request_search_defs
        .get_by_id(*id)
        .await?
        .ok_or_else(|| anyhow!("no saved pull request search with id {id}"))?;
      let (organization_url, project_name) =
        parse_organization_and_project(&def.url).ok_or_else(|| anyhow!("could not parse url {}", def.url))?;
      let repository_name =
        repository_name_from_url(&def.url).ok_or_else(|| anyhow!("could not parse repository from {}", def.url))?;
      let view: PullRequestView = def.view.parse().map_err(|e| anyhow!("{e}"))?;
      Ok(Search::PullRequests { id: def.id, organization_url, project_name, repository_name, view })
    }
    RefreshCommand::Pipeline { id } => {
      let def = ctx
        .definition_search_defs
        .get_by_id(*id)
        .await?
        .ok_or_else(|| anyhow!("no saved pipeline search with id {id}"))?;
      let (organization_url, project_name) =
        parse_organization_and_project(&def.url).ok_or_else(|| anyhow!("could not parse url {}", def.url))?;
      Ok(Search::Pipeline { id: def.id, organization_url, project_name, definition_external_id: def.external_id })
    }
    RefreshCommand::MyWorkItems { organization_url, project_name } => Ok(Search::MyWorkItems {
      organization_url: organization_url.clone(),
      project_name: project_name.clone(),
      username: ctx.username.clone(),
    }),
    RefreshCommand::All => unreachable!("handled by the caller before resolving a Search"),
  }
}

fn report(event: &CacheEvent) {
  match event.kind {
    CacheEventKind::Updated => println!("refresh succeeded"),
    CacheEventKind::Cancel => println!("refresh cancelled"),
    CacheEventKind::Error => println!("refresh failed: {}", event.error.as_deref().unwrap_or("unknown error")),
    CacheEventKind::Cleared => {}
  }
}
