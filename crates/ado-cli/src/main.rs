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

use ado_cache::CacheManager;
use ado_client::HttpLiveClient;
use ado_database::{
  CacheStore, DataStore, DefinitionSearchDefRepository, ProjectSettingsRepository, PullRequestSearchDefRepository,
  QueryDefRepository, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION,
};
use ado_updaters::{DataUpdateService, UpdaterContext};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod commands;
mod config;
mod providers;

use commands::refresh::{handle_refresh, RefreshCommand, RefreshContext};
use commands::status::{handle_status, StatusContext};
use config::CliConfig;
use providers::{StaticAccountProvider, StaticConnectionProvider};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "ado-cli")]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Verbose output
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Refresh one saved search, or every saved search with `all`.
  Refresh {
    #[command(subcommand)]
    cmd: RefreshCommand,
  },
  /// Start the periodic refresh timer and run until interrupted.
  Periodic,
  /// Drop and recreate the cache store.
  PurgeCache,
  /// Print saved-definition counts and the last successful sync time.
  Status,
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenv().ok();
  let cli = Cli::parse();

  let log_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt().with_env_filter(log_level).init();

  let config = CliConfig::from_env()?;

  let persistent_store =
    DataStore::open(&config.settings.persistent_db_path, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION)
      .context("opening persistent store")?;
  let cache_store =
    DataStore::open(&config.settings.cache_db_path, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION).context("opening cache store")?;

  let query_defs = Arc::new(QueryDefRepository::new(persistent_store.clone()));
  let pull_request_search_defs = Arc::new(PullRequestSearchDefRepository::new(persistent_store.clone()));
  let definition_search_defs = Arc::new(DefinitionSearchDefRepository::new(persistent_store.clone()));
  let project_settings = Arc::new(ProjectSettingsRepository::new(persistent_store));

  let organization_url_parsed = url::Url::parse(&config.organization_url).context("parsing ADO_ORGANIZATION_URL")?;
  let live_client = HttpLiveClient::new(organization_url_parsed, config.personal_access_token.clone())
    .context("building the Azure DevOps HTTP client")?;

  let ctx = UpdaterContext {
    live_client: Arc::new(live_client),
    cache: Arc::new(CacheStore::new(cache_store)),
    connections: Arc::new(StaticConnectionProvider::new(config.personal_access_token.clone())),
    accounts: Arc::new(StaticAccountProvider::new(config.display_name.clone(), config.username.clone())),
    settings: config.settings.clone(),
    query_defs: query_defs.clone(),
    pull_request_search_defs: pull_request_search_defs.clone(),
    definition_search_defs: definition_search_defs.clone(),
    project_settings: project_settings.clone(),
  };

  let service = DataUpdateService::new(ctx);
  let manager = CacheManager::new(service);

  match cli.command {
    Commands::Refresh { cmd } => {
      handle_refresh(
        cmd,
        RefreshContext {
          manager,
          query_defs,
          pull_request_search_defs,
          definition_search_defs,
          username: config.username.clone(),
        },
      )
      .await?
    }
    Commands::Periodic => commands::periodic::handle_periodic(manager, config.settings.periodic_interval).await?,
    Commands::PurgeCache => commands::purge_cache::handle_purge_cache(manager).await?,
    Commands::Status => {
      handle_status(StatusContext { manager, query_defs, pull_request_search_defs, definition_search_defs, project_settings })
        .await?
    }
  }

  Ok(())
}
