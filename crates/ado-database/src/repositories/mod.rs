pub mod cache_store;
pub mod search_definitions;

pub use cache_store::CacheStore;
pub use search_definitions::{
  DefinitionSearchDefRepository, ProjectSettingsRepository, PullRequestSearchDefRepository, QueryDefRepository,
};
