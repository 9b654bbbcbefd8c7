use std::sync::Arc;

use ado_cache::{CacheEventKind, CacheManager};
use anyhow::Result;

pub async fn handle_purge_cache(manager: Arc<CacheManager>) -> Result<()> {
  let mut subscription = manager.subscribe();
  manager.purge_all_data().await?;
  while let Some(event) = subscription.recv().await {
    if event.kind == CacheEventKind::Cleared {
      println!("cache purged");
      break;
    }
  }
  Ok(())
}
