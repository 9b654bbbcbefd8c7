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

//! LiveDataProvider (component G): the read-side facade. §4.6's single
//! latency guarantee — "warm reads never block on the network" — is
//! implemented exactly as the algorithm describes: a warm cache returns
//! immediately and fires a background refresh; a cold miss subscribes to
//! `CacheManager::OnUpdate` before kicking off the refresh it then awaits.

use std::sync::Arc;

use ado_core::Search;
use ado_updaters::CachedChildren;

use crate::error::ManagerResult;
use crate::manager::{CacheEventKind, CacheManager};

pub struct LiveDataProvider {
  manager: Arc<CacheManager>,
}

impl LiveDataProvider {
  pub fn new(manager: Arc<CacheManager>) -> Self {
    Self { manager }
  }

  /// `getContentData<T>(search)`: cached children for the search, triggering
  /// (but never awaiting) a background refresh on a warm hit, and blocking
  /// on the one in-flight refresh it starts for a cold miss.
  pub async fn get_content_data(&self, search: Search) -> ManagerResult<CachedChildren> {
    let cached_parent = self.manager.get_cached_data_for_search(&search).await?;

    if cached_parent.is_some() {
      let manager = Arc::clone(&self.manager);
      let background_search = search.clone();
      tokio::spawn(async move {
        if let Err(err) = manager.refresh(background_search).await {
          tracing::warn!(error = %err, "background refresh failed");
        }
      });
      return self.manager.get_cached_children(&search).await;
    }

    let mut subscription = self.manager.subscribe();
    let update_kind = search.kind();
    self.manager.refresh(search.clone()).await?;
    while let Some(event) = subscription.recv().await {
      if event.update_kind == update_kind && event.kind != CacheEventKind::Cleared {
        break;
      }
    }
    // On Error/Cancel the children may be empty — that is the documented
    // behavior, not a failure of this call.
    self.manager.get_cached_children(&search).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manager::CacheEvent;

  fn query() -> Search {
    Search::Query {
      id: 1,
      organization_url: "https://dev.azure.com/o".into(),
      project_name: "p".into(),
      external_query_id: "q1".into(),
    }
  }

  #[test]
  fn matching_terminal_event_is_recognized() {
    let event = CacheEvent {
      update_kind: ado_core::UpdateKind::Query,
      kind: CacheEventKind::Updated,
      search: Some(query()),
      error: None,
    };
    assert_eq!(event.update_kind, query().kind());
    assert_ne!(event.kind, CacheEventKind::Cleared);
  }
}
