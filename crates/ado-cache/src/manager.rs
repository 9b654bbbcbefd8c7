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

//! CacheManager (§4.5): serializes refresh/periodic/clear-cache behind one
//! logical mutex, enforcing single in-flight, cooperative cancellation, and
//! pending-action coalescing. The state transitions themselves live in
//! `state`; this module is the I/O shell around them — it takes the lock
//! only long enough to compute the next state and stage the actions that
//! follow, then performs those actions (spawning work, cancelling a token,
//! purging the store) after releasing it, per §5.

use std::sync::{Arc, Mutex as StdMutex};

use ado_core::{Search, UpdateKind};
use ado_updaters::{CachedChildren, CachedSearchHandle, DataUpdateService, UpdateEvent, UpdateEventKind};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::{EventBus, Subscription};
use crate::error::ManagerResult;
use crate::state::{transition, Action, Input, Outcome, State};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEventKind {
  Updated,
  Cancel,
  Error,
  /// The cache store was dropped and recreated — distinct from `Updated`
  /// because there is no single `update_kind` it pertains to.
  Cleared,
}

/// What `CacheManager::subscribe` delivers — the Rust shape of §4.5's
/// `OnUpdate(source, kind, params, ex?)`. `source` is implicit (there is one
/// `CacheManager` per process); `params` is folded into `search` since the
/// UI needs it to know which list to invalidate.
#[derive(Debug, Clone)]
pub struct CacheEvent {
  pub update_kind: UpdateKind,
  pub kind: CacheEventKind,
  pub search: Option<Search>,
  pub error: Option<String>,
}

struct Inner {
  state: State,
  cancel: Option<CancellationToken>,
}

/// The state-machine cache coordinator (component F). Always used behind an
/// `Arc` — background dispatch tasks hold a clone of it to report their
/// terminal event back in.
pub struct CacheManager {
  service: Arc<DataUpdateService>,
  inner: Mutex<Inner>,
  bus: EventBus<CacheEvent>,
  periodic_handle: StdMutex<Option<JoinHandle<()>>>,
}

enum PreparedAction {
  Cancel(CancellationToken),
  SpawnRefresh(Search, CancellationToken),
  SpawnPeriodic(CancellationToken),
  Purge,
  Invalid,
  None,
}

impl CacheManager {
  pub fn new(service: DataUpdateService) -> Arc<Self> {
    Arc::new(Self {
      service: Arc::new(service),
      inner: Mutex::new(Inner { state: State::Idle, cancel: None }),
      bus: EventBus::new(64),
      periodic_handle: StdMutex::new(None),
    })
  }

  pub fn subscribe(&self) -> Subscription<CacheEvent> {
    self.bus.subscribe()
  }

  /// `refresh(p)` — a no-op if the Updater reports the cached data is not
  /// stale (§4.5's refresh cooldown), checked before the state machine ever
  /// sees the request so a hot cache never perturbs `Idle`.
  pub async fn refresh(self: &Arc<Self>, search: Search) -> ManagerResult<()> {
    let stale = self.service.is_new_or_stale_data(&search, self.service.settings().refresh_cooldown).await?;
    if !stale {
      return Ok(());
    }
    self.apply(Input::Refresh(search)).await
  }

  pub async fn periodic_update(self: &Arc<Self>) -> ManagerResult<()> {
    self.apply(Input::PeriodicUpdate).await
  }

  /// `purgeAllData` (§6's name for the `clearCache` input of §4.5).
  pub async fn purge_all_data(self: &Arc<Self>) -> ManagerResult<()> {
    self.apply(Input::ClearCache).await
  }

  /// Starts the periodic timer (§4.5: every 10 minutes, cold start
  /// included — `tokio::time::interval`'s first tick fires immediately).
  pub fn start(self: &Arc<Self>) {
    let manager = Arc::clone(self);
    let interval_duration = self.service.settings().periodic_interval;
    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval_duration);
      loop {
        ticker.tick().await;
        if let Err(err) = manager.periodic_update().await {
          tracing::error!(error = %err, "periodic update dispatch failed");
        }
      }
    });
    *self.periodic_handle.lock().unwrap() = Some(handle);
  }

  pub fn stop(&self) {
    if let Some(handle) = self.periodic_handle.lock().unwrap().take() {
      handle.abort();
    }
  }

  pub async fn get_cached_data_for_search(&self, search: &Search) -> ManagerResult<Option<CachedSearchHandle>> {
    Ok(self.service.get_cached_data_for_search(search).await?)
  }

  pub async fn get_cached_children(&self, search: &Search) -> ManagerResult<CachedChildren> {
    Ok(self.service.get_cached_children(search).await?)
  }

  pub async fn last_updated(&self) -> ManagerResult<Option<i64>> {
    Ok(self.service.last_updated().await?)
  }

  async fn apply(self: &Arc<Self>, input: Input) -> ManagerResult<()> {
    let prepared = {
      let mut inner = self.inner.lock().await;
      let (next_state, actions) = transition(inner.state.clone(), input);
      inner.state = next_state;
      let mut prepared = Vec::with_capacity(actions.len());
      for action in actions {
        prepared.push(match action {
          Action::CancelInFlight => match inner.cancel.take() {
            Some(token) => PreparedAction::Cancel(token),
            None => PreparedAction::None,
          },
          Action::StartRefresh(search) => {
            let token = CancellationToken::new();
            inner.cancel = Some(token.clone());
            PreparedAction::SpawnRefresh(search, token)
          }
          Action::StartPeriodic => {
            let token = CancellationToken::new();
            inner.cancel = Some(token.clone());
            PreparedAction::SpawnPeriodic(token)
          }
          Action::Purge => {
            inner.cancel = None;
            PreparedAction::Purge
          }
          Action::Invalid => PreparedAction::Invalid,
          Action::None => PreparedAction::None,
        });
      }
      prepared
    };

    for action in prepared {
      match action {
        PreparedAction::Cancel(token) => token.cancel(),
        PreparedAction::SpawnRefresh(search, token) => self.spawn_refresh(search, token),
        PreparedAction::SpawnPeriodic(token) => self.spawn_periodic(token),
        PreparedAction::Purge => self.do_purge().await?,
        PreparedAction::Invalid => {
          tracing::warn!("handleUpdate arrived while Idle; no in-flight update to terminate");
        }
        PreparedAction::None => {}
      }
    }
    Ok(())
  }

  fn spawn_refresh(self: &Arc<Self>, search: Search, token: CancellationToken) {
    let manager = Arc::clone(self);
    tokio::spawn(async move {
      let event = manager.service.dispatch(&search, &token).await;
      manager.on_terminal(Some(search), event).await;
    });
  }

  fn spawn_periodic(self: &Arc<Self>, token: CancellationToken) {
    let manager = Arc::clone(self);
    tokio::spawn(async move {
      let event = manager.service.dispatch_all(&token).await;
      manager.on_terminal(None, event).await;
    });
  }

  async fn on_terminal(self: &Arc<Self>, search: Option<Search>, event: UpdateEvent) {
    let outcome = match event.kind {
      UpdateEventKind::Updated => Outcome::Success,
      UpdateEventKind::Cancel => Outcome::Cancel,
      UpdateEventKind::Error => Outcome::Error,
    };
    let kind = match event.kind {
      UpdateEventKind::Updated => CacheEventKind::Updated,
      UpdateEventKind::Cancel => CacheEventKind::Cancel,
      UpdateEventKind::Error => CacheEventKind::Error,
    };
    self.bus.publish(CacheEvent {
      update_kind: event.update_kind,
      kind,
      search,
      error: event.error.map(|err| err.to_string()),
    });
    if let Err(err) = self.apply(Input::HandleUpdate(outcome)).await {
      tracing::error!(error = %err, "failed to apply state transition after terminal event");
    }
  }

  async fn do_purge(self: &Arc<Self>) -> ManagerResult<()> {
    self.service.purge_all_data().await?;
    self.bus.publish(CacheEvent { update_kind: UpdateKind::All, kind: CacheEventKind::Cleared, search: None, error: None });
    Ok(())
  }
}
