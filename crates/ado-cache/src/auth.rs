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

//! AuthMediator (component H): the sign-out half of "Sign-out events flow
//! Auth → F" (§2). The hosting extension owns credential acquisition
//! (out of scope, §1); this module only reacts to the two events it emits.

use std::sync::Arc;

use ado_core::Account;

use crate::bus::{EventBus, Subscription};
use crate::manager::CacheManager;

#[derive(Debug, Clone)]
pub enum AuthEvent {
  SignIn(Account),
  SignOut,
}

/// Fan-out point for sign-in/sign-out notifications. The hosting extension
/// publishes to it from wherever its credential broker lives; `AuthMediator`
/// is the one subscriber this core cares about.
pub struct AuthBus {
  bus: EventBus<AuthEvent>,
}

impl AuthBus {
  pub fn new() -> Self {
    Self { bus: EventBus::new(16) }
  }

  pub fn publish(&self, event: AuthEvent) {
    self.bus.publish(event);
  }

  pub fn subscribe(&self) -> Subscription<AuthEvent> {
    self.bus.subscribe()
  }
}

impl Default for AuthBus {
  fn default() -> Self {
    Self::new()
  }
}

/// Subscribes to `auth_bus` and purges the cache on every `SignOut`,
/// mirroring `CacheManager::purge_all_data` into the `clearCache` state
/// input (§4.5's "Sign-out events flow `Auth → F`"). Runs until the bus is
/// dropped; spawned as a detached background task.
pub fn spawn_clear_cache_on_sign_out(manager: Arc<CacheManager>, auth_bus: &AuthBus) -> tokio::task::JoinHandle<()> {
  let mut subscription = auth_bus.subscribe();
  tokio::spawn(async move {
    while let Some(event) = subscription.recv().await {
      if let AuthEvent::SignOut = event {
        if let Err(err) = manager.purge_all_data().await {
          tracing::error!(error = %err, "failed to purge cache after sign-out");
        }
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn sign_out_event_is_observed_by_subscriber() {
    let bus = AuthBus::new();
    let mut sub = bus.subscribe();
    bus.publish(AuthEvent::SignOut);
    match sub.recv().await {
      Some(AuthEvent::SignOut) => {}
      other => panic!("expected SignOut, got {other:?}"),
    }
  }
}
