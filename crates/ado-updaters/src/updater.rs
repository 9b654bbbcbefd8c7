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

use std::time::Duration;

use ado_core::{Search, UpdateKind};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UpdaterResult;
use crate::views::CachedChildren;

/// The cached row a search resolves to, identified by natural key — just
/// enough to drive staleness checks without exposing internal ids further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedSearchHandle {
  pub row_id: i64,
  pub time_updated: i64,
}

/// Converts a `Settings`-style `std::time::Duration` into the `chrono::Duration`
/// that `Ticks::is_older_than` expects.
pub(crate) fn as_chrono_duration(d: Duration) -> chrono::Duration {
  chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero())
}

/// Uniform contract every per-kind updater implements. The generic
/// algorithm each follows: resolve identity → locate/create parent rows →
/// fetch remote list → upsert dependents then items → upsert join rows →
/// delete stale join rows → commit (or roll back and propagate on error).
#[async_trait]
pub trait Updater: Send + Sync {
  fn kind(&self) -> UpdateKind;

  async fn update_data(&self, search: &Search, cancel: &CancellationToken) -> UpdaterResult<()>;

  async fn get_cached_data_for_search(&self, search: &Search) -> UpdaterResult<Option<CachedSearchHandle>>;

  async fn get_cached_children(&self, search: &Search) -> UpdaterResult<CachedChildren>;

  /// `true` if there is no cached data yet, or the cached data is older
  /// than `cooldown`.
  async fn is_new_or_stale(&self, search: &Search, cooldown: Duration) -> UpdaterResult<bool>;

  async fn prune_obsolete_data(&self) -> UpdaterResult<()>;
}
