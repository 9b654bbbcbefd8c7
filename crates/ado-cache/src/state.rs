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

//! The five-state machine of §4.5, expressed as a single pure function over
//! `(State, Input) -> (State, Vec<Action>)` rather than a class hierarchy —
//! design note §9: "small enough to fit in a table."

use ado_core::Search;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
  Idle,
  Refreshing { search: Search },
  PeriodicUpdating,
  PendingRefresh { search: Search },
  PendingClearCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Success,
  Cancel,
  Error,
}

#[derive(Debug, Clone)]
pub enum Input {
  Refresh(Search),
  PeriodicUpdate,
  ClearCache,
  HandleUpdate(Outcome),
}

/// What the caller must actually *do* once the mutex guarding `State` is
/// released — spawning work, cancelling a token, or purging the store never
/// happens while the lock is held (§5: "long-running work is launched after
/// the mutex is released").
#[derive(Debug, Clone)]
pub enum Action {
  CancelInFlight,
  StartRefresh(Search),
  StartPeriodic,
  Purge,
  /// `handleUpdate` arrived in `Idle`: there is nothing in flight for it to
  /// terminate. Logged, not acted on.
  Invalid,
  None,
}

/// One transition of the table in §4.5. Returns the next state plus the
/// actions the caller must perform — in order — after releasing the mutex.
pub fn transition(state: State, input: Input) -> (State, Vec<Action>) {
  match (state, input) {
    (State::Idle, Input::Refresh(search)) => (State::Refreshing { search: search.clone() }, vec![Action::StartRefresh(search)]),
    (State::Refreshing { .. }, Input::Refresh(search)) => {
      (State::PendingRefresh { search: search.clone() }, vec![Action::CancelInFlight])
    }
    (State::PeriodicUpdating, Input::Refresh(search)) => {
      (State::PendingRefresh { search: search.clone() }, vec![Action::CancelInFlight])
    }
    (State::PendingRefresh { .. }, Input::Refresh(search)) => (State::PendingRefresh { search }, vec![Action::None]),
    (State::PendingClearCache, Input::Refresh(_)) => (State::PendingClearCache, vec![Action::None]),

    (State::Idle, Input::PeriodicUpdate) => (State::PeriodicUpdating, vec![Action::StartPeriodic]),
    (other @ State::Refreshing { .. }, Input::PeriodicUpdate)
    | (other @ State::PeriodicUpdating, Input::PeriodicUpdate)
    | (other @ State::PendingRefresh { .. }, Input::PeriodicUpdate)
    | (other @ State::PendingClearCache, Input::PeriodicUpdate) => (other, vec![Action::None]),

    (State::Idle, Input::ClearCache) => (State::Idle, vec![Action::Purge]),
    (State::Refreshing { .. }, Input::ClearCache) => (State::PendingClearCache, vec![Action::CancelInFlight]),
    (State::PeriodicUpdating, Input::ClearCache) => (State::PendingClearCache, vec![Action::CancelInFlight]),
    (State::PendingRefresh { .. }, Input::ClearCache) => (State::PendingClearCache, vec![Action::None]),
    (State::PendingClearCache, Input::ClearCache) => (State::PendingClearCache, vec![Action::None]),

    (State::Idle, Input::HandleUpdate(_)) => (State::Idle, vec![Action::Invalid]),
    (State::Refreshing { .. }, Input::HandleUpdate(_)) => (State::Idle, vec![Action::None]),
    (State::PeriodicUpdating, Input::HandleUpdate(_)) => (State::Idle, vec![Action::None]),
    (State::PendingRefresh { search }, Input::HandleUpdate(_)) => {
      (State::Refreshing { search: search.clone() }, vec![Action::StartRefresh(search)])
    }
    (State::PendingClearCache, Input::HandleUpdate(_)) => (State::Idle, vec![Action::Purge]),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn query(id: i64) -> Search {
    Search::Query { id, organization_url: "https://dev.azure.com/o".into(), project_name: "p".into(), external_query_id: "q".into() }
  }

  #[test]
  fn idle_refresh_starts_refreshing() {
    let (next, actions) = transition(State::Idle, Input::Refresh(query(1)));
    assert_eq!(next, State::Refreshing { search: query(1) });
    assert!(matches!(actions[0], Action::StartRefresh(_)));
  }

  #[test]
  fn refreshing_refresh_cancels_and_stashes() {
    let (next, actions) = transition(State::Refreshing { search: query(1) }, Input::Refresh(query(2)));
    assert_eq!(next, State::PendingRefresh { search: query(2) });
    assert!(matches!(actions[0], Action::CancelInFlight));
  }

  #[test]
  fn pending_refresh_replaces_stashed_search() {
    let (next, _) = transition(State::PendingRefresh { search: query(1) }, Input::Refresh(query(2)));
    assert_eq!(next, State::PendingRefresh { search: query(2) });
  }

  #[test]
  fn pending_clear_cache_ignores_refresh() {
    let (next, actions) = transition(State::PendingClearCache, Input::Refresh(query(1)));
    assert_eq!(next, State::PendingClearCache);
    assert!(matches!(actions[0], Action::None));
  }

  #[test]
  fn idle_periodic_update_starts_periodic() {
    let (next, actions) = transition(State::Idle, Input::PeriodicUpdate);
    assert_eq!(next, State::PeriodicUpdating);
    assert!(matches!(actions[0], Action::StartPeriodic));
  }

  #[test]
  fn periodic_update_is_ignored_while_periodic_updating() {
    let (next, actions) = transition(State::PeriodicUpdating, Input::PeriodicUpdate);
    assert_eq!(next, State::PeriodicUpdating);
    assert!(matches!(actions[0], Action::None));
  }

  #[test]
  fn idle_clear_cache_purges_immediately() {
    let (next, actions) = transition(State::Idle, Input::ClearCache);
    assert_eq!(next, State::Idle);
    assert!(matches!(actions[0], Action::Purge));
  }

  #[test]
  fn clear_cache_during_refresh_defers_and_cancels() {
    let (next, actions) = transition(State::Refreshing { search: query(1) }, Input::ClearCache);
    assert_eq!(next, State::PendingClearCache);
    assert!(matches!(actions[0], Action::CancelInFlight));
  }

  #[test]
  fn handle_update_in_idle_is_invalid() {
    let (next, actions) = transition(State::Idle, Input::HandleUpdate(Outcome::Success));
    assert_eq!(next, State::Idle);
    assert!(matches!(actions[0], Action::Invalid));
  }

  #[test]
  fn handle_update_drains_pending_refresh() {
    let (next, actions) = transition(State::PendingRefresh { search: query(1) }, Input::HandleUpdate(Outcome::Error));
    assert_eq!(next, State::Refreshing { search: query(1) });
    assert!(matches!(actions[0], Action::StartRefresh(_)));
  }

  #[test]
  fn handle_update_drains_pending_clear_cache() {
    let (next, actions) = transition(State::PendingClearCache, Input::HandleUpdate(Outcome::Success));
    assert_eq!(next, State::Idle);
    assert!(matches!(actions[0], Action::Purge));
  }

  #[test]
  fn handle_update_from_periodic_updating_returns_to_idle() {
    let (next, actions) = transition(State::PeriodicUpdating, Input::HandleUpdate(Outcome::Success));
    assert_eq!(next, State::Idle);
    assert!(matches!(actions[0], Action::None));
  }

  #[test]
  fn pending_clear_cache_draining_takes_priority_over_pending_refresh_by_construction() {
    // A PendingClearCache arriving while PendingRefresh is stashed overwrites
    // it outright (the table has no PendingRefresh+ClearCache combined
    // state), so draining order after a terminal event never has to choose
    // between the two — at most one is ever stashed.
    let (next, _) = transition(State::PendingRefresh { search: query(1) }, Input::ClearCache);
    assert_eq!(next, State::PendingClearCache);
  }
}
