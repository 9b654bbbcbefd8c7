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

//! Wall-clock time stored as ticks, the way the cache schema persists it.
//!
//! The data model (§3) stores time as "a signed 64-bit integer (ticks of a
//! fixed reference; UTC)" rather than as a database-native timestamp, so that
//! the cache schema does not depend on the SQL backend's datetime handling.
//! `Ticks` wraps that integer and converts to/from `chrono::DateTime<Utc>` at
//! the boundary.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Ticks of 100 nanoseconds since 0001-01-01T00:00:00Z, matching the .NET
/// `DateTime.Ticks` epoch the original store used. The exact epoch is only
/// load-bearing for on-disk compatibility with nothing outside this crate, so
/// it is an implementation detail, not a public contract. Exposed as `pub`
/// only so updaters can convert `Settings` durations into tick deltas.
pub const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_AT_UNIX_EPOCH: i64 = 621_355_968_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticks(pub i64);

impl Ticks {
  pub fn now() -> Self {
    Self::from_datetime(Utc::now())
  }

  pub fn from_datetime(dt: DateTime<Utc>) -> Self {
    let unix_ticks = dt.timestamp() * TICKS_PER_SECOND
      + (dt.timestamp_subsec_nanos() as i64) / 100;
    Ticks(unix_ticks + TICKS_AT_UNIX_EPOCH)
  }

  pub fn to_datetime(self) -> DateTime<Utc> {
    let unix_ticks = self.0 - TICKS_AT_UNIX_EPOCH;
    let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    Utc.timestamp_opt(secs, nanos).single().unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
  }

  pub fn checked_sub(self, other: Ticks) -> Option<chrono::Duration> {
    self.0.checked_sub(other.0).map(|d| chrono::Duration::nanoseconds(d.saturating_mul(100)))
  }

  pub fn age(self) -> chrono::Duration {
    Ticks::now().checked_sub(self).unwrap_or_default()
  }

  pub fn is_older_than(self, ttl: chrono::Duration) -> bool {
    self.age() > ttl
  }
}

impl From<DateTime<Utc>> for Ticks {
  fn from(dt: DateTime<Utc>) -> Self {
    Ticks::from_datetime(dt)
  }
}

impl From<Ticks> for DateTime<Utc> {
  fn from(t: Ticks) -> Self {
    t.to_datetime()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_through_datetime() {
    let dt = Utc.with_ymd_and_hms(2026, 8, 1, 12, 30, 0).unwrap();
    let ticks = Ticks::from_datetime(dt);
    let back = ticks.to_datetime();
    assert_eq!(dt.timestamp(), back.timestamp());
  }

  #[test]
  fn age_of_now_is_near_zero() {
    let t = Ticks::now();
    assert!(t.age() < chrono::Duration::seconds(1));
  }

  #[test]
  fn is_older_than_respects_ttl() {
    let old = Ticks::from_datetime(Utc::now() - chrono::Duration::days(8));
    assert!(old.is_older_than(chrono::Duration::days(7)));
    let fresh = Ticks::now();
    assert!(!fresh.is_older_than(chrono::Duration::days(7)));
  }

  #[test]
  fn ordering_matches_datetime_ordering() {
    let earlier = Ticks::from_datetime(Utc::now() - chrono::Duration::minutes(5));
    let later = Ticks::now();
    assert!(earlier < later);
  }
}
