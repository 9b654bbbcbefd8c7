/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-dot-]browne[-at-]dwightjbrowne[-dot-]com
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

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Tunable knobs for the cache-and-sync core, all with defaults from the
/// design and all overridable from the environment for tests and operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
  pub periodic_interval: Duration,
  pub refresh_cooldown: Duration,
  pub work_item_batch_size: usize,
  pub build_retention: Duration,
  pub query_work_item_ttl: Duration,
  pub my_work_items_ttl: Duration,
  pub definition_update_threshold: Duration,
  pub cache_db_path: String,
  pub persistent_db_path: String,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      periodic_interval: Duration::from_secs(10 * 60),
      refresh_cooldown: Duration::from_secs(3 * 60),
      work_item_batch_size: 200,
      build_retention: Duration::from_secs(7 * 24 * 60 * 60),
      query_work_item_ttl: Duration::from_secs(7 * 24 * 60 * 60),
      my_work_items_ttl: Duration::from_secs(2 * 60),
      definition_update_threshold: Duration::from_secs(4 * 60 * 60),
      cache_db_path: "AzureData.db".to_string(),
      persistent_db_path: "PersistentAzureData.db".to_string(),
    }
  }
}

impl Settings {
  /// Load settings from the environment, falling back to defaults for any
  /// knob that is unset or fails to parse.
  pub fn from_env() -> Self {
    dotenvy::dotenv().ok();
    let defaults = Settings::default();

    Self {
      periodic_interval: env_secs("ADO_PERIODIC_INTERVAL_SECS", defaults.periodic_interval),
      refresh_cooldown: env_secs("ADO_REFRESH_COOLDOWN_SECS", defaults.refresh_cooldown),
      work_item_batch_size: env_usize(
        "ADO_WORK_ITEM_BATCH_SIZE",
        defaults.work_item_batch_size,
      ),
      build_retention: env_secs("ADO_BUILD_RETENTION_SECS", defaults.build_retention),
      query_work_item_ttl: env_secs("ADO_QUERY_WORK_ITEM_TTL_SECS", defaults.query_work_item_ttl),
      my_work_items_ttl: env_secs("ADO_MY_WORK_ITEMS_TTL_SECS", defaults.my_work_items_ttl),
      definition_update_threshold: env_secs(
        "ADO_DEFINITION_UPDATE_THRESHOLD_SECS",
        defaults.definition_update_threshold,
      ),
      cache_db_path: env::var("ADO_CACHE_DB_PATH").unwrap_or(defaults.cache_db_path),
      persistent_db_path: env::var("ADO_PERSISTENT_DB_PATH")
        .unwrap_or(defaults.persistent_db_path),
    }
  }
}

fn env_secs(key: &str, default: Duration) -> Duration {
  env::var(key).ok().and_then(|v| v.parse::<u64>().ok()).map(Duration::from_secs).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
  env::var(key).ok().and_then(|v| v.parse::<usize>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_design_knobs() {
    let s = Settings::default();
    assert_eq!(s.periodic_interval, Duration::from_secs(600));
    assert_eq!(s.refresh_cooldown, Duration::from_secs(180));
    assert_eq!(s.work_item_batch_size, 200);
    assert_eq!(s.build_retention, Duration::from_secs(7 * 86400));
    assert_eq!(s.query_work_item_ttl, Duration::from_secs(7 * 86400));
    assert_eq!(s.my_work_items_ttl, Duration::from_secs(120));
    assert_eq!(s.definition_update_threshold, Duration::from_secs(4 * 3600));
  }

  #[test]
  fn env_override_takes_precedence() {
    unsafe {
      env::set_var("ADO_WORK_ITEM_BATCH_SIZE", "50");
    }
    let s = Settings::from_env();
    assert_eq!(s.work_item_batch_size, 50);
    unsafe {
      env::remove_var("ADO_WORK_ITEM_BATCH_SIZE");
    }
  }

  #[test]
  fn invalid_env_value_falls_back_to_default() {
    unsafe {
      env::set_var("ADO_REFRESH_COOLDOWN_SECS", "not-a-number");
    }
    let s = Settings::from_env();
    assert_eq!(s.refresh_cooldown, Duration::from_secs(180));
    unsafe {
      env::remove_var("ADO_REFRESH_COOLDOWN_SECS");
    }
  }
}
