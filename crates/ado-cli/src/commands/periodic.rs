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
use std::time::Duration;

use ado_cache::{CacheEventKind, CacheManager};
use anyhow::Result;

/// Starts the periodic timer (§4.5, default 10 minutes) and runs until
/// interrupted, printing each terminal event as it arrives — the
/// manual-operation counterpart to leaving the extension open.
pub async fn handle_periodic(manager: Arc<CacheManager>, interval: Duration) -> Result<()> {
  let mut subscription = manager.subscribe();
  manager.start();
  println!("periodic updates started (every {interval:?}); press Ctrl-C to stop");

  loop {
    tokio::select! {
      event = subscription.recv() => {
        match event {
          Some(event) if event.kind == CacheEventKind::Cleared => println!("cache cleared"),
          Some(event) => println!(
            "{:?} {:?}{}",
            event.update_kind,
            event.kind,
            event.error.map(|e| format!(": {e}")).unwrap_or_default()
          ),
          None => break,
        }
      }
      _ = tokio::signal::ctrl_c() => {
        manager.stop();
        println!("periodic updates stopped");
        break;
      }
    }
  }
  Ok(())
}
