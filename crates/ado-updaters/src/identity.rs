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

//! Shared identity mapping used by every updater that resolves a `creator`,
//! `changed_by`, `assigned_to`, or `requested_by` field. Pure: the actual
//! upsert happens inside whichever `CacheStore::sync_*` transaction the
//! caller is assembling, not here.

use ado_client::types::RemoteIdentity;
use ado_database::repositories::cache_store::NewIdentityInput;

pub fn identity_input(remote: &RemoteIdentity, time_updated: i64) -> NewIdentityInput {
  NewIdentityInput {
    name: remote.display_name.clone(),
    external_id: remote.external_id.clone(),
    login_id: remote.unique_name.clone(),
    time_updated,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_remote_fields_onto_the_input_row() {
    let remote = RemoteIdentity { external_id: "guid-1".into(), display_name: "Alice".into(), unique_name: Some("alice@contoso.com".into()) };
    let input = identity_input(&remote, 100);
    assert_eq!(input.external_id, "guid-1");
    assert_eq!(input.name, "Alice");
    assert_eq!(input.login_id.as_deref(), Some("alice@contoso.com"));
    assert_eq!(input.time_updated, 100);
  }
}
