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

use thiserror::Error;

/// The error taxonomy shared by every layer of the cache-and-sync core.
///
/// This is deliberately a *kind*, not a type hierarchy: every layer below
/// (`ado-client`, `ado-database`, `ado-updaters`) maps its own errors into one
/// of these variants so that `CacheManager` only ever has to reason about the
/// taxonomy from the error-handling design, not about each crate's internals.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("local data store is inaccessible: {0}")]
  DataStoreInaccessible(String),

  #[error("remote request failed (status {status:?}): {detail}")]
  RemoteError { status: Option<u16>, detail: String },

  #[error("operation cancelled")]
  Cancelled,

  #[error("unsupported: {0}")]
  Unsupported(String),

  #[error("internal invariant violated: {0}")]
  InternalInvariant(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl CoreError {
  pub fn remote(status: Option<u16>, detail: impl Into<String>) -> Self {
    CoreError::RemoteError { status, detail: detail.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_validation() {
    let err = CoreError::Validation("malformed url".into());
    assert_eq!(err.to_string(), "validation failed: malformed url");
  }

  #[test]
  fn display_remote_error_with_status() {
    let err = CoreError::remote(Some(503), "service unavailable");
    assert!(err.to_string().contains("503"));
  }

  #[test]
  fn display_remote_error_without_status() {
    let err = CoreError::remote(None, "connection reset");
    assert!(err.to_string().contains("connection reset"));
  }

  #[test]
  fn cancelled_has_stable_message() {
    assert_eq!(CoreError::Cancelled.to_string(), "operation cancelled");
  }
}
