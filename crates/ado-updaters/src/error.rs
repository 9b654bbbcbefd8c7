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

use ado_client::ClientError;
use ado_core::CoreError;
use ado_database::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdaterError {
  #[error("remote call failed (status {status:?}): {detail}")]
  Remote { status: Option<u16>, detail: String },

  #[error("store error: {0}")]
  Store(#[from] StoreError),

  #[error("unsupported search: {0}")]
  Unsupported(String),

  #[error("update cancelled")]
  Cancelled,

  #[error("invariant violated: {0}")]
  Invariant(String),
}

pub type UpdaterResult<T> = Result<T, UpdaterError>;

impl From<ClientError> for UpdaterError {
  fn from(err: ClientError) -> Self {
    match err {
      ClientError::Request { status, detail } => UpdaterError::Remote { status, detail },
      ClientError::Decode(detail) => UpdaterError::Remote { status: None, detail },
      ClientError::Cancelled => UpdaterError::Cancelled,
    }
  }
}

impl From<UpdaterError> for CoreError {
  fn from(err: UpdaterError) -> Self {
    match err {
      UpdaterError::Remote { status, detail } => CoreError::remote(status, detail),
      UpdaterError::Store(store_err) => store_err.into(),
      UpdaterError::Unsupported(detail) => CoreError::Unsupported(detail),
      UpdaterError::Cancelled => CoreError::Cancelled,
      UpdaterError::Invariant(detail) => CoreError::InternalInvariant(detail),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_cancelled_client_error_into_cancelled_updater_error() {
    let err: UpdaterError = ClientError::Cancelled.into();
    assert!(matches!(err, UpdaterError::Cancelled));
  }

  #[test]
  fn maps_unsupported_into_core_unsupported() {
    let core: CoreError = UpdaterError::Unsupported("temporary query".into()).into();
    assert!(matches!(core, CoreError::Unsupported(_)));
  }
}
