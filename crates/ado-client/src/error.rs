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

use ado_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ClientError {
  #[error("request failed (status {status:?}): {detail}")]
  Request { status: Option<u16>, detail: String },

  #[error("response could not be decoded: {0}")]
  Decode(String),

  #[error("operation cancelled")]
  Cancelled,
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl From<reqwest::Error> for ClientError {
  fn from(err: reqwest::Error) -> Self {
    ClientError::Request { status: err.status().map(|s| s.as_u16()), detail: err.to_string() }
  }
}

impl From<serde_json::Error> for ClientError {
  fn from(err: serde_json::Error) -> Self {
    ClientError::Decode(err.to_string())
  }
}

impl From<ClientError> for CoreError {
  fn from(err: ClientError) -> Self {
    match err {
      ClientError::Request { status, detail } => CoreError::remote(status, detail),
      ClientError::Decode(detail) => CoreError::remote(None, detail),
      ClientError::Cancelled => CoreError::Cancelled,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_request_error_into_core_remote_error() {
    let err = ClientError::Request { status: Some(502), detail: "bad gateway".into() };
    let core: CoreError = err.into();
    assert!(matches!(core, CoreError::RemoteError { status: Some(502), .. }));
  }

  #[test]
  fn maps_cancelled_into_core_cancelled() {
    let core: CoreError = ClientError::Cancelled.into();
    assert!(matches!(core, CoreError::Cancelled));
  }
}
