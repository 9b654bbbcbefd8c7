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

//! HTTP plumbing shared by every remote call: bearer-token auth, retry with
//! exponential backoff, and cooperative cancellation via a `CancellationToken`.
//! `LiveClient` builds on top of this rather than touching `reqwest` directly.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

const MAX_RETRIES: u32 = 4;
const RETRYABLE_STATUSES: [StatusCode; 3] =
  [StatusCode::TOO_MANY_REQUESTS, StatusCode::BAD_GATEWAY, StatusCode::SERVICE_UNAVAILABLE];

pub struct Transport {
  http: Client,
  organization_url: Url,
  connection_token: String,
}

impl Transport {
  pub fn new(organization_url: Url, connection_token: impl Into<String>) -> ClientResult<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(ClientError::from)?;
    Ok(Self { http, organization_url, connection_token: connection_token.into() })
  }

  #[cfg(test)]
  pub fn new_mock(base_url: Url) -> Self {
    Self { http: Client::new(), organization_url: base_url, connection_token: "mock-token".into() }
  }

  pub fn organization_url(&self) -> &Url {
    &self.organization_url
  }

  #[instrument(skip(self), fields(function = %path))]
  pub async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
    cancel: &CancellationToken,
  ) -> ClientResult<T> {
    let url = self.organization_url.join(path).map_err(|e| ClientError::Decode(e.to_string()))?;
    self.execute_with_retry(Method::GET, url, query, None::<&()>, cancel).await
  }

  #[instrument(skip(self, body), fields(function = %path))]
  pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
    cancel: &CancellationToken,
  ) -> ClientResult<T> {
    let url = self.organization_url.join(path).map_err(|e| ClientError::Decode(e.to_string()))?;
    self.execute_with_retry(Method::POST, url, &[], Some(body), cancel).await
  }

  #[instrument(skip(self), fields(function = %path))]
  pub async fn get_bytes(&self, path: &str, cancel: &CancellationToken) -> ClientResult<Vec<u8>> {
    let url = self.organization_url.join(path).map_err(|e| ClientError::Decode(e.to_string()))?;
    let mut attempt = 0;
    loop {
      if cancel.is_cancelled() {
        return Err(ClientError::Cancelled);
      }
      let request = self.http.get(url.clone()).bearer_auth(&self.connection_token);
      let outcome = tokio::select! {
        result = request.send() => result,
        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
      };
      match outcome {
        Ok(response) if response.status().is_success() => {
          return response.bytes().await.map(|b| b.to_vec()).map_err(ClientError::from)
        }
        Ok(response) if RETRYABLE_STATUSES.contains(&response.status()) && attempt < MAX_RETRIES => {
          attempt += 1;
          self.backoff(attempt, cancel).await?;
        }
        Ok(response) => {
          let status = Some(response.status().as_u16());
          let detail = response.text().await.unwrap_or_default();
          return Err(ClientError::Request { status, detail });
        }
        Err(err) if attempt < MAX_RETRIES && (err.is_timeout() || err.is_connect()) => {
          attempt += 1;
          self.backoff(attempt, cancel).await?;
        }
        Err(err) => return Err(ClientError::from(err)),
      }
    }
  }

  async fn execute_with_retry<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    method: Method,
    url: Url,
    query: &[(&str, String)],
    body: Option<&B>,
    cancel: &CancellationToken,
  ) -> ClientResult<T> {
    let mut attempt = 0;
    loop {
      if cancel.is_cancelled() {
        return Err(ClientError::Cancelled);
      }

      let mut request = self.http.request(method.clone(), url.clone()).bearer_auth(&self.connection_token);
      if !query.is_empty() {
        request = request.query(query);
      }
      if let Some(body) = body {
        request = request.json(body);
      }

      let outcome = tokio::select! {
        result = request.send() => result,
        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
      };

      match outcome {
        Ok(response) => {
          let status = response.status();
          if status.is_success() {
            return response.json::<T>().await.map_err(ClientError::from);
          }
          if RETRYABLE_STATUSES.contains(&status) && attempt < MAX_RETRIES {
            warn!(status = status.as_u16(), attempt, "retryable response, backing off");
            attempt += 1;
            self.backoff(attempt, cancel).await?;
            continue;
          }
          let detail = response.text().await.unwrap_or_default();
          return Err(ClientError::Request { status: Some(status.as_u16()), detail });
        }
        Err(err) if attempt < MAX_RETRIES && (err.is_timeout() || err.is_connect()) => {
          warn!(attempt, error = %err, "transport error, retrying");
          attempt += 1;
          self.backoff(attempt, cancel).await?;
        }
        Err(err) => return Err(ClientError::from(err)),
      }
    }
  }

  async fn backoff(&self, attempt: u32, cancel: &CancellationToken) -> ClientResult<()> {
    let delay = Duration::from_millis(1000 * 2u64.pow(attempt.saturating_sub(1)));
    tokio::select! {
      _ = tokio::time::sleep(delay) => Ok(()),
      _ = cancel.cancelled() => Err(ClientError::Cancelled),
    }
  }
}

impl std::fmt::Debug for Transport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Transport")
      .field("organization_url", &self.organization_url)
      .field("connection_token", &"<redacted>")
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_redacts_connection_token() {
    let transport = Transport::new_mock(Url::parse("https://dev.azure.com/example/").unwrap());
    let rendered = format!("{:?}", transport);
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("mock-token"));
  }
}
