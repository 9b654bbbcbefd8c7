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

//! Collaborator contracts the cache-and-sync core is written against but
//! does not itself implement: identity, connection pooling, and URL
//! validation are owned by the hosting extension.

use async_trait::async_trait;

use crate::error::CoreResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
  pub display_name: String,
  pub username: String,
}

#[derive(Debug, Clone)]
pub struct Connection {
  pub organization_url: String,
  pub bearer_token: String,
}

#[async_trait]
pub trait AccountProvider: Send + Sync {
  async fn is_signed_in(&self) -> bool;
  async fn default_account(&self) -> Option<Account>;
  async fn sign_in(&self) -> CoreResult<Account>;
  async fn sign_out(&self) -> CoreResult<()>;
}

/// Pooled by `(organizationUri, account)`; implementations are expected to
/// reuse live connections across Updaters rather than reconnect per call.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
  async fn get_connection(&self, organization_url: &str, account: &Account) -> CoreResult<Connection>;
}

#[derive(Debug, Clone)]
pub struct InfoResult {
  pub organization_name: String,
  pub project_names: Vec<String>,
}

#[async_trait]
pub trait Validator: Send + Sync {
  async fn validate(&self, url: &str, account: &Account) -> CoreResult<InfoResult>;
}
