//! Minimal `AccountProvider`/`ConnectionProvider` implementations for manual
//! CLI operation. The real sign-in broker lives in the hosting extension
//! (§1 non-goals); here a single statically-configured account and
//! connection stand in for it.

use ado_core::{Account, AccountProvider, Connection, ConnectionProvider, CoreResult};
use async_trait::async_trait;

pub struct StaticAccountProvider {
  account: Account,
}

impl StaticAccountProvider {
  pub fn new(display_name: String, username: String) -> Self {
    Self { account: Account { display_name, username } }
  }
}

#[async_trait]
impl AccountProvider for StaticAccountProvider {
  async fn is_signed_in(&self) -> bool {
    true
  }

  async fn default_account(&self) -> Option<Account> {
    Some(self.account.clone())
  }

  async fn sign_in(&self) -> CoreResult<Account> {
    Ok(self.account.clone())
  }

  async fn sign_out(&self) -> CoreResult<()> {
    Ok(())
  }
}

pub struct StaticConnectionProvider {
  bearer_token: String,
}

impl StaticConnectionProvider {
  pub fn new(bearer_token: String) -> Self {
    Self { bearer_token }
  }
}

#[async_trait]
impl ConnectionProvider for StaticConnectionProvider {
  async fn get_connection(&self, organization_url: &str, _account: &Account) -> CoreResult<Connection> {
    Ok(Connection { organization_url: organization_url.to_string(), bearer_token: self.bearer_token.clone() })
  }
}
