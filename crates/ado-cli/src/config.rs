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

use anyhow::{Context, Result};
use ado_core::Settings;
use std::env;

/// Operator-supplied connection details. Credential acquisition itself is a
/// non-goal of the core (§1) — this just reads the bearer token an operator
/// already obtained (a Personal Access Token) out of the environment.
#[derive(Debug, Clone)]
pub struct CliConfig {
  pub settings: Settings,
  pub organization_url: String,
  pub personal_access_token: String,
  pub username: String,
  pub display_name: String,
}

impl CliConfig {
  pub fn from_env() -> Result<Self> {
    let organization_url =
      env::var("ADO_ORGANIZATION_URL").context("ADO_ORGANIZATION_URL environment variable not set")?;
    let personal_access_token =
      env::var("ADO_PAT").context("ADO_PAT environment variable not set")?;
    let username = env::var("ADO_USERNAME").unwrap_or_else(|_| "unknown".to_string());
    let display_name = env::var("ADO_DISPLAY_NAME").unwrap_or_else(|_| username.clone());

    Ok(Self { settings: Settings::from_env(), organization_url, personal_access_token, username, display_name })
  }
}
