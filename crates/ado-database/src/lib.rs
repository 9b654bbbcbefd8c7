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

//! # ado-database
//!
//! SQLite-backed storage for the two logical stores the cache-and-sync core
//! depends on: the persistent store (user-authored search definitions) and
//! the cache store (materialized remote state). Both are opened through
//! [`DataStore`], pooled with `r2d2`, and bridged into async callers via
//! `tokio::task::spawn_blocking`.

pub mod datastore;
pub mod error;
pub mod models;
pub mod repositories;
pub mod schema;

pub use datastore::{DataStore, CACHE_MIGRATIONS, CACHE_SCHEMA_VERSION, PERSISTENT_MIGRATIONS, PERSISTENT_SCHEMA_VERSION};
pub use error::{StoreError, StoreResult};
pub use repositories::{
  CacheStore, DefinitionSearchDefRepository, ProjectSettingsRepository, PullRequestSearchDefRepository,
  QueryDefRepository,
};
