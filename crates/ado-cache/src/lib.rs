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

//! # ado-cache
//!
//! The state-machine cache coordinator (`CacheManager`, component F), the
//! read-side facade built on top of it (`LiveDataProvider`, component G),
//! and the event plumbing that ties sign-out to cache clearing and cache
//! updates to UI invalidation (component H).

pub mod auth;
pub mod bus;
pub mod error;
pub mod live_data_provider;
pub mod manager;
pub mod state;

pub use auth::{spawn_clear_cache_on_sign_out, AuthBus, AuthEvent};
pub use error::{ManagerError, ManagerResult};
pub use live_data_provider::LiveDataProvider;
pub use manager::{CacheEvent, CacheEventKind, CacheManager};
