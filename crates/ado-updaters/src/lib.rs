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

//! # ado-updaters
//!
//! One `Updater` implementation per search kind (Query, PullRequests,
//! Pipeline, MyWorkItems), the shared `UpdaterContext` they're built from,
//! and the dispatcher (`data_update_service`) that multiplexes them by
//! `UpdateKind`.

pub mod batch;
pub mod context;
pub mod data_update_service;
pub mod error;
pub mod identity;
pub mod my_work_items_updater;
pub mod pipeline_updater;
pub mod pull_request_updater;
pub mod query_updater;
#[cfg(test)]
mod testutil;
pub mod updater;
pub mod views;

pub use context::UpdaterContext;
pub use data_update_service::DataUpdateService;
pub use error::{UpdaterError, UpdaterResult};
pub use my_work_items_updater::MyWorkItemsUpdater;
pub use pipeline_updater::PipelineUpdater;
pub use pull_request_updater::PullRequestUpdater;
pub use query_updater::QueryUpdater;
pub use updater::{CachedSearchHandle, Updater};
pub use data_update_service::{UpdateEvent, UpdateEventKind};
pub use views::CachedChildren;
