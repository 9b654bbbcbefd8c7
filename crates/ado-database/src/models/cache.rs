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

//! Rows of the cache store: materialized remote state. Created by an
//! Updater, mutated only by Updaters, deleted by periodic prune or
//! `ClearCache`.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{
  build, definition, identity, metadata, organization, project, pull_request,
  pull_request_search, pull_request_search_pull_request, query, query_work_item, repository,
  work_item, work_item_type,
};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = organization)]
pub struct Organization {
  pub id: i64,
  pub name: String,
  pub connection: String,
  pub time_updated: i64,
  pub time_last_sync: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = organization)]
pub struct NewOrganization<'a> {
  pub name: &'a str,
  pub connection: &'a str,
  pub time_updated: i64,
  pub time_last_sync: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = project)]
pub struct Project {
  pub id: i64,
  pub name: String,
  pub external_id: String,
  pub description: Option<String>,
  pub organization_id: i64,
  pub time_updated: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = project)]
pub struct NewProject<'a> {
  pub name: &'a str,
  pub external_id: &'a str,
  pub description: Option<&'a str>,
  pub organization_id: i64,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = identity)]
pub struct Identity {
  pub id: i64,
  pub name: String,
  pub external_id: String,
  pub avatar_blob: Option<Vec<u8>>,
  pub login_id: Option<String>,
  pub time_updated: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = identity)]
pub struct NewIdentity<'a> {
  pub name: &'a str,
  pub external_id: &'a str,
  pub avatar_blob: Option<&'a [u8]>,
  pub login_id: Option<&'a str>,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = repository)]
pub struct Repository {
  pub id: i64,
  pub name: String,
  pub external_id: String,
  pub project_id: i64,
  pub clone_url: String,
  pub is_private: bool,
  pub time_updated: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = repository)]
pub struct NewRepository<'a> {
  pub name: &'a str,
  pub external_id: &'a str,
  pub project_id: i64,
  pub clone_url: &'a str,
  pub is_private: bool,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = query)]
pub struct Query {
  pub id: i64,
  pub external_id: String,
  pub display_name: String,
  pub username: String,
  pub project_id: i64,
  pub time_updated: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = query)]
pub struct NewQuery<'a> {
  pub external_id: &'a str,
  pub display_name: &'a str,
  pub username: &'a str,
  pub project_id: i64,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = work_item_type)]
pub struct WorkItemType {
  pub id: i64,
  pub name: String,
  pub icon: String,
  pub color: String,
  pub description: String,
  pub project_id: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = work_item_type)]
pub struct NewWorkItemType<'a> {
  pub name: &'a str,
  pub icon: &'a str,
  pub color: &'a str,
  pub description: &'a str,
  pub project_id: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = work_item)]
pub struct WorkItem {
  pub id: i64,
  pub external_id: i64,
  pub title: String,
  pub html_url: String,
  pub state: String,
  pub reason: String,
  pub assigned_to_id: Option<i64>,
  pub created_date: i64,
  pub created_by_id: i64,
  pub changed_date: i64,
  pub changed_by_id: i64,
  pub work_item_type_id: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = work_item)]
pub struct NewWorkItem<'a> {
  pub external_id: i64,
  pub title: &'a str,
  pub html_url: &'a str,
  pub state: &'a str,
  pub reason: &'a str,
  pub assigned_to_id: Option<i64>,
  pub created_date: i64,
  pub created_by_id: i64,
  pub changed_date: i64,
  pub changed_by_id: i64,
  pub work_item_type_id: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = query_work_item)]
pub struct QueryWorkItem {
  pub id: i64,
  pub query_id: i64,
  pub work_item_id: i64,
  pub time_updated: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = query_work_item)]
pub struct NewQueryWorkItem {
  pub query_id: i64,
  pub work_item_id: i64,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = pull_request_search)]
pub struct PullRequestSearch {
  pub id: i64,
  pub repository_id: i64,
  pub username: String,
  pub project_id: i64,
  pub view_id: String,
  pub time_updated: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = pull_request_search)]
pub struct NewPullRequestSearch<'a> {
  pub repository_id: i64,
  pub username: &'a str,
  pub project_id: i64,
  pub view_id: &'a str,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = pull_request)]
pub struct PullRequest {
  pub id: i64,
  pub external_id: i64,
  pub title: String,
  pub url: String,
  pub repository_id: i64,
  pub creator_id: i64,
  pub status: String,
  pub policy_status: String,
  pub policy_status_reason: String,
  pub target_branch: String,
  pub creation_date: i64,
  pub html_url: String,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = pull_request)]
pub struct NewPullRequest<'a> {
  pub external_id: i64,
  pub title: &'a str,
  pub url: &'a str,
  pub repository_id: i64,
  pub creator_id: i64,
  pub status: &'a str,
  pub policy_status: &'a str,
  pub policy_status_reason: &'a str,
  pub target_branch: &'a str,
  pub creation_date: i64,
  pub html_url: &'a str,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = pull_request_search_pull_request)]
pub struct PullRequestSearchPullRequest {
  pub id: i64,
  pub search_id: i64,
  pub pull_request_id: i64,
  pub time_updated: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = pull_request_search_pull_request)]
pub struct NewPullRequestSearchPullRequest {
  pub search_id: i64,
  pub pull_request_id: i64,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = definition)]
pub struct Definition {
  pub id: i64,
  pub external_id: i64,
  pub name: String,
  pub project_id: i64,
  pub creation_date: i64,
  pub html_url: String,
  pub time_updated: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = definition)]
pub struct NewDefinition<'a> {
  pub external_id: i64,
  pub name: &'a str,
  pub project_id: i64,
  pub creation_date: i64,
  pub html_url: &'a str,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = build)]
pub struct Build {
  pub id: i64,
  pub external_id: i64,
  pub build_number: String,
  pub status: String,
  pub result: String,
  pub queue_time: i64,
  pub start_time: Option<i64>,
  pub finish_time: Option<i64>,
  pub url: String,
  pub definition_id: i64,
  pub source_branch: String,
  pub trigger_message: Option<String>,
  pub requester_id: i64,
  pub time_updated: i64,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = build)]
pub struct NewBuild<'a> {
  pub external_id: i64,
  pub build_number: &'a str,
  pub status: &'a str,
  pub result: &'a str,
  pub queue_time: i64,
  pub start_time: Option<i64>,
  pub finish_time: Option<i64>,
  pub url: &'a str,
  pub definition_id: i64,
  pub source_branch: &'a str,
  pub trigger_message: Option<&'a str>,
  pub requester_id: i64,
  pub time_updated: i64,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = metadata)]
#[diesel(primary_key(key))]
pub struct Metadata {
  pub key: String,
  pub value: String,
}
