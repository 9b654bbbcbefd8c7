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

//! Rows of the persistent store: user intent, retained across sign-out and
//! reinstall. Never auto-deleted; mutated only through `SearchDefinitionRepository`.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{definition_search_def, project_settings, pull_request_search_def, query_def};

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = query_def)]
pub struct QueryDef {
  pub id: i64,
  pub name: String,
  pub url: String,
  pub is_top_level: bool,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = query_def)]
pub struct NewQueryDef<'a> {
  pub name: &'a str,
  pub url: &'a str,
  pub is_top_level: bool,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = pull_request_search_def)]
pub struct PullRequestSearchDef {
  pub id: i64,
  pub url: String,
  pub name: String,
  /// One of "mine" / "assigned" / "all" — stored as text so the schema
  /// doesn't need to change if the view set grows.
  pub view: String,
  pub is_top_level: bool,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = pull_request_search_def)]
pub struct NewPullRequestSearchDef<'a> {
  pub url: &'a str,
  pub name: &'a str,
  pub view: &'a str,
  pub is_top_level: bool,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = definition_search_def)]
pub struct DefinitionSearchDef {
  pub id: i64,
  pub name: String,
  pub external_id: i64,
  pub url: String,
  pub is_top_level: bool,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = definition_search_def)]
pub struct NewDefinitionSearchDef<'a> {
  pub name: &'a str,
  pub external_id: i64,
  pub url: &'a str,
  pub is_top_level: bool,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = project_settings)]
pub struct ProjectSettings {
  pub id: i64,
  pub organization_url: String,
  pub project_name: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = project_settings)]
pub struct NewProjectSettings<'a> {
  pub organization_url: &'a str,
  pub project_name: &'a str,
}
