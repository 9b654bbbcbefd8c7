//! Diesel table definitions for both logical stores. No DB-level foreign
//! keys: referential integrity is enforced at the repository/updater layer
//! so the two stores can evolve schemas independently (per the data model's
//! "no cross-store foreign keys" rule).

diesel::table! {
  schema_version (id) {
    id -> Integer,
    version -> Integer,
  }
}

// --- Persistent store: user intent, retained across sign-out/reinstall ---

diesel::table! {
  query_def (id) {
    id -> BigInt,
    name -> Text,
    url -> Text,
    is_top_level -> Bool,
  }
}

diesel::table! {
  pull_request_search_def (id) {
    id -> BigInt,
    url -> Text,
    name -> Text,
    view -> Text,
    is_top_level -> Bool,
  }
}

diesel::table! {
  definition_search_def (id) {
    id -> BigInt,
    name -> Text,
    external_id -> BigInt,
    url -> Text,
    is_top_level -> Bool,
  }
}

diesel::table! {
  project_settings (id) {
    id -> BigInt,
    organization_url -> Text,
    project_name -> Text,
  }
}

// --- Cache store: materialized remote state, rebuilt on schema mismatch ---

diesel::table! {
  organization (id) {
    id -> BigInt,
    name -> Text,
    connection -> Text,
    time_updated -> BigInt,
    time_last_sync -> BigInt,
  }
}

diesel::table! {
  project (id) {
    id -> BigInt,
    name -> Text,
    external_id -> Text,
    description -> Nullable<Text>,
    organization_id -> BigInt,
    time_updated -> BigInt,
  }
}

diesel::table! {
  identity (id) {
    id -> BigInt,
    name -> Text,
    external_id -> Text,
    avatar_blob -> Nullable<Binary>,
    login_id -> Nullable<Text>,
    time_updated -> BigInt,
  }
}

diesel::table! {
  repository (id) {
    id -> BigInt,
    name -> Text,
    external_id -> Text,
    project_id -> BigInt,
    clone_url -> Text,
    is_private -> Bool,
    time_updated -> BigInt,
  }
}

diesel::table! {
  query (id) {
    id -> BigInt,
    external_id -> Text,
    display_name -> Text,
    username -> Text,
    project_id -> BigInt,
    time_updated -> BigInt,
  }
}

diesel::table! {
  work_item_type (id) {
    id -> BigInt,
    name -> Text,
    icon -> Text,
    color -> Text,
    description -> Text,
    project_id -> BigInt,
  }
}

diesel::table! {
  work_item (id) {
    id -> BigInt,
    external_id -> BigInt,
    title -> Text,
    html_url -> Text,
    state -> Text,
    reason -> Text,
    assigned_to_id -> Nullable<BigInt>,
    created_date -> BigInt,
    created_by_id -> BigInt,
    changed_date -> BigInt,
    changed_by_id -> BigInt,
    work_item_type_id -> BigInt,
  }
}

diesel::table! {
  query_work_item (id) {
    id -> BigInt,
    query_id -> BigInt,
    work_item_id -> BigInt,
    time_updated -> BigInt,
  }
}

diesel::table! {
  pull_request_search (id) {
    id -> BigInt,
    repository_id -> BigInt,
    username -> Text,
    project_id -> BigInt,
    view_id -> Text,
    time_updated -> BigInt,
  }
}

diesel::table! {
  pull_request (id) {
    id -> BigInt,
    external_id -> BigInt,
    title -> Text,
    url -> Text,
    repository_id -> BigInt,
    creator_id -> BigInt,
    status -> Text,
    policy_status -> Text,
    policy_status_reason -> Text,
    target_branch -> Text,
    creation_date -> BigInt,
    html_url -> Text,
  }
}

diesel::table! {
  pull_request_search_pull_request (id) {
    id -> BigInt,
    search_id -> BigInt,
    pull_request_id -> BigInt,
    time_updated -> BigInt,
  }
}

diesel::table! {
  definition (id) {
    id -> BigInt,
    external_id -> BigInt,
    name -> Text,
    project_id -> BigInt,
    creation_date -> BigInt,
    html_url -> Text,
    time_updated -> BigInt,
  }
}

diesel::table! {
  build (id) {
    id -> BigInt,
    external_id -> BigInt,
    build_number -> Text,
    status -> Text,
    result -> Text,
    queue_time -> BigInt,
    start_time -> Nullable<BigInt>,
    finish_time -> Nullable<BigInt>,
    url -> Text,
    definition_id -> BigInt,
    source_branch -> Text,
    trigger_message -> Nullable<Text>,
    requester_id -> BigInt,
    time_updated -> BigInt,
  }
}

diesel::table! {
  metadata (key) {
    key -> Text,
    value -> Text,
  }
}

diesel::allow_tables_to_appear_in_same_query!(
  organization,
  project,
  identity,
  repository,
  query,
  work_item_type,
  work_item,
  query_work_item,
  pull_request_search,
  pull_request,
  pull_request_search_pull_request,
  definition,
  build,
  metadata,
);

diesel::allow_tables_to_appear_in_same_query!(
  query_def,
  pull_request_search_def,
  definition_search_def,
  project_settings,
);
