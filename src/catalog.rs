//! Glossary discovery and read layer over the legacy Data Catalog, plus the
//! relationship fan-out.
//!
//! Two error policies coexist here by design. Collection reads (discovery,
//! per-entry relationship fetches, term search) degrade to an empty result
//! and log the failure; the bulk entry listing, the glossary metadata fetch,
//! and project-number extraction return
//! [`MigrationError::Unrecoverable`](crate::error::MigrationError) instead,
//! because continuing without them would silently corrupt the migration.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::api::ApiClient;
use crate::constants::GLOSSARY_SEARCH_SUBTYPE;
use crate::context::{MigrationContext, MigrationSettings};
use crate::convert::{
    convert_entry_relationships, convert_glossary_taxonomy_entries,
    convert_glossary_taxonomy_relationships, convert_search_results,
};
use crate::error::MigrationError;
use crate::models::{
    DcEntryRelationship, GlossaryTaxonomyEntry, GlossaryTaxonomyRelationship, SearchEntryResult,
};
use crate::urls::{
    RelationshipView, dc_entries_url, dc_glossary_entry_url, dc_relationships_url, project_url,
    with_page_token,
};
use crate::utils::normalize_linked_resource;

/// Accumulated pages from a token-driven listing endpoint.
struct PagedItems {
    items: Vec<Value>,
    /// Error text from the page that stopped the loop, if any. Items
    /// gathered before the failing page are retained.
    error: Option<String>,
}

/// Follows `nextPageToken` until a token-less page, accumulating `items_key`
/// arrays.
async fn fetch_all_pages(api: &ApiClient, base_url: &str, items_key: &str) -> PagedItems {
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let url = with_page_token(base_url, page_token.as_deref());
        let response = api.fetch_api_response(Method::GET, &url, None).await;
        if let Some(error_msg) = response.error_msg {
            return PagedItems {
                items,
                error: Some(error_msg),
            };
        }
        let page = response.json.unwrap_or(Value::Null);
        if let Some(page_items) = page.get(items_key).and_then(Value::as_array) {
            items.extend(page_items.iter().cloned());
        }
        page_token = page
            .get("nextPageToken")
            .and_then(Value::as_str)
            .map(str::to_string);
        if page_token.is_none() {
            return PagedItems { items, error: None };
        }
    }
}

/// Finds all legacy glossaries in a project via the Catalog search API.
///
/// Returns the glossaries' linked resources rewritten to `https://` URLs.
/// Any failure degrades to an empty list: the caller decides whether a
/// project without discoverable glossaries is a problem.
pub async fn discover_glossaries(api: &ApiClient, project_id: &str) -> Vec<String> {
    let request_body = json!({
        "query": "type=glossary",
        "scope": {"includeProjectIds": [project_id]},
        "pageSize": 1000,
    });

    let response = api
        .fetch_api_response(Method::POST, &api.endpoints().search_url, Some(request_body))
        .await;

    if let Some(error_msg) = response.error_msg {
        error!("Failed to search for glossaries: {error_msg}");
        return Vec::new();
    }

    let Some(results) = response
        .json
        .as_ref()
        .and_then(|j| j.get("results"))
        .and_then(Value::as_array)
        .cloned()
    else {
        debug!("Glossary search response for project '{project_id}' carried no results field.");
        return Vec::new();
    };
    if results.is_empty() {
        warn!("No datacatalog glossaries found in project '{project_id}'.");
        return Vec::new();
    }

    extract_glossary_urls(&results)
}

/// Keeps only glossary-subtype results and rewrites their linked resources
/// from `//{id}` to `https://{id}`.
fn extract_glossary_urls(results: &[Value]) -> Vec<String> {
    results
        .iter()
        .filter(|result| {
            result.get("searchResultSubtype").and_then(Value::as_str)
                == Some(GLOSSARY_SEARCH_SUBTYPE)
        })
        .filter_map(|result| result.get("linkedResource").and_then(Value::as_str))
        .map(|linked| format!("https://{}", normalize_linked_resource(linked)))
        .collect()
}

/// Fetches every entry of the legacy entry group, following pagination.
///
/// Fatal policy: a failing page returns
/// [`MigrationError::Unrecoverable`] — a partial entry set would silently
/// corrupt the migration downstream.
pub async fn fetch_dc_glossary_taxonomy_entries(
    api: &ApiClient,
    context: &MigrationContext,
    settings: &MigrationSettings,
) -> Result<Vec<GlossaryTaxonomyEntry>, MigrationError> {
    let base_url = dc_entries_url(api.endpoints(), context, settings.page_size);
    let pages = fetch_all_pages(api, &base_url, "entries").await;
    if let Some(error_msg) = pages.error {
        error!("Cannot fetch entries, which is a fatal error: {error_msg}");
        return Err(MigrationError::unrecoverable(
            "fetch_dc_glossary_taxonomy_entries",
            error_msg,
        ));
    }
    debug!(
        "Fetched {} entries for entry group '{}'.",
        pages.items.len(),
        context.entry_group_id
    );
    Ok(convert_glossary_taxonomy_entries(&pages.items))
}

/// Fetches all relationships of one glossary taxonomy entry (FULL view).
///
/// Non-fatal: a failing page logs a warning and the relationships gathered
/// so far are returned — one entry's missing relationships degrade
/// gracefully, unlike a missing entry list.
pub async fn fetch_relationships_dc_glossary_term(
    api: &ApiClient,
    dc_glossary_taxonomy_name: &str,
    page_size: u32,
) -> Vec<GlossaryTaxonomyRelationship> {
    let base_url = dc_relationships_url(
        api.endpoints(),
        dc_glossary_taxonomy_name,
        RelationshipView::Full,
        page_size,
    );
    let pages = fetch_all_pages(api, &base_url, "relationships").await;
    if let Some(error_msg) = pages.error {
        warn!("Could not fetch relationships page for {dc_glossary_taxonomy_name}: {error_msg}");
    }
    convert_glossary_taxonomy_relationships(&pages.items)
}

/// Fetches all relationships of one catalog entry (BASIC view).
pub async fn fetch_relationships_dc_glossary_entry(
    api: &ApiClient,
    dc_entry_name: &str,
    page_size: u32,
) -> Vec<DcEntryRelationship> {
    let base_url = dc_relationships_url(
        api.endpoints(),
        dc_entry_name,
        RelationshipView::Basic,
        page_size,
    );
    let pages = fetch_all_pages(api, &base_url, "relationships").await;
    if let Some(error_msg) = pages.error {
        warn!("Could not fetch relationships page for {dc_entry_name}: {error_msg}");
    }
    convert_entry_relationships(&pages.items)
}

/// Fetches relationships for all entries concurrently under a bounded
/// worker pool.
///
/// All-or-nothing: a panicked worker fails the whole batch and no partial
/// map is returned, so a partial relationship graph can never be mistaken
/// for a complete one. Completion order is irrelevant; the result is keyed
/// by entry name.
pub async fn fetch_dc_glossary_taxonomy_relationships(
    api: &ApiClient,
    entries: &[GlossaryTaxonomyEntry],
    settings: &MigrationSettings,
) -> Result<HashMap<String, Vec<GlossaryTaxonomyRelationship>>, MigrationError> {
    let page_size = settings.page_size;
    let mut in_flight = stream::iter(entries.iter().map(|entry| {
        let api = api.clone();
        let name = entry.name.clone();
        async move {
            tokio::spawn(async move {
                let relationships =
                    fetch_relationships_dc_glossary_term(&api, &name, page_size).await;
                (name, relationships)
            })
            .await
        }
    }))
    .buffer_unordered(settings.max_workers.max(1));

    let mut relationship_map = HashMap::with_capacity(entries.len());
    while let Some(joined) = in_flight.next().await {
        let (name, relationships) = joined?;
        relationship_map.insert(name, relationships);
    }
    Ok(relationship_map)
}

/// Searches Data Catalog for entries matching `query`, following
/// pagination. Degrades to the results gathered so far on a failing page.
pub async fn search_dc_entries_for_term(
    api: &ApiClient,
    context: &MigrationContext,
    query: &str,
    page_size: u32,
) -> Vec<SearchEntryResult> {
    let mut results = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut request_body = json!({
            "orderBy": "relevance",
            "pageSize": page_size,
            "query": query,
            "scope": {"includeOrgIds": context.org_ids},
        });
        if let Some(token) = &page_token {
            request_body["pageToken"] = json!(token);
        }

        let response = api
            .fetch_api_response(
                Method::POST,
                &api.endpoints().search_url,
                Some(request_body),
            )
            .await;
        if let Some(error_msg) = response.error_msg {
            warn!("Catalog search page for query '{query}' failed: {error_msg}");
            break;
        }
        let page = response.json.unwrap_or(Value::Null);
        if let Some(page_results) = page.get("results").and_then(Value::as_array) {
            results.extend(page_results.iter().cloned());
        }
        page_token = page
            .get("nextPageToken")
            .and_then(Value::as_str)
            .map(str::to_string);
        if page_token.is_none() {
            break;
        }
    }

    convert_search_results(&results)
}

/// Fetches the legacy glossary's display name.
///
/// Falls back to the target glossary id when the entry has no
/// `displayName`. Fatal on API error: the display name seeds the created
/// glossary.
pub async fn fetch_glossary_display_name(
    api: &ApiClient,
    context: &MigrationContext,
) -> Result<String, MigrationError> {
    let url = dc_glossary_entry_url(api.endpoints(), context);
    let response = api.fetch_api_response(Method::GET, &url, None).await;
    if let Some(error_msg) = response.error_msg {
        error!("Failed to get original glossary details: {error_msg}");
        return Err(MigrationError::unrecoverable(
            "fetch_glossary_display_name",
            error_msg,
        ));
    }
    Ok(response
        .json_str("displayName")
        .map(str::to_string)
        .unwrap_or_else(|| context.dp_glossary_id.clone()))
}

/// Resolves a project id to its numeric project number via Cloud Resource
/// Manager. Fatal on API error or an unparseable project name.
pub async fn get_project_number(
    api: &ApiClient,
    project_id: &str,
) -> Result<String, MigrationError> {
    let url = project_url(api.endpoints(), project_id);
    let response = api.fetch_api_response(Method::GET, &url, None).await;
    if let Some(error_msg) = response.error_msg {
        error!("Failed to fetch project info for '{project_id}': {error_msg}");
        return Err(MigrationError::unrecoverable("get_project_number", error_msg));
    }
    extract_project_number_from_info(&response.json.unwrap_or(Value::Null))
}

/// Extracts the numeric project number from a project-info `name` field of
/// the form `projects/{number}[/...]`.
pub fn extract_project_number_from_info(project_info: &Value) -> Result<String, MigrationError> {
    let name = project_info.get("name").and_then(Value::as_str).unwrap_or("");
    let pattern = Regex::new(r"projects/(\d+)").unwrap();
    if let Some(captures) = pattern.captures(name) {
        return Ok(captures[1].to_string());
    }
    error!("Project number not found in project info.");
    Err(MigrationError::unrecoverable(
        "extract_project_number_from_info",
        format!("project number not found in name '{name}'"),
    ))
}
