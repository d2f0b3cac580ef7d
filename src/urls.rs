//! Deterministic URL construction for every endpoint the migration calls.
//!
//! The grammar here is fixed by the services; builders only interpolate
//! path components. The one non-trivial case is the Dataplex lookup-entry
//! URL, which rewrites a search result's linked resource into the legacy
//! entry's resource path.

use crate::api::Endpoints;
use crate::context::MigrationContext;
use crate::models::SearchEntryResult;
use crate::utils::{extract_entry_parts, normalize_linked_resource};

/// Relationship listing view requested from Data Catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipView {
    Full,
    Basic,
}

impl RelationshipView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Basic => "BASIC",
        }
    }
}

/// Base URL for listing a legacy entry group's entries.
pub fn dc_entries_url(endpoints: &Endpoints, context: &MigrationContext, page_size: u32) -> String {
    format!(
        "{}/projects/{}/locations/{}/entryGroups/{}/entries?view=FULL&pageSize={}",
        endpoints.datacatalog_base,
        context.project,
        context.location_id,
        context.entry_group_id,
        page_size
    )
}

/// Base URL for listing one entry's relationships.
pub fn dc_relationships_url(
    endpoints: &Endpoints,
    dc_entry_name: &str,
    view: RelationshipView,
    page_size: u32,
) -> String {
    format!(
        "{}/{}/relationships?view={}&pageSize={}",
        endpoints.datacatalog_base,
        dc_entry_name,
        view.as_str(),
        page_size
    )
}

/// URL of the legacy glossary's own catalog entry.
pub fn dc_glossary_entry_url(endpoints: &Endpoints, context: &MigrationContext) -> String {
    format!(
        "{}/projects/{}/locations/{}/entryGroups/{}/entries/{}",
        endpoints.datacatalog_base,
        context.project,
        context.location_id,
        context.entry_group_id,
        context.dc_glossary_id
    )
}

/// URL for reading the target Dataplex glossary.
pub fn dataplex_glossary_url(endpoints: &Endpoints, context: &MigrationContext) -> String {
    format!(
        "{}/projects/{}/locations/global/glossaries/{}",
        endpoints.dataplex_base, context.project, context.dp_glossary_id
    )
}

/// URL for creating the target Dataplex glossary.
pub fn dataplex_glossary_create_url(endpoints: &Endpoints, context: &MigrationContext) -> String {
    format!(
        "{}/projects/{}/locations/global/glossaries?glossary_id={}",
        endpoints.dataplex_base, context.project, context.dp_glossary_id
    )
}

/// URL of the glossary's `@dataplex` entry (aspects live here).
pub fn dataplex_glossary_entry_url(
    endpoints: &Endpoints,
    project_id: &str,
    glossary_id: &str,
) -> String {
    format!(
        "{}/projects/{}/locations/global/entryGroups/@dataplex/entries/projects/{}/locations/global/glossaries/{}",
        endpoints.dataplex_base, project_id, project_id, glossary_id
    )
}

/// Cloud Resource Manager project lookup URL.
pub fn project_url(endpoints: &Endpoints, project_id: &str) -> String {
    format!("{}/projects/{}", endpoints.resource_manager_base, project_id)
}

/// URL for submitting a metadata job.
pub fn metadata_jobs_url(
    endpoints: &Endpoints,
    project_id: &str,
    location: &str,
    job_id: &str,
) -> String {
    format!(
        "{}/projects/{}/locations/{}/metadataJobs?metadataJobId={}",
        endpoints.dataplex_base, project_id, location, job_id
    )
}

/// URL for polling one metadata job.
pub fn metadata_job_url(
    endpoints: &Endpoints,
    project_id: &str,
    location: &str,
    job_id: &str,
) -> String {
    format!(
        "{}/projects/{}/locations/{}/metadataJobs/{}",
        endpoints.dataplex_base, project_id, location, job_id
    )
}

/// Appends a continuation token to a listing URL.
pub fn with_page_token(base_url: &str, page_token: Option<&str>) -> String {
    match page_token {
        Some(token) => format!("{base_url}&pageToken={token}"),
        None => base_url.to_string(),
    }
}

/// Builds the Dataplex lookup-entry URL for a search result.
///
/// The entry id at the tail of `relative_resource_name` is replaced with the
/// id carried by `linked_resource` (its leading slashes stripped), and the
/// `projects/{p}/locations/{l}` prefix becomes the lookup scope. When the
/// resource name does not match the
/// `projects/{p}/locations/{l}/entryGroups/{g}/entries/{id}` grammar, the
/// scope is left empty and the resource name is passed through unchanged —
/// the lookup then fails server-side rather than here, matching the
/// long-standing behavior callers depend on.
pub fn build_dataplex_lookup_entry_url(
    endpoints: &Endpoints,
    search_entry_result: &SearchEntryResult,
) -> String {
    let new_entry_id = normalize_linked_resource(&search_entry_result.linked_resource);

    let (scope, entry) = match extract_entry_parts(&search_entry_result.relative_resource_name) {
        Some(parts) => (
            parts.project_location.clone(),
            format!(
                "{}/entryGroups/{}/entries/{}",
                parts.project_location, parts.entry_group_id, new_entry_id
            ),
        ),
        None => (
            String::new(),
            search_entry_result.relative_resource_name.clone(),
        ),
    };

    format!(
        "{}/{}:lookupEntry?entry={}",
        endpoints.dataplex_base, scope, entry
    )
}
