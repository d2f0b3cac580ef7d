//! Dataplex write layer: glossary creation and verification, entry lookup,
//! metadata jobs, and the bucket permission probe.

use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiResponse};
use crate::constants::{
    DATAPLEX_PROJECT_NUMBER, PERMISSION_CHECK_JOB_PREFIX, PERMISSION_DENIED_MARKER,
};
use crate::context::{MigrationContext, MigrationSettings};
use crate::models::SearchEntryResult;
use crate::urls::{
    build_dataplex_lookup_entry_url, dataplex_glossary_create_url, dataplex_glossary_entry_url,
    dataplex_glossary_url, dc_glossary_entry_url, metadata_job_url, metadata_jobs_url,
};
use crate::utils::{generate_job_id, trim_spaces_in_display_name};

// ------------------------------------------------------------------------
// Glossary creation
// ------------------------------------------------------------------------

/// Creates the target glossary in Dataplex and backfills its overview from
/// the legacy description.
///
/// Three outcomes:
/// 1. The glossary already exists (HTTP 409 / `ALREADY_EXISTS`) — treated
///    as success; the overview backfill still runs.
/// 2. Any other error — logged, the operation is abandoned without failing
///    the process.
/// 3. Creation accepted — after a settling delay the glossary is re-read
///    and its `@dataplex` entry polled until it materializes.
pub async fn create_dataplex_glossary(
    api: &ApiClient,
    context: &MigrationContext,
    settings: &MigrationSettings,
) {
    let display_name = &context.display_name;
    let create_response = post_dataplex_glossary(api, context).await;

    if is_glossary_already_exists(&create_response) {
        info!("Glossary '{display_name}' already exists in Dataplex.");
        check_and_update_glossary_overview(api, context).await;
        return;
    }

    if let Some(error_msg) = &create_response.error_msg {
        error!(
            "Unexpected response from Dataplex API for glossary '{display_name}': {error_msg}"
        );
        return;
    }

    info!("Glossary creation initiated for '{display_name}'. Waiting for operation to complete...");
    tokio::time::sleep(settings.verify_delay).await;

    let verification = get_dataplex_glossary(api, context).await;
    handle_dataplex_glossary_response(api, &verification, context, settings).await;
}

/// Whether a create response carries the conflict signature for an
/// existing glossary.
pub fn is_glossary_already_exists(api_response: &ApiResponse) -> bool {
    let Some(error) = api_response.json.as_ref().and_then(|j| j.get("error")) else {
        return false;
    };
    error.get("code").and_then(Value::as_i64) == Some(409)
        && error.get("status").and_then(Value::as_str) == Some("ALREADY_EXISTS")
}

async fn post_dataplex_glossary(api: &ApiClient, context: &MigrationContext) -> ApiResponse {
    let url = dataplex_glossary_create_url(api.endpoints(), context);
    let request_body = json!({
        "displayName": trim_spaces_in_display_name(&context.display_name),
    });
    api.fetch_api_response(Method::POST, &url, Some(request_body)).await
}

async fn get_dataplex_glossary(api: &ApiClient, context: &MigrationContext) -> ApiResponse {
    let url = dataplex_glossary_url(api.endpoints(), context);
    api.fetch_api_response(Method::GET, &url, None).await
}

async fn handle_dataplex_glossary_response(
    api: &ApiClient,
    api_response: &ApiResponse,
    context: &MigrationContext,
    settings: &MigrationSettings,
) {
    if let Some(error_msg) = &api_response.error_msg {
        error!("Failed to fetch Dataplex glossary: {error_msg}");
        return;
    }
    if api_response.json.is_some() {
        if poll_dataplex_glossary_entry(api, context, settings).await {
            info!("Dataplex glossary '{}' created successfully.", context.display_name);
            check_and_update_glossary_overview(api, context).await;
        }
    } else {
        error!("Unexpected response when fetching Dataplex glossary: {api_response:?}");
    }
}

/// Polls for the glossary's `@dataplex` entry until it exists.
///
/// A 404/`NOT_FOUND` response means the backend has not caught up yet and
/// the poll continues; any other failure stops early.
pub async fn poll_dataplex_glossary_entry(
    api: &ApiClient,
    context: &MigrationContext,
    settings: &MigrationSettings,
) -> bool {
    let entry_url = format!(
        "{}?view=FULL&aspectTypes={num}.global.overview,{num}.global.contacts",
        dataplex_glossary_entry_url(api.endpoints(), &context.project, &context.dp_glossary_id),
        num = DATAPLEX_PROJECT_NUMBER,
    );

    for attempt in 0..settings.glossary_poll_attempts {
        let response = api.fetch_api_response(Method::GET, &entry_url, None).await;
        if response.json_str("name").is_some() {
            return true;
        }

        let is_not_found = response
            .json
            .as_ref()
            .and_then(|j| j.get("error"))
            .is_some_and(|error| {
                error.get("code").and_then(Value::as_i64) == Some(404)
                    && error.get("status").and_then(Value::as_str) == Some("NOT_FOUND")
            });
        if !is_not_found {
            break;
        }
        if attempt + 1 < settings.glossary_poll_attempts {
            tokio::time::sleep(settings.glossary_poll_interval).await;
        }
    }
    false
}

// ------------------------------------------------------------------------
// Overview backfill
// ------------------------------------------------------------------------

async fn fetch_dataplex_glossary_entry(api: &ApiClient, context: &MigrationContext) -> ApiResponse {
    let entry_url = format!(
        "{}?view=FULL&aspectTypes={}.global.overview",
        dataplex_glossary_entry_url(api.endpoints(), &context.project, &context.dp_glossary_id),
        DATAPLEX_PROJECT_NUMBER,
    );
    api.fetch_api_response(Method::GET, &entry_url, None).await
}

async fn update_glossary_entry_overview(
    api: &ApiClient,
    context: &MigrationContext,
    description: &str,
) -> bool {
    let entry_url =
        dataplex_glossary_entry_url(api.endpoints(), &context.project, &context.dp_glossary_id);
    let aspect_type = format!("{DATAPLEX_PROJECT_NUMBER}.global.overview");
    let overview_payload = json!({
        "aspects": {
            (aspect_type.clone()): {
                "aspectType": aspect_type,
                "data": {"content": description},
            }
        }
    });

    let response = api
        .fetch_api_response(Method::PATCH, &entry_url, Some(overview_payload))
        .await;
    if let Some(error_msg) = response.error_msg {
        error!("Failed to update glossary entry overview: {error_msg}");
        return false;
    }
    info!("Successfully updated overview for glossary '{}'", context.display_name);
    true
}

/// Reads the legacy glossary's description out of its business context;
/// empty string when absent or unreadable.
async fn fetch_dc_glossary_description(api: &ApiClient, context: &MigrationContext) -> String {
    let url = dc_glossary_entry_url(api.endpoints(), context);
    let response = api.fetch_api_response(Method::GET, &url, None).await;
    if let Some(error_msg) = response.error_msg {
        warn!("Failed to fetch DC glossary description: {error_msg}");
        return String::new();
    }
    response
        .json
        .as_ref()
        .and_then(|j| j.get("coreAspects"))
        .and_then(|j| j.get("business_context"))
        .and_then(|j| j.get("jsonContent"))
        .and_then(|j| j.get("description"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

async fn check_and_update_glossary_overview(api: &ApiClient, context: &MigrationContext) {
    let entry_response = fetch_dataplex_glossary_entry(api, context).await;
    if let Some(error_msg) = entry_response.error_msg {
        warn!("Could not fetch glossary entry to check overview: {error_msg}");
        return;
    }
    let dc_description = fetch_dc_glossary_description(api, context).await;
    if !dc_description.is_empty() {
        update_glossary_entry_overview(api, context, &dc_description).await;
    }
}

// ------------------------------------------------------------------------
// Entry lookup
// ------------------------------------------------------------------------

/// Checks whether a Dataplex entry exists for a catalog search result.
pub async fn lookup_dataplex_entry(
    api: &ApiClient,
    search_entry_result: &SearchEntryResult,
) -> bool {
    let url = build_dataplex_lookup_entry_url(api.endpoints(), search_entry_result);
    let response = api.fetch_api_response(Method::GET, &url, None).await;
    if response.json.is_none() || response.is_error() {
        warn!(
            "Dataplex entry not found for data catalog entry: {}",
            search_entry_result.linked_resource
        );
        return false;
    }
    true
}

// ------------------------------------------------------------------------
// Metadata jobs
// ------------------------------------------------------------------------

/// Submits a metadata job and returns its generated id.
///
/// Returns `""` on failure — except in `fake_job` mode, where the raw error
/// text is returned instead so callers can inspect it (the permission probe
/// greps it for a denial message).
pub async fn create_metadata_job(
    api: &ApiClient,
    project_id: &str,
    location: &str,
    payload: &Value,
    job_prefix: &str,
    fake_job: bool,
) -> String {
    let generated_job_id = generate_job_id(job_prefix);
    if project_id.is_empty() || location.is_empty() || payload.is_null() {
        error!("Missing required parameters for metadata job creation.");
        return String::new();
    }

    let url = metadata_jobs_url(api.endpoints(), project_id, location, &generated_job_id);
    let response = api
        .fetch_api_response(Method::POST, &url, Some(payload.clone()))
        .await;

    if let Some(error_msg) = response.error_msg {
        if fake_job {
            return error_msg;
        }
        error!("Failed to create metadata job '{generated_job_id}' with error: {error_msg}");
        return String::new();
    }

    info!("Job '{generated_job_id}' submitted successfully.");
    generated_job_id
}

/// Polls a metadata job until it completes, fails, or the poll budget runs
/// out.
pub async fn poll_metadata_job(
    api: &ApiClient,
    project_id: &str,
    location: &str,
    job_id: &str,
    settings: &MigrationSettings,
) -> bool {
    info!(
        "Polling status for job '{job_id}' every {:?}...",
        settings.job_poll_interval
    );
    let job_url = metadata_job_url(api.endpoints(), project_id, location, job_id);

    for check in 1..=settings.job_max_polls {
        tokio::time::sleep(settings.job_poll_interval).await;
        let response = api.fetch_api_response(Method::GET, &job_url, None).await;
        if let Some(error_msg) = response.error_msg {
            error!("Error polling job '{job_id}': {error_msg}");
            return false;
        }
        let job = response.json.unwrap_or(Value::Null);
        let state = job
            .get("status")
            .and_then(|s| s.get("state"))
            .and_then(Value::as_str)
            .unwrap_or("");
        debug!("Job '{job_id}' state: {state}");

        match state {
            "SUCCEEDED" | "SUCCEEDED_WITH_ERRORS" => {
                info!("Job '{job_id}' SUCCEEDED.");
                return true;
            }
            "FAILED" => {
                let message = job
                    .get("status")
                    .and_then(|s| s.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("No error message provided.");
                error!("Job '{job_id}' FAILED. Reason: {message}");
                return false;
            }
            _ => {
                info!(
                    "Job '{job_id}' is {state}. Continuing to wait... (check {check}/{})",
                    settings.job_max_polls
                );
            }
        }
    }
    warn!("Polling timed out for job '{job_id}'.");
    false
}

/// Submits a metadata job and monitors it to completion.
pub async fn create_and_monitor_job(
    api: &ApiClient,
    project_id: &str,
    location: &str,
    payload: &Value,
    job_prefix: &str,
    settings: &MigrationSettings,
) -> bool {
    let job_id = create_metadata_job(api, project_id, location, payload, job_prefix, false).await;
    if job_id.is_empty() {
        return false;
    }
    poll_metadata_job(api, project_id, location, &job_id, settings).await
}

// ------------------------------------------------------------------------
// Permission probe
// ------------------------------------------------------------------------

/// Builds the non-executing import payload used for permission dry runs.
///
/// The glossary scope deliberately points at a project and glossary that do
/// not exist; the job only needs to exercise the bucket read check.
pub fn build_dummy_import_payload(bucket_name: &str) -> Value {
    json!({
        "type": "IMPORT",
        "import_spec": {
            "log_level": "DEBUG",
            "source_storage_uri": format!("gs://{bucket_name}/"),
            "entry_sync_mode": "FULL",
            "aspect_sync_mode": "INCREMENTAL",
            "scope": {
                "glossaries": ["projects/dummy-project-id/locations/global/glossaries/dummy-glossary"]
            }
        }
    })
}

/// Dry-runs a metadata import against one bucket to verify the Dataplex
/// service account can read it.
pub async fn check_metadata_job_creation_for_bucket(
    api: &ApiClient,
    project_id: &str,
    bucket_name: &str,
) -> bool {
    let dummy_payload = build_dummy_import_payload(bucket_name);
    let result = create_metadata_job(
        api,
        project_id,
        "global",
        &dummy_payload,
        PERMISSION_CHECK_JOB_PREFIX,
        true,
    )
    .await;

    if result.contains(PERMISSION_DENIED_MARKER) {
        error!("{result}");
        return false;
    }
    true
}

/// Verifies the Dataplex service account can read every staging bucket.
///
/// Fails fast: the first denied bucket short-circuits the remaining checks.
pub async fn check_all_buckets_permissions(
    api: &ApiClient,
    buckets: &[String],
    project_number: &str,
) -> bool {
    for bucket in buckets {
        if !check_metadata_job_creation_for_bucket(api, project_number, bucket).await {
            return false;
        }
    }
    true
}
