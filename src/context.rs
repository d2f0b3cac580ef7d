//! Migration coordinates and tunables.

use std::time::Duration;

use crate::constants::{MAX_WORKERS, PAGE_SIZE};

/// Immutable parameter bundle identifying one glossary migration.
///
/// Passed by reference to every read/write operation; never mutated
/// mid-operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationContext {
    /// Project billed for API quota (`X-Goog-User-Project`).
    pub user_project: String,
    /// Project that owns the legacy glossary.
    pub project: String,
    /// Organization ids searched for catalog entries.
    pub org_ids: Vec<String>,
    /// Location of the legacy entry group.
    pub location_id: String,
    /// Legacy entry group id.
    pub entry_group_id: String,
    /// Legacy (Data Catalog) glossary id.
    pub dc_glossary_id: String,
    /// Target (Dataplex) glossary id.
    pub dp_glossary_id: String,
    /// Display name for the target glossary.
    pub display_name: String,
}

/// Tunables for the migration operations.
///
/// These were module-level constants in earlier revisions; they are explicit
/// fields so callers can override them per invocation (most usefully in
/// tests, where minute-scale delays are replaced with milliseconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSettings {
    /// Maximum concurrent relationship fetches in the fan-out layer.
    pub max_workers: usize,
    /// Page size for paginated listing endpoints.
    pub page_size: u32,
    /// Delay between glossary creation and the verification read, allowing
    /// the backend to settle.
    pub verify_delay: Duration,
    /// Interval between glossary-entry existence polls.
    pub glossary_poll_interval: Duration,
    /// Number of glossary-entry existence polls before giving up.
    pub glossary_poll_attempts: u32,
    /// Interval between metadata-job status polls.
    pub job_poll_interval: Duration,
    /// Number of metadata-job status polls before timing out.
    pub job_max_polls: u32,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            max_workers: MAX_WORKERS,
            page_size: PAGE_SIZE,
            verify_delay: Duration::from_secs(60),
            glossary_poll_interval: Duration::from_secs(60),
            glossary_poll_attempts: 5,
            job_poll_interval: Duration::from_secs(5 * 60),
            job_max_polls: 12 * 12,
        }
    }
}

impl MigrationSettings {
    /// Settings with all delays collapsed, for tests.
    pub fn immediate() -> Self {
        Self {
            verify_delay: Duration::from_millis(1),
            glossary_poll_interval: Duration::from_millis(1),
            job_poll_interval: Duration::from_millis(1),
            ..Self::default()
        }
    }
}
