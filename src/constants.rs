//! Fixed values shared across the migration library.

use std::time::Duration;

/// Page size requested from every paginated Data Catalog endpoint.
pub const PAGE_SIZE: u32 = 1000;

/// Default bound for the relationship fan-out worker pool.
pub const MAX_WORKERS: usize = 10;

/// Retry bounds for transient HTTP failures.
pub const MAX_ATTEMPTS: u32 = 10;
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Search-result subtype that marks a legacy glossary.
pub const GLOSSARY_SEARCH_SUBTYPE: &str = "entry.glossary";

/// Substring a dry-run metadata job returns when the Dataplex service
/// account lacks access to a staging bucket.
pub const PERMISSION_DENIED_MARKER: &str = "does not have sufficient permission";

/// Project number of the Dataplex system project that owns the global
/// glossary aspect types (`{number}.global.overview` etc.).
pub const DATAPLEX_PROJECT_NUMBER: &str = "655216118709";

/// Job-id prefix used by the permission probe.
pub const PERMISSION_CHECK_JOB_PREFIX: &str = "permission-check";
