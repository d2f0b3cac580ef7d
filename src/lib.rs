//! Migrates business glossaries from Data Catalog to Dataplex.
//!
//! Data Catalog's business glossary is shut down in favor of the Dataplex
//! glossary service. This library drives the one-time move over the public
//! REST APIs:
//!
//! 1. **Discover** glossaries in Data Catalog via `catalog:search`.
//! 2. **Read** each glossary's entries page by page, then fan out over the
//!    entries to collect their relationships concurrently.
//! 3. **Create** the target glossary in Dataplex, tolerating re-runs (an
//!    existing glossary is not an error).
//! 4. **Stage** the converted export file in a Cloud Storage bucket.
//! 5. **Probe** bucket permissions with dry-run metadata jobs before the
//!    real import is submitted.
//!
//! ## Failure model
//!
//! Read paths degrade to empty results with a log line; losing one entry's
//! relationships must not abort a long migration. Write paths are
//! idempotent where the API allows it. Only missing prerequisites, such as
//! an unreadable source glossary, surface as
//! [`MigrationError::Unrecoverable`].
//!
//! ## Authentication
//!
//! Callers supply a bearer token and a quota project; token acquisition and
//! refresh are out of scope.

pub mod api;
pub mod catalog;
pub mod constants;
pub mod context;
pub mod convert;
pub mod dataplex;
pub mod error;
pub mod gcs;
pub mod models;
pub mod urls;
pub mod utils;

pub use api::{ApiClient, ApiResponse, Endpoints, RetrySettings};
pub use context::{MigrationContext, MigrationSettings};
pub use error::MigrationError;
