//! Base URLs of the Google Cloud services the migration talks to.

/// Service base URLs.
///
/// Defaults point at the public endpoints; the `with_*` overrides exist so
/// tests can aim each service at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Data Catalog v2 (entries and relationships).
    pub datacatalog_base: String,
    /// Data Catalog v1 `catalog:search` endpoint.
    pub search_url: String,
    /// Dataplex v1.
    pub dataplex_base: String,
    /// Cloud Resource Manager v3.
    pub resource_manager_base: String,
    /// Cloud Storage JSON API.
    pub storage_base: String,
    /// Cloud Storage media-upload endpoint.
    pub storage_upload_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            datacatalog_base: "https://datacatalog.googleapis.com/v2".to_string(),
            search_url: "https://datacatalog.googleapis.com/v1/catalog:search".to_string(),
            dataplex_base: "https://dataplex.googleapis.com/v1".to_string(),
            resource_manager_base: "https://cloudresourcemanager.googleapis.com/v3".to_string(),
            storage_base: "https://storage.googleapis.com/storage/v1".to_string(),
            storage_upload_base: "https://storage.googleapis.com/upload/storage/v1".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every service at a single mock server base URL.
    ///
    /// Primarily useful in tests, where one wiremock instance stands in for
    /// all of the services at once.
    #[must_use]
    pub fn with_mock_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            datacatalog_base: format!("{base}/datacatalog/v2"),
            search_url: format!("{base}/datacatalog/v1/catalog:search"),
            dataplex_base: format!("{base}/dataplex/v1"),
            resource_manager_base: format!("{base}/crm/v3"),
            storage_base: format!("{base}/storage/v1"),
            storage_upload_base: format!("{base}/upload/storage/v1"),
        }
    }
}
