//! Cloud Storage adapter for the staging bucket.
//!
//! The migration stages its Dataplex import file in a GCS bucket. This
//! module clears leftovers from earlier runs, uploads the freshly generated
//! file, and reports outcomes through logs rather than hard failures.
//! Listing goes through the JSON API; deletes and media uploads talk to the
//! storage endpoints directly because their responses carry no JSON body.

use std::path::Path;

use reqwest::Method;
use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;

use crate::api::ApiClient;
use crate::error::MigrationError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectRecord>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectRecord {
    name: String,
}

fn bucket_objects_url(storage_base: &str, bucket_name: &str) -> String {
    format!("{storage_base}/b/{bucket_name}/o")
}

/// URL addressing a single object. Object names may contain `/`, which must
/// stay percent-encoded inside the final path segment.
fn object_url(
    storage_base: &str,
    bucket_name: &str,
    object_name: &str,
) -> Result<String, MigrationError> {
    let mut url = Url::parse(&bucket_objects_url(storage_base, bucket_name))?;
    url.path_segments_mut()
        .map_err(|()| {
            MigrationError::unrecoverable(
                "build object url",
                format!("'{storage_base}' cannot carry path segments"),
            )
        })?
        .push(object_name);
    Ok(url.into())
}

/// Names of every object currently in the bucket, across all pages.
async fn list_bucket_objects(api: &ApiClient, bucket_name: &str) -> Result<Vec<String>, String> {
    let base_url = bucket_objects_url(&api.endpoints().storage_base, bucket_name);
    let mut names = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let url = match &page_token {
            Some(token) => format!("{base_url}?pageToken={token}"),
            None => base_url.clone(),
        };
        let response = api.fetch_api_response(Method::GET, &url, None).await;
        if let Some(error_msg) = response.error_msg {
            return Err(error_msg);
        }

        let page: ObjectList = response
            .json
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| err.to_string())?
            .unwrap_or_default();
        names.extend(page.items.into_iter().map(|o| o.name));

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => return Ok(names),
        }
    }
}

async fn delete_object(api: &ApiClient, bucket_name: &str, object_name: &str) -> bool {
    let url = match object_url(&api.endpoints().storage_base, bucket_name, object_name) {
        Ok(url) => url,
        Err(err) => {
            error!("Could not address object '{object_name}': {err}");
            return false;
        }
    };

    let result = api
        .http()
        .delete(&url)
        .header("Authorization", format!("Bearer {}", api.bearer_token()))
        .header("X-Goog-User-Project", api.user_project())
        .send()
        .await;
    match result {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            error!(
                "Failed to delete object '{object_name}' from bucket '{bucket_name}': HTTP {}",
                response.status()
            );
            false
        }
        Err(err) => {
            error!("Failed to delete object '{object_name}' from bucket '{bucket_name}': {err}");
            false
        }
    }
}

/// Deletes every object in the bucket.
///
/// An already-empty bucket is success; a failed list or delete is reported
/// and stops the sweep.
pub async fn clear_bucket(api: &ApiClient, bucket_name: &str) -> bool {
    let objects = match list_bucket_objects(api, bucket_name).await {
        Ok(objects) => objects,
        Err(error_msg) => {
            error!("Failed to list objects in bucket '{bucket_name}': {error_msg}");
            return false;
        }
    };
    if objects.is_empty() {
        info!("Bucket '{bucket_name}' is already empty.");
        return true;
    }

    let total = objects.len();
    for object_name in &objects {
        if !delete_object(api, bucket_name, object_name).await {
            return false;
        }
    }
    info!("Cleared {total} objects from bucket '{bucket_name}'.");
    true
}

/// Uploads a local file into the bucket under `object_name`.
pub async fn upload_to_gcs(
    api: &ApiClient,
    bucket_name: &str,
    object_name: &str,
    local_path: &Path,
) -> bool {
    let contents = match tokio::fs::read(local_path).await {
        Ok(contents) => contents,
        Err(err) => {
            error!("Failed to read '{}': {err}", local_path.display());
            return false;
        }
    };

    let upload_url = bucket_objects_url(&api.endpoints().storage_upload_base, bucket_name);
    let mut url = match Url::parse(&upload_url) {
        Ok(url) => url,
        Err(err) => {
            error!("Could not build upload URL for bucket '{bucket_name}': {err}");
            return false;
        }
    };
    url.query_pairs_mut()
        .append_pair("uploadType", "media")
        .append_pair("name", object_name);

    let result = api
        .http()
        .post(url)
        .header("Authorization", format!("Bearer {}", api.bearer_token()))
        .header("X-Goog-User-Project", api.user_project())
        .header("Content-Type", "application/octet-stream")
        .body(contents)
        .send()
        .await;
    match result {
        Ok(response) if response.status().is_success() => {
            info!("Uploaded '{}' to gs://{bucket_name}/{object_name}.", local_path.display());
            true
        }
        Ok(response) => {
            error!(
                "Failed to upload '{}' to bucket '{bucket_name}': HTTP {}",
                local_path.display(),
                response.status()
            );
            false
        }
        Err(err) => {
            error!("Failed to upload '{}' to bucket '{bucket_name}': {err}", local_path.display());
            false
        }
    }
}

/// Clears the staging bucket and uploads the export file into it.
///
/// Always reports success; step failures surface only in the logs, and the
/// permission probe that follows catches an unusable bucket.
pub async fn prepare_gcs_bucket(
    api: &ApiClient,
    bucket_name: &str,
    object_name: &str,
    local_path: &Path,
) -> bool {
    if !clear_bucket(api, bucket_name).await {
        warn!("Continuing with bucket '{bucket_name}' despite failed cleanup.");
    }
    upload_to_gcs(api, bucket_name, object_name, local_path).await;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Endpoints, RetrySettings};
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{body_string, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_api(server: &MockServer) -> ApiClient {
        ApiClient::new("token", "billing")
            .expect("client should build")
            .with_endpoints(Endpoints::with_mock_base(&server.uri()))
            .with_retry(RetrySettings::immediate())
    }

    #[test]
    fn object_urls_encode_slashes_in_names() {
        let url = object_url("https://storage.googleapis.com/storage/v1", "bkt", "dir/file.json")
            .expect("valid url");
        assert_eq!(
            url,
            "https://storage.googleapis.com/storage/v1/b/bkt/o/dir%2Ffile.json"
        );
    }

    #[tokio::test]
    async fn clearing_an_empty_bucket_succeeds_without_deletes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/b/staging/o"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        assert!(clear_bucket(&test_api(&server), "staging").await);
    }

    #[tokio::test]
    async fn clearing_deletes_every_listed_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/b/staging/o"))
            .and(query_param("pageToken", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "nested/b.json"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/b/staging/o"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "a.json"}],
                "nextPageToken": "next"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/b/staging/o/a.json"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/b/staging/o/nested%2Fb.json"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        assert!(clear_bucket(&test_api(&server), "staging").await);
    }

    #[tokio::test]
    async fn failed_delete_stops_the_sweep() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/b/staging/o"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "a.json"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        assert!(!clear_bucket(&test_api(&server), "staging").await);
    }

    #[tokio::test]
    async fn upload_sends_file_contents_as_media() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/staging/o"))
            .and(query_param("uploadType", "media"))
            .and(query_param("name", "export.json"))
            .and(body_string("{\"entries\": []}"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "export.json"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"{\"entries\": []}").expect("write");

        let uploaded =
            upload_to_gcs(&test_api(&server), "staging", "export.json", file.path()).await;
        assert!(uploaded);
    }

    #[tokio::test]
    async fn upload_of_missing_file_fails_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let uploaded = upload_to_gcs(
            &test_api(&server),
            "staging",
            "export.json",
            Path::new("/nonexistent/export.json"),
        )
        .await;
        assert!(!uploaded);
    }

    #[tokio::test]
    async fn preparation_reports_success_even_when_upload_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/b/staging/o"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"{}").expect("write");

        let prepared =
            prepare_gcs_bucket(&test_api(&server), "staging", "export.json", file.path()).await;
        assert!(prepared);
    }
}
