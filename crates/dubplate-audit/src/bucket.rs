//! Client for the remote fingerprint bucket service.
//!
//! The bucket is the primary input of every run: a paginated listing of
//! fingerprint records, bearer-token authenticated, with per-record
//! deletion. Listing failures are fatal (without the listing there is
//! nothing to validate); deletion failures are soft and reported per
//! entry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use dubplate_core::model::{BucketEntry, EntryMetadata, TrackId};

use crate::error::{AuditError, AuditResult};

const BUCKET_API_BASE: &str = "https://api.audiobucket.net/v1";

/// Records fetched per page. The service caps `per_page` at 100.
const PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// API response types (private -- the listing nests metadata per record)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    data: Vec<BucketFile>,
    meta: PageMeta,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    current_page: u32,
    last_page: u32,
}

#[derive(Debug, Deserialize)]
struct BucketFile {
    id: u64,
    title: String,
    artist: Option<String>,
    duration_seconds: Option<u32>,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    metadata: FileMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct FileMetadata {
    source_url: Option<String>,
    platform: Option<String>,
    track_id: Option<uuid::Uuid>,
}

impl From<BucketFile> for BucketEntry {
    fn from(file: BucketFile) -> Self {
        Self {
            id: file.id.to_string(),
            title: file.title,
            artist: file.artist,
            duration_secs: file.duration_seconds,
            created_at: file.created_at,
            metadata: EntryMetadata {
                source_url: file.metadata.source_url,
                platform: file.metadata.platform,
                track_id: file.metadata.track_id.map(TrackId::from_uuid),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Read/delete access to the bucket, as the audit needs it.
///
/// Listing is the fatal path; deletion is the soft one. The distinction
/// belongs to the callers, so both methods just return errors and let the
/// orchestrator and the cleanup executor decide what survives.
#[async_trait]
pub trait BucketStore {
    /// Fetch the complete listing, following pagination to the last page.
    async fn list_entries(&self) -> AuditResult<Vec<BucketEntry>>;

    /// Delete one record. Success is exactly HTTP 200 or 204.
    async fn delete_entry(&self, id: &str) -> AuditResult<()>;
}

/// HTTP client for the bucket service.
#[derive(Debug, Clone)]
pub struct BucketClient {
    http: Client,
    api_token: String,
    bucket_id: String,
    base_url: String,
}

impl BucketClient {
    /// Create a new bucket client.
    pub fn new(
        api_token: impl Into<String>,
        bucket_id: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("dubplate/0.1.0 (https://github.com/oxur/dubplate)")
            .build()?;

        Ok(Self {
            http,
            api_token: api_token.into(),
            bucket_id: bucket_id.into(),
            base_url: BUCKET_API_BASE.to_string(),
        })
    }

    fn files_url(&self) -> String {
        format!("{}/buckets/{}/files", self.base_url, self.bucket_id)
    }

    async fn fetch_page(&self, page: u32) -> AuditResult<FileListResponse> {
        let response = self
            .http
            .get(self.files_url())
            .bearer_auth(&self.api_token)
            .query(&[("page", page.to_string()), ("per_page", PAGE_SIZE.to_string())])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AuditError::Http {
                service: "bucket".to_string(),
                message: e.to_string(),
            })?;

        response.json().await.map_err(|e| AuditError::Parse {
            service: "bucket".to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl BucketStore for BucketClient {
    async fn list_entries(&self) -> AuditResult<Vec<BucketEntry>> {
        let mut entries = Vec::new();
        let mut page = 1;

        loop {
            let listing = self.fetch_page(page).await?;
            let meta = listing.meta;
            entries.extend(listing.data.into_iter().map(BucketEntry::from));

            log::debug!(
                "Fetched bucket page {}/{} ({} entries so far)",
                meta.current_page,
                meta.last_page,
                entries.len()
            );

            if meta.current_page >= meta.last_page {
                break;
            }
            page = meta.current_page + 1;
        }

        Ok(entries)
    }

    async fn delete_entry(&self, id: &str) -> AuditResult<()> {
        let response = self
            .http
            .delete(format!("{}/{}", self.files_url(), id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => Err(AuditError::Http {
                service: "bucket".to_string(),
                message: format!("delete of {id} returned {status}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_client_creation() {
        let client = BucketClient::new("token", "bucket-1").unwrap();
        assert!(client.files_url().ends_with("/buckets/bucket-1/files"));
    }

    #[test]
    fn test_file_list_deserialize() {
        let json = r#"{
            "data": [
                {
                    "id": 12345,
                    "title": "Show Me Love (Edit)",
                    "artist": "Robin S",
                    "duration_seconds": 295,
                    "created_at": "2024-01-05T12:00:00Z",
                    "metadata": {
                        "source_url": "https://soundcloud.com/robin/show-me-love",
                        "platform": "soundcloud",
                        "track_id": "6b1d1c3e-8f57-4a75-9af0-6a6d2a1c9f01"
                    }
                }
            ],
            "meta": {"current_page": 1, "last_page": 3, "per_page": 100, "total": 250}
        }"#;

        let listing: FileListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.len(), 1);
        assert_eq!(listing.meta.current_page, 1);
        assert_eq!(listing.meta.last_page, 3);

        let entry = BucketEntry::from(
            listing.data.into_iter().next().unwrap(),
        );
        assert_eq!(entry.id, "12345");
        assert_eq!(entry.artist.as_deref(), Some("Robin S"));
        assert_eq!(entry.duration_secs, Some(295));
        assert_eq!(entry.metadata.platform.as_deref(), Some("soundcloud"));
        assert!(entry.metadata.track_id.is_some());
    }

    #[test]
    fn test_file_list_sparse_record() {
        // Records ingested before the metadata fields existed.
        let json = r#"{
            "data": [{"id": 7, "title": "Untitled Dub"}],
            "meta": {"current_page": 1, "last_page": 1}
        }"#;

        let listing: FileListResponse = serde_json::from_str(json).unwrap();
        let entry = BucketEntry::from(listing.data.into_iter().next().unwrap());
        assert_eq!(entry.id, "7");
        assert!(entry.artist.is_none());
        assert!(entry.duration_secs.is_none());
        assert!(entry.created_at.is_none());
        assert!(entry.metadata.track_id.is_none());
    }

    #[test]
    fn test_file_list_empty_page() {
        let json = r#"{"data": [], "meta": {"current_page": 1, "last_page": 1}}"#;
        let listing: FileListResponse = serde_json::from_str(json).unwrap();
        assert!(listing.data.is_empty());
    }

    #[test]
    fn test_file_list_missing_data_defaults_to_empty() {
        let json = r#"{"meta": {"current_page": 1, "last_page": 1}}"#;
        let listing: FileListResponse = serde_json::from_str(json).unwrap();
        assert!(listing.data.is_empty());
    }
}
