//! Released-track checking against the commercial catalog.
//!
//! The catalog is a soft dependency: the duplicate audit is useful on its
//! own, so missing credentials or a failed token exchange skip this stage
//! with a warning instead of failing the run. Matching reuses the same
//! similarity scorer as deduplication, but deliberately without a duration
//! gate: the catalog master of a track regularly differs in length from
//! the bucket's rip, and title plus artist has proven signal enough.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use dubplate_core::model::{BucketEntry, ReleaseMatch};

use crate::config::MatchThresholds;
use crate::error::{AuditError, AuditResult};
use crate::resilience::RatePacer;
use crate::similarity::similarity;
use crate::text::strip_bracketed;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SEARCH_URL: &str = "https://api.spotify.com/v1/search";

/// Catalog name used in removal reasons ("released on spotify: <url>").
pub const CATALOG_NAME: &str = "spotify";

/// Candidates examined per search.
const SEARCH_LIMIT: u32 = 5;

/// Flat pause before each search request, to stay under the catalog's
/// rate limit.
const SEARCH_PACE_MS: u64 = 100;

// ---------------------------------------------------------------------------
// API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One candidate track returned by the catalog search.
#[derive(Debug, Clone)]
pub struct CatalogTrack {
    /// Track title as listed in the catalog.
    pub title: String,
    /// All credited artists.
    pub artists: Vec<String>,
    /// Canonical public URL, when the catalog exposes one.
    pub url: Option<String>,
}

impl From<TrackItem> for CatalogTrack {
    fn from(item: TrackItem) -> Self {
        Self {
            title: item.name,
            artists: item.artists.into_iter().map(|a| a.name).collect(),
            url: item.external_urls.spotify,
        }
    }
}

/// Explicit per-entry result of a catalog lookup.
///
/// `Unavailable` keeps "the engine could not tell" distinguishable from
/// "genuinely not released" in logs and reports.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// A candidate cleared both similarity bars.
    Match(ReleaseMatch),
    /// The search ran and nothing qualified.
    NoMatch,
    /// The search failed; treated as "not found" without aborting the scan.
    Unavailable(String),
}

/// Aggregate of one released-check pass.
#[derive(Debug, Clone, Default)]
pub struct ReleaseScan {
    /// Entries with a confirmed catalog hit.
    pub matches: Vec<ReleaseMatch>,
    /// Lookups that failed and were counted as "not found".
    pub unavailable: usize,
    /// Set when the whole stage was skipped (with the reason).
    pub skipped: Option<String>,
}

impl ReleaseScan {
    pub(crate) fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Catalog API client: client-credentials token exchange plus track search.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    client_id: String,
    client_secret: String,
    pacer: RatePacer,
}

impl CatalogClient {
    /// Create a new catalog client.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("dubplate/0.1.0 (https://github.com/oxur/dubplate)")
            .build()?;

        Ok(Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            pacer: RatePacer::from_millis(SEARCH_PACE_MS),
        })
    }

    /// Exchange the client credentials for a bearer token.
    ///
    /// Tokens are not persisted: one exchange per validation run.
    pub async fn request_token(&self) -> AuditResult<String> {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .http
            .post(TOKEN_URL)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {credentials}"))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AuditError::Auth {
                service: "catalog".to_string(),
                message: e.to_string(),
            })?;

        let token: TokenResponse = response.json().await.map_err(|e| AuditError::Parse {
            service: "catalog".to_string(),
            message: e.to_string(),
        })?;

        Ok(token.access_token)
    }

    /// Search the catalog for tracks matching a free-text query.
    ///
    /// Waits out the flat pacing interval before each request.
    pub async fn search_tracks(&self, token: &str, query: &str) -> AuditResult<Vec<CatalogTrack>> {
        self.pacer.pause().await;

        let response = self
            .http
            .get(SEARCH_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", &SEARCH_LIMIT.to_string()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AuditError::Http {
                service: "catalog".to_string(),
                message: e.to_string(),
            })?;

        let result: SearchResponse = response.json().await.map_err(|e| AuditError::Parse {
            service: "catalog".to_string(),
            message: e.to_string(),
        })?;

        Ok(result.tracks.items.into_iter().map(CatalogTrack::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Checker
// ---------------------------------------------------------------------------

/// Scans bucket entries for tracks that have since been released.
#[derive(Debug, Clone)]
pub struct ReleaseChecker {
    client: CatalogClient,
    thresholds: MatchThresholds,
}

impl ReleaseChecker {
    /// Build a checker when both credential halves are present.
    ///
    /// Returns `None` otherwise; the caller decides how loudly to skip.
    pub fn from_credentials(
        client_id: Option<String>,
        client_secret: Option<String>,
        thresholds: MatchThresholds,
    ) -> Result<Option<Self>, reqwest::Error> {
        match (client_id, client_secret) {
            (Some(id), Some(secret)) => Ok(Some(Self {
                client: CatalogClient::new(id, secret)?,
                thresholds,
            })),
            _ => Ok(None),
        }
    }

    /// Check every eligible entry against the catalog.
    ///
    /// Eligible means both artist and title are present. Per-entry
    /// failures are logged and counted, never fatal; a failed token
    /// exchange skips the whole stage.
    pub async fn find_released(&self, entries: &[BucketEntry]) -> ReleaseScan {
        let token = match self.client.request_token().await {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Catalog token exchange failed, skipping released check: {e}");
                return ReleaseScan::skipped(format!("token exchange failed: {e}"));
            }
        };

        let mut scan = ReleaseScan::default();

        for entry in entries {
            let Some(artist) = entry.artist.as_deref() else {
                continue;
            };

            match self.check_entry(&token, entry, artist).await {
                LookupOutcome::Match(found) => {
                    log::info!(
                        "Released: {} -> {}",
                        entry.label(),
                        found.catalog_url
                    );
                    scan.matches.push(found);
                }
                LookupOutcome::NoMatch => {}
                LookupOutcome::Unavailable(reason) => {
                    log::warn!(
                        "Catalog lookup unavailable for {}: {reason}",
                        entry.label()
                    );
                    scan.unavailable += 1;
                }
            }
        }

        scan
    }

    /// Search for one entry and judge the candidates.
    async fn check_entry(&self, token: &str, entry: &BucketEntry, artist: &str) -> LookupOutcome {
        let title = strip_bracketed(&entry.title);
        let query = format!("{artist} {title}");

        match self.client.search_tracks(token, &query).await {
            Ok(candidates) => {
                match best_candidate(entry, &candidates, &self.thresholds) {
                    Some(found) => LookupOutcome::Match(found),
                    None => LookupOutcome::NoMatch,
                }
            }
            Err(e) => LookupOutcome::Unavailable(e.to_string()),
        }
    }
}

/// First candidate clearing both similarity bars, in catalog order.
///
/// The artist score is the best across the candidate's credited artists,
/// so collaborations do not fail the gate. No duration comparison here.
fn best_candidate(
    entry: &BucketEntry,
    candidates: &[CatalogTrack],
    thresholds: &MatchThresholds,
) -> Option<ReleaseMatch> {
    let entry_artist = entry.artist.as_deref()?;

    for candidate in candidates {
        let Some(url) = candidate.url.as_deref() else {
            continue;
        };

        let title_score = similarity(&entry.title, &candidate.title);
        let artist_score = candidate
            .artists
            .iter()
            .map(|name| similarity(entry_artist, name))
            .fold(0.0_f64, f64::max);

        if thresholds.title_matches(title_score) && thresholds.artist_matches(artist_score) {
            return Some(ReleaseMatch {
                entry: entry.clone(),
                catalog_url: url.to_string(),
                title_score,
                artist_score,
            });
        }
    }

    None
}
