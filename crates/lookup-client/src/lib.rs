//! Movie metadata lookup client.
//!
//! This crate talks to the TMDB v3 REST API to resolve movies by id, search
//! them by free text and list their trailers. It handles:
//! - Building authenticated requests with a bounded timeout
//! - Mapping HTTP status and decoding failures onto `LookupError`
//! - Keeping raw records raw: poster paths come back exactly as TMDB sent
//!   them, the catalog decides how to store them
//!
//! Callers depend on the `MovieLookup` trait so tests can swap in a fake.

use std::time::Duration;

use async_trait::async_trait;
use catalog::{MovieId, MovieRecord};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

/// Default TMDB API root.
pub const DEFAULT_API_URL: &str = "https://api.themoviedb.org/3";

/// How long a single lookup may take before it counts as unavailable.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the lookup service
#[derive(Error, Debug)]
pub enum LookupError {
    /// Service down, unreachable, timed out or answered with a server error.
    #[error("lookup service unavailable: {0}")]
    Unavailable(String),

    #[error("not found by lookup service: {0}")]
    NotFound(String),

    /// The service answered but the body could not be understood.
    #[error("malformed response from lookup service: {0}")]
    Malformed(String),
}

/// A video attached to a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub site: String,
}

impl Trailer {
    pub fn is_trailer(&self) -> bool {
        self.kind == "Trailer"
    }
}

#[derive(Deserialize)]
struct ResultsPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

/// Source of movie metadata.
#[async_trait]
pub trait MovieLookup: Send + Sync {
    /// Fetch one movie by id.
    async fn movie(&self, id: MovieId) -> Result<MovieRecord, LookupError>;

    /// Free-text search, in the order the service ranked them.
    async fn search(&self, query: &str) -> Result<Vec<MovieRecord>, LookupError>;

    /// Videos of type `Trailer` for a movie.
    async fn trailers(&self, id: MovieId) -> Result<Vec<Trailer>, LookupError>;
}

/// HTTP client for the TMDB API.
#[derive(Clone)]
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Creates a new client targeting `base_url` and authenticating with
    /// `api_key` as a bearer token.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Lookup client targeting {} (timeout {:?})", base_url, timeout);

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("accept", "application/json")
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                error!("Lookup request to {} failed: {}", url, e);
                if e.is_timeout() {
                    LookupError::Unavailable(format!("request to {path} timed out"))
                } else {
                    LookupError::Unavailable(format!("request to {path} failed: {e}"))
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            error!("Lookup service answered {} for {}", status, path);
            return Err(LookupError::Unavailable(format!("{path} returned {status}")));
        }

        let body = response.bytes().await.map_err(|e| {
            LookupError::Unavailable(format!("failed reading body of {path}: {e}"))
        })?;

        serde_json::from_slice::<T>(&body)
            .map_err(|e| LookupError::Malformed(format!("{path}: {e}")))
    }
}

#[async_trait]
impl MovieLookup for TmdbClient {
    async fn movie(&self, id: MovieId) -> Result<MovieRecord, LookupError> {
        let record: MovieRecord = self
            .get_json(&format!("/movie/{id}"), &[("language", "en-US")])
            .await?;

        // An empty body that happens to parse is still not a movie.
        if record.id == 0 {
            return Err(LookupError::Malformed(format!(
                "/movie/{id} returned a record without an id"
            )));
        }
        Ok(record)
    }

    async fn search(&self, query: &str) -> Result<Vec<MovieRecord>, LookupError> {
        let page: ResultsPage<MovieRecord> = self
            .get_json(
                "/search/movie",
                &[
                    ("query", query),
                    ("language", "en-US"),
                    ("page", "1"),
                    ("include_adult", "false"),
                ],
            )
            .await?;

        debug!("Search {:?} returned {} results", query, page.results.len());
        Ok(page.results)
    }

    async fn trailers(&self, id: MovieId) -> Result<Vec<Trailer>, LookupError> {
        let page: ResultsPage<Trailer> = self
            .get_json(&format!("/movie/{id}/videos"), &[("language", "en-US")])
            .await?;

        Ok(page
            .results
            .into_iter()
            .filter(Trailer::is_trailer)
            .collect())
    }
}
