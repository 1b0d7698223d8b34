//! Validated HTTP transport for the records API and the rewrite engine's
//! auxiliary fetches.

use crate::normalize::museum::MuseumObjectResponse;
use crate::record::SearchEnvelope;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "nzimage/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_ENDPOINT: &str = "https://api.digitalnz.org/records.json";
const API_KEY_HEADER: &str = "Authentication-Token";
const IMAGES_CATEGORY: &str = "Images";

/// Failures raised by the validated transport.
///
/// Every call is a single attempt: a failed validation is a hard error for
/// the caller, never a retry trigger.
#[derive(Debug)]
pub enum UpstreamError {
    /// The response status was outside the 2xx range.
    Status(StatusCode),
    /// The response content type was not the expected one.
    ContentType(Option<String>),
    /// The response body failed to decode into the expected shape.
    Decode(reqwest::Error),
    /// The request could not be sent or the body could not be read.
    Http(reqwest::Error),
    /// A text fetch returned an empty body.
    EmptyBody,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "unacceptable response status: {status}"),
            Self::ContentType(found) => write!(
                f,
                "unexpected content type: {}",
                found.as_deref().unwrap_or("<missing>")
            ),
            Self::Decode(err) => write!(f, "response decode failed: {err}"),
            Self::Http(err) => write!(f, "http request failed: {err}"),
            Self::EmptyBody => write!(f, "response body was empty"),
        }
    }
}

impl Error for UpstreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) | Self::Http(err) => Some(err),
            Self::Status(_) | Self::ContentType(_) | Self::EmptyBody => None,
        }
    }
}

impl UpstreamError {
    /// Stable failure-kind label used in log context.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "non_2xx_status",
            Self::ContentType(_) => "non_json_content_type",
            Self::Decode(_) => "decode_failure",
            Self::Http(_) => "http_failure",
            Self::EmptyBody => "empty_body",
        }
    }
}

/// Content headers reported by a metadata-only probe.
#[derive(Debug, Clone, Default)]
pub struct HeadMetadata {
    /// Content-Type header, if present.
    pub content_type: Option<String>,
    /// Content-Length header, if present.
    pub content_length: Option<u64>,
}

/// Seam used by the record sampler to query the search API.
pub trait RecordSearch {
    /// Searches one page of image records in `collection`.
    fn search(
        &self,
        collection: &str,
        page: u64,
        per_page: u64,
    ) -> impl Future<Output = Result<SearchEnvelope, UpstreamError>> + Send;
}

/// Seam used by the URL normalizer for its auxiliary lookups.
pub trait AssetFetch {
    /// Fetches a page body as text, requiring a 2xx status and non-empty body.
    fn fetch_html(&self, url: &Url) -> impl Future<Output = Result<String, UpstreamError>> + Send;

    /// Issues a metadata-only probe and returns the content headers.
    fn head_metadata(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<HeadMetadata, UpstreamError>> + Send;

    /// Fetches one object description from the museum API.
    fn museum_object(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<MuseumObjectResponse, UpstreamError>> + Send;
}

/// Reqwest-backed transport with 2xx + content-type validation.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    search_endpoint: Url,
    api_key: Option<String>,
}

impl SearchClient {
    /// Builds a client with the production endpoints.
    ///
    /// The API key is optional; when present it is sent on every search
    /// request in the aggregator's token header.
    pub fn new(api_key: Option<String>) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(UpstreamError::Http)?;

        Ok(Self {
            http,
            search_endpoint: Url::parse(SEARCH_ENDPOINT).expect("search endpoint parses"),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        with_key: bool,
    ) -> Result<T, UpstreamError> {
        let mut request = self.http.get(url).query(query);
        if with_key {
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }
        }

        let response = request.send().await.map_err(UpstreamError::Http)?;
        let response = validate_status(response)?;
        validate_json_content_type(&response)?;

        response.json().await.map_err(UpstreamError::Decode)
    }
}

impl RecordSearch for SearchClient {
    async fn search(
        &self,
        collection: &str,
        page: u64,
        per_page: u64,
    ) -> Result<SearchEnvelope, UpstreamError> {
        let query = [
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
            ("and[category][]", IMAGES_CATEGORY.to_string()),
            ("and[primary_collection][]", collection.to_string()),
        ];

        self.get_json(self.search_endpoint.clone(), &query, true)
            .await
    }
}

impl AssetFetch for SearchClient {
    async fn fetch_html(&self, url: &Url) -> Result<String, UpstreamError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(UpstreamError::Http)?;
        let response = validate_status(response)?;

        let body = response.text().await.map_err(UpstreamError::Http)?;
        if body.is_empty() {
            return Err(UpstreamError::EmptyBody);
        }
        Ok(body)
    }

    async fn head_metadata(&self, url: &Url) -> Result<HeadMetadata, UpstreamError> {
        let response = self
            .http
            .head(url.clone())
            .send()
            .await
            .map_err(UpstreamError::Http)?;
        let response = validate_status(response)?;

        Ok(HeadMetadata {
            content_type: header_value(&response, CONTENT_TYPE),
            content_length: response.content_length(),
        })
    }

    async fn museum_object(&self, url: &Url) -> Result<MuseumObjectResponse, UpstreamError> {
        self.get_json(url.clone(), &[], false).await
    }
}

fn validate_status(response: Response) -> Result<Response, UpstreamError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(UpstreamError::Status(response.status()))
    }
}

fn validate_json_content_type(response: &Response) -> Result<(), UpstreamError> {
    let content_type = header_value(response, CONTENT_TYPE);
    match content_type.as_deref() {
        Some(value) if value.starts_with("application/json") => Ok(()),
        _ => Err(UpstreamError::ContentType(content_type)),
    }
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
