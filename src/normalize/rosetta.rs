//! Multi-step crawl of the national delivery service.
//!
//! These records only expose a small derivative through the aggregator. The
//! delivery service serves the master files, but reaching them takes a
//! short session-bound walk: the object identifier from the record's source
//! URL unlocks a delivery page carrying a session token, the token unlocks
//! the viewer listing the object's files, and each file's streaming
//! endpoint reports its size on a metadata probe. The largest file wins and
//! is served through the format-conversion proxy, since masters are often
//! not browser-friendly formats.

use super::{thumbnailer_url, RewriteError};
use crate::record::Record;
use crate::search::AssetFetch;
use futures_util::future::join_all;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

const DELIVERY_BASE: &str = "https://ndhadeliver.natlib.govt.nz/delivery";

static OBJECT_ID_IN_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dps_pid=(IE\d+)").expect("object id query pattern compiles"));
static OBJECT_ID_IN_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(IE\d+)(?:[/?#]|$)").expect("object id path pattern compiles"));
static SESSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dps_dvs=([0-9A-Za-z~._-]+)").expect("session token pattern compiles"));
static FILE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FL\d+").expect("file id pattern compiles"));

/// Walks the delivery service and returns the proxied URL of the largest
/// master file behind `record`.
pub(crate) async fn crawl<F: AssetFetch>(
    fetcher: &F,
    record: &Record,
) -> Result<String, RewriteError> {
    let object_id = object_identifier(record).ok_or_else(|| RewriteError::CrawlFailed {
        stage: "object identifier",
        detail: record.summary(),
    })?;

    let delivery_page = fetch_page(
        fetcher,
        format!("{DELIVERY_BASE}/DeliveryManagerServlet?dps_pid={object_id}"),
        "delivery page",
    )
    .await?;
    let token = session_token(&delivery_page).ok_or(RewriteError::CrawlFailed {
        stage: "session token",
        detail: String::from("delivery page carries no dps_dvs token"),
    })?;

    let viewer_page = fetch_page(
        fetcher,
        format!("{DELIVERY_BASE}/DeliveryManagerServlet?dps_pid={object_id}&dps_dvs={token}"),
        "viewer page",
    )
    .await?;
    let file_ids = file_identifiers(&viewer_page);
    if file_ids.is_empty() {
        return Err(RewriteError::CrawlFailed {
            stage: "file enumeration",
            detail: format!("viewer for {object_id} lists no file identifiers"),
        });
    }

    let winner = largest_stream(fetcher, &file_ids, &token).await.ok_or_else(|| {
        RewriteError::CrawlFailed {
            stage: "stream probe",
            detail: format!("none of {} candidate files answered a probe", file_ids.len()),
        }
    })?;

    Ok(thumbnailer_url(&winner))
}

/// Probes every candidate file's streaming endpoint and returns the largest
/// by reported content length.
///
/// Probes run concurrently, but selection reduces over first-seen order:
/// per-item failures are skipped and a tie keeps the earliest candidate, so
/// completion order never changes the outcome.
async fn largest_stream<F: AssetFetch>(
    fetcher: &F,
    file_ids: &[String],
    token: &str,
) -> Option<Url> {
    let endpoints: Vec<Url> = file_ids
        .iter()
        .filter_map(|file_id| {
            Url::parse(&format!(
                "{DELIVERY_BASE}/StreamGate?dps_pid={file_id}&dps_dvs={token}"
            ))
            .ok()
        })
        .collect();

    let probes = join_all(endpoints.iter().map(|url| fetcher.head_metadata(url))).await;

    let mut best: Option<(u64, &Url)> = None;
    for (endpoint, outcome) in endpoints.iter().zip(probes) {
        let length = match outcome {
            Ok(metadata) => metadata.content_length,
            Err(err) => {
                debug!(url = %endpoint, error = %err, "stream probe failed, skipping candidate");
                continue;
            }
        };
        if let Some(length) = length {
            if best.map_or(true, |(largest, _)| length > largest) {
                best = Some((length, endpoint));
            }
        }
    }

    best.map(|(_, url)| url.clone())
}

async fn fetch_page<F: AssetFetch>(
    fetcher: &F,
    url: String,
    stage: &'static str,
) -> Result<String, RewriteError> {
    let url = Url::parse(&url).map_err(|_| RewriteError::UrlConstruction { candidate: url })?;
    fetcher
        .fetch_html(&url)
        .await
        .map_err(|err| RewriteError::CrawlFailed {
            stage,
            detail: err.to_string(),
        })
}

/// Object identifier from the record's source, origin or landing URL,
/// matched in query form first and bare path form second.
fn object_identifier(record: &Record) -> Option<String> {
    [&record.source_url, &record.origin_url, &record.landing_url]
        .into_iter()
        .flatten()
        .find_map(|url| {
            OBJECT_ID_IN_QUERY
                .captures(url.as_str())
                .or_else(|| OBJECT_ID_IN_PATH.captures(url.as_str()))
                .map(|captures| captures[1].to_string())
        })
}

fn session_token(html: &str) -> Option<String> {
    SESSION_TOKEN
        .captures(html)
        .map(|captures| captures[1].to_string())
}

/// All distinct file identifiers in `html`, in first-seen order.
fn file_identifiers(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    FILE_ID
        .find_iter(html)
        .map(|found| found.as_str().to_string())
        .filter(|file_id| seen.insert(file_id.clone()))
        .collect()
}
