//! Collection-keyed rewriting of thumbnail URLs into directly fetchable
//! full-resolution image URLs.
//!
//! Each contributing institution publishes its assets through a different,
//! mostly undocumented URL scheme, so every collection name maps to one
//! rewrite strategy. An unmapped collection is a hard error rather than a
//! silent pass-through; that way a newly onboarded collection fails loudly
//! until it gets a branch here.

pub mod museum;
mod recollect;
mod rosetta;
mod scrape;

use crate::record::Record;
use crate::search::AssetFetch;
use std::error::Error;
use std::fmt;
use url::Url;

const THUMBNAILER_BASE: &str = "https://thumbnailer.digitalnz.org/?format=jpeg&src=";
const RESIZE_PROXY_BASE: &str = "https://images.weserv.nl/?url=";

/// Failures raised while rewriting a record's thumbnail URL.
#[derive(Debug)]
pub enum RewriteError {
    /// The record carries no collection name to dispatch on.
    MissingCollection {
        /// Compact description of the offending record.
        summary: String,
    },
    /// The record's collection has no rewrite strategy.
    UnknownCollection {
        /// The unmapped collection name.
        collection: String,
    },
    /// The record carries no large-thumbnail URL to rewrite.
    MissingSourceUrl {
        /// Collection the record belongs to.
        collection: String,
    },
    /// The rewritten string does not parse back into a URL.
    UrlConstruction {
        /// The rejected candidate string.
        candidate: String,
    },
    /// A collection in the recollect family has no domain mapping.
    DomainLookup {
        /// Collection that failed the lookup.
        collection: String,
    },
    /// A step of the multi-step delivery crawl failed hard.
    CrawlFailed {
        /// Which crawl step failed.
        stage: &'static str,
        /// Failure detail for log context.
        detail: String,
    },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCollection { summary } => {
                write!(f, "record has no collection name: {summary}")
            }
            Self::UnknownCollection { collection } => {
                write!(f, "no rewrite strategy for collection {collection:?}")
            }
            Self::MissingSourceUrl { collection } => {
                write!(f, "record in {collection:?} has no large-thumbnail url")
            }
            Self::UrlConstruction { candidate } => {
                write!(f, "rewritten url does not parse: {candidate:?}")
            }
            Self::DomainLookup { collection } => {
                write!(f, "no recollect domain mapped for collection {collection:?}")
            }
            Self::CrawlFailed { stage, detail } => {
                write!(f, "delivery crawl failed at {stage}: {detail}")
            }
        }
    }
}

impl Error for RewriteError {}

impl RewriteError {
    /// Stable failure-kind label used in log context.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCollection { .. } => "missing_collection",
            Self::UnknownCollection { .. } => "unknown_collection",
            Self::MissingSourceUrl { .. } => "missing_source_url",
            Self::UrlConstruction { .. } => "url_construction_failure",
            Self::DomainLookup { .. } => "dependency_lookup_failure",
            Self::CrawlFailed { .. } => "external_crawl_failure",
        }
    }
}

/// One rewrite strategy, keyed by collection name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Escape the URL and serve it through the aggregator's thumbnailer.
    ThumbnailerEscape,
    /// Strip the standard-rendering tail, then enrich via the museum API.
    MuseumAugment,
    /// Scrape the landing page's og:image and template the media id.
    LandingScrape,
    /// Splice the photo id into the IIIF full-size template.
    KuraIiif,
    /// Replace a fixed size qualifier with a larger one.
    Substitute {
        needle: &'static str,
        replacement: &'static str,
    },
    /// Drop the trailing thumbnail-size qualifier.
    SuffixPrune,
    /// Splice the asset id into the collection's recollect download URL.
    Recollect,
    /// Walk the delivery service for the largest master file.
    DeliveryCrawl,
    /// Escape the URL and serve it through the resizing proxy.
    ResizeProxy,
    /// Serve the URL unchanged.
    Identity,
}

impl Strategy {
    fn for_collection(collection: &str) -> Option<Self> {
        match collection {
            "Auckland Libraries Heritage Images Collection" => Some(Self::ThumbnailerEscape),
            "Auckland Museum Collections" => Some(Self::MuseumAugment),
            "Te Papa Collections Online" => Some(Self::LandingScrape),
            "Kura Heritage Collections Online" => Some(Self::KuraIiif),
            "Canterbury Museum" | "Culture Waitaki" => Some(Self::Substitute {
                needle: "large",
                replacement: "xlarge",
            }),
            "Auckland Art Gallery Toi o Tāmaki" => Some(Self::Substitute {
                needle: "medium",
                replacement: "xlarge",
            }),
            "Hawke's Bay Knowledge Bank" => Some(Self::SuffixPrune),
            "Antarctica NZ Digital Asset Manager"
            | "Tauranga City Libraries Other Collection"
            | "Upper Hutt City Library Heritage Collections"
            | "Presbyterian Research Centre"
            | "National Army Museum"
            | "Wellington City Recollect"
            | "Tāmiro" => Some(Self::Recollect),
            "TAPUHI" => Some(Self::DeliveryCrawl),
            "Alexander Turnbull Library Flickr" => Some(Self::ResizeProxy),
            "National Publicity Studios black and white file prints"
            | "Picture Wairarapa"
            | "South Canterbury Museum"
            | "Howick Historical Village NZMuseums"
            | "Waimate Museum and Archives PastPerfect"
            | "Te Toi Uku, Crown Lynn and Clayworks Museum"
            | "Te Hikoi Museum"
            | "V.C. Browne & Son NZ Aerial Photograph Collection"
            | "He Purapura Marara Scattered Seeds" => Some(Self::Identity),
            _ => None,
        }
    }
}

/// Rewrites a record's large-thumbnail URL according to its collection.
#[derive(Debug, Clone)]
pub struct UrlNormalizer<F> {
    fetcher: F,
}

impl<F: AssetFetch> UrlNormalizer<F> {
    /// Builds a normalizer over the given auxiliary fetcher.
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Returns a copy of `record` whose large-thumbnail URL is replaced by
    /// the strategy output for its collection.
    ///
    /// The input record is never mutated. Strategies that consult external
    /// services degrade to the best URL already known when a lookup step
    /// falls through; only the documented hard failures surface as errors.
    pub async fn normalize(&self, record: &Record) -> Result<Record, RewriteError> {
        let collection =
            record
                .collection
                .as_deref()
                .ok_or_else(|| RewriteError::MissingCollection {
                    summary: record.summary(),
                })?;
        let strategy =
            Strategy::for_collection(collection).ok_or_else(|| RewriteError::UnknownCollection {
                collection: collection.to_string(),
            })?;
        let url = record
            .large_thumbnail_url
            .as_ref()
            .ok_or_else(|| RewriteError::MissingSourceUrl {
                collection: collection.to_string(),
            })?;

        let candidate = match strategy {
            Strategy::Identity => url.as_str().to_string(),
            Strategy::ThumbnailerEscape => thumbnailer_url(url),
            Strategy::ResizeProxy => resize_proxy_url(url),
            Strategy::Substitute {
                needle,
                replacement,
            } => url.as_str().replace(needle, replacement),
            Strategy::SuffixPrune => prune_size_suffix(url.as_str()),
            Strategy::KuraIiif => splice_id(url.as_str(), "/image/photos/", "/default.jpg", |id| {
                format!("https://kura.aucklandlibraries.govt.nz/iiif/2/photos:{id}/full/2048,/0/default.jpg")
            }),
            Strategy::Recollect => recollect::download_url(url.as_str(), collection)?,
            Strategy::MuseumAugment => museum::augmented_url(&self.fetcher, record, url).await,
            Strategy::LandingScrape => scrape::landing_image_url(&self.fetcher, record, url).await,
            Strategy::DeliveryCrawl => rosetta::crawl(&self.fetcher, record).await?,
        };

        let rewritten = Url::parse(&candidate)
            .map_err(|_| RewriteError::UrlConstruction { candidate })?;

        let mut normalized = record.clone();
        normalized.large_thumbnail_url = Some(rewritten);
        Ok(normalized)
    }
}

/// Escapes `url` and embeds it in the aggregator's jpeg thumbnailer.
pub(crate) fn thumbnailer_url(url: &Url) -> String {
    format!("{THUMBNAILER_BASE}{}", urlencoding::encode(url.as_str()))
}

fn resize_proxy_url(url: &Url) -> String {
    format!("{RESIZE_PROXY_BASE}{}", urlencoding::encode(url.as_str()))
}

/// Returns the substring strictly between `start` and `end`, searching for
/// `end` only after the first occurrence of `start`.
pub(crate) fn slice_between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let to = haystack[from..].find(end)? + from;
    Some(&haystack[from..to])
}

/// Splices the id found between `start` and `end` into `template`, or
/// returns `url` unchanged when the markers are not both present.
pub(crate) fn splice_id(
    url: &str,
    start: &str,
    end: &str,
    template: impl FnOnce(&str) -> String,
) -> String {
    match slice_between(url, start, end) {
        Some(id) => template(id),
        None => url.to_string(),
    }
}

/// Removes the 8-character size qualifier that sits 12 characters from the
/// end of multi-dash URLs (`...photo-1962-150x150.jpg` keeps its extension
/// but loses `-150x150`). Single-dash or short URLs pass through unchanged.
fn prune_size_suffix(url: &str) -> String {
    if url.matches('-').count() <= 1 || url.len() < 12 {
        return url.to_string();
    }

    let start = url.len() - 12;
    let end = url.len() - 4;
    if !url.is_char_boundary(start) || !url.is_char_boundary(end) {
        return url.to_string();
    }

    format!("{}{}", &url[..start], &url[end..])
}
