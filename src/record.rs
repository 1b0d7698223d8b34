//! Wire model for the upstream records API.

use serde::{Deserialize, Serialize};
use url::Url;

/// One metadata item returned by the records search.
///
/// Every field is optional at decode time; the two completeness predicates
/// below define which subsets a consumer may rely on. The serialized form
/// uses the upstream key names, so a record round-trips through the public
/// JSON surface unchanged (the collection travels as `display_collection`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    /// Numeric record identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Item title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Item description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Small thumbnail URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<Url>,
    /// Large thumbnail URL. Rewritten by the URL normalizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_thumbnail_url: Option<Url>,
    /// URL of the digital object itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_url: Option<Url>,
    /// Landing page on the contributing institution's site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_url: Option<Url>,
    /// Origin URL reported by the aggregator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<Url>,
    /// Source URL reported by the aggregator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<Url>,
    /// Name of the contributing collection.
    #[serde(
        default,
        rename = "display_collection",
        skip_serializing_if = "Option::is_none"
    )]
    pub collection: Option<String>,
}

impl Record {
    /// True when the record carries enough to be served: id, title and a
    /// large thumbnail.
    pub fn is_sampleable(&self) -> bool {
        self.id.is_some() && self.title.is_some() && self.large_thumbnail_url.is_some()
    }

    /// Stricter completeness check used by review tooling: id, title,
    /// description, both thumbnails and the collection name.
    pub fn is_fully_populated(&self) -> bool {
        self.id.is_some()
            && self.title.is_some()
            && self.description.is_some()
            && self.thumbnail_url.is_some()
            && self.large_thumbnail_url.is_some()
            && self.collection.is_some()
    }

    /// Compact identification string for log context.
    pub fn summary(&self) -> String {
        format!(
            "record id={:?} title={:?} collection={:?} large_thumbnail={:?}",
            self.id,
            self.title,
            self.collection,
            self.large_thumbnail_url.as_ref().map(Url::as_str)
        )
    }
}

/// Decoded top-level search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchEnvelope {
    /// Search payload; absence marks the envelope invalid.
    #[serde(default)]
    pub search: Option<SearchPage>,
}

/// One page of search results plus the total hit count.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    /// Total matching records across all pages.
    #[serde(default)]
    pub result_count: Option<u64>,
    /// Records on this page.
    #[serde(default)]
    pub results: Option<Vec<Record>>,
}

/// Envelope that passed the non-null validation.
#[derive(Debug, Clone)]
pub struct ValidatedSearch {
    /// Total matching records across all pages.
    pub result_count: u64,
    /// Records on the fetched page.
    pub results: Vec<Record>,
}

impl SearchEnvelope {
    /// Rejects envelopes with a missing payload, count or result sequence.
    ///
    /// "Non-null" is a validation predicate rather than a type constraint:
    /// the upstream API nominally always sends both fields, but an envelope
    /// missing either must never reach the sampling logic.
    pub fn validated(self) -> Option<ValidatedSearch> {
        let page = self.search?;
        Some(ValidatedSearch {
            result_count: page.result_count?,
            results: page.results?,
        })
    }
}
