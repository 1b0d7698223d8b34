//! Two-phase random record selection against the paginated search API.

use crate::record::Record;
use crate::search::{RecordSearch, UpstreamError};
use crate::weights::CollectionWeights;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fmt;
use tracing::debug;

/// Fixed page size for the second-phase fetch.
pub const RESULTS_PER_PAGE: u64 = 100;

/// Failures raised while sampling one record.
#[derive(Debug)]
pub enum SampleError {
    /// The collection holds fewer matching records than one full page.
    NoResults {
        /// Collection that was probed.
        collection: String,
        /// Total matching records reported by the count probe.
        result_count: u64,
    },
    /// A response envelope was missing its count or result sequence.
    IncompleteEnvelope {
        /// Collection that was queried.
        collection: String,
        /// Which request produced the envelope.
        phase: &'static str,
    },
    /// The drawn position was beyond the fetched page.
    ///
    /// Reachable whenever the final page of a collection carries fewer than
    /// [`RESULTS_PER_PAGE`] records even though the page count was computed
    /// from an earlier total.
    IndexOutOfRange {
        /// Position that was drawn.
        index: usize,
        /// Number of records actually present on the page.
        len: usize,
    },
    /// The selected record lacks id, title or a large thumbnail.
    MissingRequiredFields {
        /// Compact description of the offending record.
        summary: String,
    },
    /// The search transport failed.
    Upstream(UpstreamError),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResults {
                collection,
                result_count,
            } => write!(
                f,
                "collection {collection:?} has only {result_count} matching records, \
                 fewer than one page"
            ),
            Self::IncompleteEnvelope { collection, phase } => {
                write!(f, "{phase} for {collection:?} returned an incomplete envelope")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "drawn position {index} is outside the fetched page of {len}")
            }
            Self::MissingRequiredFields { summary } => {
                write!(f, "sampled record is missing required fields: {summary}")
            }
            Self::Upstream(err) => write!(f, "search request failed: {err}"),
        }
    }
}

impl Error for SampleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UpstreamError> for SampleError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(err)
    }
}

impl SampleError {
    /// Stable failure-kind label used in log context.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoResults { .. } => "no_results",
            Self::IncompleteEnvelope { .. } => "incomplete_envelope",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::MissingRequiredFields { .. } => "missing_required_fields",
            Self::Upstream(err) => err.kind(),
        }
    }
}

/// Draws one raw candidate record from a weighted or requested collection.
pub struct RecordSampler<C> {
    client: C,
    weights: CollectionWeights,
}

impl<C: RecordSearch> RecordSampler<C> {
    /// Builds a sampler over `client` with the given weight table.
    pub fn new(client: C, weights: CollectionWeights) -> Self {
        Self { client, weights }
    }

    /// The configured weight table.
    pub fn weights(&self) -> &CollectionWeights {
        &self.weights
    }

    /// Samples one record, drawing page and position from a fresh OS-seeded RNG.
    pub async fn sample(&self, requested: Option<&str>) -> Result<Record, SampleError> {
        self.sample_with(requested, &mut StdRng::from_os_rng()).await
    }

    /// Samples one record using the provided RNG for every draw.
    ///
    /// The collection is `requested` when given, otherwise a weighted pick.
    /// A count probe sizes the search space, then one fixed-size page is
    /// fetched and a single position on it is drawn.
    pub async fn sample_with<R: Rng + Send>(
        &self,
        requested: Option<&str>,
        rng: &mut R,
    ) -> Result<Record, SampleError> {
        let collection = match requested {
            Some(name) => name,
            None => self.weights.weighted_pick(rng),
        };

        debug!(collection, "issuing count probe");
        let probe = self
            .client
            .search(collection, 1, 0)
            .await?
            .validated()
            .ok_or_else(|| SampleError::IncompleteEnvelope {
                collection: collection.to_string(),
                phase: "count probe",
            })?;

        let page_count = probe.result_count / RESULTS_PER_PAGE;
        if page_count == 0 {
            return Err(SampleError::NoResults {
                collection: collection.to_string(),
                result_count: probe.result_count,
            });
        }

        let page = rng.random_range(1..=page_count);
        debug!(collection, page, page_count, "fetching sample page");
        let fetched = self
            .client
            .search(collection, page, RESULTS_PER_PAGE)
            .await?
            .validated()
            .ok_or_else(|| SampleError::IncompleteEnvelope {
                collection: collection.to_string(),
                phase: "page fetch",
            })?;

        let position = rng.random_range(0..RESULTS_PER_PAGE as usize);
        let record = fetched
            .results
            .get(position)
            .ok_or(SampleError::IndexOutOfRange {
                index: position,
                len: fetched.results.len(),
            })?;

        if !record.is_sampleable() {
            return Err(SampleError::MissingRequiredFields {
                summary: record.summary(),
            });
        }

        Ok(record.clone())
    }
}
