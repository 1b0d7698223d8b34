#![warn(missing_docs)]
//! Core library entry points for the nzimage sampling service.
//!
//! The crate answers one question: "give me one representative image from
//! the DigitalNZ aggregator". It picks a source collection (weighted or on
//! request), samples one record from it through a two-phase paged search,
//! and rewrites the record's large-thumbnail URL into a directly fetchable
//! full-resolution URL using collection-specific rules.

pub mod normalize;
pub mod record;
pub mod sampler;
pub mod search;
pub mod service;
pub mod weights;

pub use normalize::{RewriteError, UrlNormalizer};
pub use record::{Record, SearchEnvelope, SearchPage, ValidatedSearch};
pub use sampler::{RecordSampler, SampleError, RESULTS_PER_PAGE};
pub use search::{AssetFetch, HeadMetadata, RecordSearch, SearchClient, UpstreamError};
pub use service::ImageService;
pub use weights::CollectionWeights;
