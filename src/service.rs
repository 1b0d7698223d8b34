//! Single-operation façade composing the sampler and the URL normalizer.

use crate::normalize::UrlNormalizer;
use crate::record::Record;
use crate::sampler::RecordSampler;
use crate::search::{AssetFetch, RecordSearch};
use crate::weights::CollectionWeights;
use tracing::warn;

/// Serves one normalized image record per call.
///
/// Every failure below the façade aborts the whole pipeline for that call;
/// the failure kind and its context are logged here and the caller only
/// sees a uniform "no result". Internal error kinds never cross this
/// boundary.
pub struct ImageService<C> {
    sampler: RecordSampler<C>,
    normalizer: UrlNormalizer<C>,
}

impl<C> ImageService<C>
where
    C: RecordSearch + AssetFetch + Clone,
{
    /// Builds the service over one upstream client and a weight table.
    pub fn new(client: C, weights: CollectionWeights) -> Self {
        Self {
            sampler: RecordSampler::new(client.clone(), weights),
            normalizer: UrlNormalizer::new(client),
        }
    }

    /// The configured weight table.
    pub fn weights(&self) -> &CollectionWeights {
        self.sampler.weights()
    }

    /// Fetches one normalized image record.
    ///
    /// The collection is `requested` when given, otherwise drawn from the
    /// weight table.
    pub async fn image(&self, requested: Option<&str>) -> Option<Record> {
        let record = match self.sampler.sample(requested).await {
            Ok(record) => record,
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "sampling failed");
                return None;
            }
        };

        match self.normalizer.normalize(&record).await {
            Ok(normalized) => Some(normalized),
            Err(err) => {
                warn!(
                    kind = err.kind(),
                    error = %err,
                    record = %record.summary(),
                    "url rewrite failed"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::museum::MuseumObjectResponse;
    use crate::record::{SearchEnvelope, SearchPage};
    use crate::search::{HeadMetadata, UpstreamError};
    use url::Url;

    /// Upstream stub serving one fixed page of records and no asset fetches.
    #[derive(Clone)]
    struct FixedUpstream {
        result_count: u64,
        page_records: Vec<Record>,
    }

    impl RecordSearch for FixedUpstream {
        async fn search(
            &self,
            collection: &str,
            _page: u64,
            per_page: u64,
        ) -> Result<SearchEnvelope, UpstreamError> {
            let records = if per_page == 0 {
                Vec::new()
            } else {
                self.page_records
                    .iter()
                    .cloned()
                    .map(|mut record| {
                        record.collection = Some(collection.to_string());
                        record
                    })
                    .collect()
            };
            Ok(SearchEnvelope {
                search: Some(SearchPage {
                    result_count: Some(self.result_count),
                    results: Some(records),
                }),
            })
        }
    }

    impl AssetFetch for FixedUpstream {
        async fn fetch_html(&self, _url: &Url) -> Result<String, UpstreamError> {
            Err(UpstreamError::EmptyBody)
        }

        async fn head_metadata(&self, _url: &Url) -> Result<HeadMetadata, UpstreamError> {
            Err(UpstreamError::EmptyBody)
        }

        async fn museum_object(&self, _url: &Url) -> Result<MuseumObjectResponse, UpstreamError> {
            Err(UpstreamError::EmptyBody)
        }
    }

    fn page_record() -> Record {
        Record {
            id: Some(77),
            title: Some("Regatta day".into()),
            large_thumbnail_url: Some(
                Url::parse("https://images.example.org/items/77/large.jpg").unwrap(),
            ),
            ..Record::default()
        }
    }

    fn service(result_count: u64) -> ImageService<FixedUpstream> {
        ImageService::new(
            FixedUpstream {
                result_count,
                page_records: vec![page_record(); 100],
            },
            CollectionWeights::from_entries([("Canterbury Museum", 1.0)]),
        )
    }

    #[tokio::test]
    async fn requested_collection_is_sampled_and_rewritten() {
        let record = service(150)
            .image(Some("Canterbury Museum"))
            .await
            .expect("image");

        assert_eq!(record.collection.as_deref(), Some("Canterbury Museum"));
        assert_eq!(
            record.large_thumbnail_url.as_ref().map(Url::as_str),
            Some("https://images.example.org/items/77/xlarge.jpg")
        );
    }

    #[tokio::test]
    async fn failures_collapse_to_a_uniform_no_result() {
        // Too few records for one page: the sampler fails internally and the
        // caller only observes the absence of a record.
        assert!(service(50).image(Some("Canterbury Museum")).await.is_none());

        // Unknown collection: the rewrite fails internally, same signal.
        assert!(service(150).image(Some("Private Shoebox")).await.is_none());
    }
}
