use anyhow::{Context, Result};
use clap::Parser;
use nzimage::{AssetFetch, CollectionWeights, ImageService, SearchClient};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const PROBE_DELAY: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(
    name = "collection-tester",
    about = "Samples every configured collection and validates the normalized image URLs"
)]
struct TesterCli {
    /// Only test collections whose name contains this text.
    filter: Option<String>,

    /// Samples per collection.
    #[arg(long, default_value_t = 5)]
    samples: usize,

    /// Aggregator API key sent with search requests.
    #[arg(long, env = "DIGITALNZ_API_KEY")]
    api_key: Option<String>,
}

#[derive(Default)]
struct CollectionOutcome {
    fetched: usize,
    fetch_failures: usize,
    valid_urls: usize,
    invalid_urls: usize,
    incomplete_records: usize,
    sample_failure: Option<String>,
}

impl CollectionOutcome {
    fn attempts(&self) -> usize {
        self.fetched + self.fetch_failures
    }

    fn success_rate(&self) -> f64 {
        if self.attempts() == 0 {
            return 0.0;
        }
        self.valid_urls as f64 / self.attempts() as f64 * 100.0
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = TesterCli::parse();
    let client = SearchClient::new(cli.api_key).context("failed to build search client")?;
    let service = ImageService::new(client.clone(), CollectionWeights::default());

    let collections: Vec<String> = service
        .weights()
        .names()
        .filter(|name| {
            cli.filter
                .as_deref()
                .map_or(true, |filter| name.contains(filter))
        })
        .map(str::to_string)
        .collect();

    println!(
        "testing {} collections with {} samples each",
        collections.len(),
        cli.samples
    );

    let mut outcomes = Vec::with_capacity(collections.len());
    for collection in &collections {
        println!("--- {collection}");
        let mut outcome = CollectionOutcome::default();

        for attempt in 1..=cli.samples {
            let Some(record) = service.image(Some(collection.as_str())).await else {
                println!("  [{attempt}/{}] no result", cli.samples);
                outcome.fetch_failures += 1;
                continue;
            };
            outcome.fetched += 1;
            if !record.is_fully_populated() {
                outcome.incomplete_records += 1;
            }

            let Some(url) = record.large_thumbnail_url.as_ref() else {
                println!("  [{attempt}/{}] record has no image url", cli.samples);
                outcome.invalid_urls += 1;
                continue;
            };

            match client.head_metadata(url).await {
                Ok(metadata) => {
                    outcome.valid_urls += 1;
                    println!(
                        "  [{attempt}/{}] ok {} ({} bytes)",
                        cli.samples,
                        url,
                        metadata
                            .content_length
                            .map_or_else(|| String::from("?"), |len| len.to_string())
                    );
                }
                Err(err) => {
                    outcome.invalid_urls += 1;
                    outcome.sample_failure = Some(format!("{url}: {err}"));
                    println!("  [{attempt}/{}] failed {url}: {err}", cli.samples);
                }
            }

            sleep(PROBE_DELAY).await;
        }

        outcomes.push(outcome);
    }

    report(&collections, &outcomes);
    Ok(())
}

fn report(collections: &[String], outcomes: &[CollectionOutcome]) {
    println!();
    println!("--- collection test summary ---");

    let mut total_valid = 0;
    let mut total_attempts = 0;
    for (collection, outcome) in collections.iter().zip(outcomes) {
        total_valid += outcome.valid_urls;
        total_attempts += outcome.attempts();

        println!(
            "{collection}: {}/{} valid ({:.0}%)",
            outcome.valid_urls,
            outcome.attempts(),
            outcome.success_rate()
        );
        if outcome.fetch_failures > 0 {
            println!("  no-result responses: {}", outcome.fetch_failures);
        }
        if outcome.incomplete_records > 0 {
            println!("  incomplete records: {}", outcome.incomplete_records);
        }
        if let Some(failure) = &outcome.sample_failure {
            println!("  sample failure: {failure}");
        }
    }

    println!(
        "overall: {total_valid}/{total_attempts} valid image urls ({:.0}%)",
        if total_attempts == 0 {
            0.0
        } else {
            total_valid as f64 / total_attempts as f64 * 100.0
        }
    );
}
