use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use url::Url;

const DISPLAY_KEYS: [&str; 9] = [
    "id",
    "title",
    "description",
    "thumbnail_url",
    "large_thumbnail_url",
    "object_url",
    "landing_url",
    "source_url",
    "display_collection",
];

#[derive(Parser, Debug)]
#[command(
    name = "collection-fetcher",
    about = "Fetches one image record from a local nzimage-api server"
)]
struct FetcherCli {
    /// Collection to query; a weighted random pick when omitted.
    collection: Option<String>,

    /// Server host.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port.
    #[arg(long, default_value_t = 8001)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = FetcherCli::parse();

    let mut url = Url::parse(&format!("http://{}:{}/image", cli.host, cli.port))
        .context("failed to construct request url")?;
    if let Some(collection) = &cli.collection {
        url.query_pairs_mut().append_pair("collection", collection);
    }

    println!("fetching {url}");
    match &cli.collection {
        Some(collection) => println!("collection: {collection}"),
        None => println!("collection: weighted random pick"),
    }
    println!();

    let response = reqwest::get(url.clone())
        .await
        .with_context(|| format!("request to {url} failed"))?;
    let status = response.status();
    println!("status: {status}");

    if !status.is_success() {
        bail!("server returned no result ({status})");
    }

    let record: Value = response
        .json()
        .await
        .context("response body was not valid JSON")?;

    println!();
    for key in DISPLAY_KEYS {
        if let Some(value) = record.get(key) {
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            println!("  {key:<20} {rendered}");
        }
    }

    Ok(())
}
