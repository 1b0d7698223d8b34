use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use nzimage::{CollectionWeights, ImageService, SearchClient};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "nzimage-api",
    about = "HTTP API serving one normalized heritage image record per request"
)]
struct ApiCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "NZIMAGE_BIND", default_value = "127.0.0.1:8001")]
    bind: String,

    /// Aggregator API key sent with search requests.
    #[arg(long, env = "DIGITALNZ_API_KEY")]
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageQuery {
    collection: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = ApiCli::parse();
    let client = SearchClient::new(cli.api_key).context("failed to build search client")?;
    let service = Arc::new(ImageService::new(client, CollectionWeights::default()));

    let app = Router::new()
        .route("/image", get(image_handler))
        .with_state(service);

    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;
    println!("nzimage-api listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server shutdown")?;
    Ok(())
}

async fn image_handler(
    State(service): State<Arc<ImageService<SearchClient>>>,
    Query(query): Query<ImageQuery>,
) -> Response {
    match service.image(query.collection.as_deref()).await {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}
