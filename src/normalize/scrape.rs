//! Landing-page scrape for collections whose full-size media URL only
//! appears in page markup.

use super::splice_id;
use crate::record::Record;
use crate::search::AssetFetch;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

const ID_START_MARKER: &str = "collection/";
const ID_END_MARKER: &str = "/preview";

/// Rewrites a thumbnail by scraping the record's landing page.
///
/// The landing page advertises its share image in an `og:image` meta tag,
/// which points at the preview rendering; the media id inside it is spliced
/// into the full-size template. Any network or parse failure keeps the
/// original URL.
pub(crate) async fn landing_image_url<F: AssetFetch>(
    fetcher: &F,
    record: &Record,
    url: &Url,
) -> String {
    let original = url.as_str().to_string();

    let Some(landing) = record.landing_url.as_ref() else {
        return original;
    };

    let html = match fetcher.fetch_html(landing).await {
        Ok(html) => html,
        Err(err) => {
            debug!(url = %landing, error = %err, "landing page unavailable, keeping original url");
            return original;
        }
    };

    match og_image_content(&html) {
        Some(share_image) => splice_id(&share_image, ID_START_MARKER, ID_END_MARKER, |id| {
            format!("https://media.tepapa.govt.nz/collection/{id}/full")
        }),
        None => original,
    }
}

/// Content URL of the page's `og:image` meta tag, matched by property value.
fn og_image_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[property="og:image"]"#).expect("og:image selector");

    document
        .select(&selector)
        .next()?
        .value()
        .attr("content")
        .map(str::to_string)
}
