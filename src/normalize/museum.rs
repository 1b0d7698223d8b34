//! Auckland Museum enrichment via the museum's object API.
//!
//! The aggregator's thumbnail for these records is a fixed standard
//! rendering. Stripping the rendering qualifier already improves it; when
//! the record carries a landing URL the museum's own API can name the
//! preferred representation, which serves the original-resolution scan.
//! Every lookup step that falls through keeps the best URL known so far
//! rather than failing the rewrite.

use crate::record::Record;
use crate::search::AssetFetch;
use serde::Deserialize;
use tracing::debug;
use url::Url;

const MUSEUM_API_BASE: &str = "https://api.aucklandmuseum.com";
const STANDARD_RENDERING_TAIL: &str = "?rendering=standard.jpg";
const PREFERRED_REPRESENTATION_SET: &str = "am_preferredrepresentation";

/// Object description returned by the museum API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MuseumObjectResponse {
    /// Field sets describing the object, keyed by identifier.
    #[serde(default, rename = "opacObjectFieldSets")]
    pub field_sets: Option<Vec<MuseumFieldSet>>,
}

/// One named group of fields on a museum object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MuseumFieldSet {
    /// Field-set identifier, e.g. the preferred-representation marker.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Fields in this set.
    #[serde(default, rename = "opacObjectFields")]
    pub fields: Option<Vec<MuseumField>>,
}

/// One field value on a museum object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MuseumField {
    /// The field's value.
    #[serde(default)]
    pub value: Option<String>,
}

impl MuseumObjectResponse {
    /// First value of the field set with the given identifier.
    fn field_set_value(&self, identifier: &str) -> Option<&str> {
        self.field_sets
            .as_deref()?
            .iter()
            .find(|set| set.identifier.as_deref() == Some(identifier))?
            .fields
            .as_deref()?
            .iter()
            .find_map(|field| field.value.as_deref())
    }
}

/// Rewrites an Auckland Museum thumbnail, enriching through the object API
/// when possible.
pub(crate) async fn augmented_url<F: AssetFetch>(
    fetcher: &F,
    record: &Record,
    url: &Url,
) -> String {
    let stripped = url.as_str().replace(STANDARD_RENDERING_TAIL, "");

    let Some(object_url) = record.landing_url.as_ref().and_then(object_api_url) else {
        return stripped;
    };

    let object = match fetcher.museum_object(&object_url).await {
        Ok(object) => object,
        Err(err) => {
            debug!(url = %object_url, error = %err, "museum lookup unavailable, keeping stripped url");
            return stripped;
        }
    };

    match object
        .field_set_value(PREFERRED_REPRESENTATION_SET)
        .and_then(media_id)
    {
        Some(media) => {
            format!("{MUSEUM_API_BASE}/id/media/v/{media}?rendering=original.jpg")
        }
        None => stripped,
    }
}

/// Derives the object API URL from a landing page URL.
///
/// The landing page ends in a composite identifier such as
/// `am_humanhistory-object-560`; its dash-separated tokens are the object's
/// API path segments.
fn object_api_url(landing: &Url) -> Option<Url> {
    let slug = landing
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()?;
    let slug = slug.strip_prefix("am_").unwrap_or(slug);

    let path: Vec<&str> = slug.split('-').filter(|token| !token.is_empty()).collect();
    if path.len() < 2 {
        return None;
    }

    Url::parse(&format!("{MUSEUM_API_BASE}/id/{}", path.join("/"))).ok()
}

/// Numeric media id from a preferred-representation value such as
/// `am_media-123456`.
fn media_id(value: &str) -> Option<&str> {
    let token = value.rsplit('-').next()?;
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(token)
}
