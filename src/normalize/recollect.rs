//! Download-URL rewriting for collections hosted on recollect sites.

use super::{splice_id, RewriteError};

const ID_START_MARKER: &str = "display/";
const ID_END_MARKER: &str = "-600";

/// Hosting domain for each collection on the recollect platform.
fn domain_for(collection: &str) -> Option<&'static str> {
    match collection {
        "Antarctica NZ Digital Asset Manager" => Some("antarctica.recollect.co.nz"),
        "Tauranga City Libraries Other Collection" => Some("paekoroki.tauranga.govt.nz"),
        "Upper Hutt City Library Heritage Collections" => Some("uhcl.recollect.co.nz"),
        "Presbyterian Research Centre" => Some("prc.recollect.co.nz"),
        "National Army Museum" => Some("nam.recollect.co.nz"),
        "Wellington City Recollect" => Some("wellington.recollect.co.nz"),
        "Tāmiro" => Some("massey.recollect.co.nz"),
        _ => None,
    }
}

/// Rewrites a recollect display URL into the site's download endpoint.
///
/// The asset id sits between the display marker and the `-600` size
/// qualifier; when either marker is missing the URL passes through
/// unchanged. A collection without a domain mapping is a hard failure.
pub(crate) fn download_url(url: &str, collection: &str) -> Result<String, RewriteError> {
    let domain = domain_for(collection).ok_or_else(|| RewriteError::DomainLookup {
        collection: collection.to_string(),
    })?;

    Ok(splice_id(url, ID_START_MARKER, ID_END_MARKER, |id| {
        format!("https://{domain}/assets/downloadwiz/{id}")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splices_asset_id_into_download_endpoint() {
        let out = download_url(
            "https://paekoroki.tauranga.govt.nz/nodes/display/55210-600x.jpg",
            "Tauranga City Libraries Other Collection",
        )
        .expect("mapped collection");
        assert_eq!(
            out,
            "https://paekoroki.tauranga.govt.nz/assets/downloadwiz/55210"
        );
    }

    #[test]
    fn missing_marker_passes_through_unchanged() {
        let url = "https://antarctica.recollect.co.nz/nodes/view/1234.jpg";
        let out = download_url(url, "Antarctica NZ Digital Asset Manager").expect("mapped");
        assert_eq!(out, url);
    }

    #[test]
    fn unmapped_collection_is_a_domain_lookup_failure() {
        let err = download_url("https://example.org/display/1-600", "Elsewhere Museum")
            .unwrap_err();
        assert!(matches!(err, RewriteError::DomainLookup { .. }));
    }
}
