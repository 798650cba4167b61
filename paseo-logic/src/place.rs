use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::location::Coordinate;

/// Third-party service that renders a QR code image for arbitrary data
const QR_SERVICE_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Pixel size of the generated QR images
const QR_IMAGE_SIZE: &str = "200x200";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, specta::Type)]
/// A point of interest the user can navigate to and unlock on site
pub struct Place {
    /// Unique id within the catalog
    pub id: String,
    pub name: String,
    pub description: String,
    /// Where the place is in the world
    pub coordinate: Coordinate,
    /// Code a scanned QR payload must equal to unlock this place
    pub qr_token: String,
    /// Image or panorama shown once the place is unlocked
    pub content_url: String,
    /// Rendered QR image for `qr_token`, shown in the admin flow
    pub qr_image_url: String,
}

impl Place {
    /// Whether a decoded QR payload unlocks this place. The comparison is
    /// exact, no trimming or case folding is applied.
    pub fn accepts_scan(&self, decoded: &str) -> bool {
        self.qr_token == decoded
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, specta::Type)]
/// Operator-supplied fields for creating or updating a [Place]
pub struct PlaceDraft {
    pub name: String,
    pub description: String,
    pub coordinate: Coordinate,
    pub content_url: String,
}

/// Build the QR-image service URL for a token. The URL is only ever handed
/// to the UI, nothing in this crate fetches it.
pub fn qr_image_url(token: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("size", QR_IMAGE_SIZE)
        .append_pair("data", token)
        .finish();

    format!("{QR_SERVICE_ENDPOINT}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mk_place;
    use url::Url;

    #[test]
    fn test_qr_image_url_encodes_token() {
        let url = Url::parse(&qr_image_url("PASEO360_MUSEO/1&2")).expect("Produced a bad URL");

        let data = url
            .query_pairs()
            .find(|(key, _)| key == "data")
            .expect("No data parameter");
        assert_eq!(data.1, "PASEO360_MUSEO/1&2");

        let size = url
            .query_pairs()
            .find(|(key, _)| key == "size")
            .expect("No size parameter");
        assert_eq!(size.1, "200x200");
    }

    #[test]
    fn test_scan_match_is_exact() {
        let place = mk_place("museo", 10.0, -67.0, "PASEO360_MUSEO");

        assert!(place.accepts_scan("PASEO360_MUSEO"));
        assert!(!place.accepts_scan("paseo360_museo"));
        assert!(!place.accepts_scan("PASEO360_MUSEO "));
        assert!(!place.accepts_scan(" PASEO360_MUSEO"));
        assert!(!place.accepts_scan(""));
    }
}
