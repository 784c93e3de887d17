//! Opens marketplace pages in the system browser.

use tracing::{info, warn};

use crate::domain::entities::ListingId;
use crate::domain::errors::ApiError;

#[must_use]
pub fn listing_url(web_url: &str, id: ListingId) -> String {
    format!("{}/listings/{id}", web_url.trim_end_matches('/'))
}

/// # Errors
///
/// Returns an error if no browser could be launched.
pub fn open_listing(web_url: &str, id: ListingId) -> Result<(), ApiError> {
    let url = listing_url(web_url, id);
    info!(listing_id = %id, "Opening listing in browser");
    opener::open_browser(&url).map_err(|e| {
        warn!(error = %e, %url, "Failed to open browser");
        ApiError::unexpected(format!("could not open browser: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url("https://market.example.org/", ListingId(42)),
            "https://market.example.org/listings/42"
        );
    }
}
