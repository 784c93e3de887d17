//! Request and response bodies of the marketplace REST API.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CategoryId, ListingId, Money, User, UserStatus};
use crate::domain::ports::NewListing;

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Error body; the backend uses either key.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageBody<'a> {
    pub body: &'a str,
    pub client_nonce: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StartConversationBody<'a> {
    pub listing_id: ListingId,
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UserStatusBody {
    pub status: UserStatus,
}

#[derive(Debug, Serialize)]
pub struct CreateListingBody<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// Decimal string, e.g. `"12.50"`.
    pub price: String,
    pub currency: &'a str,
    pub category_id: Option<CategoryId>,
    pub location: Option<&'a str>,
}

impl<'a> From<&'a NewListing> for CreateListingBody<'a> {
    fn from(listing: &'a NewListing) -> Self {
        Self {
            title: &listing.title,
            description: &listing.description,
            price: Money::format_cents(listing.price.cents()),
            currency: listing.price.currency(),
            category_id: listing.category_id,
            location: listing.location.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_fallback() {
        let body: ErrorResponse = serde_json::from_str(r#"{"error":"listing sold"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("listing sold"));

        let body: ErrorResponse = serde_json::from_str(r#"{"message":" "}"#).unwrap();
        assert!(body.into_message().is_none());
    }

    #[test]
    fn test_create_listing_body_sends_decimal_price() {
        let listing = NewListing::new("Desk", Money::new(1250, "eur")).with_category(CategoryId(3));
        let json = serde_json::to_value(CreateListingBody::from(&listing)).unwrap();
        assert_eq!(json["price"], "12.50");
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["category_id"], 3);
        assert!(json["location"].is_null());
    }
}
