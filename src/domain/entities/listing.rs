//! Listing entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CategoryId, ListingId, Money, UserId};
use crate::domain::serde_utils::{decimal_cents, null_as_default};

/// Moderation and sale status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Pending,
    Sold,
    Rejected,
}

impl ListingStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Sold => "sold",
            Self::Rejected => "rejected",
        }
    }
}

/// Seller summary embedded in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerSummary {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    id: ListingId,
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(rename = "price", with = "decimal_cents")]
    price_cents: i64,
    #[serde(default = "default_currency")]
    currency: String,
    #[serde(default)]
    category_id: Option<CategoryId>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    seller: SellerSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    images: Vec<String>,
    #[serde(default)]
    status: ListingStatus,
    #[serde(default)]
    is_favorite: bool,
    created_at: DateTime<Utc>,
    #[serde(default)]
    views: u32,
}

fn default_currency() -> String {
    Money::DEFAULT_CURRENCY.to_string()
}

impl Listing {
    #[must_use]
    pub fn new(
        id: impl Into<ListingId>,
        title: impl Into<String>,
        price: &Money,
        seller: SellerSummary,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            price_cents: price.cents(),
            currency: price.currency().to_string(),
            category_id: None,
            category_name: None,
            location: None,
            seller,
            images: Vec::new(),
            status: ListingStatus::Active,
            is_favorite: false,
            created_at,
            views: 0,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, id: CategoryId, name: impl Into<String>) -> Self {
        self.category_id = Some(id);
        self.category_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: ListingStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_favorite(mut self, favorite: bool) -> Self {
        self.is_favorite = favorite;
        self
    }

    #[must_use]
    pub const fn id(&self) -> ListingId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn price(&self) -> Money {
        Money::new(self.price_cents, self.currency.clone())
    }

    #[must_use]
    pub const fn price_cents(&self) -> i64 {
        self.price_cents
    }

    #[must_use]
    pub const fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    #[must_use]
    pub fn category_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or("Uncategorized")
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn location_label(&self) -> &str {
        self.location
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or("Anywhere")
    }

    #[must_use]
    pub const fn seller(&self) -> &SellerSummary {
        &self.seller
    }

    #[must_use]
    pub fn seller_label(&self) -> &str {
        if self.seller.name.is_empty() {
            "Unknown seller"
        } else {
            &self.seller.name
        }
    }

    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    #[must_use]
    pub const fn status(&self) -> ListingStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ListingStatus) {
        self.status = status;
    }

    #[must_use]
    pub const fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn set_favorite(&mut self, favorite: bool) {
        self.is_favorite = favorite;
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn views(&self) -> u32 {
        self.views
    }
}

impl super::Identified for Listing {
    type Id = ListingId;

    fn id(&self) -> ListingId {
        self.id
    }
}
