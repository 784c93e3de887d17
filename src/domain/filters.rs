//! Listing filter composition.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CategoryId, Location, Money};
use crate::domain::errors::ApiError;

/// Listing sort order as understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Relevance,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Relevance,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Relevance => "relevance",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price ↑",
            Self::PriceDesc => "Price ↓",
            Self::Relevance => "Relevance",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Next order in the cycle used by the sort key.
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::Newest => Self::PriceAsc,
            Self::PriceAsc => Self::PriceDesc,
            Self::PriceDesc => Self::Relevance,
            Self::Relevance => Self::Newest,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category criterion. `id` is unset while it is only a name hint typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: Option<CategoryId>,
    pub name: String,
}

impl CategoryRef {
    #[must_use]
    pub fn resolved(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn hint(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.id.is_some()
    }
}

/// Price bounds in cents, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl PriceRange {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    #[must_use]
    pub fn label(&self) -> Option<String> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some(format!(
                "{} - {}",
                Money::format_cents(min),
                Money::format_cents(max)
            )),
            (Some(min), None) => Some(format!("≥ {}", Money::format_cents(min))),
            (None, Some(max)) => Some(format!("≤ {}", Money::format_cents(max))),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingFilter {
    pub query: Option<String>,
    pub category: Option<CategoryRef>,
    pub location: Option<Location>,
    pub price: PriceRange,
    pub sort: SortOrder,
}

impl ListingFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text query; blank text clears it.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into().trim().to_string();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: CategoryRef) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub const fn with_price(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.price = PriceRange { min, max };
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn clear_query(&mut self) {
        self.query = None;
    }

    pub fn clear_category(&mut self) {
        self.category = None;
    }

    pub fn clear_location(&mut self) {
        self.location = None;
    }

    pub fn clear_price(&mut self) {
        self.price = PriceRange::default();
    }

    /// Resets every criterion and the sort order.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when no criterion is set. Sort order does not count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.price.is_empty()
    }

    /// Rejects an inverted or negative price range.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let (Some(min), Some(max)) = (self.price.min, self.price.max)
            && min > max
        {
            return Err(ApiError::validation(format!(
                "Minimum price {} is above maximum {}",
                Money::format_cents(min),
                Money::format_cents(max)
            )));
        }
        if self.price.min.is_some_and(|p| p < 0) || self.price.max.is_some_and(|p| p < 0) {
            return Err(ApiError::validation("Prices cannot be negative"));
        }
        Ok(())
    }

    /// Query parameters for `GET /listings`, in a stable order.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(query) = &self.query {
            pairs.push(("q", query.clone()));
        }
        if let Some(category) = &self.category {
            match category.id {
                Some(id) => pairs.push(("category", id.to_string())),
                None => pairs.push(("category", category.name.clone())),
            }
        }
        if let Some(location) = &self.location {
            pairs.push(("location", location.name.clone()));
            pairs.push(("radius_km", location.radius_km.to_string()));
        }
        if let Some(min) = self.price.min {
            pairs.push(("min_price", Money::format_cents(min)));
        }
        if let Some(max) = self.price.max {
            pairs.push(("max_price", Money::format_cents(max)));
        }
        if self.sort != SortOrder::Newest {
            pairs.push(("sort", self.sort.as_str().to_string()));
        }

        pairs
    }

    /// Labels for the active criteria.
    #[must_use]
    pub fn chips(&self) -> Vec<String> {
        let mut chips = Vec::new();
        if let Some(query) = &self.query {
            chips.push(format!("\"{query}\""));
        }
        if let Some(category) = &self.category {
            chips.push(format!("#{}", category.name));
        }
        if let Some(location) = &self.location {
            chips.push(format!("@{}", location.label()));
        }
        if let Some(price) = self.price.label() {
            chips.push(format!("${price}"));
        }
        if self.sort != SortOrder::Newest {
            chips.push(format!("sort: {}", self.sort.label()));
        }
        chips
    }

    /// Overlays the criteria set in `other`. A non-default sort in `other` wins.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            query: other.query.clone().or_else(|| self.query.clone()),
            category: other.category.clone().or_else(|| self.category.clone()),
            location: other.location.clone().or_else(|| self.location.clone()),
            price: PriceRange {
                min: other.price.min.or(self.price.min),
                max: other.price.max.or(self.price.max),
            },
            sort: if other.sort == SortOrder::Newest {
                self.sort
            } else {
                other.sort
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_pairs() {
        let filter = ListingFilter::new();
        assert!(filter.is_empty());
        assert!(filter.to_query_pairs().is_empty());
        assert!(filter.chips().is_empty());
    }

    #[test]
    fn test_sort_does_not_count_as_criterion() {
        let filter = ListingFilter::new().with_sort(SortOrder::PriceAsc);
        assert!(filter.is_empty());
        assert_eq!(filter.to_query_pairs(), vec![("sort", "price_asc".into())]);
    }

    #[test]
    fn test_query_pairs_stable_order() {
        let filter = ListingFilter::new()
            .with_sort(SortOrder::PriceDesc)
            .with_price(Some(10_000), Some(30_050))
            .with_location(Location::named("Lyon").unwrap().with_radius(10))
            .with_category(CategoryRef::resolved(CategoryId(4), "Bikes"))
            .with_query("  road bike ");

        assert_eq!(
            filter.to_query_pairs(),
            vec![
                ("q", "road bike".to_string()),
                ("category", "4".to_string()),
                ("location", "Lyon".to_string()),
                ("radius_km", "10".to_string()),
                ("min_price", "100.00".to_string()),
                ("max_price", "300.50".to_string()),
                ("sort", "price_desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let filter = ListingFilter::new().with_price(Some(500), Some(100));
        let err = filter.validate().unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));

        assert!(
            ListingFilter::new()
                .with_price(Some(100), Some(100))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_blank_query_clears() {
        let filter = ListingFilter::new().with_query("bike").with_query("   ");
        assert!(filter.query.is_none());
    }

    #[test]
    fn test_merge_overlays_set_fields() {
        let base = ListingFilter::new()
            .with_location(Location::named("Paris").unwrap())
            .with_query("old")
            .with_sort(SortOrder::PriceAsc);
        let parsed = ListingFilter::new().with_query("lamp").with_price(None, Some(2000));

        let merged = base.merge(&parsed);
        assert_eq!(merged.query.as_deref(), Some("lamp"));
        assert_eq!(merged.location.as_ref().map(|l| l.name.as_str()), Some("Paris"));
        assert_eq!(merged.price.max, Some(2000));
        assert_eq!(merged.sort, SortOrder::PriceAsc);
    }

    #[test]
    fn test_chips() {
        let filter = ListingFilter::new()
            .with_category(CategoryRef::hint("bikes"))
            .with_price(Some(1000), None);
        assert_eq!(filter.chips(), vec!["#bikes", "$≥ 10.00"]);
    }

    #[test]
    fn test_sort_cycle_and_parse() {
        assert_eq!(SortOrder::Relevance.cycle(), SortOrder::Newest);
        assert_eq!(SortOrder::parse("PRICE_ASC"), Some(SortOrder::PriceAsc));
        assert_eq!(SortOrder::parse("cheapest"), None);
    }
}
