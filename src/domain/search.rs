//! Search query parsing and recent search history.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Location, Money};
use crate::domain::filters::{CategoryRef, ListingFilter, PriceRange, SortOrder};

/// Number of recent search terms kept by default.
pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// Upper bound on terms kept when loading a stored list, before the configured
/// capacity is applied.
pub const MAX_STORED_RECENT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPrefix {
    Category,
    Location,
    Price,
}

impl SearchPrefix {
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Self::Category),
            '@' => Some(Self::Location),
            '$' => Some(Self::Price),
            _ => None,
        }
    }
}

const SORT_PREFIX: &str = "sort:";

/// Parses a search box entry into a listing filter.
///
/// `#bikes` sets the category hint, `@Lyon` the location, `$100-300`,
/// `$-300` or `$100-` the price range and `sort:price_asc` the order.
/// Everything else, including tokens that fail to parse, forms the query.
#[must_use]
pub fn parse_search_query(input: &str) -> ListingFilter {
    let mut filter = ListingFilter::new();
    let mut words: Vec<&str> = Vec::new();

    for token in input.split_whitespace() {
        if let Some(order) = token.strip_prefix(SORT_PREFIX) {
            match SortOrder::parse(order) {
                Some(order) => filter.sort = order,
                None => words.push(token),
            }
            continue;
        }

        let mut chars = token.chars();
        let prefix = chars.next().and_then(SearchPrefix::from_char);
        let rest = chars.as_str();

        match prefix {
            Some(SearchPrefix::Category) if !rest.is_empty() => {
                filter.category = Some(CategoryRef::hint(rest));
            }
            Some(SearchPrefix::Location) => match Location::named(rest) {
                Some(location) => filter.location = Some(location),
                None => words.push(token),
            },
            Some(SearchPrefix::Price) => match parse_price_range(rest) {
                Some((min, max)) => filter.price = PriceRange { min, max },
                None => words.push(token),
            },
            _ => words.push(token),
        }
    }

    filter.with_query(words.join(" "))
}

fn parse_price_range(value: &str) -> Option<(Option<i64>, Option<i64>)> {
    let (min, max) = value.split_once('-')?;
    let parse = |part: &str| -> Option<Option<i64>> {
        if part.is_empty() {
            Some(None)
        } else {
            Money::parse_cents(part).map(Some)
        }
    };
    let (min, max) = (parse(min)?, parse(max)?);
    if min.is_none() && max.is_none() {
        return None;
    }
    Some((min, max))
}

/// Bounded, most-recent-first list of search terms.
///
/// Persisted as a plain array. Loading de-duplicates and keeps up to
/// [`MAX_STORED_RECENT`] terms; callers apply the configured capacity with
/// [`RecentSearches::set_capacity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RecentSearches {
    terms: Vec<String>,
    capacity: usize,
}

impl RecentSearches {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RECENT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Changes the capacity, dropping the oldest terms beyond it.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.terms.truncate(self.capacity);
    }

    /// Records a term. Returns `false` for blank input.
    pub fn add(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        self.remove(term);
        self.terms.insert(0, term.to_string());
        self.terms.truncate(self.capacity);
        true
    }

    /// Removes a term, ignoring case.
    pub fn remove(&mut self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        let before = self.terms.len();
        self.terms.retain(|existing| existing.to_lowercase() != term);
        self.terms.len() != before
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentSearches {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<String>> for RecentSearches {
    fn from(terms: Vec<String>) -> Self {
        let mut recent = Self::with_capacity(MAX_STORED_RECENT);
        // Oldest first so the stored order survives the front insertions.
        for term in terms.iter().rev() {
            recent.add(term);
        }
        recent
    }
}

impl From<RecentSearches> for Vec<String> {
    fn from(recent: RecentSearches) -> Self {
        recent.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_plain_query() {
        let filter = parse_search_query("  road   bike ");
        assert_eq!(filter.query.as_deref(), Some("road bike"));
        assert!(filter.category.is_none());
    }

    #[test]
    fn test_parse_all_prefixes() {
        let filter = parse_search_query("#bikes vintage @Lyon $100-300 sort:price_asc");
        assert_eq!(filter.query.as_deref(), Some("vintage"));
        assert_eq!(filter.category, Some(CategoryRef::hint("bikes")));
        assert_eq!(filter.location.map(|l| l.name), Some("Lyon".to_string()));
        assert_eq!(filter.price.min, Some(10_000));
        assert_eq!(filter.price.max, Some(30_000));
        assert_eq!(filter.sort, SortOrder::PriceAsc);
    }

    #[test_case("$-300", None, Some(30_000) ; "max only")]
    #[test_case("$100-", Some(10_000), None ; "min only")]
    #[test_case("$9.99-12.5", Some(999), Some(1250) ; "decimals")]
    fn test_parse_price_forms(token: &str, min: Option<i64>, max: Option<i64>) {
        let filter = parse_search_query(token);
        assert_eq!(filter.price.min, min);
        assert_eq!(filter.price.max, max);
        assert!(filter.query.is_none());
    }

    #[test_case("$abc" ; "not a number")]
    #[test_case("$-" ; "no bounds")]
    #[test_case("$100" ; "missing dash")]
    #[test_case("sort:cheapest" ; "unknown sort")]
    #[test_case("#" ; "bare hash")]
    #[test_case("@" ; "bare at")]
    fn test_malformed_tokens_stay_in_query(token: &str) {
        let filter = parse_search_query(token);
        assert_eq!(filter.query.as_deref(), Some(token));
        assert!(filter.price.is_empty());
    }

    #[test]
    fn test_recent_most_recent_first() {
        let mut recent = RecentSearches::new();
        recent.add("lamp");
        recent.add("bike");
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["bike", "lamp"]);
    }

    #[test]
    fn test_recent_dedup_moves_to_front_with_new_spelling() {
        let mut recent = RecentSearches::new();
        recent.add("Bike");
        recent.add("lamp");
        recent.add(" bike ");
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["bike", "lamp"]);
    }

    #[test]
    fn test_recent_ignores_blank_and_bounds_capacity() {
        let mut recent = RecentSearches::with_capacity(3);
        assert!(!recent.add("   "));
        for term in ["a", "b", "c", "d"] {
            recent.add(term);
        }
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["d", "c", "b"]);
        recent.set_capacity(1);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_recent_remove_and_clear() {
        let mut recent = RecentSearches::new();
        recent.add("Desk");
        assert!(recent.remove("desk"));
        assert!(!recent.remove("desk"));
        recent.add("chair");
        recent.clear();
        assert!(recent.is_empty());
    }

    #[test]
    fn test_recent_load_keeps_stored_terms() {
        let mut stored: Vec<String> = (0..15).map(|i| format!("term {i}")).collect();
        stored.push("TERM 3".into());
        let json = serde_json::to_string(&stored).unwrap();
        let mut recent: RecentSearches = serde_json::from_str(&json).unwrap();

        assert_eq!(recent.len(), 15);
        assert_eq!(recent.iter().next(), Some("term 0"));
        assert_eq!(serde_json::to_value(&recent).unwrap()[0], "term 0");

        recent.set_capacity(DEFAULT_RECENT_CAPACITY);
        assert_eq!(recent.len(), DEFAULT_RECENT_CAPACITY);
        assert_eq!(recent.iter().next(), Some("term 0"));
    }

    #[test]
    fn test_recent_load_is_bounded() {
        let stored: Vec<String> = (0..150).map(|i| format!("term {i}")).collect();
        let recent = RecentSearches::from(stored);
        assert_eq!(recent.len(), MAX_STORED_RECENT);
        assert_eq!(recent.iter().next(), Some("term 0"));
    }
}
