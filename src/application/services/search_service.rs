//! Recent searches and fuzzy suggestions for the search box.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::domain::entities::Category;
use crate::domain::filters::{CategoryRef, ListingFilter};
use crate::domain::search::RecentSearches;

/// Upper bound on suggestions shown under the search box.
pub const MAX_SUGGESTIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Recent,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
    pub score: i64,
}

impl Suggestion {
    /// Text inserted into the search box when the suggestion is accepted.
    #[must_use]
    pub fn completion(&self) -> String {
        match self.kind {
            SuggestionKind::Recent => self.text.clone(),
            SuggestionKind::Category => format!("#{}", self.text),
        }
    }
}

pub struct SearchService {
    recent: RecentSearches,
    matcher: SkimMatcherV2,
}

impl SearchService {
    #[must_use]
    pub fn new(recent: RecentSearches) -> Self {
        Self {
            recent,
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }

    #[must_use]
    pub const fn recent(&self) -> &RecentSearches {
        &self.recent
    }

    /// Records a submitted search. Returns `true` if the history changed.
    pub fn record(&mut self, term: &str) -> bool {
        self.recent.add(term)
    }

    pub fn forget(&mut self, term: &str) -> bool {
        self.recent.remove(term)
    }

    pub fn clear_history(&mut self) {
        self.recent.clear();
    }

    /// Recent terms and category names matching `prefix`, best first.
    ///
    /// An empty prefix lists the most recent searches. A `#` prefix only
    /// matches categories.
    #[must_use]
    pub fn suggestions(&self, prefix: &str, categories: &[Category]) -> Vec<Suggestion> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return self
                .recent
                .iter()
                .take(MAX_SUGGESTIONS)
                .map(|term| Suggestion {
                    text: term.to_string(),
                    kind: SuggestionKind::Recent,
                    score: 0,
                })
                .collect();
        }

        let (pattern, categories_only) = match prefix.strip_prefix('#') {
            Some(rest) => (rest, true),
            None => (prefix, false),
        };

        let mut matches: Vec<Suggestion> = Vec::new();
        if !categories_only {
            matches.extend(self.recent.iter().filter_map(|term| {
                self.matcher
                    .fuzzy_match(term, pattern)
                    .map(|score| Suggestion {
                        text: term.to_string(),
                        kind: SuggestionKind::Recent,
                        score,
                    })
            }));
        }
        matches.extend(categories.iter().filter_map(|category| {
            self.matcher
                .fuzzy_match(category.name(), pattern)
                .map(|score| Suggestion {
                    text: category.name().to_string(),
                    kind: SuggestionKind::Category,
                    score,
                })
        }));

        // Stable sort keeps recent terms ahead of categories on equal scores.
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches.truncate(MAX_SUGGESTIONS);
        matches
    }

    /// Replaces an unresolved `#name` hint with the best matching category.
    ///
    /// Returns the resolved filter and, when nothing matched, a warning for the
    /// user; the hint is then dropped.
    #[must_use]
    pub fn resolve_category(
        &self,
        filter: ListingFilter,
        categories: &[Category],
    ) -> (ListingFilter, Option<String>) {
        let Some(hint) = filter.category.as_ref().filter(|c| !c.is_resolved()) else {
            return (filter, None);
        };
        let name = hint.name.clone();

        let exact = categories.iter().find(|c| {
            c.name().eq_ignore_ascii_case(&name) || c.slug().eq_ignore_ascii_case(&name)
        });
        let best = exact.or_else(|| {
            categories
                .iter()
                .filter_map(|c| self.matcher.fuzzy_match(c.name(), &name).map(|s| (s, c)))
                .max_by_key(|(score, _)| *score)
                .map(|(_, c)| c)
        });

        let mut filter = filter;
        match best {
            Some(category) => {
                tracing::debug!(hint = %name, category = %category.name(), "Resolved category hint");
                filter.category = Some(CategoryRef::resolved(category.id(), category.name()));
                (filter, None)
            }
            None => {
                filter.clear_category();
                (filter, Some(format!("No category matches \"#{name}\"")))
            }
        }
    }
}
