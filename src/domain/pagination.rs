//! Page requests and an accumulating, generation-guarded list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::entities::Identified;

/// Largest page the backend accepts.
pub const MAX_PER_PAGE: u32 = 100;
/// Page size used when nothing is configured.
pub const DEFAULT_PER_PAGE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// First page with the given size, clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Arbitrary page, 1-based, with the same clamping as `first`.
    #[must_use]
    pub fn at(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            per_page: self.per_page,
        }
    }

    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn per_page(self) -> u32 {
        self.per_page
    }

    #[must_use]
    pub fn to_query_pairs(self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PER_PAGE)
    }
}

/// One page of a server-side collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    /// Total item count when the backend reports it.
    #[serde(default)]
    pub total: Option<u64>,
}

const fn default_page() -> u32 {
    1
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, page: u32, per_page: u32, total: Option<u64>) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
        }
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        match self.total {
            Some(total) => u64::from(self.page) * u64::from(self.per_page) < total,
            None => self.per_page > 0 && self.items.len() >= self.per_page as usize,
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// Token identifying which reset a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Generation(u64);

/// Accumulated view over a paged collection.
///
/// Each reset bumps the generation; responses carrying an older generation
/// are dropped on `apply`. Items stay unique by id, in server order.
#[derive(Debug, Clone)]
pub struct PagedList<T: Identified> {
    items: Vec<T>,
    seen: HashSet<T::Id>,
    generation: Generation,
    next: Option<PageRequest>,
    per_page: u32,
    loading: bool,
    total: Option<u64>,
}

impl<T: Identified> PagedList<T> {
    #[must_use]
    pub fn new(per_page: u32) -> Self {
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            generation: Generation::default(),
            next: Some(PageRequest::first(per_page)),
            per_page,
            loading: false,
            total: None,
        }
    }

    /// Drops all items and starts a new generation at page one.
    pub fn begin_reset(&mut self) -> (Generation, PageRequest) {
        self.generation = Generation(self.generation.0 + 1);
        self.items.clear();
        self.seen.clear();
        self.total = None;
        self.loading = true;
        let request = PageRequest::first(self.per_page);
        self.next = Some(request);
        (self.generation, request)
    }

    /// Next request to issue, if none is in flight and pages remain.
    pub fn begin_next(&mut self) -> Option<(Generation, PageRequest)> {
        if self.loading {
            return None;
        }
        let request = self.next?;
        self.loading = true;
        Some((self.generation, request))
    }

    /// Applies a page. Returns `false` when the page belongs to a stale generation.
    pub fn apply(&mut self, generation: Generation, page: Page<T>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                stale = generation.0,
                current = self.generation.0,
                "Dropping stale page"
            );
            return false;
        }

        self.loading = false;
        self.total = page.total;
        let has_more = page.has_more();
        let request = PageRequest::at(page.page, self.per_page);

        for item in page.items {
            if self.seen.insert(item.id()) {
                self.items.push(item);
            }
        }

        self.next = has_more.then(|| request.next());
        true
    }

    /// Clears the loading flag after a failed request for `generation`.
    pub fn fail(&mut self, generation: Generation) {
        if generation == self.generation {
            self.loading = false;
        }
    }

    /// Replaces the item with the same id. Returns `false` when absent.
    pub fn replace_item(&mut self, item: T) -> bool {
        let id = item.id();
        match self.items.iter_mut().find(|existing| existing.id() == id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove_item(&mut self, id: T::Id) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        self.seen.remove(&id);
        if let Some(total) = self.total.as_mut() {
            *total = total.saturating_sub(1);
        }
        Some(self.items.remove(index))
    }

    /// Inserts an item at the front, used for items created locally or pushed by the server.
    pub fn push_front(&mut self, item: T) -> bool {
        if !self.seen.insert(item.id()) {
            return false;
        }
        self.items.insert(0, item);
        true
    }

    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn total(&self) -> Option<u64> {
        self.total
    }
}

impl<T: Identified> Default for PagedList<T> {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Category, CategoryId};

    fn cat(id: u64) -> Category {
        Category::new(id, format!("cat {id}"))
    }

    fn page(ids: &[u64], page: u32, per_page: u32, total: Option<u64>) -> Page<Category> {
        Page::new(ids.iter().copied().map(cat).collect(), page, per_page, total)
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::first(0).per_page(), 1);
        assert_eq!(PageRequest::first(500).per_page(), MAX_PER_PAGE);
        assert_eq!(PageRequest::first(10).next().page(), 2);
    }

    #[test]
    fn test_has_more() {
        assert!(page(&[1, 2], 1, 2, Some(5)).has_more());
        assert!(!page(&[5], 3, 2, Some(5)).has_more());
        assert!(page(&[1, 2], 1, 2, None).has_more());
        assert!(!page(&[1], 1, 2, None).has_more());
    }

    #[test]
    fn test_accumulates_and_drops_duplicates() {
        let mut list = PagedList::<Category>::new(2);
        let (generation, request) = list.begin_reset();
        assert_eq!(request.page(), 1);
        assert!(list.begin_next().is_none(), "in flight");

        assert!(list.apply(generation, page(&[1, 2], 1, 2, Some(4))));
        let (generation, request) = list.begin_next().unwrap();
        assert_eq!(request.page(), 2);

        list.apply(generation, page(&[2, 3], 2, 2, Some(4)));
        let ids: Vec<_> = list.items().iter().map(Category::id).collect();
        assert_eq!(ids, vec![CategoryId(1), CategoryId(2), CategoryId(3)]);
        assert!(list.is_exhausted());
        assert!(list.begin_next().is_none());
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut list = PagedList::<Category>::new(2);
        let (old, _) = list.begin_reset();
        let (current, _) = list.begin_reset();

        assert!(!list.apply(old, page(&[9], 1, 2, Some(1))));
        assert!(list.is_empty());
        assert!(list.is_loading());

        list.fail(old);
        assert!(list.is_loading());
        list.fail(current);
        assert!(!list.is_loading());
    }

    #[test]
    fn test_replace_and_remove() {
        let mut list = PagedList::<Category>::new(5);
        let (generation, _) = list.begin_reset();
        list.apply(generation, page(&[1, 2], 1, 5, Some(2)));

        assert!(list.replace_item(cat(2).with_listing_count(7)));
        assert_eq!(list.items()[1].listing_count(), 7);
        assert!(!list.replace_item(cat(3)));

        assert!(list.remove_item(CategoryId(1)).is_some());
        assert_eq!(list.len(), 1);
        assert_eq!(list.total(), Some(1));
        assert!(list.push_front(cat(1)));
        assert!(!list.push_front(cat(2)));
    }
}
