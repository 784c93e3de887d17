//! Listing category entity.

use serde::{Deserialize, Serialize};

use super::CategoryId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    parent_id: Option<CategoryId>,
    #[serde(default)]
    listing_count: u32,
}

impl Category {
    #[must_use]
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = name.to_lowercase().replace(' ', "-");
        Self {
            id: id.into(),
            name,
            slug,
            parent_id: None,
            listing_count: 0,
        }
    }

    #[must_use]
    pub const fn with_parent(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub const fn with_listing_count(mut self, count: u32) -> Self {
        self.listing_count = count;
        self
    }

    #[must_use]
    pub const fn id(&self) -> CategoryId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub const fn parent_id(&self) -> Option<CategoryId> {
        self.parent_id
    }

    #[must_use]
    pub const fn listing_count(&self) -> u32 {
        self.listing_count
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl super::Identified for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}
