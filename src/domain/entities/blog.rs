//! Blog post entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PostId;
use crate::domain::serde_utils::null_as_default;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    id: PostId,
    slug: String,
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    excerpt: String,
    /// Absent in list responses.
    #[serde(default, deserialize_with = "null_as_default")]
    body: String,
    #[serde(default)]
    author: String,
    published_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<String>,
}

impl BlogPost {
    #[must_use]
    pub fn new(
        id: impl Into<PostId>,
        slug: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            title: title.into(),
            excerpt: String::new(),
            body: String::new(),
            author: String::new(),
            published_at,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    #[must_use]
    pub const fn id(&self) -> PostId {
        self.id
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn author_label(&self) -> &str {
        if self.author.is_empty() {
            "Editorial team"
        } else {
            &self.author
        }
    }

    #[must_use]
    pub const fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether the full article body has been fetched.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Text used in list views: the excerpt, or the body's first paragraph.
    #[must_use]
    pub fn summary(&self) -> &str {
        if !self.excerpt.is_empty() {
            return &self.excerpt;
        }
        self.body.split("\n\n").next().unwrap_or_default().trim()
    }
}

impl super::Identified for BlogPost {
    type Id = PostId;

    fn id(&self) -> PostId {
        self.id
    }
}
