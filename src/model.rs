use serde::{Deserialize, Serialize};

/// A persisted bookmark. The five fields below are the full wire
/// representation; the table's timestamp columns never leave the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub description: String,
    pub rating: i32,
}

/// A create payload that has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub description: String,
    pub rating: i32,
}

/// The validated subset of fields supplied to a partial update. Fields
/// left as `None` are retained unchanged by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub rating: Option<i32>,
}

impl BookmarkPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none() && self.description.is_none() && self.rating.is_none()
    }
}
