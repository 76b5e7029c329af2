//! Request validation for the bookmark resource.
//!
//! Both entry points take the raw JSON body as a `serde_json::Value` so
//! that any malformed shape (missing body, array, string) degrades to
//! "field absent" instead of a deserialization failure with its own error
//! format. Checks run in a fixed order and the first failure wins.

use serde_json::Value;
use url::Url;

use crate::model::{BookmarkPatch, NewBookmark};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing '{0}' in request body.")]
    MissingField(&'static str),
    #[error("Rating must be a number between 0 and 5.")]
    RatingOutOfRange,
    #[error("URL must be valid.")]
    InvalidUrl,
    #[error("Request body must contain either 'title', 'url', 'description', or 'rating'.")]
    EmptyUpdate,
}

/// Validates a create payload.
///
/// Check order: `title` present, `url` present, `description` present,
/// `rating` present, `rating` an integer in [0, 5], `url` a syntactically
/// valid absolute URI. Ratings are coerced loosely: a JSON integer or a
/// string holding one are both accepted.
pub fn validate_create(body: &Value) -> Result<NewBookmark, ValidationError> {
    let title = text_field(body, "title").ok_or(ValidationError::MissingField("title"))?;
    let url = text_field(body, "url").ok_or(ValidationError::MissingField("url"))?;
    let description =
        text_field(body, "description").ok_or(ValidationError::MissingField("description"))?;

    let rating = match body.get("rating") {
        Some(value) if !value.is_null() => {
            parse_rating(value).ok_or(ValidationError::RatingOutOfRange)?
        }
        _ => return Err(ValidationError::MissingField("rating")),
    };

    if Url::parse(&url).is_err() {
        return Err(ValidationError::InvalidUrl);
    }

    Ok(NewBookmark {
        title,
        url,
        description,
        rating,
    })
}

/// Validates a partial-update payload.
///
/// The payload must supply at least one usable field out of {title, url,
/// description, rating}; anything else in the body is ignored. Supplied
/// fields are then held to the same rules as on create.
pub fn validate_update(body: &Value) -> Result<BookmarkPatch, ValidationError> {
    let rating = match body.get("rating").filter(|value| !value.is_null()) {
        Some(value) => Some(parse_rating(value).ok_or(ValidationError::RatingOutOfRange)?),
        None => None,
    };

    let patch = BookmarkPatch {
        title: text_field(body, "title"),
        url: text_field(body, "url"),
        description: text_field(body, "description"),
        rating,
    };

    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }

    if let Some(url) = &patch.url {
        if Url::parse(url).is_err() {
            return Err(ValidationError::InvalidUrl);
        }
    }

    Ok(patch)
}

/// The only usable text value is a non-empty JSON string.
fn text_field(body: &Value, name: &str) -> Option<String> {
    body.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn parse_rating(value: &Value) -> Option<i32> {
    let n = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    if (0..=5).contains(&n) { Some(n as i32) } else { None }
}
