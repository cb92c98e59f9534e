//! Success-shape probing for page responses.
//!
//! The upstream API does not document a single response layout, so each
//! resource kind lists the shapes it accepts. The first matcher whose marker
//! is present wins and normalizes the body into a [`PageResult`].

use super::resource::ResourceKind;
use serde_json::{Map, Value};
use thiserror::Error;

/// Decoded content of one successful page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub items: Vec<Value>,
    pub has_next_page: bool,
    pub next_cursor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessMarker {
    /// The body carries this top-level field.
    Field(&'static str),
    /// The body carries `"status": "success"`.
    StatusSuccess,
}

impl SuccessMarker {
    fn is_present(self, body: &Map<String, Value>) -> bool {
        match self {
            Self::Field(name) => body.contains_key(name),
            Self::StatusSuccess => body.get("status").and_then(Value::as_str) == Some("success"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMatcher {
    pub marker: SuccessMarker,
    pub items_field: &'static str,
}

impl ShapeMatcher {
    pub const fn new(marker: SuccessMarker, items_field: &'static str) -> Self {
        Self {
            marker,
            items_field,
        }
    }

    /// `None` when the marker is absent, so the next matcher gets a try.
    pub fn try_match(&self, body: &Map<String, Value>) -> Option<Result<PageResult, ShapeError>> {
        if !self.marker.is_present(body) {
            return None;
        }
        Some(self.normalize(body))
    }

    fn normalize(&self, body: &Map<String, Value>) -> Result<PageResult, ShapeError> {
        let items = match body.get(self.items_field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(ShapeError::ItemsNotArray(self.items_field)),
        };

        Ok(PageResult {
            items,
            has_next_page: body
                .get("has_next_page")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            next_cursor: body
                .get("next_cursor")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("field '{0}' is not an array")]
    ItemsNotArray(&'static str),

    #[error("unrecognized response format: {0}")]
    Unrecognized(String),
}

/// Matches `body` against the accepted shapes of `kind`.
pub fn parse_page(kind: ResourceKind, body: &str) -> Result<PageResult, ShapeError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ShapeError::InvalidJson(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(ShapeError::NotAnObject);
    };

    kind.shapes()
        .iter()
        .find_map(|matcher| matcher.try_match(&object))
        .unwrap_or_else(|| {
            let message = object
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no accepted success marker")
                .to_string();
            Err(ShapeError::Unrecognized(message))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_accepts_tweets_field_without_status() {
        let body = json!({
            "tweets": [{"id": "1"}, {"id": "2"}],
            "has_next_page": true,
            "next_cursor": "c1"
        });
        let page = parse_page(ResourceKind::Search, &body.to_string()).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next_page);
        assert_eq!(page.next_cursor, "c1");
    }

    #[test]
    fn test_search_accepts_status_success_without_tweets() {
        let body = json!({"status": "success"});
        let page = parse_page(ResourceKind::Search, &body.to_string()).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_next_page);
        assert_eq!(page.next_cursor, "");
    }

    #[test]
    fn test_replies_requires_status_success() {
        let body = json!({"tweets": [{"id": "1"}], "has_next_page": false});
        let err = parse_page(ResourceKind::Replies, &body.to_string()).unwrap_err();
        assert!(matches!(err, ShapeError::Unrecognized(_)));
    }

    #[test]
    fn test_replies_reads_items_from_tweets() {
        let body = json!({
            "status": "success",
            "tweets": [{"id": "r1"}],
            "has_next_page": true,
            "next_cursor": "n"
        });
        let page = parse_page(ResourceKind::Replies, &body.to_string()).unwrap();
        assert_eq!(page.items, vec![json!({"id": "r1"})]);
    }

    #[test]
    fn test_retweeters_accepts_users_field_alone() {
        let body = json!({"users": [{"userName": "a"}], "has_next_page": false});
        let page = parse_page(ResourceKind::Retweeters, &body.to_string()).unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_unrecognized_carries_upstream_message() {
        let body = json!({"status": "error", "message": "tweet not found"});
        let err = parse_page(ResourceKind::Retweeters, &body.to_string()).unwrap_err();
        assert_eq!(err, ShapeError::Unrecognized("tweet not found".into()));
    }

    #[test]
    fn test_null_cursor_and_items_are_treated_as_empty() {
        let body = json!({"status": "success", "tweets": null, "next_cursor": null});
        let page = parse_page(ResourceKind::Replies, &body.to_string()).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_cursor, "");
    }

    #[test]
    fn test_items_not_array_is_malformed() {
        let body = json!({"status": "success", "users": {"a": 1}});
        let err = parse_page(ResourceKind::Retweeters, &body.to_string()).unwrap_err();
        assert_eq!(err, ShapeError::ItemsNotArray("users"));
    }

    #[test]
    fn test_invalid_json_and_non_object() {
        assert!(matches!(
            parse_page(ResourceKind::Search, "<html>"),
            Err(ShapeError::InvalidJson(_))
        ));
        assert_eq!(
            parse_page(ResourceKind::Search, "[1,2]"),
            Err(ShapeError::NotAnObject)
        );
    }
}
