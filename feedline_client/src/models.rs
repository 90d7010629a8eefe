use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub username: String,
    pub created_datetime: String,
    pub title: String,
    pub content: String,
}

impl Post {
    /// Parsed creation time, or `None` when the server sent something that
    /// is not RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.created_datetime).ok()
    }

    /// Whether `username` may edit or delete this post.
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.username == username
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CreatePostInput {
    pub username: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpdatePostInput {
    pub title: String,
    pub content: String,
}

/// One page of the collection, in the uniform shape the feed works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Page {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Post>,
}

impl Page {
    /// A page holding every post with no neighbours.
    pub fn complete(results: Vec<Post>) -> Self {
        Self {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }
}

/// The list endpoint answers either with a bare array or with a
/// paginated envelope whose fields may be missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse {
    Bare(Vec<Post>),
    Paginated(PaginatedResponse),
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PaginatedResponse {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<Post>>,
}

impl From<ListResponse> for Page {
    fn from(response: ListResponse) -> Self {
        match response {
            ListResponse::Bare(posts) => Page::complete(posts),
            ListResponse::Paginated(envelope) => {
                let results = envelope.results.unwrap_or_default();
                Page {
                    count: envelope.count.unwrap_or(results.len() as u64),
                    next: envelope.next,
                    previous: envelope.previous,
                    results,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "username": "alice",
            "created_datetime": "2025-01-02T12:00:00.000000Z",
            "title": "hello",
            "content": "world"
        })
    }

    #[test]
    fn bare_array_becomes_single_complete_page() {
        let raw = json!([post(1), post(2)]);
        let response: ListResponse = serde_json::from_value(raw).expect("parse");
        let page = Page::from(response);
        assert_eq!(page.count, 2);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
        assert_eq!(page.results.len(), 2);
    }

    #[test]
    fn envelope_defaults_missing_fields() {
        let raw = json!({ "results": [post(3)] });
        let response: ListResponse = serde_json::from_value(raw).expect("parse");
        let page = Page::from(response);
        assert_eq!(page.count, 1);
        assert_eq!(page.next, None);
        assert_eq!(page.results[0].id, 3);

        let empty: ListResponse = serde_json::from_value(json!({})).expect("parse");
        assert_eq!(Page::from(empty), Page::default());
    }

    #[test]
    fn envelope_keeps_cursors_and_advisory_count() {
        let raw = json!({
            "count": 40,
            "next": "https://example.test/careers/?limit=10&offset=10",
            "previous": null,
            "results": [post(1)]
        });
        let page = Page::from(serde_json::from_value::<ListResponse>(raw).expect("parse"));
        assert_eq!(page.count, 40);
        assert_eq!(
            page.next.as_deref(),
            Some("https://example.test/careers/?limit=10&offset=10")
        );
        assert_eq!(page.previous, None);
    }

    #[test]
    fn ownership_is_exact_match() {
        let post: Post = serde_json::from_value(post(7)).expect("parse");
        assert!(post.is_owned_by("alice"));
        assert!(!post.is_owned_by("Alice"));
        assert!(post.created_at().is_some());
    }
}
