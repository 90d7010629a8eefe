#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use feedline_client::models::Post;
use feedline_client::{ApiClient, PostsClient};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Request target exactly as it arrived on the wire.
    pub target: String,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct MockState {
    pub base_url: String,
    /// Newest first, the way the real endpoint lists them.
    pub posts: Vec<Post>,
    pub next_id: i64,
    pub page_size: usize,
    pub bare_list: bool,
    pub failure: Option<(StatusCode, String)>,
    pub requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<MockState>>;

/// In-process stand-in for the remote posts collection.
pub struct MockServer {
    pub base_url: String,
    pub state: Shared,
    server: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(posts: Vec<Post>, page_size: usize) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{addr}/careers/");
        let next_id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let state = Arc::new(Mutex::new(MockState {
            base_url: base_url.clone(),
            posts,
            next_id,
            page_size,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/careers/", get(list_posts).post(create_post))
            .route("/careers/:id/", patch(update_post).delete(delete_post))
            .with_state(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self {
            base_url,
            state,
            server,
        }
    }

    pub fn client(&self) -> PostsClient {
        let api = ApiClient::new(self.base_url.clone(), Duration::from_secs(5)).expect("client");
        PostsClient::new(api)
    }

    pub fn fail_next(&self, status: StatusCode, body: &str) {
        self.state.lock().unwrap().failure = Some((status, body.to_string()));
    }

    pub fn set_bare_list(&self, bare: bool) {
        self.state.lock().unwrap().bare_list = bare;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn post_ids(&self) -> Vec<i64> {
        self.state.lock().unwrap().posts.iter().map(|p| p.id).collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub fn post(id: i64, username: &str, created: &str, title: &str) -> Post {
    Post {
        id,
        username: username.into(),
        created_datetime: created.into(),
        title: title.into(),
        content: format!("{title} content"),
    }
}

/// `count` posts with descending ids and timestamps, alternating owners.
pub fn seed(count: i64) -> Vec<Post> {
    (1..=count)
        .rev()
        .map(|id| {
            let owner = if id % 2 == 0 { "alice" } else { "bob" };
            post(
                id,
                owner,
                &format!("2025-01-{:02}T12:00:00Z", id),
                &format!("post {id}"),
            )
        })
        .collect()
}

fn record(state: &mut MockState, method: &str, path: String, headers: &HeaderMap, body: &str) {
    let target = path.clone();
    record_target(state, method, path, target, headers, body);
}

fn record_target(
    state: &mut MockState,
    method: &str,
    path: String,
    target: String,
    headers: &HeaderMap,
    body: &str,
) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_str(body).ok();
    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path,
        target,
        content_type,
        body,
    });
}

fn take_failure(state: &mut MockState) -> Option<Response> {
    state
        .failure
        .take()
        .map(|(status, body)| (status, body).into_response())
}

async fn list_posts(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    let offset: usize = params
        .get("offset")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(0);
    record_target(
        &mut state,
        "GET",
        format!("/careers/?offset={offset}"),
        uri.to_string(),
        &headers,
        "",
    );
    if let Some(failure) = take_failure(&mut state) {
        return failure;
    }
    if state.bare_list {
        return Json(state.posts.clone()).into_response();
    }

    let total = state.posts.len();
    let end = (offset + state.page_size).min(total);
    let results: Vec<Post> = state.posts.get(offset..end).unwrap_or_default().to_vec();
    let next = (end < total).then(|| format!("{}?offset={end}", state.base_url));
    let previous = (offset > 0).then(|| format!("{}?offset={}", state.base_url, offset.saturating_sub(state.page_size)));
    Json(json!({
        "count": total,
        "next": next,
        "previous": previous,
        "results": results,
    }))
    .into_response()
}

async fn create_post(State(state): State<Shared>, headers: HeaderMap, body: String) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "POST", "/careers/".into(), &headers, &body);
    if let Some(failure) = take_failure(&mut state) {
        return failure;
    }
    let Ok(input) = serde_json::from_str::<Value>(&body) else {
        return (StatusCode::BAD_REQUEST, "invalid json").into_response();
    };
    let post = Post {
        id: state.next_id,
        username: input["username"].as_str().unwrap_or_default().to_string(),
        created_datetime: Utc::now().to_rfc3339(),
        title: input["title"].as_str().unwrap_or_default().to_string(),
        content: input["content"].as_str().unwrap_or_default().to_string(),
    };
    state.next_id += 1;
    state.posts.insert(0, post.clone());
    (StatusCode::CREATED, Json(post)).into_response()
}

async fn update_post(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "PATCH", format!("/careers/{id}/"), &headers, &body);
    if let Some(failure) = take_failure(&mut state) {
        return failure;
    }
    let input: Value = serde_json::from_str(&body).unwrap_or_default();
    let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
        return (StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#).into_response();
    };
    if let Some(title) = input["title"].as_str() {
        post.title = title.to_string();
    }
    if let Some(content) = input["content"].as_str() {
        post.content = content.to_string();
    }
    Json(post.clone()).into_response()
}

async fn delete_post(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "DELETE", format!("/careers/{id}/"), &headers, "");
    if let Some(failure) = take_failure(&mut state) {
        return failure;
    }
    let before = state.posts.len();
    state.posts.retain(|p| p.id != id);
    if state.posts.len() == before {
        return (StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#).into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}
