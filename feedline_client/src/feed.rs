//! Cursor pagination over the posts collection and the derived visible feed.
//!
//! [`FeedState`] owns everything fetched during one pagination run. A run
//! starts with [`FeedState::begin_initial`], grows one page at a time through
//! [`FeedState::begin_next`] / [`FeedState::finish`], and is thrown away on
//! logout or after a successful mutation. Every run has its own generation
//! number; a page that finishes for an older generation is dropped.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::models::{Page, Post};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFilter {
    #[default]
    All,
    Mine,
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            other => Err(anyhow!("unknown sort order '{other}' (expected newest|oldest)")),
        }
    }
}

impl FromStr for FeedFilter {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FeedFilter::All),
            "mine" => Ok(FeedFilter::Mine),
            other => Err(anyhow!("unknown feed filter '{other}' (expected all|mine)")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Newest => f.write_str("newest"),
            SortOrder::Oldest => f.write_str("oldest"),
        }
    }
}

impl fmt::Display for FeedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedFilter::All => f.write_str("all"),
            FeedFilter::Mine => f.write_str("mine"),
        }
    }
}

/// The three controls that shape the visible feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedView {
    pub sort: SortOrder,
    pub filter: FeedFilter,
    pub search: String,
}

/// Posts fetched so far in one run, deduplicated by id. The first copy of an
/// id wins and keeps its position.
#[derive(Debug, Clone, Default)]
pub struct AccumulatedPosts {
    posts: Vec<Post>,
    seen: HashSet<i64>,
}

impl AccumulatedPosts {
    /// Appends the posts of `page` not seen before, in page order, and
    /// returns how many were added.
    pub fn merge_page(&mut self, page: &Page) -> usize {
        let mut added = 0;
        for post in &page.results {
            if !self.seen.insert(post.id) {
                continue;
            }
            self.posts.push(post.clone());
            added += 1;
        }
        added
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn contains(&self, post_id: i64) -> bool {
        self.seen.contains(&post_id)
    }
}

/// Identifies one page request. `cursor` is `None` for the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub cursor: Option<String>,
}

impl FetchTicket {
    pub fn is_first_page(&self) -> bool {
        self.cursor.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Fetching(FetchTicket),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Merged { added: usize, has_more: bool },
    Failed { first_page: bool },
    /// The ticket belongs to a run that has since been reset.
    Stale,
}

#[derive(Debug, Default)]
pub struct FeedState {
    accumulated: AccumulatedPosts,
    generation: u64,
    next_cursor: Option<String>,
    pages_loaded: usize,
    in_flight: Option<FetchTicket>,
    error: Option<String>,
    load_more_error: Option<String>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every fetched post and starts a new run at page one.
    pub fn begin_initial(&mut self) -> FetchTicket {
        self.reset();
        let ticket = FetchTicket {
            generation: self.generation,
            cursor: None,
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    /// Starts fetching the next page, unless a fetch is already running or
    /// the last page reported no successor.
    pub fn begin_next(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        let cursor = self.next_cursor.clone()?;
        self.load_more_error = None;
        let ticket = FetchTicket {
            generation: self.generation,
            cursor: Some(cursor),
        };
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    /// Applies the result of the fetch identified by `ticket`.
    pub fn finish(&mut self, ticket: &FetchTicket, result: anyhow::Result<Page>) -> FetchOutcome {
        if self.in_flight.as_ref() != Some(ticket) {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "ignoring stale page"
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let added = self.accumulated.merge_page(&page);
                self.next_cursor = page.next;
                self.pages_loaded += 1;
                self.error = None;
                FetchOutcome::Merged {
                    added,
                    has_more: self.next_cursor.is_some(),
                }
            }
            Err(err) => {
                let first_page = ticket.is_first_page();
                if first_page {
                    self.error = Some(err.to_string());
                } else {
                    self.load_more_error = Some(err.to_string());
                }
                FetchOutcome::Failed { first_page }
            }
        }
    }

    /// Forgets the current run. Pages still in flight become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.accumulated = AccumulatedPosts::default();
        self.next_cursor = None;
        self.pages_loaded = 0;
        self.in_flight = None;
        self.error = None;
        self.load_more_error = None;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn posts(&self) -> &[Post] {
        self.accumulated.posts()
    }

    pub fn accumulated(&self) -> &AccumulatedPosts {
        &self.accumulated
    }

    pub fn status(&self) -> FetchStatus {
        match (&self.in_flight, &self.error) {
            (Some(ticket), _) => FetchStatus::Fetching(ticket.clone()),
            (None, Some(_)) => FetchStatus::Failed,
            (None, None) => FetchStatus::Idle,
        }
    }

    /// Page one is on its way and nothing has been loaded yet.
    pub fn is_pending(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(FetchTicket::is_first_page)
    }

    pub fn is_fetching_more(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|t| !t.is_first_page())
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn can_load_more(&self) -> bool {
        self.has_more() && self.in_flight.is_none()
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn load_more_error(&self) -> Option<&str> {
        self.load_more_error.as_deref()
    }

    pub fn visible(&self, view: &FeedView, username: &str) -> Vec<&Post> {
        visible_posts(self.posts(), view, username)
    }
}

/// Filters by ownership, then by search text, then sorts by creation time.
/// Posts with an unreadable timestamp sort as the oldest.
pub fn visible_posts<'a>(posts: &'a [Post], view: &FeedView, username: &str) -> Vec<&'a Post> {
    let query = view.search.trim().to_lowercase();
    let mut visible: Vec<&Post> = posts
        .iter()
        .filter(|post| match view.filter {
            FeedFilter::All => true,
            FeedFilter::Mine => post.username == username,
        })
        .filter(|post| query.is_empty() || matches_search(post, &query))
        .collect();

    match view.sort {
        SortOrder::Newest => visible.sort_by_cached_key(|post| Reverse(post.created_at())),
        SortOrder::Oldest => visible.sort_by_cached_key(|post| post.created_at()),
    }
    visible
}

fn matches_search(post: &Post, query: &str) -> bool {
    post.title.to_lowercase().contains(query)
        || post.content.to_lowercase().contains(query)
        || post.username.to_lowercase().contains(query)
}
