//! Owner of all session-scoped state.
//!
//! Network work runs on spawned tokio tasks which report back over a channel
//! as [`AppMessage`]s. Only the owner of [`FeedApp`] mutates state, by
//! draining that channel with [`FeedApp::process_messages`] or
//! [`FeedApp::next_event`]. Spawning requires a running tokio runtime.

use anyhow::{bail, Result};
use flume::{Receiver, Sender};

use crate::feed::{FeedFilter, FeedState, FeedView, SortOrder};
use crate::models::Post;
use crate::posts::PostsClient;
use crate::reactions::Reactions;
use crate::session::{Session, SessionStore};

mod messages;
mod spawners;
mod state;
mod tasks;

pub use messages::{AppEvent, AppMessage};
pub use state::{MutationState, MutationStates, Operation};

pub struct FeedApp {
    posts: PostsClient,
    session: Session,
    feed: FeedState,
    mutations: MutationStates,
    reactions: Reactions,
    /// Bumped whenever the signed-in user changes; mutation replies tagged
    /// with an older epoch are dropped.
    epoch: u64,
    tx: Sender<AppMessage>,
    rx: Receiver<AppMessage>,
}

impl FeedApp {
    pub fn new(posts: PostsClient, store: Box<dyn SessionStore>) -> Result<Self> {
        let session = Session::restore(store)?;
        let (tx, rx) = flume::unbounded();
        Ok(Self {
            posts,
            session,
            feed: FeedState::new(),
            mutations: MutationStates::default(),
            reactions: Reactions::default(),
            epoch: 0,
            tx,
            rx,
        })
    }

    /// Starts loading the feed when a username was restored from the store.
    pub fn start(&mut self) {
        if self.session.is_signed_in() {
            self.spawn_load_feed();
        }
    }

    pub fn sign_in(&mut self, username: &str) -> Result<()> {
        self.session.sign_in(username)?;
        self.new_epoch();
        self.spawn_load_feed();
        Ok(())
    }

    /// Forgets the username, the feed, likes, comments and any selection.
    /// Replies still in flight are dropped when they arrive.
    pub fn sign_out(&mut self) -> Result<()> {
        self.session.sign_out()?;
        self.feed.reset();
        self.reactions.clear();
        self.new_epoch();
        Ok(())
    }

    pub fn refresh(&mut self) -> Result<()> {
        if !self.session.is_signed_in() {
            bail!("sign in to see the feed");
        }
        self.spawn_load_feed();
        Ok(())
    }

    /// Requests the next page. Returns `false` when there is nothing to load
    /// or a page is already on its way.
    pub fn load_more(&mut self) -> bool {
        self.spawn_load_more()
    }

    pub fn create_post(&mut self, title: &str, content: &str) -> Result<()> {
        self.spawn_create_post(title, content)
    }

    pub fn begin_edit(&mut self, post_id: i64) -> Result<()> {
        let post = self.find_post(post_id)?.clone();
        self.session.select_for_edit(&post)
    }

    pub fn submit_edit(&mut self, title: &str, content: &str) -> Result<()> {
        self.spawn_update_post(title, content)
    }

    pub fn begin_delete(&mut self, post_id: i64) -> Result<()> {
        let post = self.find_post(post_id)?.clone();
        self.session.select_for_delete(&post)
    }

    pub fn confirm_delete(&mut self) -> Result<()> {
        self.spawn_delete_post()
    }

    pub fn cancel_edit(&mut self) {
        self.session.clear_editing();
    }

    pub fn cancel_delete(&mut self) {
        self.session.clear_deleting();
    }

    /// Returns whether the post is now liked.
    pub fn toggle_like(&mut self, post_id: i64) -> Result<bool> {
        self.find_post(post_id)?;
        Ok(self.reactions.toggle_like(post_id))
    }

    pub fn add_comment(&mut self, post_id: i64, text: &str) -> Result<usize> {
        self.find_post(post_id)?;
        self.reactions.add_comment(post_id, text)
    }

    pub fn reactions(&self) -> &Reactions {
        &self.reactions
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.session.view.sort = sort;
    }

    pub fn set_filter(&mut self, filter: FeedFilter) {
        self.session.view.filter = filter;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.session.view.search = search.into();
    }

    pub fn view(&self) -> &FeedView {
        &self.session.view
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn feed(&self) -> &FeedState {
        &self.feed
    }

    pub fn mutations(&self) -> &MutationStates {
        &self.mutations
    }

    pub fn visible_posts(&self) -> Vec<&Post> {
        self.feed
            .visible(&self.session.view, self.session.username().unwrap_or_default())
    }

    /// Whether a page fetch or a mutation is still outstanding.
    pub fn is_busy(&self) -> bool {
        self.feed.is_pending() || self.feed.is_fetching_more() || self.mutations.any_pending()
    }

    /// Applies every message that has already arrived, without waiting.
    pub fn process_messages(&mut self) -> Vec<AppEvent> {
        messages::process_messages(self)
    }

    /// Waits for the next message that changes state and applies it.
    /// Returns `None` only if the channel is closed.
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        loop {
            let message = self.rx.recv_async().await.ok()?;
            if let Some(event) = messages::handle_message(self, message) {
                return Some(event);
            }
        }
    }

    /// Applies messages until nothing is outstanding, including the feed
    /// reload a successful mutation triggers.
    pub async fn settle(&mut self) -> Vec<AppEvent> {
        let mut events = self.process_messages();
        while self.is_busy() {
            match self.next_event().await {
                Some(event) => events.push(event),
                None => break,
            }
        }
        events
    }

    fn find_post(&self, post_id: i64) -> Result<&Post> {
        match self.feed.posts().iter().find(|post| post.id == post_id) {
            Some(post) => Ok(post),
            None => bail!("post {post_id} is not in the loaded feed"),
        }
    }

    fn new_epoch(&mut self) {
        self.epoch += 1;
        self.mutations = MutationStates::default();
    }

    fn restart_feed(&mut self) {
        if self.session.is_signed_in() {
            self.spawn_load_feed();
        }
    }

    fn mutation_failed(&mut self, operation: Operation, err: anyhow::Error) -> AppEvent {
        let error = err.to_string();
        tracing::warn!(%operation, error = %error, "mutation failed");
        self.mutations.get_mut(operation).fail(error.clone());
        AppEvent::MutationFailed { operation, error }
    }
}
