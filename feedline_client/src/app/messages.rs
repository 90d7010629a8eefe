use tracing::{debug, info, warn};

use crate::feed::{FetchOutcome, FetchTicket};
use crate::models::{Page, Post};

use super::state::Operation;
use super::FeedApp;

pub enum AppMessage {
    PageLoaded {
        ticket: FetchTicket,
        result: Result<Page, anyhow::Error>,
    },
    PostCreated {
        epoch: u64,
        result: Result<Post, anyhow::Error>,
    },
    PostUpdated {
        epoch: u64,
        post_id: i64,
        result: Result<Post, anyhow::Error>,
    },
    PostDeleted {
        epoch: u64,
        post_id: i64,
        result: Result<(), anyhow::Error>,
    },
}

/// What changed after a message was applied, for the front end to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    PageApplied(FetchOutcome),
    PostCreated(Post),
    PostUpdated(Post),
    PostDeleted(i64),
    MutationFailed { operation: Operation, error: String },
}

pub(super) fn process_messages(app: &mut FeedApp) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(message) = app.rx.try_recv() {
        events.extend(handle_message(app, message));
    }
    events
}

impl AppMessage {
    fn mutation_epoch(&self) -> Option<u64> {
        match self {
            AppMessage::PageLoaded { .. } => None,
            AppMessage::PostCreated { epoch, .. }
            | AppMessage::PostUpdated { epoch, .. }
            | AppMessage::PostDeleted { epoch, .. } => Some(*epoch),
        }
    }
}

pub(super) fn handle_message(app: &mut FeedApp, message: AppMessage) -> Option<AppEvent> {
    if let Some(epoch) = message.mutation_epoch() {
        if epoch != app.epoch {
            debug!(
                epoch,
                current = app.epoch,
                "dropping reply from an earlier session"
            );
            return None;
        }
    }
    match message {
        AppMessage::PageLoaded { ticket, result } => {
            if let Err(err) = &result {
                warn!(cursor = ?ticket.cursor, error = %err, "page fetch failed");
            }
            match app.feed.finish(&ticket, result) {
                FetchOutcome::Stale => None,
                outcome => {
                    if let FetchOutcome::Merged { added, has_more } = &outcome {
                        info!(
                            added,
                            has_more,
                            total = app.feed.posts().len(),
                            "merged page"
                        );
                    }
                    Some(AppEvent::PageApplied(outcome))
                }
            }
        }
        AppMessage::PostCreated { result, .. } => match result {
            Ok(post) => {
                info!(post_id = post.id, "post created");
                app.mutations.create.succeed();
                app.restart_feed();
                Some(AppEvent::PostCreated(post))
            }
            Err(err) => Some(app.mutation_failed(Operation::Create, err)),
        },
        AppMessage::PostUpdated { post_id, result, .. } => match result {
            Ok(post) => {
                info!(post_id, "post updated");
                app.mutations.update.succeed();
                if app.session.editing().is_some_and(|p| p.id == post_id) {
                    app.session.clear_editing();
                }
                app.restart_feed();
                Some(AppEvent::PostUpdated(post))
            }
            Err(err) => Some(app.mutation_failed(Operation::Update, err)),
        },
        AppMessage::PostDeleted { post_id, result, .. } => match result {
            Ok(()) => {
                info!(post_id, "post deleted");
                app.mutations.delete.succeed();
                if app.session.deleting().is_some_and(|p| p.id == post_id) {
                    app.session.clear_deleting();
                }
                app.restart_feed();
                Some(AppEvent::PostDeleted(post_id))
            }
            Err(err) => Some(app.mutation_failed(Operation::Delete, err)),
        },
    }
}
