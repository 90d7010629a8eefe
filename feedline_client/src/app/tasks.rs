use flume::Sender;
use tracing::error;

use crate::feed::FetchTicket;
use crate::models::{CreatePostInput, UpdatePostInput};
use crate::posts::PostsClient;

use super::messages::AppMessage;

pub fn load_page(client: PostsClient, tx: Sender<AppMessage>, ticket: FetchTicket) {
    tokio::spawn(async move {
        let result = client.list_page(ticket.cursor.as_deref()).await;
        if tx.send(AppMessage::PageLoaded { ticket, result }).is_err() {
            error!("failed to send PageLoaded message");
        }
    });
}

pub fn create_post(
    client: PostsClient,
    tx: Sender<AppMessage>,
    epoch: u64,
    payload: CreatePostInput,
) {
    tokio::spawn(async move {
        let result = client.create(&payload).await;
        if tx.send(AppMessage::PostCreated { epoch, result }).is_err() {
            error!("failed to send PostCreated message");
        }
    });
}

pub fn update_post(
    client: PostsClient,
    tx: Sender<AppMessage>,
    epoch: u64,
    post_id: i64,
    payload: UpdatePostInput,
) {
    tokio::spawn(async move {
        let result = client.update(post_id, &payload).await;
        let message = AppMessage::PostUpdated {
            epoch,
            post_id,
            result,
        };
        if tx.send(message).is_err() {
            error!("failed to send PostUpdated message");
        }
    });
}

pub fn delete_post(client: PostsClient, tx: Sender<AppMessage>, epoch: u64, post_id: i64) {
    tokio::spawn(async move {
        let result = client.delete(post_id).await;
        let message = AppMessage::PostDeleted {
            epoch,
            post_id,
            result,
        };
        if tx.send(message).is_err() {
            error!("failed to send PostDeleted message");
        }
    });
}
