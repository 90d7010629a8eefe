use anyhow::{anyhow, bail, Result};

use crate::models::{CreatePostInput, UpdatePostInput};

use super::state::Operation;
use super::tasks;
use super::FeedApp;

impl FeedApp {
    /// Throws away the accumulated feed and fetches page one again.
    pub(super) fn spawn_load_feed(&mut self) {
        let ticket = self.feed.begin_initial();
        tracing::debug!(generation = ticket.generation, "loading first page");
        tasks::load_page(self.posts.clone(), self.tx.clone(), ticket);
    }

    pub(super) fn spawn_load_more(&mut self) -> bool {
        let Some(ticket) = self.feed.begin_next() else {
            return false;
        };
        tracing::debug!(cursor = ?ticket.cursor, "loading next page");
        tasks::load_page(self.posts.clone(), self.tx.clone(), ticket);
        true
    }

    pub(super) fn spawn_create_post(&mut self, title: &str, content: &str) -> Result<()> {
        let username = self
            .session
            .username()
            .ok_or_else(|| anyhow!("sign in before posting"))?
            .to_string();
        let (title, content) = validate_post_fields(title, content)?;
        self.begin_mutation(Operation::Create)?;
        let payload = CreatePostInput {
            username,
            title,
            content,
        };
        tasks::create_post(self.posts.clone(), self.tx.clone(), self.epoch, payload);
        Ok(())
    }

    pub(super) fn spawn_update_post(&mut self, title: &str, content: &str) -> Result<()> {
        let post_id = self
            .session
            .editing()
            .map(|post| post.id)
            .ok_or_else(|| anyhow!("no post selected for editing"))?;
        let (title, content) = validate_post_fields(title, content)?;
        self.begin_mutation(Operation::Update)?;
        tasks::update_post(
            self.posts.clone(),
            self.tx.clone(),
            self.epoch,
            post_id,
            UpdatePostInput { title, content },
        );
        Ok(())
    }

    pub(super) fn spawn_delete_post(&mut self) -> Result<()> {
        let post_id = self
            .session
            .deleting()
            .map(|post| post.id)
            .ok_or_else(|| anyhow!("no post selected for deletion"))?;
        self.begin_mutation(Operation::Delete)?;
        tasks::delete_post(self.posts.clone(), self.tx.clone(), self.epoch, post_id);
        Ok(())
    }

    fn begin_mutation(&mut self, operation: Operation) -> Result<()> {
        let state = self.mutations.get_mut(operation);
        if state.pending {
            bail!("a {operation} is already in progress");
        }
        state.start();
        Ok(())
    }
}

fn validate_post_fields(title: &str, content: &str) -> Result<(String, String)> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Title cannot be empty");
    }
    let content = content.trim();
    if content.is_empty() {
        bail!("Content cannot be empty");
    }
    Ok((title.to_string(), content.to_string()))
}

#[cfg(test)]
mod tests {
    use super::validate_post_fields;

    #[test]
    fn post_fields_are_trimmed_and_required() {
        assert_eq!(
            validate_post_fields("  Hi ", "\tthere\n").expect("valid"),
            ("Hi".to_string(), "there".to_string())
        );
        assert!(validate_post_fields("   ", "body").is_err());
        assert!(validate_post_fields("title", "").is_err());
    }
}
