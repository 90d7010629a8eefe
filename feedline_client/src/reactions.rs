//! Likes and comments. They live only in memory for the current session and
//! are never sent to the server.

use std::collections::HashMap;

use anyhow::{bail, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostReactions {
    pub liked: bool,
    pub likes: u32,
    pub comments: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Reactions {
    by_post: HashMap<i64, PostReactions>,
}

impl Reactions {
    pub fn get(&self, post_id: i64) -> Option<&PostReactions> {
        self.by_post.get(&post_id)
    }

    pub fn likes(&self, post_id: i64) -> u32 {
        self.get(post_id).map_or(0, |r| r.likes)
    }

    pub fn comment_count(&self, post_id: i64) -> usize {
        self.get(post_id).map_or(0, |r| r.comments.len())
    }

    /// Flips the like on `post_id` and returns whether it is now liked.
    pub fn toggle_like(&mut self, post_id: i64) -> bool {
        let entry = self.by_post.entry(post_id).or_default();
        if entry.liked {
            entry.likes = entry.likes.saturating_sub(1);
        } else {
            entry.likes += 1;
        }
        entry.liked = !entry.liked;
        entry.liked
    }

    /// Appends a trimmed comment and returns the new comment count.
    pub fn add_comment(&mut self, post_id: i64, text: &str) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            bail!("Comment cannot be empty");
        }
        let entry = self.by_post.entry(post_id).or_default();
        entry.comments.push(text.to_string());
        Ok(entry.comments.len())
    }

    pub fn clear(&mut self) {
        self.by_post.clear();
    }
}
