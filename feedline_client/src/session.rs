use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::feed::FeedView;
use crate::models::Post;

/// Durable home of the one value that survives restarts: the username.
pub trait SessionStore: Send {
    fn load_username(&self) -> Result<Option<String>>;
    fn save_username(&mut self, username: &str) -> Result<()>;
    fn clear_username(&mut self) -> Result<()>;
}

/// Keeps the username as plain text in a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load_username(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let username = raw.trim();
                Ok((!username.is_empty()).then(|| username.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    fn save_username(&mut self, username: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, username)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    fn clear_username(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove {}", self.path.display())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    username: Option<String>,
}

impl MemorySessionStore {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load_username(&self) -> Result<Option<String>> {
        Ok(self.username.clone())
    }

    fn save_username(&mut self, username: &str) -> Result<()> {
        self.username = Some(username.to_string());
        Ok(())
    }

    fn clear_username(&mut self) -> Result<()> {
        self.username = None;
        Ok(())
    }
}

/// Everything the user has chosen during this process lifetime. Only the
/// username is written through to the store.
pub struct Session {
    store: Box<dyn SessionStore>,
    username: Option<String>,
    pub view: FeedView,
    editing: Option<Post>,
    deleting: Option<Post>,
}

impl Session {
    pub fn restore(store: Box<dyn SessionStore>) -> Result<Self> {
        let username = store.load_username()?;
        Ok(Self {
            store,
            username,
            view: FeedView::default(),
            editing: None,
            deleting: None,
        })
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.username.is_some()
    }

    pub fn sign_in(&mut self, username: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            bail!("username may not be empty");
        }
        self.store.save_username(username)?;
        self.username = Some(username.to_string());
        tracing::info!(username, "signed in");
        Ok(())
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.store.clear_username()?;
        if let Some(username) = self.username.take() {
            tracing::info!(username = %username, "signed out");
        }
        self.clear_selections();
        Ok(())
    }

    pub fn select_for_edit(&mut self, post: &Post) -> Result<()> {
        self.ensure_owner(post)?;
        self.editing = Some(post.clone());
        Ok(())
    }

    pub fn select_for_delete(&mut self, post: &Post) -> Result<()> {
        self.ensure_owner(post)?;
        self.deleting = Some(post.clone());
        Ok(())
    }

    pub fn editing(&self) -> Option<&Post> {
        self.editing.as_ref()
    }

    pub fn deleting(&self) -> Option<&Post> {
        self.deleting.as_ref()
    }

    pub fn clear_editing(&mut self) {
        self.editing = None;
    }

    pub fn clear_deleting(&mut self) {
        self.deleting = None;
    }

    pub fn clear_selections(&mut self) {
        self.editing = None;
        self.deleting = None;
    }

    fn ensure_owner(&self, post: &Post) -> Result<()> {
        match self.username.as_deref() {
            Some(username) if post.is_owned_by(username) => Ok(()),
            Some(_) => bail!("post {} belongs to {}", post.id, post.username),
            None => bail!("sign in first"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn post(id: i64, username: &str) -> Post {
        Post {
            id,
            username: username.into(),
            created_datetime: "2025-01-01T00:00:00Z".into(),
            title: "t".into(),
            content: "c".into(),
        }
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempdir().expect("tempdir");
        let mut store = FileSessionStore::new(dir.path().join("nested").join("username"));
        assert_eq!(store.load_username().expect("load"), None);
        store.save_username("alice").expect("save");
        assert_eq!(store.load_username().expect("load").as_deref(), Some("alice"));
        store.clear_username().expect("clear");
        assert_eq!(store.load_username().expect("load"), None);
        store.clear_username().expect("clearing twice is fine");
    }

    #[test]
    fn sign_in_trims_and_persists() {
        let mut session = Session::restore(Box::new(MemorySessionStore::default())).expect("restore");
        assert!(!session.is_signed_in());
        assert!(session.sign_in("   ").is_err());
        session.sign_in("  alice ").expect("sign in");
        assert_eq!(session.username(), Some("alice"));
        assert_eq!(
            session.store.load_username().expect("load").as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn restore_picks_up_stored_username() {
        let session =
            Session::restore(Box::new(MemorySessionStore::with_username("bob"))).expect("restore");
        assert_eq!(session.username(), Some("bob"));
    }

    #[test]
    fn only_own_posts_can_be_selected() {
        let mut session =
            Session::restore(Box::new(MemorySessionStore::with_username("alice"))).expect("restore");
        assert!(session.select_for_edit(&post(1, "bob")).is_err());
        session.select_for_edit(&post(2, "alice")).expect("edit");
        session.select_for_delete(&post(3, "alice")).expect("delete");
        assert_eq!(session.editing().map(|p| p.id), Some(2));
        assert_eq!(session.deleting().map(|p| p.id), Some(3));
    }

    #[test]
    fn sign_out_clears_selections_and_store() {
        let mut session =
            Session::restore(Box::new(MemorySessionStore::with_username("alice"))).expect("restore");
        session.select_for_edit(&post(2, "alice")).expect("edit");
        session.select_for_delete(&post(2, "alice")).expect("delete");
        session.sign_out().expect("sign out");
        assert!(!session.is_signed_in());
        assert!(session.editing().is_none());
        assert!(session.deleting().is_none());
        assert_eq!(session.store.load_username().expect("load"), None);
    }
}
