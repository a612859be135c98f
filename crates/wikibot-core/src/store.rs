//! Document store capability interface.
//!
//! The core only needs to read a document, commit a new body and know which
//! account the bot is logged in as. Real clients (HTTP, authentication,
//! sessions) live outside this crate and implement [`DocumentStore`];
//! [`MemoryStore`] is the in-process implementation used by tests and dry runs.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use crate::error::{BotError, Result};

/// Store-provided metadata about a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Revision identifier of the fetched body, if the document exists.
    pub revision: Option<u64>,
}

/// Snapshot of a document as returned by [`DocumentStore::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Unique title of the document.
    pub title: String,
    /// Whether the document currently exists.
    pub exists: bool,
    /// Current body; empty when the document is absent.
    pub body: String,
    /// Store metadata.
    pub metadata: DocumentMeta,
}

impl Document {
    /// A snapshot of a document that does not exist.
    pub fn absent(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            exists: false,
            body: String::new(),
            metadata: DocumentMeta::default(),
        }
    }
}

/// Flags attached to a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Edit summary.
    pub summary: String,
    /// Mark the edit as minor.
    pub minor: bool,
    /// Mark the edit as made by a bot.
    pub bot: bool,
    /// Suppress interactive confirmation and diff output in the client.
    pub quiet: bool,
    /// Bypass the store's conflict detection.
    pub force: bool,
}

/// Minimal capability interface over a remote document store.
pub trait DocumentStore {
    /// Account name the client is authenticated as.
    fn username(&self) -> Result<String>;

    /// Fetch the current state of a document. An absent document is not an error.
    fn fetch(&self, title: &str) -> Result<Document>;

    /// Replace the body of a document, creating it if needed.
    ///
    /// Must fail with [`BotError::EditConflict`] when the store rejects the
    /// write because of a concurrent modification.
    fn commit(&self, title: &str, body: &str, options: &CommitOptions) -> Result<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn username(&self) -> Result<String> {
        (**self).username()
    }

    fn fetch(&self, title: &str) -> Result<Document> {
        (**self).fetch(title)
    }

    fn commit(&self, title: &str, body: &str, options: &CommitOptions) -> Result<()> {
        (**self).commit(title, body, options)
    }
}

/// A commit accepted by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Title that was written.
    pub title: String,
    /// Body that was written.
    pub body: String,
    /// Flags the commit was issued with.
    pub options: CommitOptions,
}

#[derive(Debug, Default)]
struct MemoryState {
    pages: BTreeMap<String, (String, u64)>,
    commits: Vec<CommitRecord>,
    conflicts: HashSet<String>,
    fetch_count: usize,
}

/// In-memory document store backed by a BTreeMap. Thread-safe via RwLock.
#[derive(Debug)]
pub struct MemoryStore {
    username: String,
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates a new empty store logged in as `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Seed a document without recording a commit.
    pub fn insert(&self, title: impl Into<String>, body: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            let entry = state.pages.entry(title.into()).or_insert((String::new(), 0));
            entry.0 = body.into();
            entry.1 += 1;
        }
    }

    /// Current body of a document, if it exists.
    pub fn body(&self, title: &str) -> Option<String> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.pages.get(title).map(|(body, _)| body.clone()))
    }

    /// Make the next non-forced commit to `title` fail with an edit conflict.
    pub fn inject_conflict(&self, title: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.conflicts.insert(title.into());
        }
    }

    /// All commits accepted so far, oldest first.
    pub fn commits(&self) -> Vec<CommitRecord> {
        self.state
            .read()
            .map(|state| state.commits.clone())
            .unwrap_or_default()
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.state.read().map(|state| state.fetch_count).unwrap_or(0)
    }
}

impl DocumentStore for MemoryStore {
    fn username(&self) -> Result<String> {
        Ok(self.username.clone())
    }

    fn fetch(&self, title: &str) -> Result<Document> {
        let mut state = self.state.write().map_err(|e| BotError::Store {
            msg: e.to_string(),
        })?;
        state.fetch_count += 1;
        Ok(match state.pages.get(title) {
            Some((body, revision)) => Document {
                title: title.to_string(),
                exists: true,
                body: body.clone(),
                metadata: DocumentMeta {
                    revision: Some(*revision),
                },
            },
            None => Document::absent(title),
        })
    }

    fn commit(&self, title: &str, body: &str, options: &CommitOptions) -> Result<()> {
        let mut state = self.state.write().map_err(|e| BotError::Store {
            msg: e.to_string(),
        })?;
        if state.conflicts.remove(title) && !options.force {
            return Err(BotError::EditConflict {
                title: title.to_string(),
            });
        }
        let entry = state
            .pages
            .entry(title.to_string())
            .or_insert((String::new(), 0));
        entry.0 = body.to_string();
        entry.1 += 1;
        state.commits.push(CommitRecord {
            title: title.to_string(),
            body: body.to_string(),
            options: options.clone(),
        });
        Ok(())
    }
}
