//! Shared fakes for wikibot-core integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::time::Duration;

use wikibot_core::{BotError, Clock, CommitOptions, Document, DocumentStore, MemoryStore, Result};

/// Store wrapper that fails the first `failures` commits with a transport error.
pub struct FlakyStore {
    pub inner: MemoryStore,
    failures: Cell<u32>,
    pub commit_attempts: Cell<u32>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failures: u32) -> Self {
        Self {
            inner,
            failures: Cell::new(failures),
            commit_attempts: Cell::new(0),
        }
    }
}

impl DocumentStore for FlakyStore {
    fn username(&self) -> Result<String> {
        self.inner.username()
    }

    fn fetch(&self, title: &str) -> Result<Document> {
        self.inner.fetch(title)
    }

    fn commit(&self, title: &str, body: &str, options: &CommitOptions) -> Result<()> {
        self.commit_attempts.set(self.commit_attempts.get() + 1);
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(BotError::Store {
                msg: "503 Service Unavailable".to_string(),
            });
        }
        self.inner.commit(title, body, options)
    }
}

/// Simulated monotonic clock: sleeping advances time, `advance` models work.
#[derive(Default)]
pub struct SimClock {
    now: Cell<Duration>,
    pub sleeps: RefCell<Vec<Duration>>,
}

impl SimClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for &SimClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

/// A store whose runpage for `ExampleBot` is enabled.
pub fn running_store() -> MemoryStore {
    let store = MemoryStore::new("ExampleBot");
    store.insert("User:ExampleBot/Run", "<!-- Set to False to stop the bot -->\nTrue");
    store
}
