//! Page writer.
//!
//! Computes a new body from an edit mode and the current remote body, refuses
//! writes that would change nothing, and commits quietly without ever forcing
//! past the store's conflict detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::store::{CommitOptions, DocumentStore};

/// How the supplied text is combined with the current body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// New body is the text.
    Replace,
    /// New body is the old body followed by the text.
    Append,
    /// New body is the text followed by the old body.
    Prepend,
    /// Page deletion. Not handled by [`save_page`].
    Delete,
}

impl EditMode {
    /// Lowercase name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            EditMode::Replace => "replace",
            EditMode::Append => "append",
            EditMode::Prepend => "prepend",
            EditMode::Delete => "delete",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditMode {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "replace" => Ok(EditMode::Replace),
            "append" => Ok(EditMode::Append),
            "prepend" => Ok(EditMode::Prepend),
            "delete" => Ok(EditMode::Delete),
            other => Err(BotError::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Result of computing a write against the current body.
///
/// There is no conflict outcome: a commit the store rejects for concurrent
/// modification surfaces as [`BotError::EditConflict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The computed body equals the current body.
    NoOp,
    /// An existing document gets a new body.
    NewContent(String),
    /// An absent document is created with this body.
    Create(String),
}

/// Everything [`save_page`] needs besides the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEdit {
    /// Title of the document to write.
    pub title: String,
    /// Text to combine with the current body.
    pub text: String,
    /// Edit summary.
    pub summary: String,
    /// Mark the edit as minor.
    pub minor: bool,
    /// Mark the edit as made by a bot.
    pub bot: bool,
    /// How `text` is combined with the current body.
    pub mode: EditMode,
    /// Treat an absent document as empty instead of failing.
    pub new_ok: bool,
    /// Return successfully instead of failing when nothing would change.
    pub no_change_ok: bool,
}

impl PageEdit {
    /// A bot-flagged, non-minor edit with creation and no-op both disallowed.
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        summary: impl Into<String>,
        mode: EditMode,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            summary: summary.into(),
            minor: false,
            bot: true,
            mode,
            new_ok: false,
            no_change_ok: false,
        }
    }
}

/// Compute the outcome of applying `text` in `mode` to `old` (`None` = absent).
pub fn compute_edit(old: Option<&str>, text: &str, mode: EditMode) -> Result<EditOutcome> {
    let old_body = old.unwrap_or("");
    let new_body = match mode {
        EditMode::Replace => text.to_string(),
        EditMode::Append => format!("{}{}", old_body, text),
        EditMode::Prepend => format!("{}{}", text, old_body),
        EditMode::Delete => {
            return Err(BotError::UnsupportedMode {
                mode: mode.to_string(),
            })
        }
    };
    Ok(if new_body == old_body {
        EditOutcome::NoOp
    } else if old.is_none() {
        EditOutcome::Create(new_body)
    } else {
        EditOutcome::NewContent(new_body)
    })
}

/// Apply `edit` to the store.
///
/// Fails with [`BotError::UnsupportedMode`] for [`EditMode::Delete`] before
/// touching the store, [`BotError::DocumentNotFound`] for an absent document
/// unless `new_ok`, and [`BotError::NoChange`] when the body would not change
/// unless `no_change_ok`. Commit errors, edit conflicts included, propagate.
pub fn save_page<S: DocumentStore + ?Sized>(store: &S, edit: &PageEdit) -> Result<EditOutcome> {
    if edit.mode == EditMode::Delete {
        return Err(BotError::UnsupportedMode {
            mode: edit.mode.to_string(),
        });
    }

    let page = store.fetch(&edit.title)?;
    if !page.exists && !edit.new_ok {
        return Err(BotError::DocumentNotFound {
            title: edit.title.clone(),
        });
    }
    let old = page.exists.then_some(page.body.as_str());

    let outcome = compute_edit(old, &edit.text, edit.mode)?;
    let body = match &outcome {
        EditOutcome::NewContent(body) | EditOutcome::Create(body) => body.as_str(),
        EditOutcome::NoOp if edit.no_change_ok => {
            debug!(title = %edit.title, "nothing to save");
            return Ok(EditOutcome::NoOp);
        }
        EditOutcome::NoOp => {
            return Err(BotError::NoChange {
                title: edit.title.clone(),
            })
        }
    };

    let options = CommitOptions {
        summary: edit.summary.clone(),
        minor: edit.minor,
        bot: edit.bot,
        quiet: true,
        force: false,
    };
    store.commit(&edit.title, body, &options)?;
    info!(title = %edit.title, mode = %edit.mode, created = !page.exists, "saved page");
    Ok(outcome)
}

/// Writes pages through one store.
#[derive(Debug)]
pub struct PageWriter<S> {
    store: S,
}

impl<S: DocumentStore> PageWriter<S> {
    /// Create a writer over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply `edit`. See [`save_page`].
    pub fn write(&self, edit: &PageEdit) -> Result<EditOutcome> {
        save_page(&self.store, edit)
    }
}
