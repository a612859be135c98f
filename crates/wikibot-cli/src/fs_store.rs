//! Directory-backed document store for local dry runs.
//!
//! Each title maps to one file, `<root>/<percent-encoded title>.wiki`.

use std::path::{Path, PathBuf};

use wikibot_core::{CommitOptions, Document, DocumentMeta, DocumentStore, Result};

/// File extension of stored pages.
pub const PAGE_EXTENSION: &str = "wiki";

/// A [`DocumentStore`] over a local directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    username: String,
}

impl FsStore {
    /// Open a store rooted at `root`, acting as `username`.
    pub fn new(root: impl Into<PathBuf>, username: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            username: username.into(),
        }
    }

    /// Directory holding the pages.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds `title`.
    pub fn page_path(&self, title: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", urlencoding::encode(title), PAGE_EXTENSION))
    }
}

impl DocumentStore for FsStore {
    fn username(&self) -> Result<String> {
        Ok(self.username.clone())
    }

    fn fetch(&self, title: &str) -> Result<Document> {
        match std::fs::read_to_string(self.page_path(title)) {
            Ok(body) => Ok(Document {
                title: title.to_string(),
                exists: true,
                body,
                metadata: DocumentMeta::default(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::absent(title)),
            Err(e) => Err(e.into()),
        }
    }

    fn commit(&self, title: &str, body: &str, options: &CommitOptions) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.page_path(title), body)?;
        tracing::debug!(title, summary = %options.summary, "wrote page file");
        Ok(())
    }
}
