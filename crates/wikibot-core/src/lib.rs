#![warn(missing_docs)]

//! wikibot core: safe automated writes to a shared wiki.
//!
//! Runpage kill switch, edit throttle, bounded retry, idempotent page writer
//! and replica lag probe, plus the config and logging bootstrap bots share.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod replag;
pub mod retry;
pub mod runpage;
pub mod session;
pub mod store;
pub mod throttle;
pub mod writer;

pub use clock::{Clock, MonotonicClock};
pub use config::{load_config, BotSettings, ConfigMap};
pub use error::{BotError, Result};
pub use logging::{get_log_location, init_logging, on_toolforge, LogEnvironment, LoggingGuard};
pub use replag::{get_replag, MemoryReplicaDatabase, ReplicaConnection, ReplicaDatabase};
pub use retry::{retry, RetryConfig, RetryExecutor};
pub use runpage::{check_runpage, parse_runpage, resolve_title, RunpageOptions};
pub use session::{EditSession, ReplagLimit};
pub use store::{CommitOptions, CommitRecord, Document, DocumentMeta, DocumentStore, MemoryStore};
pub use throttle::Throttle;
pub use writer::{compute_edit, save_page, EditMode, EditOutcome, PageEdit, PageWriter};
