//! One bot write stream: gate, optional freshness check, pacing and retry
//! around the page writer.

use std::time::Duration;

use tracing::debug;

use crate::clock::{Clock, MonotonicClock};
use crate::config::BotSettings;
use crate::error::{BotError, Result};
use crate::replag::{get_replag, ReplicaDatabase};
use crate::retry::RetryExecutor;
use crate::runpage::{check_runpage, RunpageOptions};
use crate::store::DocumentStore;
use crate::throttle::Throttle;
use crate::writer::{save_page, EditOutcome, PageEdit};

/// Replica lag ceiling for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplagLimit {
    /// Database to probe.
    pub db: String,
    /// Replica cluster to probe.
    pub cluster: String,
    /// Largest lag at which writes still proceed.
    pub max: Duration,
}

impl ReplagLimit {
    /// Limit described by `replag_db`, `replag_cluster` and `max_replag_secs`.
    ///
    /// `None` unless both a database and a ceiling are configured.
    pub fn from_settings(settings: &BotSettings) -> Option<Self> {
        let db = settings.replag_db.clone()?;
        let max = settings.max_replag()?;
        Some(Self {
            db,
            cluster: settings.replag_cluster.clone(),
            max,
        })
    }
}

/// Sequences `check_runpage`, the replag check, the throttle and a retried
/// `save_page` for every edit.
///
/// Only transient errors (see [`BotError::is_transient`]) are retried.
pub struct EditSession<'a, S: ?Sized, C: Clock = MonotonicClock> {
    store: &'a S,
    throttle: Throttle<C>,
    retry: RetryExecutor,
    runpage: RunpageOptions,
    replag: Option<(&'a dyn ReplicaDatabase, ReplagLimit)>,
}

impl<'a, S: DocumentStore + ?Sized> EditSession<'a, S, MonotonicClock> {
    /// Build a session from merged settings.
    pub fn from_settings(store: &'a S, settings: &BotSettings) -> Self {
        let runpage = RunpageOptions {
            task: settings.runpage_task.clone().unwrap_or_default(),
            title: settings.runpage_title.clone().unwrap_or_default(),
            override_check: false,
        };
        Self::new(
            store,
            Throttle::new(settings.edit_delay()),
            RetryExecutor::new(settings.retry_config()),
            runpage,
        )
    }
}

impl<'a, S: DocumentStore + ?Sized, C: Clock> EditSession<'a, S, C> {
    /// Create a session without a replag check.
    pub fn new(
        store: &'a S,
        throttle: Throttle<C>,
        retry: RetryExecutor,
        runpage: RunpageOptions,
    ) -> Self {
        Self {
            store,
            throttle,
            retry,
            runpage,
            replag: None,
        }
    }

    /// Refuse to write while replica lag exceeds `limit`.
    pub fn with_replag_limit(mut self, database: &'a dyn ReplicaDatabase, limit: ReplagLimit) -> Self {
        self.replag = Some((database, limit));
        self
    }

    /// Apply the replag limit from `settings`, if one is configured.
    pub fn with_replag_from_settings(
        self,
        database: &'a dyn ReplicaDatabase,
        settings: &BotSettings,
    ) -> Self {
        match ReplagLimit::from_settings(settings) {
            Some(limit) => self.with_replag_limit(database, limit),
            None => self,
        }
    }

    /// Force runs regardless of the runpage contents.
    pub fn override_runpage(mut self, override_check: bool) -> Self {
        self.runpage.override_check = override_check;
        self
    }

    /// The session's throttle.
    pub fn throttle(&self) -> &Throttle<C> {
        &self.throttle
    }

    /// Fail if the replica is further behind than the configured limit.
    pub fn check_replag(&self) -> Result<()> {
        let Some((database, limit)) = &self.replag else {
            return Ok(());
        };
        let lag = get_replag(*database, &limit.db, &limit.cluster)?;
        if lag > limit.max {
            return Err(BotError::ReplagExceeded {
                lag,
                max: limit.max,
            });
        }
        Ok(())
    }

    /// Gate, pace and commit one edit.
    pub fn save(&mut self, edit: &PageEdit) -> Result<EditOutcome> {
        check_runpage(self.store, &self.runpage)?;
        self.check_replag()?;
        self.throttle.throttle();

        let store = self.store;
        // Permanent failures leave the retry loop as a successful inner Err.
        let shielded = self.retry.execute(|| match save_page(store, edit) {
            Err(e) if !e.is_transient() => Ok(Err(e)),
            Err(e) => {
                debug!(title = %edit.title, "transient save failure");
                Err(e)
            }
            Ok(outcome) => Ok(Ok(outcome)),
        });
        shielded?
    }
}
