//! Replica lag probe.
//!
//! Bots that read from a replica before writing to the primary check how far
//! the replica trails. The probe reads the heartbeat table of one replica
//! cluster and turns the single lag value into a [`Duration`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{BotError, Result};

/// Heartbeat query; the single parameter is the database name.
pub const REPLAG_QUERY: &str =
    "SELECT lag FROM heartbeat_p.heartbeat JOIN meta_p.wiki ON shard = slice WHERE dbname = ?";

/// An open connection to a replica database.
pub trait ReplicaConnection {
    /// Run `sql` against `cluster`. Each row is a single numeric value.
    fn query(&self, sql: &str, cluster: &str) -> Result<Vec<f64>>;
}

/// Factory for replica connections.
pub trait ReplicaDatabase {
    /// Open a connection to the named replica database.
    fn connect(&self, identifier: &str) -> Result<Box<dyn ReplicaConnection>>;
}

/// Name of the public replica view for a database.
pub fn replica_name(db: &str) -> String {
    format!("{}_p", db)
}

fn lag_from_secs(secs: f64) -> Result<Duration> {
    if !secs.is_finite() {
        return Err(BotError::Database {
            msg: format!("non-finite replica lag: {}", secs),
        });
    }
    Ok(Duration::from_secs_f64(secs.max(0.0)))
}

/// Measure replication lag of `db` on `cluster`.
///
/// Zero rows fail with [`BotError::ClusterNotFound`]. If more than one row is
/// returned the first is used. Negative values clamp to zero.
pub fn get_replag<D: ReplicaDatabase + ?Sized>(
    database: &D,
    db: &str,
    cluster: &str,
) -> Result<Duration> {
    let conn = database.connect(&replica_name(db))?;
    let rows = conn.query(REPLAG_QUERY, cluster)?;
    let secs = match rows.as_slice() {
        [] => {
            return Err(BotError::ClusterNotFound {
                cluster: cluster.to_string(),
            })
        }
        [secs] => *secs,
        [secs, ..] => {
            warn!(db, cluster, rows = rows.len(), "replag probe returned multiple rows");
            *secs
        }
    };
    let lag = lag_from_secs(secs)?;
    debug!(db, cluster, lag_ms = lag.as_millis() as u64, "measured replica lag");
    Ok(lag)
}

/// In-memory replica database keyed by cluster name.
#[derive(Debug, Default)]
pub struct MemoryReplicaDatabase {
    rows: HashMap<String, Vec<f64>>,
    connections: Mutex<Vec<String>>,
}

impl MemoryReplicaDatabase {
    /// Creates an empty database; every cluster returns zero rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rows returned for `cluster`.
    pub fn with_rows(mut self, cluster: impl Into<String>, rows: Vec<f64>) -> Self {
        self.rows.insert(cluster.into(), rows);
        self
    }

    /// Identifiers passed to `connect`, oldest first.
    pub fn connections(&self) -> Vec<String> {
        self.connections
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

struct MemoryReplicaConnection {
    rows: HashMap<String, Vec<f64>>,
}

impl ReplicaConnection for MemoryReplicaConnection {
    fn query(&self, _sql: &str, cluster: &str) -> Result<Vec<f64>> {
        Ok(self.rows.get(cluster).cloned().unwrap_or_default())
    }
}

impl ReplicaDatabase for MemoryReplicaDatabase {
    fn connect(&self, identifier: &str) -> Result<Box<dyn ReplicaConnection>> {
        self.connections
            .lock()
            .map_err(|e| BotError::Database { msg: e.to_string() })?
            .push(identifier.to_string());
        Ok(Box::new(MemoryReplicaConnection {
            rows: self.rows.clone(),
        }))
    }
}
