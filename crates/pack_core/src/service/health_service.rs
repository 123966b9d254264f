//! Service health reporting.
//!
//! # Responsibility
//! - Probe the pack store and report its state next to the service state.
//!
//! # Invariants
//! - A failing store never flips the service's own `status`; callers read
//!   dependency health from `dbhealth`.

use crate::repo::pack_repo::PackRepository;
use log::error;
use serde::{Deserialize, Serialize};

/// Name reported for the service itself.
pub const SERVICE_NAME: &str = "pack";
/// Name reported for the pack store dependency.
pub const STORE_NAME: &str = "packstore";

/// Health of one storage dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbHealth {
    pub name: String,
    pub status: bool,
    pub message: String,
}

/// Health report for the service and its dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub name: String,
    pub status: bool,
    #[serde(rename = "dbhealth")]
    pub db_health: Vec<DbHealth>,
}

impl HealthStatus {
    pub fn new(name: impl Into<String>, status: bool) -> Self {
        Self {
            name: name.into(),
            status,
            db_health: Vec::new(),
        }
    }

    pub fn add_db(&mut self, db: DbHealth) {
        self.db_health.push(db);
    }

    /// True when the service and every dependency report healthy.
    pub fn is_healthy(&self) -> bool {
        self.status && self.db_health.iter().all(|db| db.status)
    }
}

/// Health probe over a pack repository.
pub struct HealthService<R: PackRepository> {
    repo: R,
}

impl<R: PackRepository> HealthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn health(&self) -> HealthStatus {
        let store = match self.repo.ping() {
            Ok(stats) => DbHealth {
                name: STORE_NAME.to_string(),
                status: true,
                message: format!(
                    "ok packs={} schema_version={}",
                    stats.pack_count, stats.schema_version
                ),
            },
            Err(err) => {
                error!(
                    "event=health_check module=service status=error dependency={} error={}",
                    STORE_NAME, err
                );
                DbHealth {
                    name: STORE_NAME.to_string(),
                    status: false,
                    message: err.to_string(),
                }
            }
        };

        let mut status = HealthStatus::new(SERVICE_NAME, true);
        status.add_db(store);
        status
    }
}
