//! Core domain logic for the pack catalog service.
//! This crate is the single source of truth for pack business invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ServiceConfig};
pub use error::ErrorCode;
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::pack::{
    Currency, Mno, Pack, PackId, PackKeys, PackState, PackType, PackValidationError, Resource,
    Term, INITIAL_PACK_STATE,
};
pub use repo::pack_repo::{
    FieldChange, PackRepository, RepoError, RepoResult, SqlitePackRepository, StoreStats,
};
pub use service::health_service::{DbHealth, HealthService, HealthStatus};
pub use service::pack_service::{PackService, ServiceError, ServiceResult, StockPolicy};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
