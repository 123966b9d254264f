//! Persistence contract for the pack store.
//!
//! # Responsibility
//! - Define the storage-agnostic pack repository contract.
//! - Isolate SQLite query details from orchestration code.
//!
//! # Invariants
//! - Repositories never apply business rules; the service layer does.
//! - Missing rows are reported as absent values on reads, `NotFound` on
//!   writes, never as transport errors.

pub mod pack_repo;
