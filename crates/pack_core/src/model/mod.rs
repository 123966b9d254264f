//! Pack catalog domain model.
//!
//! # Responsibility
//! - Define the pack aggregate and its structured sub-entities.
//! - Define the uniqueness probe shared by service and repository layers.
//!
//! # Invariants
//! - Every stored pack is identified by a stable `PackId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod pack;
