//! Pack use-case services.
//!
//! # Responsibility
//! - Gate every pack mutation behind shape and uniqueness rules.
//! - Report service and store health.
//!
//! # Invariants
//! - Services receive their repository by construction, never from
//!   process-wide state.

pub mod health_service;
pub mod pack_service;
