//! Transport boundary for the pack catalog.
//!
//! Callers hand in plain strings and serde inputs; everything returned is an
//! envelope, never a panic or a raw core error.

pub mod api;

pub use api::{
    core_version, init_logging, ActionResponse, LookupResponse, PackApi, PackCommand,
    SUCCESS_CODE, UNCODED_FAILURE,
};
