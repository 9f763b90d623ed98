//! Client-side session lifecycle and mutation guard for the lab-record
//! management API.
//!
//! - [`identity`]: time-bounded session, persistence, and the guard in front of protected views
//! - [`access`]: ownership, referential-integrity and permission decisions
//! - [`api`]: the consumed REST surface
//! - [`screen`]: the per-resource workflow combining the above

pub mod access;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod screen;
