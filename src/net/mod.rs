//! Networking modules for persisting board mutations.
//!
//! SYSTEM CONTEXT
//! ==============
//! `types` defines the action requests and response envelope, `api` the
//! transport seam and its browser implementation, and `dispatch` the ledger
//! that coalesces moves and records failures.

pub mod api;
pub mod dispatch;
#[cfg(test)]
pub(crate) mod recording;
pub mod types;
