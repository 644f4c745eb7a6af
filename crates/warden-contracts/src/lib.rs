//! # warden-contracts
//!
//! Shared types and contracts for the warden authorization engine.
//!
//! All crates in the workspace import from here. No engine logic lives in
//! this crate — only data definitions, small invariant-preserving helpers,
//! and error types.

pub mod error;
pub mod policy;
pub mod request;
pub mod result;
