//! # warden-core
//!
//! The policy decision engine for the warden authorization system.
//!
//! This crate provides:
//! - The collaborator traits (`PolicyEvaluator`, `PolicyEvaluatorFactory`,
//!   `ContextEnricher`, `AccessResultProcessor`)
//! - `PolicyRepository`: the ordered evaluator list for one policy family,
//!   with its audit cache
//! - `PolicyEngine`: the two-stage (tag-first, then resource) evaluation
//!   pipeline with deny-overrides combination across tags
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_core::{PolicyEngine, traits::PolicyEvaluatorFactory};
//!
//! let engine = PolicyEngine::new(&service_policies, &options, &factory)?;
//! engine.enrich_context(&request);
//! let result = engine.is_access_allowed(&request, None);
//! ```

pub mod engine;
pub mod repository;
pub mod tag;
pub mod traits;

pub use engine::PolicyEngine;
pub use repository::PolicyRepository;
pub use tag::{tag_access_request, TAG_RESOURCE_DIMENSION};
