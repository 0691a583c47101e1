//! # berth-common
//!
//! Shared utilities and types for berth.
//!
//! This crate provides:
//! - The common error type
//! - Composed container names with random suffixes
//! - String-set diffing

#![warn(missing_docs)]

pub mod diff;
pub mod error;
pub mod name;

pub use diff::diff_strings;
pub use error::{BerthError, BerthResult};
pub use name::InstanceName;
