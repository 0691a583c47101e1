//! # berth-image
//!
//! Image references and registry credentials for berth.
//!
//! This crate provides:
//! - Splitting image references into registry, name and tag
//! - Registry credential lookup and encoding for the Docker daemon

#![warn(missing_docs)]

pub mod credentials;
pub mod reference;

pub use credentials::{AuthConfig, CredentialResolver, EncodedCredential, RegistryAuth};
pub use reference::ImageReference;
