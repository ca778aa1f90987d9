//! # kc-federation
//!
//! User federation framework.
//!
//! This crate provides the base traits, configuration and error taxonomy for
//! user federation providers, plus the codec that names federated users.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod config;
pub mod error;
pub mod provider;

pub use codec::IdentityCodec;
pub use config::{EditMode, FederationConfig};
pub use error::{FederationError, FederationResult};
pub use provider::{CredentialValidator, Page, UserStorageProvider};
