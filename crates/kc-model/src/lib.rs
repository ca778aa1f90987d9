//! # kc-model
//!
//! Domain values shared by federation providers.
//!
//! - [`StorageId`] - platform-visible identifier of a federated user
//! - [`User`] - the platform's view of an external user record
//! - [`CredentialInput`] / [`CredentialType`] - credentials presented for validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod storage_id;
pub mod user;

pub use credential::{CredentialInput, CredentialType};
pub use storage_id::{StorageId, StorageIdError};
pub use user::User;
