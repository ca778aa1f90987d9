//! Federated storage identifiers.
//!
//! Users served by a federation provider are addressed by the platform with a
//! composite id of the form `f:<provider-id>:<external-id>`. The provider id
//! tags which federation provider owns the user; the external id is the
//! natural key of the user inside the external store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix carried by every federated storage id.
pub const FEDERATED_PREFIX: &str = "f:";

/// Separator between the provider id and the external id.
const SEPARATOR: char = ':';

/// Errors raised when a string cannot be read as a [`StorageId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageIdError {
    /// The id does not start with the federated prefix.
    #[error("not a federated storage id: '{0}'")]
    NotFederated(String),

    /// The id has no separator between provider id and external id.
    #[error("storage id '{0}' has no provider separator")]
    MissingSeparator(String),

    /// The provider id part is empty.
    #[error("storage id '{0}' has an empty provider id")]
    EmptyProvider(String),

    /// The external id part is empty.
    #[error("storage id '{0}' has an empty external id")]
    EmptyExternalId(String),
}

/// Identifier of a user stored in a federation provider.
///
/// The external id is kept verbatim, including any `:` it may contain; only
/// the first separator after the prefix is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageId {
    provider_id: String,
    external_id: String,
}

impl StorageId {
    /// Creates a storage id for a user held by `provider_id`.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            external_id: external_id.into(),
        }
    }

    /// Parses a rendered storage id.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageIdError`] describing the first structural problem.
    pub fn parse(id: &str) -> Result<Self, StorageIdError> {
        let rest = id
            .strip_prefix(FEDERATED_PREFIX)
            .ok_or_else(|| StorageIdError::NotFederated(id.to_string()))?;

        let (provider_id, external_id) = rest
            .split_once(SEPARATOR)
            .ok_or_else(|| StorageIdError::MissingSeparator(id.to_string()))?;

        if provider_id.is_empty() {
            return Err(StorageIdError::EmptyProvider(id.to_string()));
        }
        if external_id.is_empty() {
            return Err(StorageIdError::EmptyExternalId(id.to_string()));
        }

        Ok(Self::new(provider_id, external_id))
    }

    /// Returns true if `id` carries the federated prefix.
    #[must_use]
    pub fn is_federated(id: &str) -> bool {
        id.starts_with(FEDERATED_PREFIX)
    }

    /// Returns the id of the provider owning the user.
    #[must_use]
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Returns the user's key in the external store.
    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Consumes the id, returning the external id.
    #[must_use]
    pub fn into_external_id(self) -> String {
        self.external_id
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{FEDERATED_PREFIX}{}{SEPARATOR}{}",
            self.provider_id, self.external_id
        )
    }
}

impl FromStr for StorageId {
    type Err = StorageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StorageId {
    type Error = StorageIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StorageId> for String {
    fn from(id: StorageId) -> Self {
        id.to_string()
    }
}
