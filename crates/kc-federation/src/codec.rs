//! Identity codec for federated user references.
//!
//! Turns external keys into platform references owned by one provider, and
//! back. The provider tag is opaque: decoding only checks that it matches.

use kc_model::StorageId;

use crate::error::{FederationError, FederationResult};

/// Encodes and decodes references for a single federation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCodec {
    provider_id: String,
}

impl IdentityCodec {
    /// Creates a codec for the given provider.
    #[must_use]
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }

    /// Returns the provider id this codec tags references with.
    #[must_use]
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Builds the platform reference for an external key.
    #[must_use]
    pub fn encode(&self, key: &str) -> StorageId {
        StorageId::new(self.provider_id.as_str(), key)
    }

    /// Extracts the external key from a platform reference.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::MalformedReference`] if the reference is
    /// not a federated id or belongs to another provider.
    pub fn decode(&self, reference: &str) -> FederationResult<String> {
        let id = StorageId::parse(reference)?;

        if id.provider_id() != self.provider_id {
            return Err(FederationError::malformed_reference(format!(
                "reference '{reference}' is not owned by provider '{}'",
                self.provider_id
            )));
        }

        Ok(id.into_external_id())
    }
}
