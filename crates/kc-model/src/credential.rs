//! Credential types and inputs.
//!
//! Credentials are authentication factors presented by users. Federation
//! providers only validate them; they never store or rotate them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credential type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    /// Password credential.
    Password,
    /// TOTP (Time-based One-Time Password) credential.
    Totp,
    /// `WebAuthn` credential.
    Webauthn,
    /// Recovery codes.
    RecoveryCodes,
}

impl CredentialType {
    /// Returns the type tag used by the platform.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Totp => "otp",
            Self::Webauthn => "webauthn",
            Self::RecoveryCodes => "recovery-authn-codes",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential presented for validation.
///
/// The challenge response is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialInput {
    /// Credential type tag (e.g. `password`).
    #[serde(rename = "type")]
    pub credential_type: String,
    /// The secret supplied by the user.
    #[serde(rename = "value")]
    pub challenge_response: String,
}

impl CredentialInput {
    /// Creates a credential input.
    #[must_use]
    pub fn new(credential_type: impl Into<String>, challenge_response: impl Into<String>) -> Self {
        Self {
            credential_type: credential_type.into(),
            challenge_response: challenge_response.into(),
        }
    }

    /// Creates a password credential input.
    #[must_use]
    pub fn password(password: impl Into<String>) -> Self {
        Self::new(CredentialType::Password.as_str(), password)
    }
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInput")
            .field("credential_type", &self.credential_type)
            .field("challenge_response", &"[REDACTED]")
            .finish()
    }
}
