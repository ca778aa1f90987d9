//! Federated user model.
//!
//! A [`User`] is the platform-facing view of one entry of an external user
//! directory. It is derived from the external record on every request and is
//! never written back.

use serde::{Deserialize, Serialize};

use crate::storage_id::StorageId;

/// A user served by a federation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    // === Identity ===
    /// Platform-visible identifier (`f:<provider-id>:<username>`).
    pub id: StorageId,
    /// Username, equal to the external store's natural key.
    pub username: String,
    /// Whether the user account is enabled.
    pub enabled: bool,

    // === Profile ===
    /// User's first name.
    pub first_name: String,
    /// User's last name (empty when the external record has none).
    pub last_name: String,
    /// User's email address, as stored externally.
    pub email: Option<String>,

    // === Federation ===
    /// Id of the federation provider that owns this user.
    pub federation_link: String,
}

impl User {
    /// Creates an enabled user with empty profile fields.
    ///
    /// The federation link is taken from the storage id.
    #[must_use]
    pub fn new(id: StorageId, username: impl Into<String>) -> Self {
        let federation_link = id.provider_id().to_string();
        Self {
            id,
            username: username.into(),
            enabled: true,
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            federation_link,
        }
    }

    /// Sets the user's email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the user's first name.
    #[must_use]
    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = name.into();
        self
    }

    /// Sets the user's last name.
    #[must_use]
    pub fn with_last_name(mut self, name: impl Into<String>) -> Self {
        self.last_name = name.into();
        self
    }
}
