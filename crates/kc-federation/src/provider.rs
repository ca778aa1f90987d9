//! User storage provider traits.
//!
//! These traits are the contract between the identity platform and an
//! external user store. Providers are shared across worker tasks, so every
//! implementation must be `Send + Sync` and keep no per-request state.

use std::collections::HashMap;

use kc_model::{CredentialInput, User};

use crate::config::FederationConfig;
use crate::error::{FederationError, FederationResult};

/// Default number of results per page.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

// ============================================================================
// Paging
// ============================================================================

/// A window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of leading results to skip.
    pub first: usize,
    /// Maximum number of results to return.
    pub max: usize,
}

impl Page {
    /// Creates a page.
    #[must_use]
    pub const fn new(first: usize, max: usize) -> Self {
        Self { first, max }
    }

    /// Returns a copy with `max` clamped to `cap`.
    #[must_use]
    pub fn capped(self, cap: usize) -> Self {
        Self {
            first: self.first,
            max: self.max.min(cap),
        }
    }

    /// Returns true if the page can hold no results.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.max == 0
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, DEFAULT_MAX_RESULTS)
    }
}

// ============================================================================
// User Storage Provider
// ============================================================================

/// Trait for user storage federation providers.
///
/// Handles user lookup and queries against an external identity store.
/// Missing users are reported as `Ok(None)`, never as errors.
#[allow(async_fn_in_trait)]
pub trait UserStorageProvider: Send + Sync {
    /// Returns the provider configuration.
    fn config(&self) -> &FederationConfig;

    /// Returns the provider type identifier.
    fn provider_type(&self) -> &'static str;

    /// Validates the provider configuration.
    async fn validate_config(&self) -> FederationResult<()>;

    /// Tests the connection to the external store.
    async fn test_connection(&self) -> FederationResult<()>;

    // === User Lookup ===

    /// Gets a user by the platform reference handed out by this provider.
    async fn get_user_by_id(&self, id: &str) -> FederationResult<Option<User>>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str) -> FederationResult<Option<User>>;

    /// Gets a user by email.
    async fn get_user_by_email(&self, email: &str) -> FederationResult<Option<User>>;

    // === User Queries ===

    /// Counts all users in the external store.
    async fn count_users(&self) -> FederationResult<u64>;

    /// Lists users, ordered by display name.
    async fn get_users(&self, page: Page) -> FederationResult<Vec<User>>;

    /// Searches for users whose display name matches `pattern`.
    async fn search_users(&self, pattern: &str, page: Page) -> FederationResult<Vec<User>>;

    /// Searches for users by a map of platform search parameters.
    ///
    /// Providers without structured search answer with the plain listing.
    async fn search_users_by_params(
        &self,
        _params: &HashMap<String, String>,
        page: Page,
    ) -> FederationResult<Vec<User>> {
        self.get_users(page).await
    }

    /// Searches for users by a single attribute value.
    async fn search_users_by_attribute(
        &self,
        _name: &str,
        _value: &str,
    ) -> FederationResult<Vec<User>> {
        Ok(Vec::new())
    }

    /// Gets the members of a platform group.
    async fn get_group_members(&self, _group_id: &str, _page: Page) -> FederationResult<Vec<User>> {
        Ok(Vec::new())
    }

    // === User Management (if supported) ===

    /// Creates a user in the external store.
    ///
    /// Returns `FederationError::ReadOnly` if the provider is read-only.
    async fn create_user(&self, _user: &User) -> FederationResult<()> {
        if self.config().edit_mode.is_read_only() {
            return Err(FederationError::read_only("create user"));
        }
        Err(FederationError::not_supported("create user"))
    }

    /// Updates a user in the external store.
    ///
    /// Returns `FederationError::ReadOnly` if the provider is read-only.
    async fn update_user(&self, _user: &User) -> FederationResult<()> {
        if self.config().edit_mode.is_read_only() {
            return Err(FederationError::read_only("update user"));
        }
        Err(FederationError::not_supported("update user"))
    }

    /// Deletes a user from the external store.
    ///
    /// Returns `FederationError::ReadOnly` if the provider is read-only.
    async fn delete_user(&self, _id: &str) -> FederationResult<()> {
        if self.config().edit_mode.is_read_only() {
            return Err(FederationError::read_only("delete user"));
        }
        Err(FederationError::not_supported("delete user"))
    }

    /// Closes the provider, releasing any resources.
    async fn close(&self) -> FederationResult<()> {
        Ok(())
    }
}

// ============================================================================
// Credential Validator
// ============================================================================

/// Trait for validating credentials against external systems.
///
/// Implementations must never log the supplied secret.
#[allow(async_fn_in_trait)]
pub trait CredentialValidator: Send + Sync {
    /// Returns true if the provider can validate credentials of this type.
    fn supports_credential_type(&self, credential_type: &str) -> bool;

    /// Returns true if `user` can be validated with this credential type.
    fn is_configured_for(&self, _user: &User, credential_type: &str) -> bool {
        self.supports_credential_type(credential_type)
    }

    /// Validates a credential for the user behind the platform reference `id`.
    ///
    /// Unknown users and unsupported credential types yield `Ok(false)`.
    async fn is_valid(&self, id: &str, input: &CredentialInput) -> FederationResult<bool>;

    /// Updates a credential in the external store.
    ///
    /// Returns `FederationError::NotSupported` if credential updates are not supported.
    async fn update_credential(&self, _id: &str, _input: &CredentialInput) -> FederationResult<()> {
        Err(FederationError::not_supported("credential update"))
    }
}
