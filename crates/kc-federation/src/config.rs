//! Federation provider configuration.
//!
//! Configuration types for user federation providers. A configuration is
//! built once when the provider is created and is immutable afterwards.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FederationError, FederationResult};

/// Edit mode for federated users.
///
/// Controls whether changes to users are written back to the external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditMode {
    /// Users are read-only. Changes on the platform are not written back.
    #[default]
    ReadOnly,

    /// Users are writable. Changes are written back to the external store.
    Writable,

    /// Changes are stored by the platform and not written back.
    Unsynced,
}

impl EditMode {
    /// Returns true if the mode is read-only.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

/// Base configuration for all federation providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Unique identifier for this provider configuration.
    ///
    /// Rendered into every user reference the provider hands out.
    pub id: Uuid,

    /// Provider type (e.g., "legacy-sql").
    pub provider_type: String,

    /// Display name.
    pub name: String,

    /// Edit mode.
    pub edit_mode: EditMode,

    /// Provider-specific configuration.
    pub config: HashMap<String, String>,

    /// Connection timeout.
    #[serde(with = "duration_secs")]
    pub connection_timeout: Duration,

    /// Read timeout.
    #[serde(with = "duration_secs")]
    pub read_timeout: Duration,
}

impl FederationConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> FederationConfigBuilder {
        FederationConfigBuilder::new()
    }

    /// Returns the provider id as rendered in user references.
    #[must_use]
    pub fn provider_id(&self) -> String {
        self.id.to_string()
    }

    /// Gets a config value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }
}

/// Builder for [`FederationConfig`].
#[derive(Debug, Default)]
pub struct FederationConfigBuilder {
    id: Option<Uuid>,
    provider_type: Option<String>,
    name: Option<String>,
    edit_mode: EditMode,
    config: HashMap<String, String>,
    connection_timeout: Duration,
    read_timeout: Duration,
}

impl FederationConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connection_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            ..Default::default()
        }
    }

    /// Sets the ID.
    #[must_use]
    pub const fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the provider type.
    #[must_use]
    pub fn provider_type(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = Some(provider_type.into());
        self
    }

    /// Sets the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the edit mode.
    #[must_use]
    pub const fn edit_mode(mut self, mode: EditMode) -> Self {
        self.edit_mode = mode;
        self
    }

    /// Adds a config value.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider type or name is missing,
    /// or if a timeout is zero.
    pub fn build(self) -> FederationResult<FederationConfig> {
        let provider_type = self
            .provider_type
            .ok_or_else(|| FederationError::config("provider_type is required"))?;
        let name = self
            .name
            .ok_or_else(|| FederationError::config("name is required"))?;

        if self.connection_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(FederationError::config("timeouts must be greater than zero"));
        }

        Ok(FederationConfig {
            id: self.id.unwrap_or_else(Uuid::now_v7),
            provider_type,
            name,
            edit_mode: self.edit_mode,
            config: self.config,
            connection_timeout: self.connection_timeout,
            read_timeout: self.read_timeout,
        })
    }
}

/// Serde support for `Duration` as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
