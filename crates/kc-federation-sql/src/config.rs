//! Legacy store configuration.
//!
//! Describes how to reach the legacy database and where the user directory
//! lives inside it. Table and column names are interpolated into SQL text,
//! so they are validated as plain identifiers when the configuration is
//! built; everything a user supplies travels as a bound parameter instead.

use std::fmt;
use std::time::Duration;

use kc_federation::{FederationConfig, FederationError, FederationResult};
use serde::{Deserialize, Serialize};

/// Component configuration keys understood by [`LegacyStoreConfig::from_component`].
pub mod keys {
    /// Database connection URL.
    pub const CONNECTION_URL: &str = "connectionUrl";
    /// Database user (overrides the URL).
    pub const USER: &str = "user";
    /// Database password (overrides the URL).
    pub const PASSWORD: &str = "password";
    /// User table name.
    pub const TABLE: &str = "table";
    /// Column holding the login name.
    pub const KEY_COLUMN: &str = "keyColumn";
    /// Column holding the display name.
    pub const DISPLAY_NAME_COLUMN: &str = "displayNameColumn";
    /// Column holding the email address.
    pub const EMAIL_COLUMN: &str = "emailColumn";
    /// Column holding the stored secret.
    pub const SECRET_COLUMN: &str = "secretColumn";
    /// Result cap per page.
    pub const MAX_RESULTS: &str = "maxResults";
}

// ============================================================================
// Schema
// ============================================================================

/// Where the user directory lives in the legacy database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySchema {
    /// User table (optionally schema-qualified).
    pub table: String,
    /// Unique login name column.
    pub key_column: String,
    /// Free-text full name column.
    pub display_name_column: String,
    /// Email column.
    pub email_column: String,
    /// Stored secret column.
    pub secret_column: String,
}

impl Default for LegacySchema {
    fn default() -> Self {
        Self {
            table: "users".to_string(),
            key_column: "username".to_string(),
            display_name_column: "full_name".to_string(),
            email_column: "email".to_string(),
            secret_column: "password".to_string(),
        }
    }
}

impl LegacySchema {
    /// Checks that every name is a plain SQL identifier.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending setting.
    pub fn validate(&self) -> FederationResult<()> {
        let names = [
            ("table", &self.table),
            ("key column", &self.key_column),
            ("display name column", &self.display_name_column),
            ("email column", &self.email_column),
            ("secret column", &self.secret_column),
        ];

        for (what, name) in names {
            if !is_identifier(name) {
                return Err(FederationError::config(format!(
                    "{what} '{name}' is not a plain SQL identifier"
                )));
            }
        }
        Ok(())
    }
}

/// Accepts `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

// ============================================================================
// Store Configuration
// ============================================================================

/// Connection and schema settings for the legacy store.
#[derive(Clone, Serialize, Deserialize)]
pub struct LegacyStoreConfig {
    /// `PostgreSQL` connection URL.
    pub connection_url: String,

    /// Database user, overriding the one in the URL.
    pub username: Option<String>,

    /// Database password, overriding the one in the URL.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// User directory location.
    pub schema: LegacySchema,

    /// Maximum users returned by one listing or search.
    pub max_results: usize,

    /// Time allowed to establish a connection.
    pub connection_timeout: Duration,

    /// Time allowed for one statement.
    pub read_timeout: Duration,
}

impl fmt::Debug for LegacyStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyStoreConfig")
            .field("connection_url", &redact_url(&self.connection_url))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("schema", &self.schema)
            .field("max_results", &self.max_results)
            .field("connection_timeout", &self.connection_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

const REDACTED: &str = "REDACTED";

/// Hides the password in the userinfo and in any `password` query parameter.
///
/// A URL that does not parse is hidden entirely.
fn redact_url(raw: &str) -> String {
    let Ok(mut url) = url::Url::parse(raw) else {
        return format!("[{REDACTED}]");
    };

    if url.password().is_some() && url.set_password(Some(REDACTED)).is_err() {
        return format!("[{REDACTED}]");
    }

    if url.query_pairs().any(|(key, _)| key == "password") {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| {
                let value = if key == "password" {
                    REDACTED.to_string()
                } else {
                    value.into_owned()
                };
                (key.into_owned(), value)
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    url.to_string()
}

impl LegacyStoreConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> LegacyStoreConfigBuilder {
        LegacyStoreConfigBuilder::new()
    }

    /// Reads the store settings from a federation component configuration.
    ///
    /// Timeouts come from the component itself; everything else from its
    /// provider-specific map (see [`keys`]).
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the connection URL is missing or any
    /// setting is invalid.
    pub fn from_component(component: &FederationConfig) -> FederationResult<Self> {
        let url = component
            .get(keys::CONNECTION_URL)
            .ok_or_else(|| FederationError::config("connectionUrl is required"))?;

        let mut builder = Self::builder()
            .connection_url(url)
            .connection_timeout(component.connection_timeout)
            .read_timeout(component.read_timeout);

        if let Some(user) = component.get(keys::USER) {
            builder = builder.username(user);
        }
        if let Some(password) = component.get(keys::PASSWORD) {
            builder = builder.password(password);
        }
        if let Some(table) = component.get(keys::TABLE) {
            builder = builder.table(table);
        }
        if let Some(column) = component.get(keys::KEY_COLUMN) {
            builder = builder.key_column(column);
        }
        if let Some(column) = component.get(keys::DISPLAY_NAME_COLUMN) {
            builder = builder.display_name_column(column);
        }
        if let Some(column) = component.get(keys::EMAIL_COLUMN) {
            builder = builder.email_column(column);
        }
        if let Some(column) = component.get(keys::SECRET_COLUMN) {
            builder = builder.secret_column(column);
        }
        if let Some(max) = component.get(keys::MAX_RESULTS) {
            let max = max.parse().map_err(|_| {
                FederationError::config(format!("maxResults '{max}' is not a number"))
            })?;
            builder = builder.max_results(max);
        }

        builder.build()
    }

    /// Loads the store settings from environment variables.
    ///
    /// Reads a `.env` file if one exists. `LEGACY_DB_URL` is required; see
    /// [`LegacyStoreConfigBuilder::from_env`] for the optional variables.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a variable is missing or invalid.
    pub fn from_env() -> FederationResult<Self> {
        let _ = dotenvy::dotenv();

        let url = std::env::var("LEGACY_DB_URL")
            .map_err(|_| FederationError::config("LEGACY_DB_URL environment variable is required"))?;

        LegacyStoreConfigBuilder::from_env()?.connection_url(url).build()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> FederationResult<()> {
        let url = self.connection_url.to_lowercase();
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(FederationError::config(
                "connection_url must use the postgres:// or postgresql:// scheme",
            ));
        }

        self.schema.validate()?;

        if self.max_results == 0 {
            return Err(FederationError::config("max_results must be greater than zero"));
        }
        if self.connection_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(FederationError::config("timeouts must be greater than zero"));
        }
        if self.read_timeout < Duration::from_millis(1) {
            return Err(FederationError::config(
                "read_timeout must be at least one millisecond",
            ));
        }

        Ok(())
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> FederationResult<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| FederationError::config(format!("{name} '{value}' is not a number"))),
        Err(_) => Ok(None),
    }
}

// ============================================================================
// Configuration Builder
// ============================================================================

/// Builder for [`LegacyStoreConfig`].
#[derive(Default)]
pub struct LegacyStoreConfigBuilder {
    connection_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    schema: LegacySchema,
    max_results: usize,
    connection_timeout: Duration,
    read_timeout: Duration,
}

impl LegacyStoreConfigBuilder {
    /// Creates a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_results: kc_federation::provider::DEFAULT_MAX_RESULTS,
            connection_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            ..Default::default()
        }
    }

    /// Creates a builder from the optional `LEGACY_DB_*` variables.
    ///
    /// `LEGACY_DB_USER`, `LEGACY_DB_PASSWORD`, `LEGACY_DB_TABLE`,
    /// `LEGACY_DB_KEY_COLUMN`, `LEGACY_DB_DISPLAY_NAME_COLUMN`,
    /// `LEGACY_DB_EMAIL_COLUMN`, `LEGACY_DB_SECRET_COLUMN`,
    /// `LEGACY_DB_MAX_RESULTS`, `LEGACY_DB_CONNECT_TIMEOUT_SECS` and
    /// `LEGACY_DB_READ_TIMEOUT_SECS` are read when set. The connection URL is
    /// left to the caller.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a numeric variable does not parse.
    pub fn from_env() -> FederationResult<Self> {
        let mut builder = Self::new();

        if let Ok(user) = std::env::var("LEGACY_DB_USER") {
            builder = builder.username(user);
        }
        if let Ok(password) = std::env::var("LEGACY_DB_PASSWORD") {
            builder = builder.password(password);
        }
        if let Ok(table) = std::env::var("LEGACY_DB_TABLE") {
            builder = builder.table(table);
        }
        if let Ok(column) = std::env::var("LEGACY_DB_KEY_COLUMN") {
            builder = builder.key_column(column);
        }
        if let Ok(column) = std::env::var("LEGACY_DB_DISPLAY_NAME_COLUMN") {
            builder = builder.display_name_column(column);
        }
        if let Ok(column) = std::env::var("LEGACY_DB_EMAIL_COLUMN") {
            builder = builder.email_column(column);
        }
        if let Ok(column) = std::env::var("LEGACY_DB_SECRET_COLUMN") {
            builder = builder.secret_column(column);
        }
        if let Some(max) = env_number("LEGACY_DB_MAX_RESULTS")? {
            builder = builder.max_results(max);
        }
        if let Some(secs) = env_number("LEGACY_DB_CONNECT_TIMEOUT_SECS")? {
            builder = builder.connection_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_number("LEGACY_DB_READ_TIMEOUT_SECS")? {
            builder = builder.read_timeout(Duration::from_secs(secs));
        }

        Ok(builder)
    }

    /// Sets the connection URL.
    #[must_use]
    pub fn connection_url(mut self, url: impl Into<String>) -> Self {
        self.connection_url = Some(url.into());
        self
    }

    /// Sets the database user.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the database password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the user table.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.schema.table = table.into();
        self
    }

    /// Sets the login name column.
    #[must_use]
    pub fn key_column(mut self, column: impl Into<String>) -> Self {
        self.schema.key_column = column.into();
        self
    }

    /// Sets the display name column.
    #[must_use]
    pub fn display_name_column(mut self, column: impl Into<String>) -> Self {
        self.schema.display_name_column = column.into();
        self
    }

    /// Sets the email column.
    #[must_use]
    pub fn email_column(mut self, column: impl Into<String>) -> Self {
        self.schema.email_column = column.into();
        self
    }

    /// Sets the stored secret column.
    #[must_use]
    pub fn secret_column(mut self, column: impl Into<String>) -> Self {
        self.schema.secret_column = column.into();
        self
    }

    /// Sets the per-page result cap.
    #[must_use]
    pub const fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the statement timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is missing or any setting is
    /// invalid.
    pub fn build(self) -> FederationResult<LegacyStoreConfig> {
        let config = LegacyStoreConfig {
            connection_url: self
                .connection_url
                .ok_or_else(|| FederationError::config("connection_url is required"))?,
            username: self.username,
            password: self.password,
            schema: self.schema,
            max_results: self.max_results,
            connection_timeout: self.connection_timeout,
            read_timeout: self.read_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}
