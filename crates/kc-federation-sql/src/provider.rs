//! Legacy SQL storage provider implementation.
//!
//! ## Security
//!
//! - The provider is read-only; it refuses any edit mode but `READ_ONLY`
//! - Search patterns, usernames, emails and keys are always bound parameters
//! - Passwords are compared by plain equality against the stored value, which
//!   the legacy directory keeps as-is; they are never logged

use std::sync::Arc;

use futures::{future, TryStreamExt};
use kc_federation::{
    CredentialValidator, FederationConfig, FederationError, FederationResult, IdentityCodec, Page,
    UserStorageProvider,
};
use kc_model::{CredentialInput, CredentialType, User};

use crate::config::LegacyStoreConfig;
use crate::connection::{ConnectionFactory, PgConnectionFactory, RawRow};
use crate::executor::QueryExecutor;
use crate::mapper::LegacyUserMapper;
use crate::statement::{columns, Statement};

/// Provider type identifier.
pub const PROVIDER_TYPE: &str = "legacy-sql";

/// Legacy SQL storage provider.
///
/// Exposes a legacy user table to the platform. Every call opens its own
/// connection through `F` and releases it before returning; the provider
/// keeps nothing between calls but its configuration.
pub struct LegacyUserStorageProvider<F = PgConnectionFactory> {
    /// Federation configuration.
    federation_config: FederationConfig,

    /// Statement runner.
    executor: QueryExecutor<F>,

    /// Row mapper.
    mapper: LegacyUserMapper,
}

impl LegacyUserStorageProvider<PgConnectionFactory> {
    /// Creates a provider backed by `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the edit mode is not read-only or the
    /// store configuration is invalid.
    pub fn new(
        federation_config: FederationConfig,
        store_config: LegacyStoreConfig,
    ) -> FederationResult<Self> {
        Self::with_factory(federation_config, store_config, PgConnectionFactory)
    }

    /// Creates a provider from a component configuration alone.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the component map does not describe a
    /// valid store.
    pub fn from_component(federation_config: FederationConfig) -> FederationResult<Self> {
        let store_config = LegacyStoreConfig::from_component(&federation_config)?;
        Self::new(federation_config, store_config)
    }
}

impl<F: ConnectionFactory> LegacyUserStorageProvider<F> {
    /// Creates a provider that opens connections through `factory`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the edit mode is not read-only or the
    /// store configuration is invalid.
    pub fn with_factory(
        federation_config: FederationConfig,
        store_config: LegacyStoreConfig,
        factory: F,
    ) -> FederationResult<Self> {
        ensure_read_only(&federation_config)?;
        store_config.validate()?;

        let codec = IdentityCodec::new(federation_config.provider_id());
        tracing::info!(
            provider = %codec.provider_id(),
            name = %federation_config.name,
            table = %store_config.schema.table,
            "Legacy user storage provider created"
        );

        Ok(Self {
            federation_config,
            executor: QueryExecutor::new(Arc::new(factory), Arc::new(store_config)),
            mapper: LegacyUserMapper::new(codec),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn store_config(&self) -> &LegacyStoreConfig {
        self.executor.config()
    }

    /// Returns the codec naming this provider's users.
    #[must_use]
    pub const fn codec(&self) -> &IdentityCodec {
        self.mapper.codec()
    }

    fn provider_id(&self) -> &str {
        self.codec().provider_id()
    }

    /// Clamps a page to the configured result cap.
    fn window(&self, page: Page) -> Page {
        page.capped(self.store_config().max_results)
    }

    /// Runs an exact lookup; a row that cannot be mapped fails the call.
    async fn fetch_one(&self, statement: Statement) -> FederationResult<Option<User>> {
        let row = self.executor.query(statement).try_next().await?;
        row.map(|row| self.mapper.map_row(&row)).transpose()
    }

    /// Runs a listing; rows that cannot be mapped are skipped.
    async fn fetch_page(&self, statement: Statement) -> FederationResult<Vec<User>> {
        if let Statement::List { page } | Statement::Search { page, .. } = &statement {
            if page.is_empty() {
                return Ok(Vec::new());
            }
        }

        self.executor
            .query(statement)
            .try_filter_map(|row| future::ready(Ok(self.map_listed(&row))))
            .try_collect()
            .await
    }

    fn map_listed(&self, row: &RawRow) -> Option<User> {
        match self.mapper.map_row(row) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(provider = %self.provider_id(), error = %e, "Skipping legacy row");
                None
            }
        }
    }
}

fn ensure_read_only(config: &FederationConfig) -> FederationResult<()> {
    if config.edit_mode.is_read_only() {
        Ok(())
    } else {
        Err(FederationError::config(format!(
            "legacy provider '{}' is read-only, edit mode {:?} is not supported",
            config.name, config.edit_mode
        )))
    }
}

impl<F: ConnectionFactory> UserStorageProvider for LegacyUserStorageProvider<F> {
    fn config(&self) -> &FederationConfig {
        &self.federation_config
    }

    fn provider_type(&self) -> &'static str {
        PROVIDER_TYPE
    }

    async fn validate_config(&self) -> FederationResult<()> {
        ensure_read_only(&self.federation_config)?;
        self.store_config().validate()
    }

    async fn test_connection(&self) -> FederationResult<()> {
        let users = self.executor.count().await?;
        tracing::info!(provider = %self.provider_id(), users, "Legacy store reachable");
        Ok(())
    }

    async fn get_user_by_id(&self, id: &str) -> FederationResult<Option<User>> {
        let key = self.codec().decode(id)?;
        self.fetch_one(Statement::ByKey { key }).await
    }

    async fn get_user_by_username(&self, username: &str) -> FederationResult<Option<User>> {
        self.fetch_one(Statement::ByKey {
            key: username.to_string(),
        })
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> FederationResult<Option<User>> {
        self.fetch_one(Statement::ByEmail {
            email: email.to_string(),
        })
        .await
    }

    async fn count_users(&self) -> FederationResult<u64> {
        self.executor.count().await
    }

    async fn get_users(&self, page: Page) -> FederationResult<Vec<User>> {
        self.fetch_page(Statement::List {
            page: self.window(page),
        })
        .await
    }

    async fn search_users(&self, pattern: &str, page: Page) -> FederationResult<Vec<User>> {
        self.fetch_page(Statement::Search {
            pattern: pattern.to_string(),
            page: self.window(page),
        })
        .await
    }

    async fn close(&self) -> FederationResult<()> {
        tracing::info!(provider = %self.provider_id(), "Legacy user storage provider closed");
        Ok(())
    }
}

impl<F: ConnectionFactory> CredentialValidator for LegacyUserStorageProvider<F> {
    fn supports_credential_type(&self, credential_type: &str) -> bool {
        credential_type == CredentialType::Password.as_str()
    }

    /// Checks a password against the stored value.
    ///
    /// ## Security
    ///
    /// - The password is NEVER logged
    /// - Unsupported credential types are rejected before any connection is opened
    /// - A NULL stored value never matches
    async fn is_valid(&self, id: &str, input: &CredentialInput) -> FederationResult<bool> {
        if !self.supports_credential_type(&input.credential_type) {
            tracing::debug!(
                provider = %self.provider_id(),
                credential_type = %input.credential_type,
                "Unsupported credential type"
            );
            return Ok(false);
        }

        let key = self.codec().decode(id)?;
        let row = self
            .executor
            .query(Statement::SecretByKey { key: key.clone() })
            .try_next()
            .await?;

        let valid = row
            .as_ref()
            .and_then(|row| row.get(columns::SECRET))
            .is_some_and(|stored| stored == input.challenge_response);

        tracing::debug!(provider = %self.provider_id(), user = %key, valid, "Password checked");
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use kc_federation::EditMode;
    use kc_model::StorageId;
    use uuid::Uuid;

    use super::*;
    use crate::testing::{store_config, Failure, MemoryFactory, MemoryUser};

    fn federation_config(edit_mode: EditMode) -> FederationConfig {
        FederationConfig::builder()
            .id(Uuid::nil())
            .provider_type(PROVIDER_TYPE)
            .name("Legacy users")
            .edit_mode(edit_mode)
            .build()
            .unwrap()
    }

    fn directory() -> Vec<MemoryUser> {
        vec![
            MemoryUser::new("jdoe", "Jane Doe", "j@x.com", "pw1"),
            MemoryUser::new("asmith", "Alan Smith", "a@x.com", "pw2"),
            MemoryUser::new("cbrown", "Charlie Brown", "c@x.com", "pw3"),
            MemoryUser::new("bmarley", "Bob Marley", "b@x.com", "pw4"),
            MemoryUser::new("madonna", "Madonna", "m@x.com", "pw5"),
        ]
    }

    fn provider_with(factory: MemoryFactory) -> LegacyUserStorageProvider<MemoryFactory> {
        LegacyUserStorageProvider::with_factory(
            federation_config(EditMode::ReadOnly),
            store_config(),
            factory,
        )
        .unwrap()
    }

    fn provider() -> LegacyUserStorageProvider<MemoryFactory> {
        provider_with(MemoryFactory::new(directory()))
    }

    fn usernames(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.username.as_str()).collect()
    }

    fn factory(provider: &LegacyUserStorageProvider<MemoryFactory>) -> &MemoryFactory {
        provider.executor.factory()
    }

    #[test]
    fn rejects_writable_edit_modes() {
        for mode in [EditMode::Writable, EditMode::Unsynced] {
            let result = LegacyUserStorageProvider::with_factory(
                federation_config(mode),
                store_config(),
                MemoryFactory::new(Vec::new()),
            );
            assert!(matches!(result, Err(FederationError::Configuration(_))));
        }
    }

    #[test]
    fn from_component_requires_connection_url() {
        let result = LegacyUserStorageProvider::from_component(federation_config(EditMode::ReadOnly));
        assert!(matches!(result, Err(FederationError::Configuration(_))));
    }

    #[tokio::test]
    async fn counts_users() {
        let provider = provider();
        assert_eq!(provider.count_users().await.unwrap(), 5);
        assert_eq!(factory(&provider).open(), 0);
    }

    #[tokio::test]
    async fn empty_directory_counts_zero() {
        let provider = provider_with(MemoryFactory::new(Vec::new()));
        assert_eq!(provider.count_users().await.unwrap(), 0);
        assert!(provider.get_users(Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_display_names_page_by_key() {
        let provider = provider_with(MemoryFactory::new(vec![
            MemoryUser::new("zed", "Same Name", "z@x.com", "pw1"),
            MemoryUser::new("amy", "Same Name", "a@x.com", "pw2"),
        ]));

        let first = provider.get_users(Page::new(0, 1)).await.unwrap();
        let second = provider.get_users(Page::new(1, 1)).await.unwrap();
        assert_eq!(usernames(&first), vec!["amy"]);
        assert_eq!(usernames(&second), vec!["zed"]);

        let statement = factory(&provider).executed().remove(0);
        let query = statement.bind(&store_config().schema);
        assert!(query.sql.contains("ORDER BY full_name, username"), "{}", query.sql);
    }

    #[tokio::test]
    async fn lists_users_ordered_by_display_name() {
        let provider = provider();

        let users = provider.get_users(Page::default()).await.unwrap();
        assert_eq!(
            usernames(&users),
            vec!["asmith", "bmarley", "cbrown", "jdoe", "madonna"]
        );
    }

    #[tokio::test]
    async fn pagination_is_applied_once() {
        let provider = provider();

        let users = provider.get_users(Page::new(2, 2)).await.unwrap();
        assert_eq!(usernames(&users), vec!["cbrown", "jdoe"]);

        let users = provider.search_users("%", Page::new(4, 10)).await.unwrap();
        assert_eq!(usernames(&users), vec!["madonna"]);
    }

    #[tokio::test]
    async fn pages_are_capped_by_max_results() {
        let config = LegacyStoreConfig::builder()
            .connection_url("postgres://reader@memory/legacy")
            .max_results(2)
            .build()
            .unwrap();
        let provider = LegacyUserStorageProvider::with_factory(
            federation_config(EditMode::ReadOnly),
            config,
            MemoryFactory::new(directory()),
        )
        .unwrap();

        let users = provider.get_users(Page::default()).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(
            factory(&provider).executed(),
            vec![Statement::List {
                page: Page::new(0, 2)
            }]
        );
    }

    #[tokio::test]
    async fn empty_page_does_not_touch_storage() {
        let provider = provider();

        assert!(provider.get_users(Page::new(0, 0)).await.unwrap().is_empty());
        assert!(provider
            .search_users("%", Page::new(3, 0))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(factory(&provider).acquired(), 0);
    }

    #[tokio::test]
    async fn search_passes_wildcards_through() {
        let provider = provider();

        let users = provider.search_users("%a%", Page::default()).await.unwrap();
        assert_eq!(
            usernames(&users),
            vec!["asmith", "bmarley", "cbrown", "jdoe", "madonna"]
        );

        let users = provider.search_users("J_ne%", Page::default()).await.unwrap();
        assert_eq!(usernames(&users), vec!["jdoe"]);

        let users = provider.search_users("Jane", Page::default()).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn search_pattern_is_bound_verbatim() {
        let provider = provider();
        let pattern = "x' OR '1'='1";

        let users = provider.search_users(pattern, Page::default()).await.unwrap();
        assert!(users.is_empty());
        assert_eq!(
            factory(&provider).executed(),
            vec![Statement::Search {
                pattern: pattern.to_string(),
                page: Page::default(),
            }]
        );
    }

    #[tokio::test]
    async fn param_search_lists_users() {
        let provider = provider();
        let mut params = HashMap::new();
        params.insert("email".to_string(), "nobody@x.com".to_string());

        let users = provider
            .search_users_by_params(&params, Page::new(0, 2))
            .await
            .unwrap();
        assert_eq!(usernames(&users), vec!["asmith", "bmarley"]);
    }

    #[tokio::test]
    async fn looks_up_user_by_reference() {
        let provider = provider();
        let reference = provider.codec().encode("jdoe").to_string();

        let user = provider.get_user_by_id(&reference).await.unwrap().unwrap();
        assert_eq!(user.id.to_string(), reference);
        assert_eq!(user.username, "jdoe");
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.last_name, "Doe");
        assert_eq!(user.email.as_deref(), Some("j@x.com"));
        assert_eq!(user.federation_link, Uuid::nil().to_string());

        let missing = provider.codec().encode("nobody").to_string();
        assert!(provider.get_user_by_id(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn foreign_or_malformed_reference_is_rejected() {
        let provider = provider();

        let foreign = StorageId::new("another-provider", "jdoe").to_string();
        for reference in [foreign.as_str(), "jdoe", "f:"] {
            let err = provider.get_user_by_id(reference).await.unwrap_err();
            assert!(err.is_malformed_reference(), "{reference:?}");
        }
        assert_eq!(factory(&provider).acquired(), 0);
    }

    #[tokio::test]
    async fn looks_up_by_username_and_email() {
        let provider = provider();

        let user = provider.get_user_by_username("madonna").await.unwrap().unwrap();
        assert_eq!(user.first_name, "Madonna");
        assert_eq!(user.last_name, "");

        let user = provider.get_user_by_email("b@x.com").await.unwrap().unwrap();
        assert_eq!(user.username, "bmarley");

        assert!(provider.get_user_by_username("nobody").await.unwrap().is_none());
        assert!(provider.get_user_by_email("nobody@x.com").await.unwrap().is_none());
        assert_eq!(factory(&provider).open(), 0);
    }

    #[tokio::test]
    async fn email_lookup_takes_first_match() {
        let mut users = directory();
        users.push(MemoryUser::new("jdoe2", "Jane Doe", "j@x.com", "pw6"));
        let provider = provider_with(MemoryFactory::new(users));

        let user = provider.get_user_by_email("j@x.com").await.unwrap().unwrap();
        assert_eq!(user.username, "jdoe");
    }

    #[tokio::test]
    async fn unmappable_rows_are_skipped_in_listings_only() {
        let mut users = directory();
        users.push(MemoryUser {
            key: Some(String::new()),
            display_name: Some("Aaron Broken".to_string()),
            ..MemoryUser::default()
        });
        let provider = provider_with(MemoryFactory::new(users));

        let listed = provider.get_users(Page::default()).await.unwrap();
        assert_eq!(listed.len(), 5);
        assert!(listed.iter().all(|u| !u.username.is_empty()));

        let err = provider.get_user_by_username("").await.unwrap_err();
        assert!(matches!(err, FederationError::Mapping(_)));
    }

    #[tokio::test]
    async fn storage_failures_surface_unchanged() {
        let provider = provider_with(MemoryFactory::failing(Failure::Acquire));
        assert!(provider.count_users().await.unwrap_err().is_unavailable());
        assert!(provider
            .get_users(Page::default())
            .await
            .unwrap_err()
            .is_unavailable());
        assert!(provider.test_connection().await.unwrap_err().is_unavailable());

        let provider = provider_with(MemoryFactory::failing(Failure::Fetch));
        let err = provider.get_user_by_username("jdoe").await.unwrap_err();
        assert!(matches!(err, FederationError::Query(_)));
        assert_eq!(factory(&provider).open(), 0);
    }

    #[tokio::test]
    async fn validates_passwords() {
        let provider = provider();
        let reference = provider.codec().encode("jdoe").to_string();

        assert!(provider
            .is_valid(&reference, &CredentialInput::password("pw1"))
            .await
            .unwrap());
        assert!(!provider
            .is_valid(&reference, &CredentialInput::password("wrong"))
            .await
            .unwrap());
        assert!(!provider
            .is_valid(&reference, &CredentialInput::password("PW1"))
            .await
            .unwrap());

        let missing = provider.codec().encode("nobody").to_string();
        assert!(!provider
            .is_valid(&missing, &CredentialInput::password("pw1"))
            .await
            .unwrap());
        assert_eq!(factory(&provider).open(), 0);
    }

    #[tokio::test]
    async fn null_stored_password_never_matches() {
        let provider = provider_with(MemoryFactory::new(vec![MemoryUser {
            key: Some("nopass".to_string()),
            ..MemoryUser::default()
        }]));
        let reference = provider.codec().encode("nopass").to_string();

        assert!(!provider
            .is_valid(&reference, &CredentialInput::password(""))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unsupported_credential_type_skips_storage() {
        let provider = provider();
        let reference = provider.codec().encode("jdoe").to_string();
        let otp = CredentialInput::new(CredentialType::Totp.as_str(), "pw1");

        assert!(!provider.is_valid(&reference, &otp).await.unwrap());
        assert_eq!(factory(&provider).acquired(), 0);
    }

    #[test]
    fn supports_only_passwords() {
        let provider = provider();
        let user = User::new(provider.codec().encode("jdoe"), "jdoe");

        assert!(provider.supports_credential_type("password"));
        assert!(provider.is_configured_for(&user, "password"));
        assert!(!provider.supports_credential_type("otp"));
        assert!(!provider.supports_credential_type("hashed-password"));
        assert!(!provider.is_configured_for(&user, "webauthn"));
    }

    #[tokio::test]
    async fn write_operations_are_read_only() {
        let provider = provider();
        let user = User::new(provider.codec().encode("new"), "new");

        assert!(matches!(
            provider.create_user(&user).await,
            Err(FederationError::ReadOnly(_))
        ));
        assert!(matches!(
            provider.update_user(&user).await,
            Err(FederationError::ReadOnly(_))
        ));
        assert!(matches!(
            provider.delete_user(&user.id.to_string()).await,
            Err(FederationError::ReadOnly(_))
        ));
        assert!(matches!(
            provider
                .update_credential(&user.id.to_string(), &CredentialInput::password("x"))
                .await,
            Err(FederationError::NotSupported(_))
        ));
    }

    #[tokio::test]
    async fn stubbed_queries_are_empty() {
        let provider = provider();

        assert!(provider
            .get_group_members("admins", Page::default())
            .await
            .unwrap()
            .is_empty());
        assert!(provider
            .search_users_by_attribute("department", "sales")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(factory(&provider).acquired(), 0);
    }

    #[tokio::test]
    async fn lifecycle_checks() {
        let provider = provider();

        assert_eq!(provider.provider_type(), PROVIDER_TYPE);
        provider.validate_config().await.unwrap();
        provider.test_connection().await.unwrap();
        provider.close().await.unwrap();
        assert_eq!(factory(&provider).released(), 1);
    }
}
