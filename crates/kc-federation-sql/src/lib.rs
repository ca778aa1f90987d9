//! # kc-federation-sql
//!
//! Read-only user federation over a legacy SQL user directory.
//!
//! ## Overview
//!
//! The provider answers platform lookups, searches and password checks from
//! a single legacy user table:
//!
//! - [`LegacyUserStorageProvider`] - the platform-facing provider
//! - [`QueryExecutor`] - one connection per call, released on every path
//! - [`LegacyUserMapper`] - legacy rows to platform users
//! - [`Statement`] - parameterized statements rendered per schema
//!
//! ## Security
//!
//! - Table and column names are validated identifiers; user input is always bound
//! - Users cannot be created, changed or deleted through this provider
//! - Passwords are compared by plain equality and never logged
//!
//! ## Example
//!
//! ```rust,ignore
//! use kc_federation::{FederationConfig, Page, UserStorageProvider};
//! use kc_federation_sql::{LegacyStoreConfig, LegacyUserStorageProvider};
//!
//! let store = LegacyStoreConfig::builder()
//!     .connection_url("postgres://reader@legacy-db/auth")
//!     .build()?;
//! let component = FederationConfig::builder()
//!     .provider_type("legacy-sql")
//!     .name("Legacy users")
//!     .build()?;
//!
//! let provider = LegacyUserStorageProvider::new(component, store)?;
//! let users = provider.search_users("Jane%", Page::default()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod provider;
pub mod statement;

#[cfg(test)]
mod testing;

pub use config::{LegacySchema, LegacyStoreConfig, LegacyStoreConfigBuilder};
pub use connection::{ConnectionFactory, LegacyConnection, PgConnectionFactory, RawRow};
pub use error::from_sqlx_error;
pub use executor::{QueryExecutor, RowStream};
pub use mapper::LegacyUserMapper;
pub use provider::{LegacyUserStorageProvider, PROVIDER_TYPE};
pub use statement::{BoundQuery, SqlParam, Statement};
