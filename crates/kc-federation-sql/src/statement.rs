//! Statements issued against the legacy user directory.
//!
//! A [`Statement`] says what to fetch; [`Statement::bind`] renders it into
//! `PostgreSQL` text for a given [`LegacySchema`] plus an ordered list of
//! bound parameters. Search patterns, usernames, emails and keys only ever
//! appear in the parameter list.

use kc_federation::Page;

use crate::config::LegacySchema;

/// Column aliases used in rendered projections.
pub mod columns {
    /// Alias of the login name column.
    pub const KEY: &str = "user_key";
    /// Alias of the display name column.
    pub const DISPLAY_NAME: &str = "display_name";
    /// Alias of the email column.
    pub const EMAIL: &str = "email";
    /// Alias of the stored secret column.
    pub const SECRET: &str = "secret";
}

const USER_COLUMNS: &[&str] = &[columns::KEY, columns::DISPLAY_NAME, columns::EMAIL];
const SECRET_COLUMNS: &[&str] = &[columns::SECRET];

/// A read against the legacy user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Number of rows in the user table.
    Count,
    /// All users ordered by display name, paged.
    List {
        /// Result window.
        page: Page,
    },
    /// Users whose display name is `LIKE` the pattern, ordered and paged.
    ///
    /// `%` and `_` in the pattern keep their SQL meaning.
    Search {
        /// Caller-controlled `LIKE` pattern.
        pattern: String,
        /// Result window.
        page: Page,
    },
    /// The user with this login name.
    ByKey {
        /// Login name.
        key: String,
    },
    /// The first user with this email.
    ByEmail {
        /// Email address.
        email: String,
    },
    /// The stored secret of the user with this login name.
    SecretByKey {
        /// Login name.
        key: String,
    },
}

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// Text value.
    Text(String),
    /// 64-bit integer value.
    Int(i64),
}

/// A statement rendered for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundQuery {
    /// The statement this query was rendered from.
    pub statement: Statement,
    /// SQL text with `$n` placeholders.
    pub sql: String,
    /// Values for the placeholders, in order.
    pub params: Vec<SqlParam>,
    /// Column aliases each returned row carries.
    pub columns: &'static [&'static str],
}

impl Statement {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::List { .. } => "list",
            Self::Search { .. } => "search",
            Self::ByKey { .. } => "by_key",
            Self::ByEmail { .. } => "by_email",
            Self::SecretByKey { .. } => "secret_by_key",
        }
    }

    /// Renders the statement for `schema`.
    ///
    /// Exact lookups carry no `ORDER BY`. Listings order by display name,
    /// then by key so pages stay disjoint when display names repeat.
    #[must_use]
    pub fn bind(self, schema: &LegacySchema) -> BoundQuery {
        let table = &schema.table;
        let display = &schema.display_name_column;
        let key = &schema.key_column;
        let projection = format!(
            "{key} AS {}, {display} AS {}, {} AS {}",
            columns::KEY,
            columns::DISPLAY_NAME,
            schema.email_column,
            columns::EMAIL
        );

        let (sql, params, columns) = match &self {
            Self::Count => (format!("SELECT COUNT(*) FROM {table}"), vec![], &[][..]),
            Self::List { page } => (
                format!(
                    "SELECT {projection} FROM {table} ORDER BY {display}, {key} LIMIT $1 OFFSET $2"
                ),
                page_params(*page),
                USER_COLUMNS,
            ),
            Self::Search { pattern, page } => {
                let mut params = vec![SqlParam::Text(pattern.clone())];
                params.extend(page_params(*page));
                (
                    format!(
                        "SELECT {projection} FROM {table} WHERE {display} LIKE $1 \
                         ORDER BY {display}, {key} LIMIT $2 OFFSET $3"
                    ),
                    params,
                    USER_COLUMNS,
                )
            }
            Self::ByKey { key } => (
                format!(
                    "SELECT {projection} FROM {table} WHERE {} = $1 LIMIT 1",
                    schema.key_column
                ),
                vec![SqlParam::Text(key.clone())],
                USER_COLUMNS,
            ),
            Self::ByEmail { email } => (
                format!(
                    "SELECT {projection} FROM {table} WHERE {} = $1 LIMIT 1",
                    schema.email_column
                ),
                vec![SqlParam::Text(email.clone())],
                USER_COLUMNS,
            ),
            Self::SecretByKey { key } => (
                format!(
                    "SELECT {} AS {} FROM {table} WHERE {} = $1 LIMIT 1",
                    schema.secret_column,
                    columns::SECRET,
                    schema.key_column
                ),
                vec![SqlParam::Text(key.clone())],
                SECRET_COLUMNS,
            ),
        };

        BoundQuery {
            statement: self,
            sql,
            params,
            columns,
        }
    }
}

fn page_params(page: Page) -> Vec<SqlParam> {
    vec![
        SqlParam::Int(i64::try_from(page.max).unwrap_or(i64::MAX)),
        SqlParam::Int(i64::try_from(page.first).unwrap_or(i64::MAX)),
    ]
}
