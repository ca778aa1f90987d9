//! In-memory legacy store for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kc_federation::{FederationError, FederationResult};

use crate::config::LegacyStoreConfig;
use crate::connection::{ConnectionFactory, LegacyConnection, RawRow};
use crate::statement::{columns, BoundQuery, Statement};

/// One row of the in-memory user table.
#[derive(Debug, Clone, Default)]
pub struct MemoryUser {
    pub key: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub secret: Option<String>,
}

impl MemoryUser {
    pub fn new(key: &str, display_name: &str, email: &str, secret: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            display_name: Some(display_name.to_string()),
            email: Some(email.to_string()),
            secret: Some(secret.to_string()),
        }
    }
}

/// Where the store fails, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    Acquire,
    Fetch,
}

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    open: AtomicUsize,
    released: AtomicUsize,
}

/// Connection factory over a fixed user table.
pub struct MemoryFactory {
    users: Arc<Vec<MemoryUser>>,
    failure: Failure,
    counters: Arc<Counters>,
    executed: Arc<Mutex<Vec<Statement>>>,
}

impl MemoryFactory {
    pub fn new(users: Vec<MemoryUser>) -> Self {
        Self {
            users: Arc::new(users),
            failure: Failure::None,
            counters: Arc::default(),
            executed: Arc::default(),
        }
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure,
            ..Self::new(Vec::new())
        }
    }

    /// Connections handed out so far.
    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    /// Connections handed out and not yet dropped.
    pub fn open(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    /// Connections given back through `release`.
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionFactory for MemoryFactory {
    type Connection = MemoryConnection;

    async fn acquire(&self, _config: &LegacyStoreConfig) -> FederationResult<MemoryConnection> {
        if self.failure == Failure::Acquire {
            return Err(FederationError::unavailable("connection refused"));
        }

        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        self.counters.open.fetch_add(1, Ordering::SeqCst);

        Ok(MemoryConnection {
            users: Arc::clone(&self.users),
            failure: self.failure,
            counters: Arc::clone(&self.counters),
            executed: Arc::clone(&self.executed),
        })
    }
}

pub struct MemoryConnection {
    users: Arc<Vec<MemoryUser>>,
    failure: Failure,
    counters: Arc<Counters>,
    executed: Arc<Mutex<Vec<Statement>>>,
}

impl MemoryConnection {
    fn record(&self, query: &BoundQuery) -> FederationResult<()> {
        self.executed.lock().unwrap().push(query.statement.clone());
        if self.failure == Failure::Fetch {
            return Err(FederationError::query("relation \"users\" does not exist"));
        }
        Ok(())
    }

    fn ordered<'a>(users: impl Iterator<Item = &'a MemoryUser>) -> Vec<&'a MemoryUser> {
        let mut users: Vec<_> = users.collect();
        users.sort_by_key(|u| {
            (
                u.display_name.is_none(),
                u.display_name.clone(),
                u.key.clone(),
            )
        });
        users
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LegacyConnection for MemoryConnection {
    async fn fetch_count(&mut self, query: &BoundQuery) -> FederationResult<u64> {
        self.record(query)?;
        Ok(self.users.len() as u64)
    }

    async fn fetch_rows(&mut self, query: &BoundQuery) -> FederationResult<Vec<RawRow>> {
        self.record(query)?;

        let users = self.users.iter();
        let selected: Vec<&MemoryUser> = match &query.statement {
            Statement::Count => Vec::new(),
            Statement::List { page } => Self::ordered(users)
                .into_iter()
                .skip(page.first)
                .take(page.max)
                .collect(),
            Statement::Search { pattern, page } => Self::ordered(
                users.filter(|u| u.display_name.as_deref().is_some_and(|d| like(d, pattern))),
            )
            .into_iter()
            .skip(page.first)
            .take(page.max)
            .collect(),
            Statement::ByKey { key } | Statement::SecretByKey { key } => users
                .filter(|u| u.key.as_deref() == Some(key.as_str()))
                .take(1)
                .collect(),
            Statement::ByEmail { email } => users
                .filter(|u| u.email.as_deref() == Some(email.as_str()))
                .take(1)
                .collect(),
        };

        Ok(selected
            .into_iter()
            .map(|u| {
                if matches!(query.statement, Statement::SecretByKey { .. }) {
                    RawRow::new().with(columns::SECRET, u.secret.clone())
                } else {
                    RawRow::new()
                        .with(columns::KEY, u.key.clone())
                        .with(columns::DISPLAY_NAME, u.display_name.clone())
                        .with(columns::EMAIL, u.email.clone())
                }
            })
            .collect())
    }

    async fn release(self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// SQL `LIKE` with `%` and `_` wildcards, no escape character.
pub fn like(value: &str, pattern: &str) -> bool {
    fn matches(value: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => (0..=value.len()).any(|i| matches(&value[i..], rest)),
            Some(('_', rest)) => !value.is_empty() && matches(&value[1..], rest),
            Some((c, rest)) => value.first() == Some(c) && matches(&value[1..], rest),
        }
    }

    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    matches(&value, &pattern)
}

pub fn store_config() -> LegacyStoreConfig {
    LegacyStoreConfig::builder()
        .connection_url("postgres://reader@memory/legacy")
        .build()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards() {
        assert!(like("Jane Doe", "%Doe"));
        assert!(like("Jane Doe", "J_ne%"));
        assert!(like("Jane Doe", "%"));
        assert!(!like("Jane Doe", "Doe"));
        assert!(!like("Jane Doe", "J_e%"));
    }
}
