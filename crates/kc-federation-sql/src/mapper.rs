//! Legacy row to platform user mapping.

use kc_federation::{FederationError, FederationResult, IdentityCodec};
use kc_model::User;

use crate::connection::RawRow;
use crate::statement::columns;

/// Builds platform users from legacy directory rows.
#[derive(Debug, Clone)]
pub struct LegacyUserMapper {
    codec: IdentityCodec,
}

impl LegacyUserMapper {
    /// Creates a mapper that tags users with the codec's provider.
    #[must_use]
    pub const fn new(codec: IdentityCodec) -> Self {
        Self { codec }
    }

    /// Returns the codec used for user ids.
    #[must_use]
    pub const fn codec(&self) -> &IdentityCodec {
        &self.codec
    }

    /// Maps one row to a user.
    ///
    /// The username and email are taken verbatim. The display name is split
    /// on single spaces: the first token becomes the first name, the second
    /// the last name, and any further tokens are dropped.
    ///
    /// # Errors
    ///
    /// Returns a mapping error if the row has no key or an empty key.
    pub fn map_row(&self, row: &RawRow) -> FederationResult<User> {
        let key = row
            .get(columns::KEY)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| FederationError::mapping("legacy row has no user key"))?;

        let (first_name, last_name) = split_display_name(row.get(columns::DISPLAY_NAME).unwrap_or(""));

        let mut user = User::new(self.codec.encode(key), key)
            .with_first_name(first_name)
            .with_last_name(last_name);
        if let Some(email) = row.get(columns::EMAIL) {
            user = user.with_email(email);
        }

        Ok(user)
    }
}

/// Splits `"Jane Doe"` into `("Jane", "Doe")`.
///
/// A single token is the first name; `"Jane Q Doe"` loses `"Doe"`.
#[must_use]
pub fn split_display_name(display_name: &str) -> (&str, &str) {
    let mut tokens = display_name.split(' ');
    let first = tokens.next().unwrap_or("");
    let last = tokens.next().unwrap_or("");
    (first, last)
}
