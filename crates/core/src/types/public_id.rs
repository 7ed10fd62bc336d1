//! Terminal public identifiers.
//!
//! A public id is the operator-chosen token printed in a terminal's QR URL
//! (`/w/JOE-CBD-1`). It is the only terminal identifier customers ever see,
//! and it also names the terminal's folder in the blob store, so the alphabet
//! is restricted to characters that are safe in both places.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TerminalPublicId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PublicIdError {
    #[error("public id cannot be empty")]
    Empty,
    #[error("public id must be at most {max} characters")]
    TooLong { max: usize },
    #[error("public id may only contain letters, digits, '-', '_' and '.' (found {0:?})")]
    InvalidChar(char),
}

/// A terminal's public identifier.
///
/// ## Constraints
///
/// - 1-64 characters after trimming surrounding whitespace
/// - ASCII letters, digits, `-`, `_` and `.` only
/// - Case is preserved; uniqueness is enforced by the store
///
/// ```
/// use receetly_core::TerminalPublicId;
///
/// assert!(TerminalPublicId::parse("JOE-CBD-1").is_ok());
/// assert!(TerminalPublicId::parse("till_2.back").is_ok());
/// assert!(TerminalPublicId::parse("").is_err());
/// assert!(TerminalPublicId::parse("JOE CBD").is_err());
/// assert!(TerminalPublicId::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct TerminalPublicId(String);

impl TerminalPublicId {
    pub const MAX_LENGTH: usize = 64;

    /// Parse a public id, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a [`PublicIdError`] if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains a character outside the allowed set.
    pub fn parse(s: &str) -> Result<Self, PublicIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PublicIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(PublicIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(bad) = s.chars().find(|c| !is_allowed(*c)) {
            return Err(PublicIdError::InvalidChar(bad));
        }
        // A lone "." or ".." would be a path segment of its own
        if s.chars().all(|c| c == '.') {
            return Err(PublicIdError::InvalidChar('.'));
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl fmt::Display for TerminalPublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TerminalPublicId {
    type Err = PublicIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TerminalPublicId {
    type Error = PublicIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TerminalPublicId> for String {
    fn from(id: TerminalPublicId) -> Self {
        id.0
    }
}

impl AsRef<str> for TerminalPublicId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TerminalPublicId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TerminalPublicId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TerminalPublicId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_preserves_case() {
        let id = TerminalPublicId::parse("  Joe-Cbd-1\n").unwrap();
        assert_eq!(id.as_str(), "Joe-Cbd-1");
    }

    #[test]
    fn test_parse_rejects_path_characters() {
        assert_eq!(
            TerminalPublicId::parse("a/b"),
            Err(PublicIdError::InvalidChar('/'))
        );
        assert_eq!(
            TerminalPublicId::parse(".."),
            Err(PublicIdError::InvalidChar('.'))
        );
    }

    #[test]
    fn test_parse_length_limit() {
        assert!(TerminalPublicId::parse(&"A".repeat(64)).is_ok());
        assert!(matches!(
            TerminalPublicId::parse(&"A".repeat(65)),
            Err(PublicIdError::TooLong { max: 64 })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: TerminalPublicId = serde_json::from_str("\"JOE-CBD-1\"").unwrap();
        assert_eq!(ok.to_string(), "JOE-CBD-1");
        assert!(serde_json::from_str::<TerminalPublicId>("\"JOE CBD\"").is_err());
    }
}
