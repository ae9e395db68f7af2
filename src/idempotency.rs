//! Client-supplied idempotency keys for deduplicating retried writes.
//!
//! Keys are recorded in the same transaction as the expense they guard and
//! are never deleted.

use axum::http::{HeaderName, HeaderValue};
use axum_extra::headers::{self, Header};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::Error;

/// The longest key the `idempotency_key` table accepts.
pub const MAX_KEY_LENGTH: usize = 255;

static IDEMPOTENCY_KEY_HEADER: HeaderName = HeaderName::from_static("idempotency-key");

/// An opaque token chosen by the client that identifies one logical write.
///
/// Use with `TypedHeader` to read it from the `Idempotency-Key` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Create a key from a non-empty string of at most [MAX_KEY_LENGTH]
    /// characters.
    ///
    /// # Errors
    /// Returns [Error::MissingIdempotencyKey] if `key` is empty or too long.
    pub fn new(key: &str) -> Result<Self, Error> {
        if key.is_empty() || key.chars().count() > MAX_KEY_LENGTH {
            return Err(Error::MissingIdempotencyKey);
        }

        Ok(Self(key.to_owned()))
    }

    /// The key as sent by the client.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Header for IdempotencyKey {
    fn name() -> &'static HeaderName {
        &IDEMPOTENCY_KEY_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(headers::Error::invalid());
        };

        IdempotencyKey::new(value).map_err(|_| headers::Error::invalid())
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode idempotency-key header"),
        }
    }
}

/// Create the table of recorded keys if it does not exist.
pub fn create_idempotency_key_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS idempotency_key (
            id INTEGER PRIMARY KEY,
            key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Check whether a write with `key` has already been recorded.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn key_exists(key: &IdempotencyKey, connection: &Connection) -> Result<bool, Error> {
    let exists = connection.query_row(
        "SELECT EXISTS(SELECT 1 FROM idempotency_key WHERE key = ?1)",
        (key.as_str(),),
        |row| row.get(0),
    )?;

    Ok(exists)
}

/// Record `key`. Callers pair this with the insert it guards in one transaction.
///
/// # Errors
/// Returns [Error::DuplicateIdempotencyKey] if the key has already been
/// recorded, or [Error::SqlError] for any other SQL error.
pub(crate) fn insert_idempotency_key(
    key: &IdempotencyKey,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO idempotency_key (key, created_at) VALUES (?1, ?2)",
        (key.as_str(), created_at),
    )?;

    Ok(())
}
