// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup, PRAGMAs, and column conversion helpers.
//!
//! All access goes through one `tokio_rusqlite::Connection`, whose background
//! thread serializes every closure. Do not open a second connection for writes.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use dunning_core::DunningError;
use rusqlite::types::Type;
use tracing::debug;

use crate::migrations::run_migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database file and applies migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, DunningError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(DunningError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(DunningError::storage)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// In-memory database with migrations applied.
    pub async fn open_in_memory() -> Result<Self, DunningError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(DunningError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), DunningError> {
        self.conn
            .call(move |conn| -> Result<(), DunningError> {
                if wal_mode {
                    let mode: String = conn
                        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                        .map_err(DunningError::storage)?;
                    debug!(journal_mode = %mode, "journal mode set");
                }
                conn.pragma_update(None, "foreign_keys", "ON")
                    .map_err(DunningError::storage)?;
                conn.pragma_update(None, "synchronous", "NORMAL")
                    .map_err(DunningError::storage)?;
                conn.busy_timeout(BUSY_TIMEOUT)
                    .map_err(DunningError::storage)?;
                run_migrations(conn)
            })
            .await
            .map_err(map_call_err)
    }
}

/// Converts a tokio-rusqlite error into [`DunningError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> DunningError {
    DunningError::storage(e)
}

/// Unwraps closure errors that are already [`DunningError`]s.
pub fn map_call_err(e: tokio_rusqlite::Error<DunningError>) -> DunningError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => DunningError::Storage {
            source: other.to_string().into(),
        },
    }
}

/// Timestamp format written to every TEXT time column.
pub(crate) fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a TEXT column into any `FromStr` type, reporting failures as
/// column conversion errors.
pub(crate) fn parse_column<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Reads and parses a TEXT column.
pub(crate) fn get_parsed<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    parse_column(idx, &text)
}

/// Reads and parses a nullable TEXT column.
pub(crate) fn get_parsed_opt<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|t| parse_column(idx, &t)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_file_and_applies_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dunning.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        assert!(path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(map_tr_err)
            .unwrap();

        for expected in [
            "credit_transactions",
            "message_log",
            "purchase_invoices",
            "retailers",
            "sales_invoices",
            "tenant_messaging",
            "tenants",
            "vendors",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dunning.db");
        let path = path.to_str().unwrap();
        drop(Database::open(path, true).await.unwrap());
        Database::open(path, true).await.unwrap();
    }

    #[test]
    fn timestamps_round_trip_through_text() {
        let t = DateTime::parse_from_rfc3339("2026-03-10T09:15:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        let text = format_timestamp(t);
        assert_eq!(text, "2026-03-10T09:15:00.250Z");
        let back: DateTime<Utc> = parse_column(0, &text).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn bad_text_is_a_conversion_failure() {
        let err = parse_column::<i64>(3, "abc").unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, _)
        ));
    }
}
