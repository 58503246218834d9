//! The register-or-increment workflow and read access to [`Registration`]
//! rows.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, TransactionBehavior};

use crate::countries::{parse_timestamp, row_to_country};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{RegisterOutcome, Registration};

impl Database {
    /// Record one vote for `country_code` on behalf of `nullifier`.
    ///
    /// Runs in a single `IMMEDIATE` transaction, so competing writers queue
    /// on the SQLite write lock rather than interleaving between the
    /// duplicate check and the increment. If the nullifier has voted before,
    /// the transaction is rolled back and the earlier country is returned.
    /// Otherwise the country row is inserted with `count = 1` or incremented
    /// in place, and the registration row is written. Any failure drops the
    /// transaction, which rolls both writes back.
    ///
    /// `country_name` is only stored when the country is first seen.
    pub fn register_vote(
        &mut self,
        nullifier: &str,
        country_code: &str,
        country_name: &str,
    ) -> Result<RegisterOutcome> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                "SELECT r.country_code, COALESCE(c.country_name, r.country_code)
                 FROM registrations r
                 LEFT JOIN countries c ON c.country_code = r.country_code
                 WHERE r.nullifier = ?1",
                params![nullifier],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        if let Some((country_code, country_name)) = existing {
            tx.rollback()?;
            return Ok(RegisterOutcome::AlreadyRegistered {
                country_code,
                country_name,
            });
        }

        let now = Utc::now().to_rfc3339();

        let country = tx.query_row(
            "INSERT INTO countries (country_code, country_name, count, updated_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(country_code) DO UPDATE SET
                 count = count + 1,
                 updated_at = excluded.updated_at
             RETURNING country_code, country_name, count, updated_at",
            params![country_code, country_name, now],
            row_to_country,
        )?;

        tx.execute(
            "INSERT INTO registrations (nullifier, country_code, created_at)
             VALUES (?1, ?2, ?3)",
            params![nullifier, country_code, now],
        )?;

        tx.commit()?;

        Ok(RegisterOutcome::Registered(country))
    }

    pub fn get_registration(&self, nullifier: &str) -> Result<Registration> {
        self.conn()
            .query_row(
                "SELECT nullifier, country_code, created_at
                 FROM registrations WHERE nullifier = ?1",
                params![nullifier],
                |row| {
                    let created_str: String = row.get(2)?;
                    Ok(Registration {
                        nullifier: row.get(0)?,
                        country_code: row.get(1)?,
                        created_at: parse_timestamp(2, &created_str)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Number of registrations recorded for one country.
    pub fn count_registrations(&self, country_code: &str) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM registrations WHERE country_code = ?1",
            params![country_code],
            |row| row.get(0),
        )?)
    }

    pub fn total_registrations(&self) -> Result<i64> {
        Ok(self
            .conn()
            .query_row("SELECT COUNT(*) FROM registrations", [], |row| row.get(0))?)
    }
}
