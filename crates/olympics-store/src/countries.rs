//! Read access to [`Country`] rows and the leaderboard.
//!
//! Counts change only through [`Database::register_vote`].

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Country;

impl Database {
    /// All countries ranked by `count` descending, ties broken by name.
    pub fn list_leaderboard(&self) -> Result<Vec<Country>> {
        let mut stmt = self.conn().prepare(
            "SELECT country_code, country_name, count, updated_at
             FROM countries
             ORDER BY count DESC, country_name ASC",
        )?;
        let rows = stmt.query_map([], row_to_country)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Fetch a single country by code.
    pub fn get_country(&self, country_code: &str) -> Result<Country> {
        self.conn()
            .query_row(
                "SELECT country_code, country_name, count, updated_at
                 FROM countries WHERE country_code = ?1",
                params![country_code],
                row_to_country,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Number of countries with at least one vote.
    pub fn count_countries(&self) -> Result<i64> {
        Ok(self
            .conn()
            .query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))?)
    }
}

pub(crate) fn row_to_country(row: &rusqlite::Row<'_>) -> rusqlite::Result<Country> {
    let updated_str: String = row.get(3)?;
    Ok(Country {
        country_code: row.get(0)?,
        country_name: row.get(1)?,
        count: row.get(2)?,
        updated_at: parse_timestamp(3, &updated_str)?,
    })
}

pub(crate) fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(db: &mut Database, nullifier: &str, code: &str, name: &str) {
        db.register_vote(nullifier, code, name).unwrap();
    }

    #[test]
    fn test_empty_leaderboard() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.list_leaderboard().unwrap().is_empty());
        assert_eq!(db.count_countries().unwrap(), 0);
    }

    #[test]
    fn test_ranking_breaks_ties_by_name() {
        let mut db = Database::open_in_memory().unwrap();

        // Insert out of order so the result cannot just be insertion order.
        for i in 0..3 {
            vote(&mut db, &format!("chl-{i}"), "CHL", "Chile");
        }
        for i in 0..5 {
            vote(&mut db, &format!("bra-{i}"), "BRA", "Brazil");
        }
        for i in 0..5 {
            vote(&mut db, &format!("arg-{i}"), "ARG", "Argentina");
        }

        let board = db.list_leaderboard().unwrap();
        let ranked: Vec<(&str, i64)> = board
            .iter()
            .map(|c| (c.country_code.as_str(), c.count))
            .collect();
        assert_eq!(ranked, vec![("ARG", 5), ("BRA", 5), ("CHL", 3)]);
        assert_eq!(db.count_countries().unwrap(), 3);
    }

    #[test]
    fn test_repeated_reads_are_identical() {
        let mut db = Database::open_in_memory().unwrap();
        vote(&mut db, "a", "FRA", "France");
        vote(&mut db, "b", "DEU", "Germany");
        vote(&mut db, "c", "DEU", "Germany");

        let first = db.list_leaderboard().unwrap();
        let second = db.list_leaderboard().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_get_missing_country() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_country("BRA"), Err(StoreError::NotFound)));
    }
}
