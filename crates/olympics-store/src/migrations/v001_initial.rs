//! v001 -- Initial schema creation.
//!
//! Creates the two tables: `countries` (aggregate vote count per nation) and
//! `registrations` (one row per accepted vote).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Countries
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS countries (
    country_code TEXT PRIMARY KEY NOT NULL,    -- ISO 3166-1 alpha-3
    country_name TEXT NOT NULL,                -- set on first insert only
    count        INTEGER NOT NULL DEFAULT 1 CHECK (count >= 0),
    updated_at   TEXT NOT NULL                 -- RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_countries_ranking
    ON countries(count DESC, country_name ASC);

-- ----------------------------------------------------------------
-- Registrations
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS registrations (
    nullifier    TEXT PRIMARY KEY NOT NULL,    -- per-identity pseudonym
    country_code TEXT NOT NULL,                -- FK -> countries(country_code)
    created_at   TEXT NOT NULL,

    FOREIGN KEY (country_code) REFERENCES countries(country_code)
);

CREATE INDEX IF NOT EXISTS idx_registrations_country
    ON registrations(country_code);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
