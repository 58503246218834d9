//! Domain model structs persisted in the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Country
// ---------------------------------------------------------------------------

/// Aggregate vote count for one nation.
///
/// `count` always equals the number of [`Registration`] rows pointing at
/// `country_code`; the only writer is [`Database::register_vote`].
///
/// [`Database::register_vote`]: crate::Database::register_vote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// ISO 3166-1 alpha-3 code.
    pub country_code: String,
    /// Display name captured on the first registration.
    pub country_name: String,
    pub count: i64,
    /// Refreshed on every increment.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// One vote cast by one identity. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub nullifier: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of [`Database::register_vote`].
///
/// [`Database::register_vote`]: crate::Database::register_vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The vote was recorded; carries the country with its new count.
    Registered(Country),
    /// The nullifier had already voted. Nothing was written.
    AlreadyRegistered {
        country_code: String,
        country_name: String,
    },
}
