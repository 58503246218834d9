//! # olympics-shared
//!
//! Types and static data shared by the store and the HTTP server: the
//! country directory, identity-proof wire types and default settings.

pub mod constants;
pub mod countries;
pub mod types;

pub use countries::{country_name, is_valid_country_code};
pub use types::{ProofBundle, VerificationOutcome};
