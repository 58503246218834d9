//! Turns a country claim or an identity proof into a recorded vote.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use olympics_shared::{country_name, is_valid_country_code, ProofBundle};
use olympics_store::{Pool, RegisterOutcome};

use crate::error::ApiError;
use crate::verifier::IdentityVerifier;

const REGISTER_FAILED: &str = "Failed to register country";

pub struct Registrar {
    pool: Pool,
    verifier: Arc<dyn IdentityVerifier>,
    allow_unverified: bool,
}

impl Registrar {
    pub fn new(pool: Pool, verifier: Arc<dyn IdentityVerifier>, allow_unverified: bool) -> Self {
        Self {
            pool,
            verifier,
            allow_unverified,
        }
    }

    /// Record a vote for a caller-supplied country without any proof.
    ///
    /// Each call gets a fresh synthetic nullifier, so nothing stops the same
    /// person from voting repeatedly through this path.
    pub async fn register_claimed(
        &self,
        country_code: &str,
        country_name: &str,
    ) -> Result<RegisterOutcome, ApiError> {
        if !self.allow_unverified {
            return Err(ApiError::Validation(
                "Unverified registration is disabled".into(),
            ));
        }

        let nullifier = format!("{country_code}-{}", Uuid::new_v4());
        self.record(nullifier, country_code.to_string(), country_name.to_string())
            .await
    }

    /// Verify `bundle` and record a vote for the nationality it discloses.
    pub async fn register_verified(&self, bundle: &ProofBundle) -> Result<RegisterOutcome, ApiError> {
        let outcome = self.verifier.verify(bundle).await?;

        if !outcome.valid {
            warn!(details = ?outcome.details, "identity proof rejected");
            return Err(ApiError::verification("Verification failed", outcome.details));
        }

        let Some(nationality) = outcome
            .nationality
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        else {
            warn!("valid proof without nationality disclosure");
            return Err(ApiError::verification("Nationality not disclosed", None));
        };

        let Some(nullifier) = outcome.unique_identifier.filter(|id| !id.is_empty()) else {
            warn!("valid proof without unique identifier");
            return Err(ApiError::verification("Missing unique identifier", None));
        };

        let code = nationality.to_ascii_uppercase();
        if !is_valid_country_code(&code) {
            warn!(code = %code, "nationality not in country directory");
        }
        let name = country_name(&code).to_string();

        self.record(nullifier, code, name).await
    }

    async fn record(
        &self,
        nullifier: String,
        code: String,
        name: String,
    ) -> Result<RegisterOutcome, ApiError> {
        let outcome = self
            .pool
            .run(move |db| db.register_vote(&nullifier, &code, &name))
            .await
            .map_err(ApiError::storage(REGISTER_FAILED))?;

        match &outcome {
            RegisterOutcome::Registered(country) => info!(
                code = %country.country_code,
                count = country.count,
                "registration accepted"
            ),
            RegisterOutcome::AlreadyRegistered { country_code, .. } => info!(
                code = %country_code,
                "duplicate registration ignored"
            ),
        }

        Ok(outcome)
    }
}
