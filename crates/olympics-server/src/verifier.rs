//! Identity-proof verification.
//!
//! Proof checking belongs to the Self SDK and is not reimplemented here. The
//! server talks to it through [`IdentityVerifier`]; in production that is a
//! [`RemoteVerifier`] posting the proof to a sidecar that hosts the SDK.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use olympics_shared::{ProofBundle, VerificationOutcome};

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("verifier request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("verifier responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("verifier response was not a verification outcome: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can judge a [`ProofBundle`].
///
/// An `Ok` outcome may still be a rejection (`valid == false`); `Err` means
/// the verifier itself could not be consulted.
pub trait IdentityVerifier: Send + Sync {
    fn verify<'a>(
        &'a self,
        bundle: &'a ProofBundle,
    ) -> BoxFuture<'a, Result<VerificationOutcome, VerifierError>>;
}

// ---------------------------------------------------------------------------
// Remote verifier
// ---------------------------------------------------------------------------

/// Sends proofs to an HTTP verification service.
///
/// The service receives the bundle plus the scope, endpoint and mock flag
/// the frontend was configured with, and answers `200` with a
/// [`VerificationOutcome`] body whether or not the proof holds.
pub struct RemoteVerifier {
    client: reqwest::Client,
    url: String,
    scope: String,
    endpoint: String,
    mock_passport: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    scope: &'a str,
    endpoint: &'a str,
    mock_passport: bool,
    #[serde(flatten)]
    bundle: &'a ProofBundle,
}

impl RemoteVerifier {
    pub fn new(
        url: String,
        scope: String,
        endpoint: String,
        mock_passport: bool,
        timeout: Duration,
    ) -> Result<Self, VerifierError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            scope,
            endpoint,
            mock_passport,
        })
    }

    async fn post(&self, bundle: &ProofBundle) -> Result<VerificationOutcome, VerifierError> {
        let body = VerifyRequest {
            scope: &self.scope,
            endpoint: &self.endpoint,
            mock_passport: self.mock_passport,
            bundle,
        };

        let resp = self.client.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(VerifierError::Status(status));
        }

        let body = resp.bytes().await?;
        let outcome: VerificationOutcome = serde_json::from_slice(&body)?;
        debug!(valid = outcome.valid, "verifier answered");
        Ok(outcome)
    }
}

impl IdentityVerifier for RemoteVerifier {
    fn verify<'a>(
        &'a self,
        bundle: &'a ProofBundle,
    ) -> BoxFuture<'a, Result<VerificationOutcome, VerifierError>> {
        Box::pin(self.post(bundle))
    }
}

// ---------------------------------------------------------------------------
// Disabled verifier
// ---------------------------------------------------------------------------

/// Stand-in used when no verification service is configured. Rejects every
/// proof.
pub struct DisabledVerifier;

impl IdentityVerifier for DisabledVerifier {
    fn verify<'a>(
        &'a self,
        _bundle: &'a ProofBundle,
    ) -> BoxFuture<'a, Result<VerificationOutcome, VerifierError>> {
        let outcome = VerificationOutcome {
            valid: false,
            details: Some(serde_json::json!({
                "reason": "proof verification is not configured on this server"
            })),
            ..Default::default()
        };
        Box::pin(futures::future::ready(Ok::<_, VerifierError>(outcome)))
    }
}


#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

    use super::*;

    /// Serve `router` on an ephemeral local port and return a verifier
    /// pointed at its `/verify` route.
    async fn remote(router: Router) -> RemoteVerifier {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        RemoteVerifier::new(
            format!("http://{addr}/verify"),
            "scope".into(),
            "endpoint".into(),
            true,
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn bundle() -> ProofBundle {
        ProofBundle {
            attestation_id: serde_json::json!(1),
            proof: serde_json::json!({"a": ["1"]}),
            public_signals: serde_json::json!(["7"]),
            user_context_data: serde_json::json!("00"),
        }
    }

    #[tokio::test]
    async fn test_disabled_verifier_rejects() {
        let outcome = DisabledVerifier.verify(&bundle()).await.unwrap();
        assert!(!outcome.valid);
        assert!(outcome.details.is_some());
    }

    #[test]
    fn test_request_body_flattens_bundle() {
        let b = bundle();
        let body = serde_json::to_value(VerifyRequest {
            scope: "self-olympics-2024",
            endpoint: "https://example.org/api/register",
            mock_passport: true,
            bundle: &b,
        })
        .unwrap();

        assert_eq!(body["scope"], "self-olympics-2024");
        assert_eq!(body["mockPassport"], true);
        assert_eq!(body["attestationId"], 1);
        assert_eq!(body["publicSignals"], serde_json::json!(["7"]));
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let verifier = RemoteVerifier::new(
            "http://127.0.0.1:9/verify".into(),
            "scope".into(),
            "endpoint".into(),
            false,
            Duration::from_secs(2),
        )
        .unwrap();

        let err = verifier.verify(&bundle()).await.unwrap_err();
        assert!(matches!(err, VerifierError::Transport(_)));
    }

    #[tokio::test]
    async fn test_remote_outcome_is_passed_through() {
        let router = Router::new().route(
            "/verify",
            post(|| async {
                axum::Json(serde_json::json!({
                    "valid": true,
                    "nationality": "BRA",
                    "uniqueIdentifier": "0xabc"
                }))
            }),
        );

        let outcome = remote(router).await.verify(&bundle()).await.unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.nationality.as_deref(), Some("BRA"));
        assert_eq!(outcome.unique_identifier.as_deref(), Some("0xabc"));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_decode_error() {
        let router = Router::new().route("/verify", post(|| async { "not json" }));

        let err = remote(router).await.verify(&bundle()).await.unwrap_err();
        assert!(matches!(err, VerifierError::Decode(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/verify",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );

        let err = remote(router).await.verify(&bundle()).await.unwrap_err();
        assert!(matches!(
            err,
            VerifierError::Status(s) if s == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }
}
