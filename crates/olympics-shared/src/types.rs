use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity-proof bundle produced by the Self app.
///
/// The fields are opaque to this service and handed to the verifier as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    /// Document type (passport, national ID, ...).
    pub attestation_id: Value,
    pub proof: Value,
    pub public_signals: Value,
    pub user_context_data: Value,
}

/// What the verifier concluded about a [`ProofBundle`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    /// Proof is structurally and cryptographically valid.
    pub valid: bool,
    /// Disclosed nationality (alpha-3), if the user disclosed it.
    #[serde(default)]
    pub nationality: Option<String>,
    /// Per-person pseudonymous identifier (the nullifier).
    #[serde(default)]
    pub unique_identifier: Option<String>,
    /// Verifier-provided diagnostics, echoed back on rejection.
    #[serde(default)]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_decodes_verifier_json() {
        let outcome: VerificationOutcome = serde_json::from_str(
            r#"{"valid":true,"nationality":"BRA","uniqueIdentifier":"0xabc"}"#,
        )
        .unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.nationality.as_deref(), Some("BRA"));
        assert_eq!(outcome.unique_identifier.as_deref(), Some("0xabc"));
        assert!(outcome.details.is_none());
    }

    #[test]
    fn test_outcome_tolerates_missing_disclosures() {
        let outcome: VerificationOutcome =
            serde_json::from_str(r#"{"valid":false,"details":{"isValid":false}}"#).unwrap();
        assert!(!outcome.valid);
        assert!(outcome.nationality.is_none());
        assert!(outcome.unique_identifier.is_none());
    }

    #[test]
    fn test_bundle_uses_camel_case_keys() {
        let bundle: ProofBundle = serde_json::from_value(serde_json::json!({
            "attestationId": 1,
            "proof": {"a": []},
            "publicSignals": ["1", "2"],
            "userContextData": "00ff",
        }))
        .unwrap();
        assert_eq!(bundle.attestation_id, serde_json::json!(1));
        let back = serde_json::to_value(&bundle).unwrap();
        assert!(back.get("publicSignals").is_some());
    }
}
