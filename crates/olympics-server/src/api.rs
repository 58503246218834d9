use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use olympics_shared::countries::COUNTRIES;
use olympics_shared::ProofBundle;
use olympics_store::{Country, Pool, RegisterOutcome};

use crate::error::ApiError;
use crate::registration::Registrar;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub registrar: Arc<Registrar>,
}

/// Every route is reachable both at the root and under `/api`, the prefix
/// the web frontend uses.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/test", get(test_get).post(test_post))
        .route("/leaderboard", get(leaderboard))
        .route("/register", post(register))
        .route("/countries", get(list_countries))
        .route("/stats", get(stats))
}

// ─── Wire types ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct TestResponse {
    message: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardEntry {
    country_code: String,
    country_name: String,
    count: i64,
}

impl From<Country> for LeaderboardEntry {
    fn from(c: Country) -> Self {
        Self {
            country_code: c.country_code,
            country_name: c.country_name,
            count: c.count,
        }
    }
}

#[derive(Serialize)]
struct LeaderboardResponse {
    success: bool,
    leaderboard: Vec<LeaderboardEntry>,
    total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryEntry {
    country_code: &'static str,
    country_name: &'static str,
}

#[derive(Serialize)]
struct CountriesResponse {
    success: bool,
    countries: Vec<DirectoryEntry>,
    total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    success: bool,
    total_registrations: i64,
    total_countries: i64,
}

/// Body of `POST /register`. Both the bare claim and the proof bundle are
/// optional here; [`RegisterRequest::into_claim`] decides which one was sent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    country_code: Option<String>,
    country_name: Option<String>,
    attestation_id: Option<Value>,
    proof: Option<Value>,
    public_signals: Option<Value>,
    user_context_data: Option<Value>,
}

#[derive(Debug, PartialEq)]
enum Claim {
    Proof(ProofBundle),
    Country { code: String, name: String },
}

impl RegisterRequest {
    fn into_claim(self) -> Result<Claim, ApiError> {
        let has_proof_field = self.attestation_id.is_some()
            || self.proof.is_some()
            || self.public_signals.is_some()
            || self.user_context_data.is_some();

        if has_proof_field {
            return match (
                self.attestation_id,
                self.proof,
                self.public_signals,
                self.user_context_data,
            ) {
                (Some(attestation_id), Some(proof), Some(public_signals), Some(user_context_data)) => {
                    Ok(Claim::Proof(ProofBundle {
                        attestation_id,
                        proof,
                        public_signals,
                        user_context_data,
                    }))
                }
                _ => Err(ApiError::Validation(
                    "Proof, publicSignals, attestationId and userContextData are required".into(),
                )),
            };
        }

        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        match (non_empty(self.country_code), non_empty(self.country_name)) {
            (Some(code), Some(name)) => Ok(Claim::Country { code, name }),
            _ => Err(ApiError::Validation(
                "Missing countryCode or countryName".into(),
            )),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredBody {
    success: bool,
    country_code: String,
    country_name: String,
    count: i64,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AlreadyRegisteredBody {
    success: bool,
    already_registered: bool,
    country_code: String,
    country_name: String,
    message: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RegisterResponse {
    Registered(RegisteredBody),
    AlreadyRegistered(AlreadyRegisteredBody),
}

impl From<RegisterOutcome> for RegisterResponse {
    fn from(outcome: RegisterOutcome) -> Self {
        match outcome {
            RegisterOutcome::Registered(country) => Self::Registered(RegisteredBody {
                success: true,
                message: format!("Successfully registered for {}!", country.country_name),
                country_code: country.country_code,
                country_name: country.country_name,
                count: country.count,
            }),
            RegisterOutcome::AlreadyRegistered {
                country_code,
                country_name,
            } => Self::AlreadyRegistered(AlreadyRegisteredBody {
                success: false,
                already_registered: true,
                message: format!("This identity has already registered for {country_name}"),
                country_code,
                country_name,
            }),
        }
    }
}

// ─── Handlers ───

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn test_get() -> Json<TestResponse> {
    debug!("test endpoint hit");
    Json(TestResponse {
        message: "Backend is working!",
        timestamp: now_iso(),
    })
}

async fn test_post() -> Json<TestResponse> {
    debug!("test POST endpoint hit");
    Json(TestResponse {
        message: "POST is working!",
        timestamp: now_iso(),
    })
}

async fn leaderboard(State(state): State<AppState>) -> Result<Json<LeaderboardResponse>, ApiError> {
    let countries = state
        .pool
        .run(|db| db.list_leaderboard())
        .await
        .map_err(ApiError::storage("Failed to fetch leaderboard"))?;

    debug!(countries = countries.len(), "leaderboard fetched");

    let leaderboard: Vec<LeaderboardEntry> = countries.into_iter().map(Into::into).collect();
    Ok(Json(LeaderboardResponse {
        success: true,
        total: leaderboard.len(),
        leaderboard,
    }))
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(request) = payload
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e.body_text())))?;

    let outcome = match request.into_claim()? {
        Claim::Proof(bundle) => state.registrar.register_verified(&bundle).await?,
        Claim::Country { code, name } => state.registrar.register_claimed(&code, &name).await?,
    };

    Ok(Json(outcome.into()))
}

async fn list_countries() -> Json<CountriesResponse> {
    let mut countries: Vec<DirectoryEntry> = COUNTRIES
        .iter()
        .map(|(code, name)| DirectoryEntry {
            country_code: *code,
            country_name: *name,
        })
        .collect();
    countries.sort_by(|a, b| a.country_name.cmp(b.country_name));

    Json(CountriesResponse {
        success: true,
        total: countries.len(),
        countries,
    })
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let (total_registrations, total_countries) = state
        .pool
        .run(|db| Ok((db.total_registrations()?, db.count_countries()?)))
        .await
        .map_err(ApiError::storage("Failed to fetch stats"))?;

    Ok(Json(StatsResponse {
        success: true,
        total_registrations,
        total_countries,
    }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
