/// Application name
pub const APP_NAME: &str = "Self Olympics";

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Verification scope the frontend and verifier must agree on
pub const DEFAULT_SELF_SCOPE: &str = "self-olympics-2024";

/// Endpoint the Self app is told to post proofs to
pub const DEFAULT_SELF_ENDPOINT: &str = "http://localhost:3000/api/register";

/// Default number of pooled database connections
pub const DEFAULT_POOL_SIZE: usize = 8;

/// Default database file
pub const DEFAULT_DATABASE_PATH: &str = "./olympics.db";
