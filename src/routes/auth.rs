use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Auth Router
///
/// The only unauthenticated endpoints besides the health probe. Both answer
/// with a signed session token on success; neither ever returns a token on
/// failure.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/register
        // Creates an account and signs the first session token.
        .route("/register", post(handlers::register))
        // POST /api/auth/login
        // Verifies credentials and signs a fresh session token.
        .route("/login", post(handlers::login))
}
