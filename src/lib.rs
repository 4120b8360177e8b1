use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod seed;

// Routing, one module per entity group.
pub mod routes;
use auth::AuthUser;
use routes::{auth as auth_routes, permissions, roles, users};

// --- Public Re-exports ---

// Core state types for the application entry point (main.rs) and tests.
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates the OpenAPI documentation for every handler and schema carrying
/// `#[utoipa::path]` / `ToSchema` annotations. Served as JSON at
/// `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login,
        handlers::create_user, handlers::list_users, handlers::get_user,
        handlers::get_user_roles, handlers::update_user, handlers::update_user_password,
        handlers::delete_user, handlers::add_role_to_user, handlers::remove_role_from_user,
        handlers::create_role, handlers::list_roles, handlers::get_role,
        handlers::get_role_permissions, handlers::update_role, handlers::delete_role,
        handlers::add_permission_to_role, handlers::remove_permission_from_role,
        handlers::create_permission, handlers::list_permissions, handlers::get_permission,
        handlers::update_permission, handlers::delete_permission
    ),
    components(
        schemas(
            models::User, models::Role, models::Permission, models::RoleDetail,
            models::CredentialsRequest, models::CreateUserRequest, models::UpdateUserRequest,
            models::UpdatePasswordRequest, models::CreateRoleRequest, models::UpdateRoleRequest,
            models::CreatePermissionRequest, models::UpdatePermissionRequest,
            models::RolePermissionRequest, models::UserRoleRequest,
            models::ApiMessage, models::TokenResponse, models::UserResponse,
            models::UsersResponse, models::UserRolesResponse, models::RoleResponse,
            models::RoleDetailResponse, models::RolesResponse, models::PermissionResponse,
            models::PermissionsResponse,
        )
    ),
    tags(
        (name = "iam-portal", description = "User / Role / Permission management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe container holding the application's shared
/// services: the repository (persistence) and the immutable configuration.
/// Constructed once in `main` and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: storage access behind the `Repository` trait object.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// FromRef lets extractors (notably AuthUser) pull individual components out
// of the shared state without depending on the whole of it.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the entity routers. `AuthUser` implements
/// `FromRequestParts`, so extracting it here runs the full token gate; a
/// failure rejects the request with the corresponding auth error before any
/// handler executes.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure: swagger, the public auth router, the
/// token-gated entity routers under `/api`, and the outer observability and
/// CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // Entity routers share one authentication layer; per-endpoint permission
    // checks happen inside the handlers.
    let protected = Router::new()
        .nest("/users", users::user_routes())
        .nest("/roles", roles::role_routes())
        .nest("/permissions", permissions::permission_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        .nest("/auth", auth_routes::auth_routes())
        .merge(protected);

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(state);

    // Observability and correlation layers, applied outermost.
    base_router
        .layer(
            ServiceBuilder::new()
                // Unique request id for every inbound request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Wrap the request/response lifecycle in a tracing span that
                // carries method, URI, and the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Return the generated id to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: includes the `x-request-id` header so every
/// log line for one request is correlated by a single id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
