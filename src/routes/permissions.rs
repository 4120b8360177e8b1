use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Permissions Router
///
/// Plain CRUD over the permission catalog; associations to roles live on the
/// roles router. Handlers enforce `permissions:*` permissions.
pub fn permission_routes() -> Router<AppState> {
    Router::new()
        // POST /api/permissions - create; GET /api/permissions - list all.
        .route(
            "/",
            post(handlers::create_permission).get(handlers::list_permissions),
        )
        // GET/PUT/DELETE /api/permissions/{id}
        .route(
            "/{id}",
            get(handlers::get_permission)
                .put(handlers::update_permission)
                .delete(handlers::delete_permission),
        )
}
