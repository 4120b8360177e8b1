use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Roles Router
///
/// Role CRUD and the Role<->Permission association endpoints. Role reads
/// embed each role's permission set. Handlers enforce `roles:*` permissions.
pub fn role_routes() -> Router<AppState> {
    Router::new()
        // POST /api/roles - create (optionally with initial permission slugs);
        // GET /api/roles - list all with permissions.
        .route("/", post(handlers::create_role).get(handlers::list_roles))
        // Association endpoints take the role id plus the permission slug.
        .route("/addPermission", post(handlers::add_permission_to_role))
        .route(
            "/removePermission",
            post(handlers::remove_permission_from_role),
        )
        // GET/PUT/DELETE /api/roles/{id}
        .route(
            "/{id}",
            get(handlers::get_role)
                .put(handlers::update_role)
                .delete(handlers::delete_role),
        )
        // GET /api/roles/{id}/permissions - the role's permission set.
        .route("/{id}/permissions", get(handlers::get_role_permissions))
}
