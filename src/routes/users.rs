use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Users Router
///
/// Account CRUD and the User<->Role association endpoints. Reached only
/// through the authentication layer; each handler checks its `users:*`
/// permission before touching the store.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // POST /api/users - create an account; GET /api/users - list all.
        .route(
            "/",
            post(handlers::create_user).get(handlers::list_users),
        )
        // Association endpoints take the user id plus the role name in the
        // body. Static segments, so they are registered alongside /{id}.
        .route("/addRole", post(handlers::add_role_to_user))
        .route("/removeRole", post(handlers::remove_role_from_user))
        // GET/PUT/DELETE /api/users/{id}
        .route(
            "/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // PUT /api/users/{id}/password - rotate the stored hash.
        .route("/{id}/password", put(handlers::update_user_password))
        // GET /api/users/{id}/roles - the roles the account holds.
        .route("/{id}/roles", get(handlers::get_user_roles))
}
