/// Router Module Index
///
/// One router per entity group, mounted under the common `/api` prefix by
/// `create_router`. The auth router is public; the three entity routers sit
/// behind the bearer-token middleware applied in `lib.rs`, and each handler
/// additionally enforces its own `entity:verb` permission.

/// Public credential endpoints: register and login.
pub mod auth;

/// User account CRUD plus role attach/detach.
pub mod users;

/// Role CRUD plus permission attach/detach.
pub mod roles;

/// Permission CRUD.
pub mod permissions;
