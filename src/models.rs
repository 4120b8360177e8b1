use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A user account row from the `users` table. The password hash is carried for
/// internal verification only and is skipped by serde, so it can never appear
/// in a response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Role
///
/// A role row from the `roles` table. Users hold roles through the
/// `user_roles` join relation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Permission
///
/// A permission row from the `permissions` table, identified by its slug
/// (e.g. `"users:read"`). Roles carry permissions through `role_permissions`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Permission {
    pub id: Uuid,
    pub slug: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// RoleDetail
///
/// A role together with the permissions it carries. Composed in the handler
/// layer from a role row plus a per-role permission load; role read endpoints
/// return this shape.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoleDetail {
    pub id: Uuid,
    pub name: String,
    pub permissions: Vec<Permission>,
}

// --- Request Payloads (Input Schemas) ---

/// Credentials for POST /api/auth/register and POST /api/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Input for POST /api/users. Same field pair as registration; the password is
/// hashed before it reaches the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

/// Partial update for PUT /api/users/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Input for PUT /api/users/{id}/password.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// Input for POST /api/roles. The optional slug list is attached to the new
/// role; slugs that match no existing permission are skipped.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

/// Partial update for PUT /api/roles/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRoleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Input for POST /api/permissions.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePermissionRequest {
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update for PUT /api/permissions/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePermissionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Association payload for POST /api/roles/addPermission and
/// POST /api/roles/removePermission: the role by id, the partner by slug.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RolePermissionRequest {
    pub role_id: Uuid,
    pub permission_slug: String,
}

/// Association payload for POST /api/users/addRole and
/// POST /api/users/removeRole: the user by id, the partner by name.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserRoleRequest {
    pub user_id: Uuid,
    pub role_name: String,
}

// --- Response Envelopes (Output Schemas) ---
//
// Every response carries `success` and `message`; payload-bearing responses
// nest their payload under a named key. Errors reuse ApiMessage.

/// Message-only envelope, also the error body shape.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

/// Envelope for register/login: the signed session token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UsersResponse {
    pub success: bool,
    pub message: String,
    pub users: Vec<User>,
}

/// Role list for a single user (GET /api/users/{id}/roles): bare roles,
/// without their permission sets.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserRolesResponse {
    pub success: bool,
    pub message: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoleResponse {
    pub success: bool,
    pub message: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoleDetailResponse {
    pub success: bool,
    pub message: String,
    pub role: RoleDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RolesResponse {
    pub success: bool,
    pub message: String,
    pub roles: Vec<RoleDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PermissionResponse {
    pub success: bool,
    pub message: String,
    pub permission: Permission,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PermissionsResponse {
    pub success: bool,
    pub message: String,
    pub permissions: Vec<Permission>,
}
