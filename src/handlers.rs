use crate::{
    AppState,
    auth::{self, AuthUser},
    authz,
    error::ApiError,
    models::{
        ApiMessage, CreatePermissionRequest, CreateRoleRequest, CreateUserRequest,
        CredentialsRequest, PermissionResponse, PermissionsResponse, RoleDetail,
        RoleDetailResponse, RolePermissionRequest, RoleResponse, RolesResponse, TokenResponse,
        UpdatePasswordRequest, UpdatePermissionRequest, UpdateRoleRequest, UpdateUserRequest,
        UserResponse, UserRoleRequest, UserRolesResponse, UsersResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

/// Rejects missing/empty fields before they reach the store.
fn require_field(value: &str, field: &'static str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

// --- Authentication ---

/// register
///
/// [Public Route] Creates a user account and returns a signed session token.
/// The duplicate pre-check is advisory; a concurrent create with the same
/// username is caught by the unique index and reported identically.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created", body = TokenResponse),
        (status = 400, description = "Missing field or username taken", body = ApiMessage)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    require_field(&payload.username, "username")?;
    require_field(&payload.password, "password")?;

    if state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Duplicate("username already in use".to_string()));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = state
        .repo
        .create_user(&payload.username, &password_hash)
        .await?;

    let token = auth::issue_token(user.id, &state.config.jwt_secret, state.config.token_ttl_secs)?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            success: true,
            message: "user created".to_string(),
            token,
        }),
    ))
}

/// login
///
/// [Public Route] Verifies credentials and returns a fresh session token.
/// An unknown username is a 404; a failed hash comparison is a 400, with no
/// token in either case.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Incorrect password", body = ApiMessage),
        (status = 404, description = "Unknown username", body = ApiMessage)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    require_field(&payload.username, "username")?;
    require_field(&payload.password, "password")?;

    let user = state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if !auth::verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::issue_token(user.id, &state.config.jwt_secret, state.config.token_ttl_secs)?;

    Ok(Json(TokenResponse {
        success: true,
        message: "login successful".to_string(),
        token,
    }))
}

// --- Users ---

/// create_user
///
/// [Gated: users:create] Administrative account creation, same validation as
/// registration but no token issuance.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing field or username taken", body = ApiMessage),
        (status = 403, description = "Permission denied", body = ApiMessage)
    )
)]
pub async fn create_user(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:create").await?;
    require_field(&payload.username, "username")?;
    require_field(&payload.password, "password")?;

    if state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Duplicate("username already in use".to_string()));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = state
        .repo
        .create_user(&payload.username, &password_hash)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            message: "user created".to_string(),
            user,
        }),
    ))
}

/// list_users
///
/// [Gated: users:read] Lists every user account. Password hashes are skipped
/// at serialization, so the listing never carries them.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = UsersResponse),
        (status = 403, description = "Permission denied", body = ApiMessage)
    )
)]
pub async fn list_users(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UsersResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:read").await?;

    let users = state.repo.list_users().await?;
    Ok(Json(UsersResponse {
        success: true,
        message: "users retrieved".to_string(),
        users,
    }))
}

/// get_user
///
/// [Gated: users:read] Single user account by id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ApiMessage)
    )
)]
pub async fn get_user(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:read").await?;

    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(UserResponse {
        success: true,
        message: "user retrieved".to_string(),
        user,
    }))
}

/// get_user_roles
///
/// [Gated: users:read] Lists the roles a user currently holds.
#[utoipa::path(
    get,
    path = "/api/users/{id}/roles",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User roles", body = UserRolesResponse),
        (status = 404, description = "User not found", body = ApiMessage)
    )
)]
pub async fn get_user_roles(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRolesResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:read").await?;

    if state.repo.get_user(id).await?.is_none() {
        return Err(ApiError::NotFound("user"));
    }

    let roles = state.repo.roles_for_user(id).await?;
    Ok(Json(UserRolesResponse {
        success: true,
        message: "user roles retrieved".to_string(),
        roles,
    }))
}

/// update_user
///
/// [Gated: users:update] Renames an account. A new username colliding with
/// another account is rejected as a duplicate.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Username taken", body = ApiMessage),
        (status = 404, description = "User not found", body = ApiMessage)
    )
)]
pub async fn update_user(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:update").await?;

    let mut user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if let Some(username) = payload.username {
        require_field(&username, "username")?;

        if let Some(existing) = state.repo.get_user_by_username(&username).await? {
            if existing.id != id {
                return Err(ApiError::Duplicate("username already in use".to_string()));
            }
        }

        user = state
            .repo
            .update_username(id, &username)
            .await?
            .ok_or(ApiError::NotFound("user"))?;
    }

    Ok(Json(UserResponse {
        success: true,
        message: "user updated".to_string(),
        user,
    }))
}

/// update_user_password
///
/// [Gated: users:update] Rotates an account password; the new value is
/// re-hashed with a fresh salt.
#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = ApiMessage),
        (status = 404, description = "User not found", body = ApiMessage)
    )
)]
pub async fn update_user_password(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:update").await?;
    require_field(&payload.password, "password")?;

    let password_hash = auth::hash_password(&payload.password)?;

    if !state.repo.update_password(id, &password_hash).await? {
        return Err(ApiError::NotFound("user"));
    }

    Ok(Json(ApiMessage {
        success: true,
        message: "password updated".to_string(),
    }))
}

/// delete_user
///
/// [Gated: users:delete] Removes an account; its role associations go with it
/// via the join-table cascade.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiMessage),
        (status = 404, description = "User not found", body = ApiMessage)
    )
)]
pub async fn delete_user(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:delete").await?;

    if !state.repo.delete_user(id).await? {
        return Err(ApiError::NotFound("user"));
    }

    Ok(Json(ApiMessage {
        success: true,
        message: "user deleted".to_string(),
    }))
}

/// add_role_to_user
///
/// [Gated: users:update] Attaches a role (by name) to a user (by id). Both
/// sides must exist; re-attaching an already-held role is a no-op success.
#[utoipa::path(
    post,
    path = "/api/users/addRole",
    request_body = UserRoleRequest,
    responses(
        (status = 200, description = "Role attached", body = ApiMessage),
        (status = 404, description = "User or role not found", body = ApiMessage)
    )
)]
pub async fn add_role_to_user(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UserRoleRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:update").await?;

    let user = state
        .repo
        .get_user(payload.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let role = state
        .repo
        .get_role_by_name(&payload.role_name)
        .await?
        .ok_or(ApiError::NotFound("role"))?;

    state.repo.attach_role(user.id, role.id).await?;

    Ok(Json(ApiMessage {
        success: true,
        message: format!("role {} added to user", role.name),
    }))
}

/// remove_role_from_user
///
/// [Gated: users:update] Detaches a role (by name) from a user (by id).
#[utoipa::path(
    post,
    path = "/api/users/removeRole",
    request_body = UserRoleRequest,
    responses(
        (status = 200, description = "Role detached", body = ApiMessage),
        (status = 404, description = "User or role not found", body = ApiMessage)
    )
)]
pub async fn remove_role_from_user(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UserRoleRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "users:update").await?;

    let user = state
        .repo
        .get_user(payload.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let role = state
        .repo
        .get_role_by_name(&payload.role_name)
        .await?
        .ok_or(ApiError::NotFound("role"))?;

    state.repo.detach_role(user.id, role.id).await?;

    Ok(Json(ApiMessage {
        success: true,
        message: format!("role {} removed from user", role.name),
    }))
}

// --- Roles ---

/// Loads the permission set for each role; role reads embed their permissions.
async fn role_details(
    state: &AppState,
    roles: Vec<crate::models::Role>,
) -> Result<Vec<RoleDetail>, ApiError> {
    let mut details = Vec::with_capacity(roles.len());
    for role in roles {
        let permissions = state.repo.permissions_for_role(role.id).await?;
        details.push(RoleDetail {
            id: role.id,
            name: role.name,
            permissions,
        });
    }
    Ok(details)
}

/// create_role
///
/// [Gated: roles:create] Creates a role, optionally attaching an initial list
/// of permissions by slug. Slugs matching no existing permission are skipped
/// rather than failing the whole creation.
#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleDetailResponse),
        (status = 400, description = "Missing field or name taken", body = ApiMessage)
    )
)]
pub async fn create_role(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleDetailResponse>), ApiError> {
    authz::require_permission(&state.repo, actor_id, "roles:create").await?;
    require_field(&payload.name, "name")?;

    if state.repo.get_role_by_name(&payload.name).await?.is_some() {
        return Err(ApiError::Duplicate("role name already in use".to_string()));
    }

    let role = state.repo.create_role(&payload.name).await?;

    if let Some(slugs) = payload.permissions {
        for slug in slugs {
            if let Some(permission) = state.repo.get_permission_by_slug(&slug).await? {
                state.repo.attach_permission(role.id, permission.id).await?;
            }
        }
    }

    let permissions = state.repo.permissions_for_role(role.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleDetailResponse {
            success: true,
            message: "role created".to_string(),
            role: RoleDetail {
                id: role.id,
                name: role.name,
                permissions,
            },
        }),
    ))
}

/// list_roles
///
/// [Gated: roles:read] Lists every role with its permission set.
#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "All roles with permissions", body = RolesResponse),
        (status = 403, description = "Permission denied", body = ApiMessage)
    )
)]
pub async fn list_roles(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<RolesResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "roles:read").await?;

    let roles = state.repo.list_roles().await?;
    let roles = role_details(&state, roles).await?;

    Ok(Json(RolesResponse {
        success: true,
        message: "roles retrieved".to_string(),
        roles,
    }))
}

/// get_role
///
/// [Gated: roles:read] Single role by id, permissions embedded.
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role found", body = RoleDetailResponse),
        (status = 404, description = "Role not found", body = ApiMessage)
    )
)]
pub async fn get_role(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleDetailResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "roles:read").await?;

    let role = state
        .repo
        .get_role(id)
        .await?
        .ok_or(ApiError::NotFound("role"))?;

    let permissions = state.repo.permissions_for_role(role.id).await?;

    Ok(Json(RoleDetailResponse {
        success: true,
        message: "role retrieved".to_string(),
        role: RoleDetail {
            id: role.id,
            name: role.name,
            permissions,
        },
    }))
}

/// get_role_permissions
///
/// [Gated: roles:read] The permission set a role carries.
#[utoipa::path(
    get,
    path = "/api/roles/{id}/permissions",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role permissions", body = PermissionsResponse),
        (status = 404, description = "Role not found", body = ApiMessage)
    )
)]
pub async fn get_role_permissions(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PermissionsResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "roles:read").await?;

    if state.repo.get_role(id).await?.is_none() {
        return Err(ApiError::NotFound("role"));
    }

    let permissions = state.repo.permissions_for_role(id).await?;

    Ok(Json(PermissionsResponse {
        success: true,
        message: "role permissions retrieved".to_string(),
        permissions,
    }))
}

/// update_role
///
/// [Gated: roles:update] Renames a role, rejecting a name already held by a
/// different role.
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 400, description = "Name taken", body = ApiMessage),
        (status = 404, description = "Role not found", body = ApiMessage)
    )
)]
pub async fn update_role(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "roles:update").await?;

    let mut role = state
        .repo
        .get_role(id)
        .await?
        .ok_or(ApiError::NotFound("role"))?;

    if let Some(name) = payload.name {
        require_field(&name, "name")?;

        if let Some(existing) = state.repo.get_role_by_name(&name).await? {
            if existing.id != id {
                return Err(ApiError::Duplicate("role name already in use".to_string()));
            }
        }

        role = state
            .repo
            .rename_role(id, &name)
            .await?
            .ok_or(ApiError::NotFound("role"))?;
    }

    Ok(Json(RoleResponse {
        success: true,
        message: "role updated".to_string(),
        role,
    }))
}

/// delete_role
///
/// [Gated: roles:delete] Removes a role. Users holding it lose the
/// association through the join-table cascade.
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role deleted", body = ApiMessage),
        (status = 404, description = "Role not found", body = ApiMessage)
    )
)]
pub async fn delete_role(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "roles:delete").await?;

    if !state.repo.delete_role(id).await? {
        return Err(ApiError::NotFound("role"));
    }

    Ok(Json(ApiMessage {
        success: true,
        message: "role deleted".to_string(),
    }))
}

/// add_permission_to_role
///
/// [Gated: roles:update] Attaches a permission (by slug) to a role (by id).
/// Both sides must exist; a missing slug leaves the role's permission set
/// unchanged and answers 404.
#[utoipa::path(
    post,
    path = "/api/roles/addPermission",
    request_body = RolePermissionRequest,
    responses(
        (status = 200, description = "Permission attached", body = ApiMessage),
        (status = 404, description = "Role or permission not found", body = ApiMessage)
    )
)]
pub async fn add_permission_to_role(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<RolePermissionRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "roles:update").await?;

    let role = state
        .repo
        .get_role(payload.role_id)
        .await?
        .ok_or(ApiError::NotFound("role"))?;

    let permission = state
        .repo
        .get_permission_by_slug(&payload.permission_slug)
        .await?
        .ok_or(ApiError::NotFound("permission"))?;

    state.repo.attach_permission(role.id, permission.id).await?;

    Ok(Json(ApiMessage {
        success: true,
        message: format!("permission {} added to role", permission.slug),
    }))
}

/// remove_permission_from_role
///
/// [Gated: roles:update] Detaches a permission (by slug) from a role (by id).
#[utoipa::path(
    post,
    path = "/api/roles/removePermission",
    request_body = RolePermissionRequest,
    responses(
        (status = 200, description = "Permission detached", body = ApiMessage),
        (status = 404, description = "Role or permission not found", body = ApiMessage)
    )
)]
pub async fn remove_permission_from_role(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<RolePermissionRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "roles:update").await?;

    let role = state
        .repo
        .get_role(payload.role_id)
        .await?
        .ok_or(ApiError::NotFound("role"))?;

    let permission = state
        .repo
        .get_permission_by_slug(&payload.permission_slug)
        .await?
        .ok_or(ApiError::NotFound("permission"))?;

    state.repo.detach_permission(role.id, permission.id).await?;

    Ok(Json(ApiMessage {
        success: true,
        message: format!("permission {} removed from role", permission.slug),
    }))
}

// --- Permissions ---

/// create_permission
///
/// [Gated: permissions:create] Creates a permission from a unique slug and an
/// optional description.
#[utoipa::path(
    post,
    path = "/api/permissions",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = PermissionResponse),
        (status = 400, description = "Missing field or slug taken", body = ApiMessage)
    )
)]
pub async fn create_permission(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<PermissionResponse>), ApiError> {
    authz::require_permission(&state.repo, actor_id, "permissions:create").await?;
    require_field(&payload.slug, "slug")?;

    if state
        .repo
        .get_permission_by_slug(&payload.slug)
        .await?
        .is_some()
    {
        return Err(ApiError::Duplicate(
            "permission slug already in use".to_string(),
        ));
    }

    let permission = state
        .repo
        .create_permission(&payload.slug, payload.description.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionResponse {
            success: true,
            message: "permission created".to_string(),
            permission,
        }),
    ))
}

/// list_permissions
///
/// [Gated: permissions:read] Lists every permission.
#[utoipa::path(
    get,
    path = "/api/permissions",
    responses(
        (status = 200, description = "All permissions", body = PermissionsResponse),
        (status = 403, description = "Permission denied", body = ApiMessage)
    )
)]
pub async fn list_permissions(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PermissionsResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "permissions:read").await?;

    let permissions = state.repo.list_permissions().await?;
    Ok(Json(PermissionsResponse {
        success: true,
        message: "permissions retrieved".to_string(),
        permissions,
    }))
}

/// get_permission
///
/// [Gated: permissions:read] Single permission by id.
#[utoipa::path(
    get,
    path = "/api/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission found", body = PermissionResponse),
        (status = 404, description = "Permission not found", body = ApiMessage)
    )
)]
pub async fn get_permission(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PermissionResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "permissions:read").await?;

    let permission = state
        .repo
        .get_permission(id)
        .await?
        .ok_or(ApiError::NotFound("permission"))?;

    Ok(Json(PermissionResponse {
        success: true,
        message: "permission retrieved".to_string(),
        permission,
    }))
}

/// update_permission
///
/// [Gated: permissions:update] Partial update of slug and/or description. A
/// new slug colliding with another permission is rejected as a duplicate.
#[utoipa::path(
    put,
    path = "/api/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    request_body = UpdatePermissionRequest,
    responses(
        (status = 200, description = "Permission updated", body = PermissionResponse),
        (status = 400, description = "Slug taken", body = ApiMessage),
        (status = 404, description = "Permission not found", body = ApiMessage)
    )
)]
pub async fn update_permission(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> Result<Json<PermissionResponse>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "permissions:update").await?;

    if let Some(slug) = payload.slug.as_deref() {
        require_field(slug, "slug")?;

        if let Some(existing) = state.repo.get_permission_by_slug(slug).await? {
            if existing.id != id {
                return Err(ApiError::Duplicate(
                    "permission slug already in use".to_string(),
                ));
            }
        }
    }

    let permission = state
        .repo
        .update_permission(id, payload.slug.as_deref(), payload.description.as_deref())
        .await?
        .ok_or(ApiError::NotFound("permission"))?;

    Ok(Json(PermissionResponse {
        success: true,
        message: "permission updated".to_string(),
        permission,
    }))
}

/// delete_permission
///
/// [Gated: permissions:delete] Removes a permission; roles carrying it lose
/// the association through the join-table cascade.
#[utoipa::path(
    delete,
    path = "/api/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission deleted", body = ApiMessage),
        (status = 404, description = "Permission not found", body = ApiMessage)
    )
)]
pub async fn delete_permission(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    authz::require_permission(&state.repo, actor_id, "permissions:delete").await?;

    if !state.repo.delete_permission(id).await? {
        return Err(ApiError::NotFound("permission"));
    }

    Ok(Json(ApiMessage {
        success: true,
        message: "permission deleted".to_string(),
    }))
}
