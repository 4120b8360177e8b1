use crate::{auth, error::ApiError, repository::RepositoryState};

/// The full permission matrix the service enforces: one slug per entity and
/// verb. Seeded on first boot so the grids exist before anyone administers
/// them through the API.
const BASE_PERMISSIONS: &[(&str, &str)] = &[
    ("users:create", "Create user accounts"),
    ("users:read", "Read user accounts and their roles"),
    ("users:update", "Update user accounts and their role grants"),
    ("users:delete", "Delete user accounts"),
    ("roles:create", "Create roles"),
    ("roles:read", "Read roles and their permissions"),
    ("roles:update", "Update roles and their permission grants"),
    ("roles:delete", "Delete roles"),
    ("permissions:create", "Create permissions"),
    ("permissions:read", "Read permissions"),
    ("permissions:update", "Update permissions"),
    ("permissions:delete", "Delete permissions"),
];

const BASE_ROLES: &[&str] = &["admin", "user"];

const ADMIN_USERNAME: &str = "admin";

/// initialize
///
/// Idempotent startup bootstrap: fills empty permission/role tables, grants
/// every base permission to the `admin` role, and creates the initial `admin`
/// account (password from `ADMIN_PASSWORD`, development default otherwise)
/// holding that role. Without the grants a fresh install would have no
/// principal able to pass any permission check.
pub async fn initialize(repo: &RepositoryState) -> Result<(), ApiError> {
    if repo.list_permissions().await?.is_empty() {
        for &(slug, description) in BASE_PERMISSIONS {
            repo.create_permission(slug, Some(description)).await?;
        }
        tracing::info!("seeded {} base permissions", BASE_PERMISSIONS.len());
    }

    if repo.list_roles().await?.is_empty() {
        for name in BASE_ROLES {
            repo.create_role(name).await?;
        }
        tracing::info!("seeded base roles");
    }

    // Grant the full matrix to `admin`. attach_permission is idempotent, so
    // re-running on an already-seeded database changes nothing.
    let admin_role = repo
        .get_role_by_name("admin")
        .await?
        .ok_or(ApiError::NotFound("admin role"))?;

    for &(slug, _) in BASE_PERMISSIONS {
        if let Some(permission) = repo.get_permission_by_slug(slug).await? {
            repo.attach_permission(admin_role.id, permission.id).await?;
        }
    }

    if repo.get_user_by_username(ADMIN_USERNAME).await?.is_none() {
        let password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "adminpassword".to_string());
        let password_hash = auth::hash_password(&password)?;

        let admin_user = repo.create_user(ADMIN_USERNAME, &password_hash).await?;
        repo.attach_role(admin_user.id, admin_role.id).await?;

        tracing::info!("created initial admin user with the admin role");
    }

    Ok(())
}
