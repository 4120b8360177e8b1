use crate::models::{Permission, Role, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository
///
/// Abstract contract for all persistence operations. Handlers and the
/// authorization gate depend on this trait, never on the concrete store, so
/// tests swap in hand-written mocks.
///
/// All methods surface `sqlx::Error` to the caller; the request boundary
/// converts unique-index violations into the duplicate result and everything
/// else into a logged 500. Deletion/detach methods report whether a row was
/// actually affected so callers can distinguish success from a missing target.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, sqlx::Error>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error>;
    async fn update_username(&self, id: Uuid, username: &str)
    -> Result<Option<User>, sqlx::Error>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, sqlx::Error>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Roles ---
    async fn create_role(&self, name: &str) -> Result<Role, sqlx::Error>;
    async fn get_role(&self, id: Uuid) -> Result<Option<Role>, sqlx::Error>;
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, sqlx::Error>;
    async fn list_roles(&self) -> Result<Vec<Role>, sqlx::Error>;
    async fn rename_role(&self, id: Uuid, name: &str) -> Result<Option<Role>, sqlx::Error>;
    async fn delete_role(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Permissions ---
    async fn create_permission(
        &self,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Permission, sqlx::Error>;
    async fn get_permission(&self, id: Uuid) -> Result<Option<Permission>, sqlx::Error>;
    async fn get_permission_by_slug(&self, slug: &str) -> Result<Option<Permission>, sqlx::Error>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, sqlx::Error>;
    // Partial update: None keeps the stored value (COALESCE).
    async fn update_permission(
        &self,
        id: Uuid,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Permission>, sqlx::Error>;
    async fn delete_permission(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Associations ---
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>, sqlx::Error>;
    async fn permissions_for_role(&self, role_id: Uuid) -> Result<Vec<Permission>, sqlx::Error>;
    // Attach operations are idempotent (ON CONFLICT DO NOTHING); the boolean
    // reports whether a new association row was inserted.
    async fn attach_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, sqlx::Error>;
    async fn detach_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, sqlx::Error>;
    async fn attach_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, sqlx::Error>;
    async fn detach_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete `Repository` backed by PostgreSQL. Queries are runtime-bound
/// (`query_as` + `bind`), so building the crate needs no live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, created_at, updated_at";
const ROLE_COLUMNS: &str = "id, name, created_at, updated_at";
const PERMISSION_COLUMNS: &str = "id, slug, description, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    // --- Users ---

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
        sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await
    }

    async fn update_username(
        &self,
        id: Uuid,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            "UPDATE users SET username = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        // user_roles rows go with the user via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Roles ---

    async fn create_role(&self, name: &str) -> Result<Role, sqlx::Error> {
        let sql =
            format!("INSERT INTO roles (id, name) VALUES ($1, $2) RETURNING {ROLE_COLUMNS}");
        sqlx::query_as::<_, Role>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_role(&self, id: Uuid) -> Result<Option<Role>, sqlx::Error> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1");
        sqlx::query_as::<_, Role>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1");
        sqlx::query_as::<_, Role>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, sqlx::Error> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY name");
        sqlx::query_as::<_, Role>(&sql).fetch_all(&self.pool).await
    }

    async fn rename_role(&self, id: Uuid, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let sql = format!(
            "UPDATE roles SET name = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {ROLE_COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_role(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        // Cascade removes user_roles and role_permissions rows referencing it.
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Permissions ---

    async fn create_permission(
        &self,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Permission, sqlx::Error> {
        let sql = format!(
            "INSERT INTO permissions (id, slug, description) VALUES ($1, $2, $3) \
             RETURNING {PERMISSION_COLUMNS}"
        );
        sqlx::query_as::<_, Permission>(&sql)
            .bind(Uuid::new_v4())
            .bind(slug)
            .bind(description)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_permission(&self, id: Uuid) -> Result<Option<Permission>, sqlx::Error> {
        let sql = format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = $1");
        sqlx::query_as::<_, Permission>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_permission_by_slug(&self, slug: &str) -> Result<Option<Permission>, sqlx::Error> {
        let sql = format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE slug = $1");
        sqlx::query_as::<_, Permission>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, sqlx::Error> {
        let sql = format!("SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY slug");
        sqlx::query_as::<_, Permission>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    async fn update_permission(
        &self,
        id: Uuid,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Permission>, sqlx::Error> {
        // COALESCE keeps the stored value for fields the caller left out.
        let sql = format!(
            "UPDATE permissions \
             SET slug = COALESCE($2, slug), \
                 description = COALESCE($3, description), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PERMISSION_COLUMNS}"
        );
        sqlx::query_as::<_, Permission>(&sql)
            .bind(id)
            .bind(slug)
            .bind(description)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_permission(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Associations ---

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT r.id, r.name, r.created_at, r.updated_at \
             FROM roles r \
             JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 \
             ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn permissions_for_role(&self, role_id: Uuid) -> Result<Vec<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.slug, p.description, p.created_at, p.updated_at \
             FROM permissions p \
             JOIN role_permissions rp ON rp.permission_id = p.id \
             WHERE rp.role_id = $1 \
             ORDER BY p.slug",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn attach_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn detach_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn attach_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn detach_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
                .bind(role_id)
                .bind(permission_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
