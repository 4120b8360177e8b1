use uuid::Uuid;

use crate::{error::ApiError, repository::RepositoryState};

/// has_permission
///
/// The authorization gate: loads the user's roles and, for each role, its
/// permissions, returning true on the first slug match. A linear
/// O(roles x permissions-per-role) scan with no memoization; role and
/// permission sets are small and rarely change, and every gated request
/// re-reads the store so grants take effect immediately.
pub async fn has_permission(
    repo: &RepositoryState,
    user_id: Uuid,
    permission_slug: &str,
) -> Result<bool, ApiError> {
    let roles = repo.roles_for_user(user_id).await?;

    for role in roles {
        let permissions = repo.permissions_for_role(role.id).await?;
        if permissions.iter().any(|perm| perm.slug == permission_slug) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// require_permission
///
/// Handler-facing wrapper: absence of the permission is not a failure of the
/// gate itself, just a normal `false`, which callers surface as
/// `PermissionDenied` (403).
pub async fn require_permission(
    repo: &RepositoryState,
    user_id: Uuid,
    permission_slug: &str,
) -> Result<(), ApiError> {
    if has_permission(repo, user_id, permission_slug).await? {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied)
    }
}
