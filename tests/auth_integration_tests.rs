use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use iam_portal::{
    AppState,
    auth::{self, AuthUser, Claims},
    config::{AppConfig, Env},
    error::ApiError,
    models::{Permission, Role, User},
    repository::Repository,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use uuid::Uuid;

// --- Mock Repository for Auth Logic ---

// Only get_user matters to the extractor; everything else answers with
// empty defaults so the trait compiles.
#[derive(Default)]
struct MockAuthRepo {
    user_to_return: Option<User>,
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn get_user(&self, _id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }

    async fn create_user(
        &self,
        _username: &str,
        _password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        Ok(User::default())
    }
    async fn get_user_by_username(&self, _username: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        Ok(vec![])
    }
    async fn update_username(
        &self,
        _id: Uuid,
        _username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        Ok(None)
    }
    async fn update_password(
        &self,
        _id: Uuid,
        _password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
    async fn delete_user(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn create_role(&self, _name: &str) -> Result<Role, sqlx::Error> {
        Ok(Role::default())
    }
    async fn get_role(&self, _id: Uuid) -> Result<Option<Role>, sqlx::Error> {
        Ok(None)
    }
    async fn get_role_by_name(&self, _name: &str) -> Result<Option<Role>, sqlx::Error> {
        Ok(None)
    }
    async fn list_roles(&self) -> Result<Vec<Role>, sqlx::Error> {
        Ok(vec![])
    }
    async fn rename_role(&self, _id: Uuid, _name: &str) -> Result<Option<Role>, sqlx::Error> {
        Ok(None)
    }
    async fn delete_role(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn create_permission(
        &self,
        _slug: &str,
        _description: Option<&str>,
    ) -> Result<Permission, sqlx::Error> {
        Ok(Permission::default())
    }
    async fn get_permission(&self, _id: Uuid) -> Result<Option<Permission>, sqlx::Error> {
        Ok(None)
    }
    async fn get_permission_by_slug(
        &self,
        _slug: &str,
    ) -> Result<Option<Permission>, sqlx::Error> {
        Ok(None)
    }
    async fn list_permissions(&self) -> Result<Vec<Permission>, sqlx::Error> {
        Ok(vec![])
    }
    async fn update_permission(
        &self,
        _id: Uuid,
        _slug: Option<&str>,
        _description: Option<&str>,
    ) -> Result<Option<Permission>, sqlx::Error> {
        Ok(None)
    }
    async fn delete_permission(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn roles_for_user(&self, _user_id: Uuid) -> Result<Vec<Role>, sqlx::Error> {
        Ok(vec![])
    }
    async fn permissions_for_role(&self, _role_id: Uuid) -> Result<Vec<Permission>, sqlx::Error> {
        Ok(vec![])
    }
    async fn attach_role(&self, _user_id: Uuid, _role_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
    async fn detach_role(&self, _user_id: Uuid, _role_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
    async fn attach_permission(
        &self,
        _role_id: Uuid,
        _permission_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
    async fn detach_permission(
        &self,
        _role_id: Uuid,
        _permission_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
}

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn known_user(id: Uuid) -> User {
    User {
        id,
        username: "alice".to_string(),
        password_hash: "unused".to_string(),
        ..User::default()
    }
}

/// Signs a token whose expiry sits `exp_offset` seconds from now (negative
/// for already-expired tokens).
fn create_token(user_id: Uuid, exp_offset: i64, secret: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(env: Env, repo: MockAuthRepo, jwt_secret: String) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = jwt_secret;

    AppState {
        repo: Arc::new(repo),
        config,
    }
}

/// Builds the mutable Parts struct the extractor operates on.
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(known_user(TEST_USER_ID)),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    let user = auth_user.expect("valid token should authenticate");
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.username, "alice");
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MissingToken));
}

#[tokio::test]
async fn test_auth_failure_without_bearer_prefix() {
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Token abc123"),
    );

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedToken));
}

#[tokio::test]
async fn test_auth_failure_with_unparseable_token() {
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, "not-a-jwt-at-all");

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedToken));
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    // Two minutes past expiry, beyond the validator's default leeway.
    let token = create_token(TEST_USER_ID, -120, TEST_JWT_SECRET);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(known_user(TEST_USER_ID)),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidToken));
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let token = create_token(TEST_USER_ID, 3600, "some-other-secret-entirely");

    let mock_repo = MockAuthRepo {
        user_to_return: Some(known_user(TEST_USER_ID)),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidToken));
}

#[tokio::test]
async fn test_auth_failure_when_subject_no_longer_exists() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);

    // Valid signature, but the store has no such user anymore.
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UnknownUser));
}

#[tokio::test]
async fn test_local_bypass_success() {
    let mock_user_id = Uuid::new_v4();
    let mock_repo = MockAuthRepo {
        user_to_return: Some(known_user(mock_user_id)),
    };
    let app_state = create_app_state(Env::Local, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    let user = auth_user.expect("local bypass should authenticate a known user");
    assert_eq!(user.id, mock_user_id);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let mock_user_id = Uuid::new_v4();
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    // Only the bypass header; production must ignore it and demand a token.
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MissingToken));
}

// --- Token Issuance Tests ---

#[tokio::test]
async fn test_issued_token_round_trips_subject_and_ttl() {
    let user_id = Uuid::new_v4();
    let token = auth::issue_token(user_id, TEST_JWT_SECRET, 3600).unwrap();

    let mut validation = Validation::default();
    validation.validate_exp = true;

    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        &validation,
    )
    .expect("freshly issued token should decode");

    assert_eq!(data.claims.sub, user_id);
    assert_eq!(data.claims.exp - data.claims.iat, 3600);
}

#[tokio::test]
async fn test_password_hash_round_trip() {
    let hash = auth::hash_password("hunter2").unwrap();

    // Salted: same input, different hash each time.
    assert_ne!(hash, auth::hash_password("hunter2").unwrap());

    assert!(auth::verify_password("hunter2", &hash).unwrap());
    assert!(!auth::verify_password("wrong", &hash).unwrap());
}
