use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use endpage_store::StoreError;
use endpage_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use endpage_types::models::User;

use crate::AppState;
use crate::error::ApiError;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username is required".into()));
    }
    if req.password.trim().is_empty() {
        return Err(ApiError::BadRequest("password is required".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        username: req.username,
        password: hash_password(&req.password)?,
        created_at: chrono::Utc::now(),
    };

    let user = state.users.insert(user).await.map_err(|e| match e {
        StoreError::Conflict => ApiError::Conflict("username already exists"),
        e => e.into(),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
        }),
    ))
}

/// The same error covers unknown usernames and wrong passwords, so a
/// response never reveals whether an account exists.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(ApiError::Unauthorized("invalid username or password"))?;

    if !verify_password(&req.password, &user.password) {
        return Err(ApiError::Unauthorized("invalid username or password"));
    }

    let token = issue_token(user.id, &user.username, &state.jwt_secret)?;
    Ok(Json(LoginResponse { token }))
}

pub fn hash_password(plaintext: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Tokens carry the user id and username and expire after one hour.
pub fn issue_token(user_id: Uuid, username: &str, secret: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encoding failed: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("invalid or expired token"))
}
