use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{is_unique_violation, ApiError};
use crate::middleware::{issue_token, AuthUser};
use crate::models::User;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/signup", post(sign_up))
        .route("/users/signin", post(sign_in))
        .route("/users/profile", put(update_profile))
}

/* ---------- SIGN UP ---------- */

#[derive(Debug, Deserialize, Validate)]
struct SignUpRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    #[validate(email(message = "email must be a valid address"))]
    email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    password: String,
    confirm_password: String,
}

#[derive(Debug, Serialize)]
struct SignUpResponse {
    user_id: i64,
    name: String,
    email: String,
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    if req.password != req.confirm_password {
        return Err(ApiError::Validation("Passwords do not match".to_string()));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {}", e)))?;

    let inserted: Result<(i64,), sqlx::Error> = sqlx::query_as(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING user_id",
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&password_hash)
    .fetch_one(&state.db.pool)
    .await;

    match inserted {
        Ok((user_id,)) => Ok((
            StatusCode::CREATED,
            Json(SignUpResponse {
                user_id,
                name: req.name,
                email: req.email,
            }),
        )),
        Err(e) if is_unique_violation(&e, "users_email_key") => Err(ApiError::Conflict(
            "Email is already registered".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/* ---------- SIGN IN ---------- */

#[derive(Debug, Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct SignInResponse {
    token: String,
    user: User,
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT user_id, name, email, password_hash, role, is_active, created_at
         FROM users
         WHERE email = $1 AND is_active = TRUE",
    )
    .bind(&req.email)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let verified = bcrypt::verify(&req.password, &user.password_hash).unwrap_or(false);
    if !verified {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    // best effort, login still succeeds if this write fails
    sqlx::query("UPDATE users SET last_logged_in = NOW() WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&state.db.pool)
        .await
        .ok();

    let token = issue_token(&state.config.jwt, user.user_id, &user.email, &user.role)?;

    Ok((StatusCode::OK, Json(SignInResponse { token, user })))
}

/* ---------- PROFILE ---------- */

#[derive(Debug, Deserialize, Validate)]
struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    password: Option<String>,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let password_hash = match &req.password {
        Some(password) => Some(
            bcrypt::hash(password, bcrypt::DEFAULT_COST)
                .map_err(|e| ApiError::Internal(format!("failed to hash password: {}", e)))?,
        ),
        None => None,
    };

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users
         SET name = COALESCE($2, name),
             password_hash = COALESCE($3, password_hash)
         WHERE user_id = $1
         RETURNING user_id, name, email, password_hash, role, is_active, created_at",
    )
    .bind(user.user_id)
    .bind(&req.name)
    .bind(&password_hash)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok((StatusCode::OK, Json(updated)))
}
