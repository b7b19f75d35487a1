use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::auth::{hash_password, verify_password};
use crate::error::AppError;
use crate::models::{LoginRequest, SignupRequest, TokenOut, User, UserOut};
use crate::AppState;

const DUPLICATE_USER: &str = "username or email already exists";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::BadRequest)?;

    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    let existing: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ? OR email = ?")
            .bind(&username)
            .bind(&email)
            .fetch_one(&state.db)
            .await?;
    if existing.0 > 0 {
        return Err(AppError::bad_request(DUPLICATE_USER));
    }

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
    let user = User::new(username, email, password_hash, payload.role);

    let inserted = sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.created_at)
    .execute(&state.db)
    .await;

    match inserted {
        Ok(_) => {}
        // Lost a race with a concurrent signup for the same name.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::bad_request(DUPLICATE_USER));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(username = %user.username, role = %user.role, "user signed up");

    Ok((StatusCode::CREATED, Json(UserOut::from(&user))))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenOut>, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(payload.username.trim())
        .fetch_optional(&state.db)
        .await?;

    let verified = match user {
        Some(user) => {
            let password = payload.password.clone();
            let hash = user.password_hash.clone();
            let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;
            ok.then_some(user)
        }
        None => None,
    };

    let Some(user) = verified else {
        tracing::info!(username = %payload.username, "failed login");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    let token = state.tokens.issue(&user.id)?;
    tracing::info!(username = %user.username, "user logged in");

    Ok(Json(TokenOut::bearer(token)))
}
