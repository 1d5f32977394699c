use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    database::Database,
    error::AppError,
    models::User,
    utils::{create_token, hash_password, verify_password},
};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub department: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(db): State<Database>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let mut missing = Vec::new();
    if body.email.trim().is_empty() {
        missing.push("email");
    }
    if body.password.is_empty() {
        missing.push("password");
    }
    if body.full_name.trim().is_empty() {
        missing.push("full_name");
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }
    if !body.email.contains('@') {
        return Err(AppError::Validation("email is not valid".to_string()));
    }
    if body.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = hash_password(&body.password)
        .map_err(|_| AppError::Validation("failed to process password".to_string()))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, full_name, department)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(body.email.trim())
    .bind(&password_hash)
    .bind(body.full_name.trim())
    .bind(body.department.trim())
    .fetch_one(&db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Validation("email already registered".to_string())
        }
        other => AppError::Database(other),
    })?;

    // Every account starts as an employee; roles are changed in settings.
    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, 'employee')")
        .bind(user.id)
        .execute(&db)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(db): State<Database>,
    cookies: Cookies,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let user = authenticate_user(&db, &body.email, &body.password)
        .await
        .ok_or(AppError::Unauthorized)?;

    let token = create_token(user.id, user.email.clone())?;

    // Session record for bookkeeping alongside the stateless token
    let session_id = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(24);
    sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(session_id)
        .bind(user.id)
        .bind(expires_at)
        .execute(&db)
        .await?;

    let cookie = Cookie::build(("auth_token", token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(24))
        .build();
    cookies.add(cookie);

    Ok(Json(json!({
        "id": user.id,
        "email": user.email,
        "full_name": user.full_name,
        "department": user.department,
    })))
}

pub async fn logout(cookies: Cookies) -> Json<Value> {
    cookies.remove(Cookie::from("auth_token"));
    Json(json!({ "ok": true }))
}

async fn authenticate_user(db: &Database, email: &str, password: &str) -> Option<User> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await
        .ok()??;

    if verify_password(password, &user.password_hash).unwrap_or(false) {
        Some(user)
    } else {
        None
    }
}
