use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::AppError,
    middleware::{get_current_user, CurrentUser},
    models::{authorize, Action, Role, TeamMember},
};

#[derive(Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Deserialize)]
pub struct SetSupervisorRequest {
    pub supervisor_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct SetBalanceRequest {
    pub balance: Decimal,
}

pub async fn team_list(
    State(db): State<Database>,
    cookies: Cookies,
) -> Result<Json<Vec<TeamMember>>, AppError> {
    require_manager(cookies, &db).await?;

    let members = sqlx::query_as::<_, TeamMember>(
        r#"
        SELECT u.id, u.email, u.full_name, u.department, u.supervisor_id, u.balance,
               COALESCE(r.role, 'employee') AS role, u.created_at
        FROM users u
        LEFT JOIN user_roles r ON r.user_id = u.id
        ORDER BY u.full_name
        "#,
    )
    .fetch_all(&db)
    .await?;

    Ok(Json(members))
}

pub async fn set_role(
    State(db): State<Database>,
    cookies: Cookies,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_manager(cookies, &db).await?;
    if actor.id == user_id {
        // Nobody promotes themselves
        return Err(AppError::Forbidden);
    }

    let role = Role::parse(&body.role)
        .ok_or_else(|| AppError::Validation(format!("unknown role: {}", body.role)))?;

    ensure_user_exists(&db, user_id).await?;

    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role, assigned_by)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id)
        DO UPDATE SET role = EXCLUDED.role, assigned_at = NOW(), assigned_by = EXCLUDED.assigned_by
        "#,
    )
    .bind(user_id)
    .bind(role.as_str())
    .bind(actor.id)
    .execute(&db)
    .await?;

    Ok(Json(json!({ "user_id": user_id, "role": role })))
}

pub async fn set_supervisor(
    State(db): State<Database>,
    cookies: Cookies,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SetSupervisorRequest>,
) -> Result<Json<Value>, AppError> {
    require_manager(cookies, &db).await?;

    if body.supervisor_id == Some(user_id) {
        return Err(AppError::Validation(
            "a user cannot be their own supervisor".to_string(),
        ));
    }

    ensure_user_exists(&db, user_id).await?;

    if let Some(supervisor_id) = body.supervisor_id {
        // The supervisor link must point at someone who can actually approve
        let role_name = sqlx::query_scalar::<_, String>(
            "SELECT COALESCE(r.role, 'employee') FROM users u LEFT JOIN user_roles r ON r.user_id = u.id WHERE u.id = $1",
        )
        .bind(supervisor_id)
        .fetch_optional(&db)
        .await?
        .ok_or(AppError::NotFound)?;

        let supervisor_role = Role::parse(&role_name).unwrap_or(Role::Employee);
        if !matches!(supervisor_role, Role::Supervisor | Role::Admin) {
            return Err(AppError::Validation(
                "supervisor must hold the supervisor or admin role".to_string(),
            ));
        }
    }

    sqlx::query("UPDATE users SET supervisor_id = $1, updated_at = NOW() WHERE id = $2")
        .bind(body.supervisor_id)
        .bind(user_id)
        .execute(&db)
        .await?;

    Ok(Json(json!({
        "user_id": user_id,
        "supervisor_id": body.supervisor_id,
    })))
}

pub async fn set_balance(
    State(db): State<Database>,
    cookies: Cookies,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SetBalanceRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_manager(cookies, &db).await?;
    if actor.id == user_id {
        return Err(AppError::Forbidden);
    }

    ensure_user_exists(&db, user_id).await?;

    sqlx::query("UPDATE users SET balance = $1, updated_at = NOW() WHERE id = $2")
        .bind(body.balance)
        .bind(user_id)
        .execute(&db)
        .await?;

    Ok(Json(json!({ "user_id": user_id, "balance": body.balance })))
}

async fn require_manager(cookies: Cookies, db: &Database) -> Result<CurrentUser, AppError> {
    let user = get_current_user(cookies, db)
        .await
        .ok_or(AppError::Unauthorized)?;
    authorize(user.role, Action::ManageTeam, false)?;
    Ok(user)
}

async fn ensure_user_exists(db: &Database, user_id: Uuid) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
