use axum::{extract::State, Json};
use serde_json::{json, Value};
use tower_cookies::Cookies;

use crate::{
    database::Database,
    error::AppError,
    middleware::get_current_user,
    models::{Expense, ExpenseSummary},
};

pub async fn dashboard(
    State(db): State<Database>,
    cookies: Cookies,
) -> Result<Json<Value>, AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let own = sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE user_id = $1")
        .bind(user.id)
        .fetch_all(&db)
        .await?;
    let mine = ExpenseSummary::from_expenses(&own);

    let pending_approvals = if user.role.can_approve() {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM expenses WHERE status = 'pending' AND user_id <> $1",
        )
        .bind(user.id)
        .fetch_one(&db)
        .await
        .unwrap_or(0);
        Some(count)
    } else {
        None
    };

    let team_member_count = if user.role.can_manage_team() {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&db)
            .await
            .unwrap_or(0);
        Some(count)
    } else {
        None
    };

    Ok(Json(json!({
        "full_name": user.full_name,
        "role": user.role,
        "mine": mine,
        "pending_approvals": pending_approvals,
        "team_member_count": team_member_count,
    })))
}
