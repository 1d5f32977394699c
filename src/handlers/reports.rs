use axum::{extract::State, Json};
use tower_cookies::Cookies;

use crate::{
    database::Database,
    error::AppError,
    middleware::get_current_user,
    models::{Expense, ExpenseSummary},
};

/// Per-status and per-category totals over the caller's visible expenses.
/// Recomputed from the fetched set on every call.
pub async fn summary(
    State(db): State<Database>,
    cookies: Cookies,
) -> Result<Json<ExpenseSummary>, AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let expenses = if user.role.can_view_all() {
        sqlx::query_as::<_, Expense>(
            "SELECT * FROM expenses WHERE user_id = $1 OR status <> 'draft'",
        )
        .bind(user.id)
        .fetch_all(&db)
        .await?
    } else {
        sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE user_id = $1")
            .bind(user.id)
            .fetch_all(&db)
            .await?
    };

    Ok(Json(ExpenseSummary::from_expenses(&expenses)))
}
