use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::AppError,
    middleware::get_current_user,
    models::{
        approval_levels_for_amount, authorize, can_view, level_label, over_limit, Action,
        Attachment, Category, Currency, Expense, ExpenseStatus,
    },
    utils::storage,
};

#[derive(Deserialize)]
pub struct ExpenseFilters {
    #[serde(default)]
    status: String,
    #[serde(default)]
    category: String,
}

#[derive(Deserialize)]
pub struct ExpensePayload {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub project: Option<String>,
    pub expense_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

/// Validated draft fields, with the currency resolved so its rate can be
/// snapshotted onto the row.
struct DraftFields {
    amount: Option<Decimal>,
    currency: Currency,
    category: Option<Category>,
}

fn validate_payload(payload: &ExpensePayload) -> Result<DraftFields, AppError> {
    if let Some(amount) = payload.amount {
        if amount < Decimal::ZERO {
            return Err(AppError::Validation(
                "amount must be non-negative".to_string(),
            ));
        }
    }

    let currency = match payload.currency.as_deref() {
        None | Some("") => Currency::Eur,
        Some(code) => Currency::parse(code)
            .ok_or_else(|| AppError::Validation(format!("unknown currency: {}", code)))?,
    };

    let category = match payload.category.as_deref() {
        None | Some("") => None,
        Some(value) => Some(
            Category::parse(value)
                .ok_or_else(|| AppError::Validation(format!("unknown category: {}", value)))?,
        ),
    };

    Ok(DraftFields {
        amount: payload.amount,
        currency,
        category,
    })
}

pub async fn expenses_list(
    State(db): State<Database>,
    cookies: Cookies,
    Query(filters): Query<ExpenseFilters>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let status = ExpenseStatus::parse(&filters.status);
    let category = Category::parse(&filters.category);

    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM expenses WHERE ");
    if user.role.can_view_all() {
        // Approvers see everything except other people's drafts
        qb.push("(user_id = ")
            .push_bind(user.id)
            .push(" OR status <> 'draft')");
    } else {
        qb.push("user_id = ").push_bind(user.id);
    }
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category) = category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    qb.push(" ORDER BY created_at DESC");

    let expenses = qb.build_query_as::<Expense>().fetch_all(&db).await?;

    Ok(Json(expenses))
}

pub async fn create_expense(
    State(db): State<Database>,
    cookies: Cookies,
    Json(payload): Json<ExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let fields = validate_payload(&payload)?;

    let expense = sqlx::query_as::<_, Expense>(
        r#"
        INSERT INTO expenses
            (user_id, amount, currency, exchange_rate, category, description, notes, project, expense_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(fields.amount)
    .bind(fields.currency.code())
    .bind(fields.currency.rate())
    .bind(fields.category.map(Category::as_str))
    .bind(&payload.description)
    .bind(&payload.notes)
    .bind(&payload.project)
    .bind(payload.expense_date)
    .fetch_one(&db)
    .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn expense_detail(
    State(db): State<Database>,
    cookies: Cookies,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let expense = fetch_expense(&db, expense_id).await?;
    if !can_view(user.role, expense.user_id == user.id, expense.lifecycle_status()) {
        return Err(AppError::Forbidden);
    }

    let attachments = sqlx::query_as::<_, Attachment>(
        "SELECT * FROM attachments WHERE expense_id = $1 ORDER BY position",
    )
    .bind(expense_id)
    .fetch_all(&db)
    .await?;

    Ok(Json(json!({
        "expense": expense,
        "attachments": attachments,
    })))
}

pub async fn update_expense(
    State(db): State<Database>,
    cookies: Cookies,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ExpensePayload>,
) -> Result<Json<Expense>, AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let expense = fetch_expense(&db, expense_id).await?;
    authorize(user.role, Action::EditDraft, expense.user_id == user.id)?;
    ensure_draft(expense.lifecycle_status())?;

    let fields = validate_payload(&payload)?;

    // Conditional on status so a concurrent submit cannot be overwritten
    let updated = sqlx::query_as::<_, Expense>(
        r#"
        UPDATE expenses
        SET amount = $1, currency = $2, exchange_rate = $3, category = $4,
            description = $5, notes = $6, project = $7, expense_date = $8,
            updated_at = NOW()
        WHERE id = $9 AND status = 'draft'
        RETURNING *
        "#,
    )
    .bind(fields.amount)
    .bind(fields.currency.code())
    .bind(fields.currency.rate())
    .bind(fields.category.map(Category::as_str))
    .bind(&payload.description)
    .bind(&payload.notes)
    .bind(&payload.project)
    .bind(payload.expense_date)
    .bind(expense_id)
    .fetch_optional(&db)
    .await?
    .ok_or(AppError::AlreadyDecided)?;

    Ok(Json(updated))
}

pub async fn submit_expense(
    State(db): State<Database>,
    cookies: Cookies,
    Path(expense_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let expense = fetch_expense(&db, expense_id).await?;
    authorize(user.role, Action::Submit, expense.user_id == user.id)?;
    ensure_draft(expense.lifecycle_status())?;

    // Read every file out of the request before touching disk or rows
    let mut files: Vec<(String, String, axum::body::Bytes)> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Validation("malformed multipart body".to_string()))?
    {
        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| AppError::Validation("malformed multipart body".to_string()))?;
        if !data.is_empty() {
            files.push((filename, media_type, data));
        }
    }

    let missing = expense.missing_for_submit(files.len());
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let category = expense
        .category
        .as_deref()
        .and_then(Category::parse)
        .ok_or_else(|| AppError::Validation("unknown category".to_string()))?;
    let normalized = expense
        .normalized_amount()
        .ok_or(AppError::MissingFields(vec!["amount"]))?;
    let required_levels = approval_levels_for_amount(normalized);
    let limit_warning = over_limit(category, normalized);

    // Uploads run one at a time; the first failure aborts the submission
    // before the row leaves draft. Already-written files stay behind.
    let base = storage::upload_dir();
    let mut stored = Vec::with_capacity(files.len());
    for (filename, media_type, data) in &files {
        let attachment =
            storage::save_attachment(&base, user.id, filename, media_type, data).await?;
        stored.push(attachment);
    }

    for (position, attachment) in stored.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO attachments (expense_id, filename, storage_path, size_bytes, media_type, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(expense_id)
        .bind(&attachment.filename)
        .bind(&attachment.storage_path)
        .bind(attachment.size_bytes)
        .bind(&attachment.media_type)
        .bind(position as i32)
        .execute(&db)
        .await?;
    }

    let submitted = sqlx::query_as::<_, Expense>(
        r#"
        UPDATE expenses
        SET status = 'pending', submitted_at = NOW(), required_levels = $1, updated_at = NOW()
        WHERE id = $2 AND status = 'draft'
        RETURNING *
        "#,
    )
    .bind(required_levels)
    .bind(expense_id)
    .fetch_optional(&db)
    .await?
    .ok_or(AppError::AlreadyDecided)?;

    // Level 1 resolves to the submitter's supervisor; higher levels are
    // role-routed and carry no named person.
    let supervisor_name: Option<String> = sqlx::query_scalar(
        "SELECT s.full_name FROM users u JOIN users s ON u.supervisor_id = s.id WHERE u.id = $1",
    )
    .bind(user.id)
    .fetch_optional(&db)
    .await?;

    let approval_chain: Vec<Value> = (1..=required_levels)
        .map(|level| {
            json!({
                "level": level,
                "label": level_label(level),
                "assignee": if level == 1 { supervisor_name.clone() } else { None },
            })
        })
        .collect();

    Ok(Json(json!({
        "expense": submitted,
        "required_levels": required_levels,
        "over_limit": limit_warning,
        "approval_chain": approval_chain,
    })))
}

pub async fn approve_expense(
    State(db): State<Database>,
    cookies: Cookies,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<Expense>, AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let expense = fetch_expense(&db, expense_id).await?;
    authorize(user.role, Action::Approve, expense.user_id == user.id)?;
    ensure_pending(expense.lifecycle_status())?;

    // Conditional update: whoever decides first wins, the loser gets 409
    let approved = sqlx::query_as::<_, Expense>(
        r#"
        UPDATE expenses
        SET status = 'approved', approved_by = $1, approved_at = NOW(), updated_at = NOW()
        WHERE id = $2 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(expense_id)
    .fetch_optional(&db)
    .await?
    .ok_or(AppError::AlreadyDecided)?;

    Ok(Json(approved))
}

pub async fn reject_expense(
    State(db): State<Database>,
    cookies: Cookies,
    Path(expense_id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<Expense>, AppError> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(AppError::Unauthorized)?;

    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(AppError::MissingFields(vec!["rejection_reason"]));
    }

    let expense = fetch_expense(&db, expense_id).await?;
    authorize(user.role, Action::Reject, expense.user_id == user.id)?;
    ensure_pending(expense.lifecycle_status())?;

    let rejected = sqlx::query_as::<_, Expense>(
        r#"
        UPDATE expenses
        SET status = 'rejected', rejected_by = $1, rejected_at = NOW(),
            rejection_reason = $2, updated_at = NOW()
        WHERE id = $3 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(reason)
    .bind(expense_id)
    .fetch_optional(&db)
    .await?
    .ok_or(AppError::AlreadyDecided)?;

    Ok(Json(rejected))
}

async fn fetch_expense(db: &Database, expense_id: Uuid) -> Result<Expense, AppError> {
    sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = $1")
        .bind(expense_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)
}

fn ensure_draft(status: ExpenseStatus) -> Result<(), AppError> {
    if status == ExpenseStatus::Draft {
        return Ok(());
    }
    if status.is_terminal() {
        return Err(AppError::AlreadyDecided);
    }
    Err(AppError::Validation(
        "expense is already pending approval".to_string(),
    ))
}

fn ensure_pending(status: ExpenseStatus) -> Result<(), AppError> {
    if status == ExpenseStatus::Pending {
        return Ok(());
    }
    if status.is_terminal() {
        return Err(AppError::AlreadyDecided);
    }
    Err(AppError::Validation(
        "expense has not been submitted".to_string(),
    ))
}
