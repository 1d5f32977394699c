use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub department: String,
    pub supervisor_id: Option<Uuid>,
    pub balance: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile plus role, as returned by the team listing join.
#[derive(Debug, Serialize, FromRow)]
pub struct TeamMember {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub department: String,
    pub supervisor_id: Option<Uuid>,
    pub balance: Option<Decimal>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}
