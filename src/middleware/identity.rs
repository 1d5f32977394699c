use serde::Serialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    models::{Role, User},
    utils::verify_token,
};

/// The authenticated actor, resolved once per request and passed explicitly
/// into every authorization check.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub department: String,
    pub supervisor_id: Option<Uuid>,
    pub role: Role,
}

impl CurrentUser {
    pub fn from_user_and_role(user: User, role: Role) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            department: user.department,
            supervisor_id: user.supervisor_id,
            role,
        }
    }
}

pub async fn get_current_user(cookies: Cookies, db: &Database) -> Option<CurrentUser> {
    // Try to get JWT token from auth_token cookie
    let token = cookies.get("auth_token")?.value().to_string();

    let claims = verify_token(&token).ok()?;
    let user_id = Uuid::parse_str(&claims.sub).ok()?;

    get_user_by_id(db, user_id).await
}

async fn get_user_by_id(db: &Database, user_id: Uuid) -> Option<CurrentUser> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
        .ok()??;

    let role = get_user_role(db, user.id).await;

    Some(CurrentUser::from_user_and_role(user, role))
}

/// Registration seeds a role row, but a missing one still resolves to the
/// least-privileged role rather than failing the request.
pub async fn get_user_role(db: &Database, user_id: Uuid) -> Role {
    let role_name = sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
        .ok()
        .flatten();

    role_name
        .as_deref()
        .and_then(Role::parse)
        .unwrap_or(Role::Employee)
}
