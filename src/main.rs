mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use dotenvy::dotenv;
use std::env;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use database::{create_database_pool, Database};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = create_database_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!()
        .run(&db)
        .await
        .expect("Failed to run migrations");

    let app = create_router(db);

    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);

    log::info!("gastos server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn create_router(db: Database) -> Router {
    Router::new()
        // Public routes (no authentication required)
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        // Expense lifecycle
        .route("/api/expenses", get(handlers::expenses::expenses_list))
        .route("/api/expenses", post(handlers::expenses::create_expense))
        .route("/api/expenses/:id", get(handlers::expenses::expense_detail))
        .route("/api/expenses/:id", put(handlers::expenses::update_expense))
        .route(
            "/api/expenses/:id/submit",
            post(handlers::expenses::submit_expense),
        )
        .route(
            "/api/expenses/:id/approve",
            post(handlers::expenses::approve_expense),
        )
        .route(
            "/api/expenses/:id/reject",
            post(handlers::expenses::reject_expense),
        )
        // Reporting
        .route("/api/reports/summary", get(handlers::reports::summary))
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route("/api/policies", get(handlers::policies::policies))
        // Team management
        .route("/api/team", get(handlers::team::team_list))
        .route("/api/team/:id/role", put(handlers::team::set_role))
        .route(
            "/api/team/:id/supervisor",
            put(handlers::team::set_supervisor),
        )
        .route("/api/team/:id/balance", put(handlers::team::set_balance))
        // Uploaded receipts, read-only
        .nest_service(
            "/static/uploads",
            ServeDir::new(utils::storage::upload_dir()),
        )
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(10 * 1024 * 1024)), // 10MB
        )
        .with_state(db)
}
