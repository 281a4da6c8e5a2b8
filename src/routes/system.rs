use super::AppState;
use crate::models::{DbTestResponse, HealthResponse};
use actix_web::{web, HttpResponse, Responder};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/db-test", web::get().to(db_test));
}

/// Plain confirmation page for quick browser checks
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body("<h1>NourishLU Backend Running</h1>")
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        service: "nourishlu-backend".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Database connectivity check
///
/// GET /api/db-test
async fn db_test(state: web::Data<AppState>) -> impl Responder {
    match state.postgres.server_time().await {
        Ok(now) => HttpResponse::Ok().json(DbTestResponse {
            connected: true,
            server_time: Some(now),
            error: None,
        }),
        Err(e) => {
            tracing::error!("Database connection error: {}", e);
            HttpResponse::InternalServerError().json(DbTestResponse {
                connected: false,
                server_time: None,
                error: Some(e.to_string()),
            })
        }
    }
}
