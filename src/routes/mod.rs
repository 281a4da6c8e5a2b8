// Route exports
pub mod chat;
pub mod meals;
pub mod system;

use crate::core::{FallbackOrchestrator, MealMatcher};
use crate::models::ErrorResponse;
use crate::services::PostgresClient;
use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub matcher: MealMatcher,
    pub orchestrator: Arc<FallbackOrchestrator>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(system::index)).service(
        web::scope("/api")
            .configure(system::configure)
            .configure(meals::configure)
            .configure(chat::configure),
    );
}

pub(crate) fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.into(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}
