use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use nourish_lu::config::{LoggingSettings, Settings};
use nourish_lu::core::{FallbackOrchestrator, MealMatcher, OrchestratorConfig};
use nourish_lu::routes::{self, AppState};
use nourish_lu::services::{CompletionClient, GenerationParams, PostgresClient};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for malformed payloads and query strings
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// RUST_LOG wins over the configured level when set
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn io_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match std::env::var("NOURISH_CONFIG") {
        Ok(path) => Settings::load_from(path),
        Err(_) => Settings::load(),
    }
    .map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io_error("Configuration error", e)
    })?;

    init_tracing(&settings.logging);

    info!("Starting NourishLU backend...");

    // Initialize PostgreSQL client
    let postgres = Arc::new(PostgresClient::from_settings(&settings.database).await.map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        io_error("PostgreSQL connection error", e)
    })?);

    info!(
        "PostgreSQL client initialized (max: {} connections)",
        settings.database.max_connections
    );

    let matcher = MealMatcher::new(postgres.clone(), settings.matching.limit);

    info!("Meal matcher initialized (limit: {})", matcher.limit());

    // Initialize completion client and model chain
    let llm = &settings.llm;
    let params = GenerationParams::bounded(llm.temperature, llm.max_tokens);
    let completion = CompletionClient::new(
        llm.api_url.clone(),
        llm.api_key.clone(),
        params,
        llm.request_timeout(),
    )
    .map_err(|e| {
        error!("Failed to build completion client: {}", e);
        io_error("Completion client error", e)
    })?;

    if llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        warn!("No chat API key configured, /api/chat will reject requests");
    }

    let orchestrator = Arc::new(FallbackOrchestrator::new(
        Arc::new(completion),
        postgres.clone(),
        OrchestratorConfig {
            primary_model: llm.default_model.clone(),
            fallback_models: llm.fallback_models.clone(),
            trigger: llm.fallback_trigger,
            system_prompt: llm.system_prompt().to_string(),
            grounding_sample_size: llm.grounding_sample_size,
            attempt_timeout: llm.attempt_timeout(),
        },
    ));

    info!(
        "Chat initialized with model {} and fallbacks {:?} ({:?} trigger)",
        llm.default_model, llm.fallback_models, llm.fallback_trigger
    );

    // Build application state
    let app_state = AppState {
        postgres,
        matcher,
        orchestrator,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
