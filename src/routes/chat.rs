use super::AppState;
use crate::core::{ChatError, ChatOutcome, FallbackOrchestrator};
use crate::models::{ChatErrorResponse, ChatRequest, ChatResponse};
use actix_web::{web, HttpResponse, Responder};
use tracing::Instrument;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat", web::post().to(chat));
}

/// Campus dining assistant
///
/// POST /api/chat
///
/// Request body:
/// ```json
/// {
///   "message": "What is a good high protein lunch?",
///   "history": [{"role": "user", "content": "..."}]
/// }
/// ```
async fn chat(state: web::Data<AppState>, req: web::Json<ChatRequest>) -> impl Responder {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);

    let req = req.into_inner();

    chat_response(answer(&state.orchestrator, &req).instrument(span).await)
}

/// Run the chat flow; a missing or non-string `message` is rejected up front
pub(crate) async fn answer(
    orchestrator: &FallbackOrchestrator,
    req: &ChatRequest,
) -> Result<ChatOutcome, ChatError> {
    let Some(message) = req.message_text() else {
        return Err(ChatError::MissingMessage);
    };

    orchestrator.answer_question(message, &req.history).await
}

/// Map the chat flow result onto the wire format
pub(crate) fn chat_response(result: Result<ChatOutcome, ChatError>) -> HttpResponse {
    match result {
        Ok(outcome) => HttpResponse::Ok().json(ChatResponse {
            success: true,
            model_used: outcome.model_used,
            reply: outcome.reply,
        }),
        Err(e @ (ChatError::MissingMessage | ChatError::MissingCredential)) => {
            tracing::info!("Rejected chat request: {}", e);
            HttpResponse::BadRequest().json(ChatErrorResponse {
                success: false,
                error: e.to_string(),
            })
        }
        Err(e) => {
            tracing::error!("Chat error: {}", e);
            HttpResponse::InternalServerError().json(ChatErrorResponse {
                success: false,
                error: e.to_string(),
            })
        }
    }
}
