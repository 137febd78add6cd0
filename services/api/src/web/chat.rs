//! services/api/src/web/chat.rs
//!
//! The conversational endpoints: append a question to a report's chat log and
//! relay it, with report context, to the answer generator.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use medreport_core::domain::{ChatMessage, Report, Sender, User};
use medreport_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub report_id: Uuid,
    pub message: String,
}

/// The two messages appended by a send: the user's question, then the
/// assistant's answer.
#[derive(Serialize, ToSchema)]
pub struct SendMessageResponse {
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatMessage>,
    #[schema(value_type = Object)]
    pub report: Report,
}

//=========================================================================================
// Prompt Assembly
//=========================================================================================

fn has_extracted_text(report: &Report) -> bool {
    report
        .extracted_text
        .as_deref()
        .is_some_and(|t| !t.is_empty())
}

/// Builds the context handed to the answer generator: the literal question,
/// the report metadata, and the full extracted text when present.
fn build_context_prompt(question: &str, report: &Report) -> String {
    let mut prompt = format!(
        "User's question: \"{}\"\n\nReport Type: {}\nReport Title: {}",
        question,
        report.report_type.label(),
        report.title
    );

    if let Some(description) = &report.description {
        prompt.push_str(&format!("\nReport Description: {}", description));
    }

    if has_extracted_text(report) {
        prompt.push_str(&format!(
            "\n\nMedical Report Content:\n{}",
            report.extracted_text.as_deref().unwrap_or_default()
        ));
        prompt.push_str(
            "\n\nPlease analyze the above medical report content and answer the user's \
             question. Reference specific values, findings, or sections from the report when \
             relevant. Explain medical terms in simple language and provide context about what \
             the results might mean.",
        );
    } else {
        prompt.push_str(&format!(
            "\n\nNote: No specific report content was provided. Please provide general guidance \
             about {} reports and encourage the user to share specific values or findings for \
             more detailed analysis.",
            report.report_type.label()
        ));
    }

    prompt.push_str(
        "\n\nImportant: Always remind the user that this analysis is for educational purposes \
         only and they should discuss their results with their healthcare provider for proper \
         medical interpretation and advice.",
    );

    prompt
}

/// The canned reply used whenever the answer service is unreachable or errors.
/// Conversations must never dead-end on a transient outage.
fn fallback_answer(has_extracted_text: bool) -> String {
    if has_extracted_text {
        "I apologize, but I'm having trouble accessing the AI service right now. However, I can \
         see that you've uploaded a medical report. Could you please ask me a specific question \
         about your results, and I'll do my best to help you understand them? Remember, this is \
         for educational purposes only, and you should always consult your healthcare provider \
         for medical advice."
            .to_string()
    } else {
        "I apologize, but I'm having trouble accessing the AI service right now. Could you \
         please share some specific details from your medical report so I can try to help you \
         understand them? Remember, this is for educational purposes only, and you should \
         always consult your healthcare provider for medical advice."
            .to_string()
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /chat/messages - Append a question and relay it to the answer generator
#[utoipa::path(
    post,
    path = "/chat/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "The appended user and assistant messages", body = SendMessageResponse),
        (status = 400, description = "Empty message"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Report not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message must not be empty".to_string()));
    }

    // 1. The report must exist and belong to the caller
    let report = load_owned_report(&state, req.report_id, user.id).await?;

    // 2. Persist the user's message
    let user_message = state
        .db
        .append_message(report.id, Sender::User, &req.message)
        .await
        .map_err(|e| {
            error!("Failed to save user message: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save message".to_string(),
            )
        })?;

    // 3. Relay to the answer generator; a failure becomes the canned apology
    let prompt = build_context_prompt(&req.message, &report);
    let answer = match state.answerer.generate_answer(&prompt).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Answer generation failed, using fallback: {:?}", e);
            fallback_answer(has_extracted_text(&report))
        }
    };

    // 4. Persist the assistant's reply
    let assistant_message = state
        .db
        .append_message(report.id, Sender::Assistant, &answer)
        .await
        .map_err(|e| {
            error!("Failed to save assistant message: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save message".to_string(),
            )
        })?;

    Ok(Json(SendMessageResponse {
        messages: vec![user_message, assistant_message],
    }))
}

/// GET /chat/history/{report_id} - Full conversation for one report
#[utoipa::path(
    get,
    path = "/chat/history/{report_id}",
    params(
        ("report_id" = Uuid, Path, description = "The report whose history to fetch")
    ),
    responses(
        (status = 200, description = "All messages in creation order plus the report", body = HistoryResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Report not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(report_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let report = load_owned_report(&state, report_id, user.id).await?;

    let messages = state
        .db
        .get_messages_for_report(report.id)
        .await
        .map_err(|e| {
            error!("Failed to load chat history: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load chat history".to_string(),
            )
        })?;

    Ok(Json(HistoryResponse { messages, report }))
}

/// Ownership gate shared by every chat operation: a report must never be
/// readable or writable by a non-owner.
async fn load_owned_report(
    state: &AppState,
    report_id: Uuid,
    user_id: Uuid,
) -> Result<Report, (StatusCode, String)> {
    state
        .db
        .get_report_for_user(report_id, user_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Report not found".to_string()),
            other => {
                error!("Failed to load report: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load report".to_string(),
                )
            }
        })
}
