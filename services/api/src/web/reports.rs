//! services/api/src/web/reports.rs
//!
//! Report creation (multipart upload) and the dashboard listing.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use medreport_core::domain::{ChatMessage, NewReport, Report, ReportSummary, ReportType, Sender, User};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

const EXTRACTION_FAILED: &str =
    "Failed to extract text from PDF. Please ensure the PDF contains readable text.";

//=========================================================================================
// API Response Structs
//=========================================================================================

/// The response payload sent after successfully creating a report.
#[derive(Serialize, ToSchema)]
pub struct CreateReportResponse {
    #[schema(value_type = Object)]
    pub report: Report,
    #[schema(value_type = Object)]
    pub message: ChatMessage,
}

/// The caller's reports, each annotated with its latest chat activity.
#[derive(Serialize, ToSchema)]
pub struct ListReportsResponse {
    #[schema(value_type = Vec<Object>)]
    pub reports: Vec<ReportSummary>,
}

//=========================================================================================
// Welcome Message
//=========================================================================================

/// The assistant-authored message that seeds every report's conversation.
fn welcome_message(report_type: ReportType, has_extracted_text: bool) -> String {
    if has_extracted_text {
        format!(
            "Hello! I've received and analyzed your {} report. I've extracted the text content \
             from your PDF and I'm ready to help you understand your medical results. What \
             specific aspects would you like me to explain?",
            report_type.label()
        )
    } else {
        format!(
            "Hello! I've received your {} report information. I'm here to help you understand \
             your medical results. What would you like to know about your report?",
            report_type.label()
        )
    }
}

//=========================================================================================
// Upload Helpers
//=========================================================================================

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

impl UploadedFile {
    fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some("application/pdf")
            || self.file_name.to_lowercase().ends_with(".pdf")
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a new report, optionally uploading a file.
///
/// Accepts multipart/form-data with `reportType`, `title`, optional
/// `description`, and an optional `file` part. A PDF upload goes through text
/// extraction; a PDF with no recoverable text blocks creation.
#[utoipa::path(
    post,
    path = "/reports",
    request_body(content_type = "multipart/form-data", description = "Report fields plus an optional file."),
    responses(
        (status = 201, description = "Report created successfully", body = CreateReportResponse),
        (status = 400, description = "Invalid input or text extraction failed"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Collect the multipart fields
    let mut report_type_raw: Option<String> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "reportType" => {
                report_type_raw = Some(field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Invalid reportType field: {}", e))
                })?);
            }
            "title" => {
                title = Some(field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Invalid title field: {}", e))
                })?);
            }
            "description" => {
                description = Some(field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Invalid description field: {}", e))
                })?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    // 2. Validate
    let report_type_raw = report_type_raw
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "reportType is required".to_string()))?;
    let report_type = ReportType::from_str(report_type_raw.trim()).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid report type: {}", report_type_raw),
        )
    })?;

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "title is required".to_string()))?;

    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    // 3. Extract text before anything is persisted; a failure aborts creation
    let extracted_text = match &file {
        Some(upload) if upload.is_pdf() => {
            let text = state
                .extractor
                .extract_text(&upload.data)
                .await
                .map_err(|_| (StatusCode::BAD_REQUEST, EXTRACTION_FAILED.to_string()))?;
            Some(text)
        }
        _ => None,
    };

    // 4. Store the uploaded file
    let file_url = match &file {
        Some(upload) => {
            let stored_name = format!(
                "{}-{}",
                Uuid::new_v4(),
                sanitize_file_name(&upload.file_name)
            );
            let dir = &state.config.upload_dir;
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                error!("Failed to create upload directory: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store file".to_string(),
                )
            })?;
            tokio::fs::write(dir.join(&stored_name), &upload.data)
                .await
                .map_err(|e| {
                    error!("Failed to store uploaded file: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to store file".to_string(),
                    )
                })?;
            Some(stored_name)
        }
        None => None,
    };

    // 5. Persist the report
    let has_extracted_text = extracted_text.is_some();
    let report = state
        .db
        .create_report(NewReport {
            user_id: user.id,
            report_type,
            title,
            description,
            file_url,
            extracted_text,
        })
        .await
        .map_err(|e| {
            error!("Failed to create report: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create report".to_string(),
            )
        })?;

    // 6. Seed the conversation with the assistant welcome message
    let welcome = welcome_message(report.report_type, has_extracted_text);
    let message = state
        .db
        .append_message(report.id, Sender::Assistant, &welcome)
        .await
        .map_err(|e| {
            error!("Failed to create welcome message: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create welcome message".to_string(),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateReportResponse { report, message }),
    ))
}

/// List the caller's reports, most recently active first.
#[utoipa::path(
    get,
    path = "/reports",
    responses(
        (status = 200, description = "The caller's reports", body = ListReportsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_reports_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let reports = state.db.list_reports_for_user(user.id).await.map_err(|e| {
        error!("Failed to list reports: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list reports".to_string(),
        )
    })?;

    Ok(Json(ListReportsResponse { reports }))
}
