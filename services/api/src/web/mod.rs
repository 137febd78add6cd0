pub mod auth;
pub mod chat;
pub mod middleware;
pub mod reports;
pub mod state;
pub mod token;

// Re-export the auth middleware to make it easily accessible
// to the binary that will build the web server router.
pub use middleware::require_auth;

use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::signin_handler,
        auth::logout_handler,
        auth::me_handler,
        reports::create_report_handler,
        reports::list_reports_handler,
        chat::send_message_handler,
        chat::history_handler,
    ),
    components(schemas(
        auth::SignupRequest,
        auth::SigninRequest,
        auth::AuthResponse,
        auth::MeResponse,
        auth::LogoutResponse,
        reports::CreateReportResponse,
        reports::ListReportsResponse,
        chat::SendMessageRequest,
        chat::SendMessageResponse,
        chat::HistoryResponse,
    )),
    tags(
        (name = "Medical Report Companion API", description = "Upload medical reports and chat about what they mean.")
    )
)]
pub struct ApiDoc;
