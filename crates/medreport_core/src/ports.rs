//! crates/medreport_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    ChatMessage, NewReport, NewUser, Report, ReportSummary, Sender, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Duplicate(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Persists a new user. Fails with `Duplicate` when the email is taken.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    // --- Report Management ---
    async fn create_report(&self, new_report: NewReport) -> PortResult<Report>;

    /// Loads a report only when it is owned by `user_id`; `NotFound` otherwise.
    async fn get_report_for_user(&self, report_id: Uuid, user_id: Uuid) -> PortResult<Report>;

    /// All reports owned by `user_id`, most recently active first.
    async fn list_reports_for_user(&self, user_id: Uuid) -> PortResult<Vec<ReportSummary>>;

    // --- Chat Log ---
    async fn append_message(
        &self,
        report_id: Uuid,
        sender: Sender,
        message: &str,
    ) -> PortResult<ChatMessage>;

    /// All messages for a report in creation order.
    async fn get_messages_for_report(&self, report_id: Uuid) -> PortResult<Vec<ChatMessage>>;
}

#[async_trait]
pub trait TextExtractionService: Send + Sync {
    /// Extracts plain text from a PDF byte stream.
    async fn extract_text(&self, data: &[u8]) -> PortResult<String>;
}

#[async_trait]
pub trait AnswerGenerationService: Send + Sync {
    /// Produces a natural-language answer for a prompt assembled from the
    /// user's question and the report context.
    async fn generate_answer(&self, prompt: &str) -> PortResult<String>;
}
