//! crates/medreport_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of medical document a report holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    BloodTest,
    UrineTest,
    Mri,
    Xray,
    Other,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::BloodTest => "blood_test",
            ReportType::UrineTest => "urine_test",
            ReportType::Mri => "mri",
            ReportType::Xray => "xray",
            ReportType::Other => "other",
        }
    }

    /// Human-readable form used in chat copy ("blood test" rather than "blood_test").
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown report type: {0}")]
pub struct UnknownReportType(pub String);

impl std::str::FromStr for ReportType {
    type Err = UnknownReportType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blood_test" => Ok(ReportType::BloodTest),
            "urine_test" => Ok(ReportType::UrineTest),
            "mri" => Ok(ReportType::Mri),
            "xray" => Ok(ReportType::Xray),
            "other" => Ok(ReportType::Other),
            other => Err(UnknownReportType(other.to_string())),
        }
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sender tag: {0}")]
pub struct UnknownSender(pub String);

impl std::str::FromStr for Sender {
    type Err = UnknownSender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "assistant" => Ok(Sender::Assistant),
            other => Err(UnknownSender(other.to_string())),
        }
    }
}

/// A user profile as exposed to the rest of the application.
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub age: Option<i32>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Payload for creating a user. The password is hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub gender: String,
    pub age: Option<i32>,
    pub profile_image: Option<String>,
}

/// Represents one uploaded medical report. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_type: ReportType,
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub extracted_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_id: Uuid,
    pub report_type: ReportType,
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub extracted_text: Option<String>,
}

/// A single turn in a report's conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub report_id: Uuid,
    pub sender: Sender,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// One entry in the dashboard listing: a report annotated with its latest
/// chat activity.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub report: Report,
    pub last_message: Option<String>,
    pub message_count: i64,
    pub last_activity: DateTime<Utc>,
}
