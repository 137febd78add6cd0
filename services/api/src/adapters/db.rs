//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medreport_core::domain::{
    ChatMessage, NewReport, NewUser, Report, ReportSummary, ReportType, Sender, User,
    UserCredentials,
};
use medreport_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

// SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct PgAdapter {
    pool: PgPool,
}

impl PgAdapter {
    /// Creates a new `PgAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    phone: String,
    gender: String,
    age: Option<i32>,
    profile_image: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            gender: self.gender,
            age: self.age,
            profile_image: self.profile_image,
            created_at: self.created_at,
        }
    }

    fn to_credentials(self) -> UserCredentials {
        let password_hash = self.password_hash.clone();
        UserCredentials {
            user: self.to_domain(),
            password_hash,
        }
    }
}

#[derive(FromRow)]
struct ReportRecord {
    id: Uuid,
    user_id: Uuid,
    report_type: String,
    title: String,
    description: Option<String>,
    file_url: Option<String>,
    extracted_text: Option<String>,
    created_at: DateTime<Utc>,
}
impl ReportRecord {
    fn to_domain(self) -> PortResult<Report> {
        let report_type = ReportType::from_str(&self.report_type)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Report {
            id: self.id,
            user_id: self.user_id,
            report_type,
            title: self.title,
            description: self.description,
            file_url: self.file_url,
            extracted_text: self.extracted_text,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    report_id: Uuid,
    sender: String,
    message: String,
    created_at: DateTime<Utc>,
}
impl MessageRecord {
    fn to_domain(self) -> PortResult<ChatMessage> {
        let sender =
            Sender::from_str(&self.sender).map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(ChatMessage {
            id: self.id,
            report_id: self.report_id,
            sender,
            message: self.message,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct SummaryRecord {
    id: Uuid,
    user_id: Uuid,
    report_type: String,
    title: String,
    description: Option<String>,
    file_url: Option<String>,
    extracted_text: Option<String>,
    created_at: DateTime<Utc>,
    last_message: Option<String>,
    message_count: i64,
    last_activity: DateTime<Utc>,
}
impl SummaryRecord {
    fn to_domain(self) -> PortResult<ReportSummary> {
        let report = ReportRecord {
            id: self.id,
            user_id: self.user_id,
            report_type: self.report_type,
            title: self.title,
            description: self.description,
            file_url: self.file_url,
            extracted_text: self.extracted_text,
            created_at: self.created_at,
        }
        .to_domain()?;
        Ok(ReportSummary {
            report,
            last_message: self.last_message,
            message_count: self.message_count,
            last_activity: self.last_activity,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for PgAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, phone, gender, age, profile_image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, first_name, last_name, email, password_hash, phone, gender, age, profile_image, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.phone)
        .bind(&new_user.gender)
        .bind(new_user.age)
        .bind(&new_user.profile_image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Duplicate(format!("user with email {} already exists", new_user.email))
            } else {
                PortError::Unexpected(e.to_string())
            }
        })?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, first_name, last_name, email, password_hash, phone, gender, age, profile_image, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("no user with email {}", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_credentials())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, first_name, last_name, email, password_hash, phone, gender, age, profile_image, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn create_report(&self, new_report: NewReport) -> PortResult<Report> {
        let record = sqlx::query_as::<_, ReportRecord>(
            "INSERT INTO reports (id, user_id, report_type, title, description, file_url, extracted_text) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, report_type, title, description, file_url, extracted_text, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(new_report.user_id)
        .bind(new_report.report_type.as_str())
        .bind(&new_report.title)
        .bind(&new_report.description)
        .bind(&new_report.file_url)
        .bind(&new_report.extracted_text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        record.to_domain()
    }

    async fn get_report_for_user(&self, report_id: Uuid, user_id: Uuid) -> PortResult<Report> {
        let record = sqlx::query_as::<_, ReportRecord>(
            "SELECT id, user_id, report_type, title, description, file_url, extracted_text, created_at \
             FROM reports WHERE id = $1 AND user_id = $2",
        )
        .bind(report_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Report {} not found", report_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        record.to_domain()
    }

    async fn list_reports_for_user(&self, user_id: Uuid) -> PortResult<Vec<ReportSummary>> {
        let records = sqlx::query_as::<_, SummaryRecord>(
            "SELECT r.id, r.user_id, r.report_type, r.title, r.description, r.file_url, \
                    r.extracted_text, r.created_at, \
                    (SELECT m.message FROM chat_messages m WHERE m.report_id = r.id \
                     ORDER BY m.created_at DESC LIMIT 1) AS last_message, \
                    (SELECT COUNT(*) FROM chat_messages m WHERE m.report_id = r.id) AS message_count, \
                    COALESCE((SELECT MAX(m.created_at) FROM chat_messages m WHERE m.report_id = r.id), \
                             r.created_at) AS last_activity \
             FROM reports r \
             WHERE r.user_id = $1 \
             ORDER BY last_activity DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn append_message(
        &self,
        report_id: Uuid,
        sender: Sender,
        message: &str,
    ) -> PortResult<ChatMessage> {
        // Timestamps are generated here rather than by a column default so that
        // consecutive appends within one request are strictly increasing.
        let record = sqlx::query_as::<_, MessageRecord>(
            "INSERT INTO chat_messages (id, report_id, sender, message, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, report_id, sender, message, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(report_id)
        .bind(sender.as_str())
        .bind(message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        record.to_domain()
    }

    async fn get_messages_for_report(&self, report_id: Uuid) -> PortResult<Vec<ChatMessage>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            "SELECT id, report_id, sender, message, created_at \
             FROM chat_messages WHERE report_id = $1 ORDER BY created_at ASC",
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }
}
