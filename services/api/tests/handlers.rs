//! services/api/tests/handlers.rs
//!
//! End-to-end tests for the HTTP surface. The router is the real one; the
//! database, text extraction, and answer generation ports are replaced with
//! in-memory fakes so every scenario is hermetic.

use api_lib::config::Config;
use api_lib::web::{
    auth::{logout_handler, me_handler, signin_handler, signup_handler},
    chat::{history_handler, send_message_handler},
    middleware::require_auth,
    reports::{create_report_handler, list_reports_handler},
    state::AppState,
    token::TokenIssuer,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use medreport_core::domain::{
    ChatMessage, NewReport, NewUser, Report, ReportSummary, Sender, User, UserCredentials,
};
use medreport_core::ports::{
    AnswerGenerationService, DatabaseService, PortError, PortResult, TextExtractionService,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

//=========================================================================================
// In-Memory Fakes
//=========================================================================================

#[derive(Default)]
struct MemoryDb {
    users: Mutex<Vec<(User, String)>>,
    reports: Mutex<Vec<Report>>,
    messages: Mutex<Vec<ChatMessage>>,
    last_message_at: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryDb {
    fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|(u, _)| u.email == new_user.email) {
            return Err(PortError::Duplicate(format!(
                "user with email {} already exists",
                new_user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            phone: new_user.phone,
            gender: new_user.gender,
            age: new_user.age,
            profile_image: new_user.profile_image,
            created_at: Utc::now(),
        };
        users.push((user.clone(), new_user.password_hash));
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                user: u.clone(),
                password_hash: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("no user with email {}", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_report(&self, new_report: NewReport) -> PortResult<Report> {
        let report = Report {
            id: Uuid::new_v4(),
            user_id: new_report.user_id,
            report_type: new_report.report_type,
            title: new_report.title,
            description: new_report.description,
            file_url: new_report.file_url,
            extracted_text: new_report.extracted_text,
            created_at: Utc::now(),
        };
        self.reports.lock().unwrap().push(report.clone());
        Ok(report)
    }

    async fn get_report_for_user(&self, report_id: Uuid, user_id: Uuid) -> PortResult<Report> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == report_id && r.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Report {} not found", report_id)))
    }

    async fn list_reports_for_user(&self, user_id: Uuid) -> PortResult<Vec<ReportSummary>> {
        let reports = self.reports.lock().unwrap();
        let messages = self.messages.lock().unwrap();
        let mut summaries: Vec<ReportSummary> = reports
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| {
                let mut for_report: Vec<&ChatMessage> =
                    messages.iter().filter(|m| m.report_id == r.id).collect();
                for_report.sort_by_key(|m| m.created_at);
                ReportSummary {
                    report: r.clone(),
                    last_message: for_report.last().map(|m| m.message.clone()),
                    message_count: for_report.len() as i64,
                    last_activity: for_report
                        .last()
                        .map(|m| m.created_at)
                        .unwrap_or(r.created_at),
                }
            })
            .collect();
        summaries.sort_by_key(|s| std::cmp::Reverse(s.last_activity));
        Ok(summaries)
    }

    async fn append_message(
        &self,
        report_id: Uuid,
        sender: Sender,
        message: &str,
    ) -> PortResult<ChatMessage> {
        // Keep timestamps strictly increasing even on a coarse clock.
        let mut last_at = self.last_message_at.lock().unwrap();
        let mut now = Utc::now();
        if let Some(last) = *last_at {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        *last_at = Some(now);

        let message = ChatMessage {
            id: Uuid::new_v4(),
            report_id,
            sender,
            message: message.to_string(),
            created_at: now,
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn get_messages_for_report(&self, report_id: Uuid) -> PortResult<Vec<ChatMessage>> {
        let mut messages: Vec<ChatMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.report_id == report_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}

/// Extraction fake: `Some(text)` succeeds, `None` fails like an unreadable PDF.
struct FakeExtractor {
    result: Option<String>,
}

#[async_trait]
impl TextExtractionService for FakeExtractor {
    async fn extract_text(&self, _data: &[u8]) -> PortResult<String> {
        match &self.result {
            Some(text) => Ok(text.clone()),
            None => Err(PortError::Unexpected(
                "No text content extracted from PDF".to_string(),
            )),
        }
    }
}

/// Generation fake: `Some(reply)` answers, `None` simulates a service outage.
struct FakeAnswerer {
    reply: Option<String>,
}

#[async_trait]
impl AnswerGenerationService for FakeAnswerer {
    async fn generate_answer(&self, _prompt: &str) -> PortResult<String> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(PortError::Unexpected("service unreachable".to_string())),
        }
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

struct TestApp {
    router: Router,
    db: Arc<MemoryDb>,
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: tracing::Level::INFO,
        jwt_secret: "test_secret".to_string(),
        token_ttl_days: 7,
        openai_api_key: None,
        chat_model: "test-model".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        upload_dir: std::env::temp_dir().join(format!("medreport-test-{}", Uuid::new_v4())),
        llm_timeout_secs: 1,
        secure_cookies: false,
    }
}

fn build_app(extractor: FakeExtractor, answerer: FakeAnswerer) -> TestApp {
    let config = Arc::new(test_config());
    let db = Arc::new(MemoryDb::default());
    let state = Arc::new(AppState {
        db: db.clone(),
        extractor: Arc::new(extractor),
        answerer: Arc::new(answerer),
        tokens: TokenIssuer::new(&config.jwt_secret, config.token_ttl_days),
        config,
    });

    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/signin", post(signin_handler));

    let protected_routes = Router::new()
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route(
            "/reports",
            get(list_reports_handler).post(create_report_handler),
        )
        .route("/chat/messages", post(send_message_handler))
        .route("/chat/history/{report_id}", get(history_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    TestApp { router, db }
}

fn default_app() -> TestApp {
    build_app(
        FakeExtractor { result: None },
        FakeAnswerer {
            reply: Some("Your results look within the normal range.".to_string()),
        },
    )
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body, set_cookie)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "X-TEST-BOUNDARY-7MA4YWxkTrZu0gW";

fn multipart_request(
    cookie: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/reports")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .unwrap()
}

fn parse_timestamp(message: &Value) -> DateTime<Utc> {
    message["created_at"]
        .as_str()
        .unwrap()
        .parse::<DateTime<Utc>>()
        .unwrap()
}

fn signup_body(email: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": email,
        "password": "pw123456",
        "phone": "01234567890",
        "gender": "female",
        "age": 36
    })
}

/// Signs up a fresh user and returns the session cookie to send back.
async fn signup(app: &TestApp, email: &str) -> String {
    let (status, body, set_cookie) = send(
        app,
        json_request("POST", "/auth/signup", None, signup_body(email)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    let set_cookie = set_cookie.expect("signup must set the session cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie must have a value")
        .to_string()
}

async fn create_report(app: &TestApp, cookie: &str, report_type: &str, title: &str) -> Value {
    let (status, body, _) = send(
        app,
        multipart_request(cookie, &[("reportType", report_type), ("title", title)], None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create report failed: {body}");
    body
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn signup_succeeds_once_then_duplicates_are_rejected() {
    let app = default_app();

    let (status, body, set_cookie) = send(
        &app,
        json_request("POST", "/auth/signup", None, signup_body("a@x.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["token"].is_string());
    let cookie = set_cookie.unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=604800"));

    let (status, body, _) = send(
        &app,
        json_request("POST", "/auth/signup", None, signup_body("a@x.com")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::String("User already exists".to_string()));
}

#[tokio::test]
async fn signup_response_never_carries_the_password_hash() {
    let app = default_app();
    let (_, body, _) = send(
        &app,
        json_request("POST", "/auth/signup", None, signup_body("a@x.com")),
    )
    .await;
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn signup_validates_required_fields() {
    let app = default_app();

    let mut bad_email = signup_body("not-an-email");
    bad_email["email"] = json!("not-an-email");
    let (status, _, _) = send(&app, json_request("POST", "/auth/signup", None, bad_email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut short_password = signup_body("b@x.com");
    short_password["password"] = json!("short");
    let (status, _, _) = send(
        &app,
        json_request("POST", "/auth/signup", None, short_password),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signin_distinguishes_codes_but_not_messages() {
    let app = default_app();
    signup(&app, "a@x.com").await;

    let (status, body, set_cookie) = send(
        &app,
        json_request(
            "POST",
            "/auth/signin",
            None,
            json!({"email": "a@x.com", "password": "pw123456"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(set_cookie.unwrap().starts_with("token="));

    let (status, body, _) = send(
        &app,
        json_request(
            "POST",
            "/auth/signin",
            None,
            json!({"email": "a@x.com", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, Value::String("Invalid email or password".to_string()));

    let (status, body, _) = send(
        &app,
        json_request(
            "POST",
            "/auth/signin",
            None,
            json!({"email": "nobody@x.com", "password": "pw123456"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::String("Invalid email or password".to_string()));
}

#[tokio::test]
async fn me_returns_the_authenticated_profile() {
    let app = default_app();
    let cookie = signup(&app, "a@x.com").await;

    let (status, body, _) = send(&app, get_request("/auth/me", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["first_name"], "Ada");
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let app = default_app();

    let (status, _, _) = send(&app, get_request("/reports", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, get_request("/reports", Some("token=garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_is_idempotent_and_clears_the_cookie() {
    let app = default_app();
    let cookie = signup(&app, "a@x.com").await;

    for _ in 0..2 {
        let (status, _, set_cookie) = send(
            &app,
            json_request("POST", "/auth/logout", Some(&cookie), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cleared = set_cookie.unwrap();
        assert!(cleared.starts_with("token=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}

//=========================================================================================
// Reports
//=========================================================================================

#[tokio::test]
async fn created_report_is_seeded_with_an_assistant_welcome() {
    let app = default_app();
    let cookie = signup(&app, "a@x.com").await;

    let body = create_report(&app, &cookie, "xray", "Chest").await;
    assert_eq!(body["report"]["report_type"], "xray");
    assert_eq!(body["report"]["title"], "Chest");
    assert_eq!(body["message"]["sender"], "assistant");
    assert!(body["message"]["message"]
        .as_str()
        .unwrap()
        .contains("received your xray report information"));
}

#[tokio::test]
async fn create_report_rejects_unknown_types_and_missing_titles() {
    let app = default_app();
    let cookie = signup(&app, "a@x.com").await;

    let (status, _, _) = send(
        &app,
        multipart_request(&cookie, &[("reportType", "ct_scan"), ("title", "Head")], None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        multipart_request(&cookie, &[("reportType", "mri")], None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.db.report_count(), 0);
    assert_eq!(app.db.message_count(), 0);
}

#[tokio::test]
async fn unreadable_pdf_blocks_report_creation() {
    let app = build_app(
        FakeExtractor { result: None },
        FakeAnswerer { reply: None },
    );
    let cookie = signup(&app, "a@x.com").await;

    let (status, body, _) = send(
        &app,
        multipart_request(
            &cookie,
            &[("reportType", "blood_test"), ("title", "Panel")],
            Some(("scan.pdf", b"%PDF-1.4 scanned image only".as_slice())),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body
        .as_str()
        .unwrap()
        .contains("Failed to extract text from PDF"));

    // Nothing may be persisted when extraction fails.
    assert_eq!(app.db.report_count(), 0);
    assert_eq!(app.db.message_count(), 0);
}

#[tokio::test]
async fn pdf_upload_stores_extracted_text_and_tailors_the_welcome() {
    let app = build_app(
        FakeExtractor {
            result: Some("Hemoglobin 13.5 g/dL".to_string()),
        },
        FakeAnswerer {
            reply: Some("All good.".to_string()),
        },
    );
    let cookie = signup(&app, "a@x.com").await;

    let (status, body, _) = send(
        &app,
        multipart_request(
            &cookie,
            &[("reportType", "blood_test"), ("title", "Panel")],
            Some(("results.pdf", b"%PDF-1.4 readable".as_slice())),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["report"]["extracted_text"], "Hemoglobin 13.5 g/dL");
    assert!(body["report"]["file_url"].is_string());
    assert!(body["message"]["message"]
        .as_str()
        .unwrap()
        .contains("analyzed your blood test report"));
}

#[tokio::test]
async fn report_listing_orders_by_latest_activity() {
    let app = default_app();
    let cookie = signup(&app, "a@x.com").await;

    let first = create_report(&app, &cookie, "xray", "Chest").await;
    let second = create_report(&app, &cookie, "mri", "Head").await;

    // Chat on the first report makes it the most recently active.
    let first_id = first["report"]["id"].as_str().unwrap();
    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/chat/messages",
            Some(&cookie),
            json!({"report_id": first_id, "message": "What does this mean?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = send(&app, get_request("/reports", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    let reports = body["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["report"]["id"], first["report"]["id"]);
    assert_eq!(reports[0]["message_count"], 3);
    assert_eq!(reports[1]["report"]["id"], second["report"]["id"]);
    assert_eq!(reports[1]["message_count"], 1);
    assert!(reports[1]["last_message"]
        .as_str()
        .unwrap()
        .contains("received your mri report information"));
}

//=========================================================================================
// Chat
//=========================================================================================

#[tokio::test]
async fn full_conversation_flow_keeps_messages_in_order() {
    let app = default_app();
    let cookie = signup(&app, "a@x.com").await;

    let created = create_report(&app, &cookie, "xray", "Chest").await;
    let report_id = created["report"]["id"].as_str().unwrap().to_string();

    let (status, body, _) = send(
        &app,
        json_request(
            "POST",
            "/chat/messages",
            Some(&cookie),
            json!({"report_id": report_id, "message": "What does this mean?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[0]["message"], "What does this mean?");
    assert_eq!(messages[1]["sender"], "assistant");
    assert_eq!(
        messages[1]["message"],
        "Your results look within the normal range."
    );
    assert!(parse_timestamp(&messages[0]) < parse_timestamp(&messages[1]));

    let (status, body, _) = send(
        &app,
        get_request(&format!("/chat/history/{report_id}"), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["messages"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["sender"], "assistant");
    assert_eq!(history[1]["sender"], "user");
    assert_eq!(history[2]["sender"], "assistant");
    let timestamps: Vec<DateTime<Utc>> = history.iter().map(parse_timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(body["report"]["id"], report_id);
}

#[tokio::test]
async fn chat_operations_are_invisible_to_non_owners() {
    let app = default_app();
    let owner = signup(&app, "a@x.com").await;
    let intruder = signup(&app, "b@x.com").await;

    let created = create_report(&app, &owner, "xray", "Chest").await;
    let report_id = created["report"]["id"].as_str().unwrap().to_string();

    let (status, body, _) = send(
        &app,
        json_request(
            "POST",
            "/chat/messages",
            Some(&intruder),
            json!({"report_id": report_id, "message": "let me in"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::String("Report not found".to_string()));

    let (status, _, _) = send(
        &app,
        get_request(&format!("/chat/history/{report_id}"), Some(&intruder)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The intruder's attempt must not have touched the owner's log.
    let (_, body, _) = send(
        &app,
        get_request(&format!("/chat/history/{report_id}"), Some(&owner)),
    )
    .await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn generator_outage_yields_the_apology_instead_of_an_error() {
    let app = build_app(
        FakeExtractor { result: None },
        FakeAnswerer { reply: None },
    );
    let cookie = signup(&app, "a@x.com").await;

    let created = create_report(&app, &cookie, "other", "Notes").await;
    let report_id = created["report"]["id"].as_str().unwrap().to_string();

    let (status, body, _) = send(
        &app,
        json_request(
            "POST",
            "/chat/messages",
            Some(&cookie),
            json!({"report_id": report_id, "message": "Anything wrong?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["sender"], "assistant");
    assert!(messages[1]["message"]
        .as_str()
        .unwrap()
        .starts_with("I apologize, but I'm having trouble accessing the AI service"));
}

#[tokio::test]
async fn empty_chat_messages_are_rejected() {
    let app = default_app();
    let cookie = signup(&app, "a@x.com").await;

    let created = create_report(&app, &cookie, "xray", "Chest").await;
    let report_id = created["report"]["id"].as_str().unwrap().to_string();

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/chat/messages",
            Some(&cookie),
            json!({"report_id": report_id, "message": "   "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Only the welcome message exists.
    assert_eq!(app.db.message_count(), 1);
}
