//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, signin, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use medreport_core::domain::{NewUser, User};
use medreport_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

/// Name of the cookie the session token travels in.
pub const SESSION_COOKIE: &str = "token";

// Both signin failure modes answer with the same body so the response text
// does not reveal whether the email or the password was wrong.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub gender: String,
    pub age: Option<i32>,
    pub profile_image: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub user: User,
    pub token: String,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    #[schema(value_type = Object)]
    pub user: User,
}

#[derive(Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

//=========================================================================================
// Cookie Helpers
//=========================================================================================

fn session_cookie(state: &AppState, token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        state.tokens.ttl_seconds(),
        secure_attr(state),
    )
}

fn clear_session_cookie(state: &AppState) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0{}",
        SESSION_COOKIE,
        secure_attr(state),
    )
}

fn secure_attr(state: &AppState) -> &'static str {
    if state.config.secure_cookies {
        "; Secure"
    } else {
        ""
    }
}

//=========================================================================================
// Validation
//=========================================================================================

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn validate_signup(req: &SignupRequest) -> Result<(), String> {
    if req.first_name.trim().is_empty() {
        return Err("First name is required".to_string());
    }
    if req.last_name.trim().is_empty() {
        return Err("Last name is required".to_string());
    }
    if !is_valid_email(&req.email) {
        return Err("A valid email address is required".to_string());
    }
    if req.password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if req.phone.trim().len() < 11 {
        return Err("Phone number must be at least 11 digits".to_string());
    }
    if req.gender.trim().is_empty() {
        return Err("Gender is required".to_string());
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate the payload
    validate_signup(&req).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    // 2. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })?
        .to_string();

    // 3. Create the user; a duplicate email is the caller's mistake, not ours
    let user = state
        .db
        .create_user(NewUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash,
            phone: req.phone,
            gender: req.gender,
            age: req.age,
            profile_image: req.profile_image,
        })
        .await
        .map_err(|e| match e {
            PortError::Duplicate(_) => {
                (StatusCode::BAD_REQUEST, "User already exists".to_string())
            }
            other => {
                error!("Failed to create user: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create user".to_string(),
                )
            }
        })?;

    // 4. Mint a session token and set the cookie
    let token = state.tokens.issue(user.id).map_err(|e| {
        error!("Failed to issue session token: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create session".to_string(),
        )
    })?;
    let cookie = session_cookie(&state, &token);

    let response = AuthResponse {
        message: "Signup successful".to_string(),
        user,
        token,
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/signin - Sign in with an existing account
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signin successful", body = AuthResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown email"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SigninRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Look up the account
    let credentials = state
        .db
        .get_user_by_email(&req.email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => (StatusCode::NOT_FOUND, INVALID_CREDENTIALS.to_string()),
            other => {
                error!("Failed to load user: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication error".to_string(),
                )
            }
        })?;

    // 2. Verify the password through the hashing library's comparison only
    let parsed_hash = PasswordHash::new(&credentials.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string()));
    }

    // 3. Mint a fresh session token and set the cookie
    let token = state.tokens.issue(credentials.user.id).map_err(|e| {
        error!("Failed to issue session token: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create session".to_string(),
        )
    })?;
    let cookie = session_cookie(&state, &token);

    let response = AuthResponse {
        message: "Login successful".to_string(),
        user: credentials.user,
        token,
    };

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/logout - Clear the session cookie
///
/// Tokens are not tracked server side, so logout only instructs the client to
/// drop the cookie. Calling it repeatedly is harmless.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cookie = clear_session_cookie(&state);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// GET /auth/me - The profile of the authenticated caller
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The caller's profile", body = MeResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<MeResponse> {
    Json(MeResponse { user })
}
