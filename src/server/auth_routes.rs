//! Registration and login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::models::{NewUser, User};
use crate::store::UserCreation;
use crate::user::{hash_password, verify_password, UserRole};

use super::error::{ApiError, ApiResult};
use super::state::{GuardedAccountStore, ServerState};
use super::user_routes::log_activity;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[a-zA-Z]{2,}$").unwrap();
}

const ALLOWED_EMAIL_TLDS: [&str; 4] = [".com", ".edu", ".org", ".net"];

/// Trims and lowercases, then checks shape and the TLD allow-list.
pub(super) fn validate_email(email: &str) -> ApiResult<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL_REGEX.is_match(&email) {
        return Err(ApiError::Validation("invalid email address".to_string()));
    }
    if !ALLOWED_EMAIL_TLDS.iter().any(|tld| email.ends_with(tld)) {
        return Err(ApiError::Validation(
            "email domain must end in .com, .edu, .org or .net".to_string(),
        ));
    }
    Ok(email)
}

pub(super) fn validate_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

pub(super) fn validate_password(password: &str) -> ApiResult<()> {
    if password.is_empty() {
        return Err(ApiError::Validation(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn invalid_credentials() -> ApiError {
    // Deliberately the same message for unknown email and wrong password.
    ApiError::Unauthorized("invalid credentials".to_string())
}

#[derive(Deserialize, Debug)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    role: Option<UserRole>,
    subscription_plan: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: User,
}

async fn register(
    State(accounts): State<GuardedAccountStore>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let name = validate_name(&body.name)?;
    let email = validate_email(&body.email)?;
    validate_password(&body.password)?;

    let new_user = NewUser {
        name,
        email,
        password_hash: hash_password(&body.password)?,
        role: body.role.unwrap_or(UserRole::Regular),
        subscription_plan: body.subscription_plan,
    };

    match accounts.create_user(&new_user)? {
        UserCreation::Created(user) => {
            info!("Registered user {} ({})", user.id, user.email);
            Ok((StatusCode::CREATED, Json(user)))
        }
        UserCreation::DuplicateEmail => Err(ApiError::Conflict(
            "email already registered".to_string(),
        )),
    }
}

async fn login(
    State(state): State<ServerState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<LoginResponse>> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let auth = state
        .accounts
        .get_user_by_email(body.email.trim())?
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&body.password, &auth.password_hash)? {
        return Err(invalid_credentials());
    }

    state.accounts.touch_last_login(auth.user.id)?;
    let token = state.token_issuer.issue(auth.user.id, auth.user.role)?;
    log_activity(&state.library, auth.user.id, "Logged in");

    Ok(Json(LoginResponse {
        token,
        user: auth.user,
    }))
}

pub(super) fn make_auth_routes(state: ServerState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}
