use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use tracing::debug;

use crate::user::UserRole;

use super::error::ApiError;
use super::state::ServerState;

/// An authenticated caller, extracted from the Authorization header.
/// Missing header is 401; a present but unverifiable token is 403.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub role: UserRole,
}

/// A session that has already passed the admin role check.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("missing authorization token".to_string()))?;
        let raw = header_value
            .to_str()
            .map_err(|_| ApiError::Forbidden("malformed authorization header".to_string()))?;
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw);

        let claims = state.token_issuer.verify(token).ok_or_else(|| {
            debug!("Token failed verification");
            ApiError::Forbidden("invalid or expired token".to_string())
        })?;

        Ok(Session {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        if !session.role.is_admin() {
            return Err(ApiError::Forbidden("admin access required".to_string()));
        }
        Ok(AdminSession(session))
    }
}
