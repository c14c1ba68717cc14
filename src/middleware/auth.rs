use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{DenialReason, Error};
use crate::models::user::UserRole;
use crate::utils::token::decode_token;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

/// The authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = Error;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;
        let role = claims
            .role
            .parse()
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;
        Ok(Self {
            id,
            email: claims.email,
            role,
        })
    }
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

fn authenticate(state: &AppState, req: &Request) -> Result<CurrentUser, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(unauthorized("missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };

    decode_token(token, &state.config.jwt_secret)
        .and_then(CurrentUser::try_from)
        .map_err(|_| unauthorized("invalid_token"))
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match authenticate(&state, &req) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(response) => response,
    }
}

pub async fn require_admin(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let user = match authenticate(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if user.role != UserRole::Admin {
        tracing::warn!(user_id = user.id, "non-admin rejected from admin route");
        return Error::forbidden(DenialReason::AdminOnly, "Admin access required").into_response();
    }
    req.extensions_mut().insert(user);
    next.run(req).await
}
