use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use cms_auth::AuthenticationResult;
use cms_axum::{validated_body, CmsAxumError};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::services::types::SharedState;
use crate::utils::validator::not_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Password is required"))]
    pub password: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new().route("/", post(login)).with_state(state)
}

/// Exchange a username and password for a bearer token.
async fn login(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthenticationResult>), CmsAxumError> {
    let req: LoginRequest = validated_body(body, "Invalid login request")?;
    let result = state.authenticator.login(req.username.trim(), &req.password).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
