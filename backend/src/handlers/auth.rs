//! Authentication handlers

use axum::{extract::State, Json};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::services::auth::LoginResponse;
use crate::services::AuthService;
use crate::AppState;
use shared::LoginRequest;

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    body.validate()?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.login(&body).await?;
    Ok(Json(response))
}
