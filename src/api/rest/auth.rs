//! Authentication endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::{run_blocking, ApiResult, CurrentUser};
use crate::api::websocket::state::AppState;
use crate::types::{NewUser, UserProfile};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(new_user): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    let store = state.store.clone();
    let user = run_blocking(move || store.create_user(new_user)).await??;
    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let auth = state.auth.clone();
    let (access_token, user) =
        run_blocking(move || auth.login(&request.email, &request.password)).await??;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: user.profile(),
    }))
}

/// GET /auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user.profile())
}

/// POST /auth/logout - tokens are stateless, the client drops its copy
pub async fn logout() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Successfully logged out" }))
}
