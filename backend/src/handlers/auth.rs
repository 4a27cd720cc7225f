//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::auth::{
    AuthResponse, AuthService, LoginInput, RefreshInput, RegisterInput, TokenPair,
};
use crate::AppState;

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<AuthResponse>> {
    let service = AuthService::new(state.db);
    let response = service.register(&state.config.jwt, input).await?;
    Ok(Json(response))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let service = AuthService::new(state.db);
    let response = service.login(&state.config.jwt, input).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<TokenPair>> {
    let service = AuthService::new(state.db);
    let tokens = service.refresh(&state.config.jwt, input).await?;
    Ok(Json(tokens))
}
