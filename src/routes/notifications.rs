use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::{error::Result, middleware::auth::AuthUser, AppState};

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses((status = 200, description = "Caller's notifications, newest first"))
)]
#[axum::debug_handler]
pub async fn list_mine(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse> {
    let notifications = state.notifications.list_mine(user.user_id).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read",
    responses((status = 200, description = "Unread notifications marked read"))
)]
#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let updated = state.notifications.mark_all_read(user.user_id).await?;
    Ok(Json(json!({ "success": true, "updated": updated })))
}
