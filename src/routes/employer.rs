use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dto::application_dto::{CategoryQuery, TransitionResponse, UpdateApplicationPayload},
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/employer/applications/apply/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 201, description = "Application submitted"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied or job closed")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.lifecycle.apply(&user.into(), job_id).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    post,
    path = "/api/employer/applications/save/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job saved, or the existing record"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn save(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.lifecycle.save(&user.into(), job_id).await?;
    Ok(Json(application))
}

#[utoipa::path(
    get,
    path = "/api/employer/applications",
    params(("category" = String, Query, description = "saved, applied, interviews, offers, hired or archived")),
    responses(
        (status = 200, description = "Own applications in the category, with job"),
        (status = 400, description = "Missing or unknown category")
    )
)]
#[axum::debug_handler]
pub async fn list_by_category(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse> {
    let applications = state
        .lifecycle
        .list_by_category(&user.into(), query.category.as_deref())
        .await?;
    Ok(Json(applications))
}

#[utoipa::path(
    put,
    path = "/api/employer/applications/{app_id}",
    params(("app_id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application updated"),
        (status = 400, description = "Unknown action, category or status"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(app_id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationPayload>,
) -> Result<impl IntoResponse> {
    let committed = state
        .lifecycle
        .update_application(&user.into(), app_id, payload)
        .await?;
    Ok(Json(TransitionResponse::from(committed)))
}

#[utoipa::path(
    delete,
    path = "/api/employer/applications/{app_id}",
    params(("app_id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application withdrawn"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    Path(app_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.lifecycle.withdraw(&user.into(), app_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Application withdrawn successfully."
    })))
}
