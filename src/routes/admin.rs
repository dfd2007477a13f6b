use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::application_dto::{ForwardResponse, JobDeletedResponse},
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/applications/workflow",
    responses(
        (status = 200, description = "Applications past shortlisting, newest first"),
        (status = 403, description = "Not an admin")
    )
)]
#[axum::debug_handler]
pub async fn workflow(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse> {
    let applications = state.lifecycle.list_workflow(&user.into()).await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{user_id}/applications",
    params(("user_id" = Uuid, Path, description = "Applicant user ID")),
    responses(
        (status = 200, description = "All applications of the user, with job"),
        (status = 403, description = "Not an admin")
    )
)]
#[axum::debug_handler]
pub async fn user_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let applications = state
        .lifecycle
        .list_for_applicant(&user.into(), user_id)
        .await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/api/admin/colleges/{college_id}/stats",
    params(("college_id" = Uuid, Path, description = "College user ID")),
    responses(
        (status = 200, description = "Jobs posted and hired count"),
        (status = 403, description = "Not an admin")
    )
)]
#[axum::debug_handler]
pub async fn college_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Path(college_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let stats = state
        .lifecycle
        .college_stats(&user.into(), college_id)
        .await?;
    Ok(Json(stats))
}

#[utoipa::path(
    put,
    path = "/api/admin/applications/{app_id}/forward-interview",
    params(("app_id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Interview confirmed and candidate notified"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "No interview to forward")
    )
)]
#[axum::debug_handler]
pub async fn forward_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(app_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let committed = state
        .lifecycle
        .forward_interview(&user.into(), app_id)
        .await?;
    let message = if committed.changed {
        "Interview details forwarded to the candidate."
    } else {
        "Interview details were already forwarded."
    };
    Ok(Json(ForwardResponse {
        success: true,
        message: message.to_string(),
        application: committed.record,
        notification: committed.notification,
    }))
}

#[utoipa::path(
    put,
    path = "/api/admin/applications/{app_id}/forward-offer",
    params(("app_id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Offer forwarded and candidate marked hired"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "No offer letter to forward")
    )
)]
#[axum::debug_handler]
pub async fn forward_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(app_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let committed = state.lifecycle.forward_offer(&user.into(), app_id).await?;
    let message = if committed.changed {
        "Offer letter forwarded to the candidate."
    } else {
        "Offer letter was already forwarded."
    };
    Ok(Json(ForwardResponse {
        success: true,
        message: message.to_string(),
        application: committed.record,
        notification: committed.notification,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/jobs/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job and its applications removed"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let removed = state.lifecycle.delete_job(&user.into(), job_id).await?;
    Ok(Json(JobDeletedResponse {
        success: true,
        message: "Job and related applications deleted.".to_string(),
        applications_removed: removed,
    }))
}
