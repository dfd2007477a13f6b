use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{OfferUpload, ScheduleInterviewPayload, TransitionResponse},
    error::{Error, Result},
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/college/applications",
    responses((status = 200, description = "Applications to the college's jobs, with applicant and job"))
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let applications = state.lifecycle.list_for_college_jobs(&user.into()).await?;
    Ok(Json(applications))
}

#[utoipa::path(
    put,
    path = "/api/college/applications/{app_id}/shortlist",
    params(("app_id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application shortlisted"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Not allowed from the current status")
    )
)]
#[axum::debug_handler]
pub async fn shortlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(app_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let committed = state.lifecycle.shortlist(&user.into(), app_id).await?;
    Ok(Json(TransitionResponse::from(committed)))
}

#[utoipa::path(
    put,
    path = "/api/college/applications/{app_id}/schedule-interview",
    params(("app_id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Interview scheduled, admins notified"),
        (status = 400, description = "Invalid interview details"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn schedule_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(app_id): Path<Uuid>,
    Json(payload): Json<ScheduleInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let committed = state
        .lifecycle
        .schedule_interview(&user.into(), app_id, payload)
        .await?;
    Ok(Json(TransitionResponse::from(committed)))
}

/// Multipart form with a `status` text field and an optional `offerLetter`
/// file. An empty file part counts as no upload.
#[utoipa::path(
    put,
    path = "/api/college/applications/{app_id}/update-status",
    params(("app_id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Status recorded"),
        (status = 400, description = "Missing or unknown status, or rejected file"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(app_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut status = None;
    let mut offer = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!(error = %e, "failed to read multipart field");
        Error::BadRequest(e.to_string())
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "status" => status = Some(field.text().await?),
            "offerLetter" => {
                let file_name = field.file_name().unwrap_or("offer_letter.pdf").to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    offer = Some(OfferUpload { file_name, data });
                }
            }
            _ => {}
        }
    }

    let committed = state
        .lifecycle
        .update_status_after_interview(&user.into(), app_id, status, offer)
        .await?;
    Ok(Json(TransitionResponse::from(committed)))
}

#[utoipa::path(
    get,
    path = "/api/college/hired",
    responses((status = 200, description = "Hired applications on the college's jobs"))
)]
#[axum::debug_handler]
pub async fn list_hired(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let hired = state.lifecycle.list_hired(&user.into()).await?;
    Ok(Json(hired))
}

#[utoipa::path(
    get,
    path = "/api/college/stats",
    responses((status = 200, description = "Jobs posted and hired count"))
)]
#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse> {
    let stats = state
        .lifecycle
        .college_stats(&user.into(), user.user_id)
        .await?;
    Ok(Json(stats))
}
