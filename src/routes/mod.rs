pub mod admin;
pub mod college;
pub mod employer;
pub mod health;
pub mod notifications;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    let employer_api = Router::new()
        .route(
            "/api/employer/applications",
            get(employer::list_by_category),
        )
        .route(
            "/api/employer/applications/apply/:job_id",
            post(employer::apply),
        )
        .route(
            "/api/employer/applications/save/:job_id",
            post(employer::save),
        )
        .route(
            "/api/employer/applications/:app_id",
            put(employer::update_application).delete(employer::withdraw),
        );

    let college_api = Router::new()
        .route(
            "/api/college/applications",
            get(college::list_applications),
        )
        .route(
            "/api/college/applications/:app_id/shortlist",
            put(college::shortlist),
        )
        .route(
            "/api/college/applications/:app_id/schedule-interview",
            put(college::schedule_interview),
        )
        .route(
            "/api/college/applications/:app_id/update-status",
            put(college::update_status),
        )
        .route("/api/college/hired", get(college::list_hired))
        .route("/api/college/stats", get(college::stats));

    let admin_api = Router::new()
        .route("/api/admin/applications/workflow", get(admin::workflow))
        .route(
            "/api/admin/users/:user_id/applications",
            get(admin::user_applications),
        )
        .route(
            "/api/admin/colleges/:college_id/stats",
            get(admin::college_stats),
        )
        .route(
            "/api/admin/applications/:app_id/forward-interview",
            put(admin::forward_interview),
        )
        .route(
            "/api/admin/applications/:app_id/forward-offer",
            put(admin::forward_offer),
        )
        .route("/api/admin/jobs/:job_id", delete(admin::delete_job));

    let notification_api = Router::new()
        .route("/api/notifications", get(notifications::list_mine))
        .route("/api/notifications/read", put(notifications::mark_all_read));

    Router::new()
        .route("/health", get(health::health))
        .merge(employer_api)
        .merge(college_api)
        .merge(admin_api)
        .merge(notification_api)
        .with_state(state)
}

#[cfg(test)]
mod tests;
