use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use super::router;
use crate::middleware::auth::AuthConfig;
use crate::models::user::Role;
use crate::repository::memory::MemoryStore;
use crate::services::file_store::LocalFileStore;
use crate::services::notification_service::{notification_channel, NotificationWorker};
use crate::AppState;

const BOUNDARY: &str = "portal-test-boundary";

struct Harness {
    app: Router,
    auth: AuthConfig,
    store: Arc<MemoryStore>,
    worker: NotificationWorker,
    uploads: std::path::PathBuf,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let uploads = std::env::temp_dir().join(format!("portal-uploads-{}", Uuid::new_v4()));
        let (sink, worker) = notification_channel(store.clone());
        let auth = AuthConfig::new("test_secret_key");
        let state = AppState::new(
            store.clone(),
            Arc::new(LocalFileStore::new(&uploads, "/uploads")),
            Arc::new(sink),
            auth.clone(),
        );
        Self {
            app: router(state),
            auth,
            store,
            worker,
            uploads,
        }
    }

    fn token(&self, user_id: Uuid, role: Role) -> String {
        self.auth
            .issue_token(user_id, role, Duration::hours(1))
            .expect("sign token")
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, JsonValue) {
        let res = self.app.clone().oneshot(req).await.expect("request");
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(req).await
    }

    async fn update_status(
        &self,
        app_id: &str,
        token: &str,
        status: Option<&str>,
        offer: Option<&[u8]>,
    ) -> (StatusCode, JsonValue) {
        let mut body = Vec::new();
        if let Some(status) = status {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"status\"\r\n\r\n{status}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(data) = offer {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"offerLetter\"; filename=\"offer.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("PUT")
            .uri(format!("/api/college/applications/{}/update-status", app_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .expect("request");
        self.send(req).await
    }
}

impl Harness {
    fn stored_offer_letters(&self) -> usize {
        std::fs::read_dir(self.uploads.join("offer_letters"))
            .map(|dir| dir.count())
            .unwrap_or(0)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.uploads);
    }
}

#[tokio::test]
async fn health_needs_no_token() {
    let h = Harness::new();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    let h = Harness::new();
    let req = Request::builder()
        .uri("/api/college/applications")
        .body(Body::empty())
        .unwrap();
    let (status, _) = h.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h
        .call("GET", "/api/college/applications", "not-a-jwt", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cookie_token_is_accepted() {
    let h = Harness::new();
    let college = h.store.add_user(Role::College, "hr@school.edu", None);
    let req = Request::builder()
        .uri("/api/college/stats")
        .header(header::COOKIE, format!("token={}", h.token(college, Role::College)))
        .body(Body::empty())
        .unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobs_posted"], 0);
}

#[tokio::test]
async fn hiring_flow_end_to_end() {
    let mut h = Harness::new();
    let college = h.store.add_user(Role::College, "hr@school.edu", Some("Greenfield"));
    let admin = h.store.add_user(Role::Admin, "admin@portal.dev", None);
    let teacher = h.store.add_user(Role::Employee, "ravi@mail.dev", Some("Ravi"));
    let job = h.store.add_job(college, "Physics Teacher", "active");

    let college_token = h.token(college, Role::College);
    let admin_token = h.token(admin, Role::Admin);
    let teacher_token = h.token(teacher, Role::Employee);

    let (status, body) = h
        .call(
            "POST",
            &format!("/api/employer/applications/apply/{}", job),
            &teacher_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "applied");
    let app_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = h
        .call(
            "POST",
            &format!("/api/employer/applications/apply/{}", job),
            &teacher_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You have already applied for this job.");

    // Applicants cannot drive college commands.
    let (status, _) = h
        .call(
            "PUT",
            &format!("/api/college/applications/{}/shortlist", app_id),
            &teacher_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h
        .call(
            "PUT",
            &format!("/api/college/applications/{}/shortlist", app_id),
            &college_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "shortlisted");

    let (status, body) = h
        .call(
            "PUT",
            &format!("/api/college/applications/{}/schedule-interview", app_id),
            &college_token,
            Some(json!({
                "meeting_link": "https://meet.example.com/physics",
                "date_time": "2030-05-01T10:00:00Z",
                "instructions": "Prepare a ten minute demo lesson"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["category"], "interviews");
    assert_eq!(body["notification"]["state"], "queued");
    assert!(h.worker.run_once().await);

    let (status, body) = h
        .call("GET", "/api/admin/applications/workflow", &admin_token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["applicant"]["name"], "Ravi");

    let (status, body) = h
        .call(
            "PUT",
            &format!("/api/admin/applications/{}/forward-interview", app_id),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["interview_details"]["confirmed_by_admin"], true);
    assert!(h.worker.run_once().await);

    let (status, body) = h
        .update_status(&app_id, &college_token, Some("offer_extended"), Some(b"%PDF-1.4 letter"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "offer_extended");
    let url = body["application"]["offer_letter"]["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/offer_letters/"));

    let (status, body) = h
        .call(
            "PUT",
            &format!("/api/admin/applications/{}/forward-offer", app_id),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["application"]["status"], "hired");
    assert!(h.worker.run_once().await);

    let (_, body) = h
        .call(
            "PUT",
            &format!("/api/admin/applications/{}/forward-offer", app_id),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(body["notification"]["state"], "not_required");

    let (status, body) = h
        .call(
            "PUT",
            &format!("/api/employer/applications/{}", app_id),
            &teacher_token,
            Some(json!({ "action": "accept_offer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);
    assert_eq!(body["application"]["category"], "hired");

    let (status, body) = h.call("GET", "/api/notifications", &teacher_token, None).await;
    assert_eq!(status, StatusCode::OK);
    let inbox = body.as_array().unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(
        inbox[0]["message"],
        "Congratulations! You have received an offer for the Physics Teacher position."
    );
    assert_eq!(inbox[0]["link"], "/my-jobs?category=offers");

    let (_, body) = h.call("PUT", "/api/notifications/read", &teacher_token, None).await;
    assert_eq!(body["updated"], 2);

    let (status, body) = h.call("GET", "/api/college/hired", &college_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["job"]["title"], "Physics Teacher");

    let (_, body) = h
        .call(
            "GET",
            &format!("/api/admin/colleges/{}/stats", college),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(body["hired_count"], 1);

    let (_, body) = h
        .call(
            "GET",
            "/api/employer/applications?category=hired",
            &teacher_token,
            None,
        )
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn update_status_validates_input() {
    let h = Harness::new();
    let college = h.store.add_user(Role::College, "hr@school.edu", None);
    let teacher = h.store.add_user(Role::Employer, "mia@mail.dev", None);
    let job = h.store.add_job(college, "Chemistry Teacher", "active");
    let (_, body) = h
        .call(
            "POST",
            &format!("/api/employer/applications/apply/{}", job),
            &h.token(teacher, Role::Employer),
            None,
        )
        .await;
    let app_id = body["id"].as_str().unwrap().to_string();
    let token = h.token(college, Role::College);

    let (status, _) = h.update_status(&app_id, &token, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h.update_status(&app_id, &token, Some("ghosted"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .update_status(&app_id, &token, Some("offer_extended"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("offer letter"));

    let (status, _) = h
        .update_status(&app_id, &token, Some("offer_extended"), Some(b"not a pdf"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .update_status(&app_id, &token, Some("rejected"), Some(b""))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["category"], "archived");

    let (status, _) = h
        .call(
            "PUT",
            &format!("/api/college/applications/{}/shortlist", app_id),
            &token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = h
        .update_status(&app_id, &token, Some("offer_extended"), Some(b"%PDF-1.4 late"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(h.stored_offer_letters(), 0);
}

#[tokio::test]
async fn colleges_only_touch_their_own_postings() {
    let h = Harness::new();
    let college = h.store.add_user(Role::College, "hr@school.edu", None);
    let rival = h.store.add_user(Role::College, "hr@rival.edu", None);
    let teacher = h.store.add_user(Role::Employee, "lena@mail.dev", None);
    let job = h.store.add_job(college, "Geography Teacher", "active");
    let (_, body) = h
        .call(
            "POST",
            &format!("/api/employer/applications/apply/{}", job),
            &h.token(teacher, Role::Employee),
            None,
        )
        .await;
    let app_id = body["id"].as_str().unwrap().to_string();
    let rival_token = h.token(rival, Role::College);

    let (status, _) = h
        .call(
            "PUT",
            &format!("/api/college/applications/{}/shortlist", app_id),
            &rival_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .update_status(&app_id, &rival_token, Some("offer_extended"), Some(b"%PDF-1.4 x"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.stored_offer_letters(), 0);

    let (status, _) = h
        .update_status(&app_id, &rival_token, Some("hired"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = h.call("GET", "/api/college/applications", &rival_token, None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = h
        .call(
            "PUT",
            &format!("/api/college/applications/{}/shortlist", app_id),
            &h.token(college, Role::College),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "shortlisted");
}

#[tokio::test]
async fn withdraw_and_listing_are_owner_scoped() {
    let h = Harness::new();
    let college = h.store.add_user(Role::College, "hr@school.edu", None);
    let owner = h.store.add_user(Role::Employee, "owner@mail.dev", None);
    let other = h.store.add_user(Role::Employee, "other@mail.dev", None);
    let job = h.store.add_job(college, "History Teacher", "active");
    let owner_token = h.token(owner, Role::Employee);
    let other_token = h.token(other, Role::Employee);

    let (status, body) = h
        .call(
            "POST",
            &format!("/api/employer/applications/save/{}", job),
            &owner_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "saved");
    let app_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = h
        .call("GET", "/api/employer/applications", &owner_token, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = h
        .call(
            "GET",
            "/api/employer/applications?category=saved",
            &other_token,
            None,
        )
        .await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = h
        .call(
            "PUT",
            &format!("/api/employer/applications/{}", app_id),
            &other_token,
            Some(json!({ "category": "archived" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .call(
            "DELETE",
            &format!("/api/employer/applications/{}", app_id),
            &other_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = h
        .call(
            "DELETE",
            &format!("/api/employer/applications/{}", app_id),
            &owner_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(h.store.application_count(), 0);
}

#[tokio::test]
async fn admin_deletes_job_with_applications() {
    let h = Harness::new();
    let college = h.store.add_user(Role::College, "hr@school.edu", None);
    let admin = h.store.add_user(Role::Admin, "admin@portal.dev", None);
    let teacher = h.store.add_user(Role::Employee, "t@mail.dev", None);
    let job = h.store.add_job(college, "Music Teacher", "active");
    h.call(
        "POST",
        &format!("/api/employer/applications/apply/{}", job),
        &h.token(teacher, Role::Employee),
        None,
    )
    .await;

    let (status, body) = h
        .call(
            "DELETE",
            &format!("/api/admin/jobs/{}", job),
            &h.token(admin, Role::Admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applications_removed"], 1);

    let (_, body) = h
        .call(
            "GET",
            &format!("/api/admin/users/{}/applications", teacher),
            &h.token(admin, Role::Admin),
            None,
        )
        .await;
    assert!(body.as_array().unwrap().is_empty());
}
