use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::Application;
use crate::models::job::JobSummary;
use crate::models::user::ApplicantSummary;
use crate::services::lifecycle_service::{Committed, NotificationOutcome};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScheduleInterviewPayload {
    #[validate(url)]
    pub meeting_link: String,
    pub date_time: DateTime<Utc>,
    #[validate(length(max = 2000))]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UpdateApplicationPayload {
    pub category: Option<String>,
    pub status: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// Offer letter received through multipart upload.
#[derive(Debug, Clone)]
pub struct OfferUpload {
    pub file_name: String,
    pub data: bytes::Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewedApplication {
    #[serde(flatten)]
    pub application: Application,
    pub applicant: Option<ApplicantSummary>,
    pub job: Option<JobSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollegeStats {
    pub college_id: Uuid,
    pub jobs_posted: usize,
    pub hired_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionResponse {
    pub application: Application,
    pub changed: bool,
    pub notification: NotificationOutcome,
}

impl From<Committed<Application>> for TransitionResponse {
    fn from(value: Committed<Application>) -> Self {
        Self {
            application: value.record,
            changed: value.changed,
            notification: value.notification,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForwardResponse {
    pub success: bool,
    pub message: String,
    pub application: Application,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDeletedResponse {
    pub success: bool,
    pub message: String,
    pub applications_removed: u64,
}
