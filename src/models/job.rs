use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const JOB_ACTIVE: &str = "active";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub school_name: String,
    pub location: String,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub posted_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_active(&self) -> bool {
        self.status == JOB_ACTIVE
    }
}

/// Job fields embedded next to an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub school_name: String,
    pub location: String,
    pub status: String,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            school_name: job.school_name.clone(),
            location: job.location.clone(),
            status: job.status.clone(),
        }
    }
}
