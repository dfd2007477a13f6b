//! Storage seams for the lifecycle engine. `PgStore` backs every trait in
//! production; tests swap in the in-memory store.

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use axum::async_trait;
use uuid::Uuid;

use crate::models::application::{
    Application, ApplicationCategory, ApplicationStatus, UnknownVariant,
};
use crate::models::job::Job;
use crate::models::notification::{Notice, Notification};
use crate::models::user::{ApplicantSummary, Role};

pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error("stored value could not be decoded: {0}")]
    Decode(#[from] UnknownVariant),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when (user, job) already exists.
    async fn insert(&self, application: &Application) -> Result<Application, StoreError>;

    /// Returns the existing (user, job) record untouched when there is one.
    async fn insert_if_absent(&self, application: &Application)
        -> Result<Application, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Application>, StoreError>;

    /// Persists `next` only while the stored version still equals
    /// `expected_version`. `None` means the record moved on or disappeared.
    async fn compare_and_swap(
        &self,
        expected_version: i32,
        next: &Application,
    ) -> Result<Option<Application>, StoreError>;

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        category: Option<ApplicationCategory>,
    ) -> Result<Vec<Application>, StoreError>;

    async fn list_for_jobs(
        &self,
        job_ids: &[Uuid],
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, StoreError>;

    /// Newest update first.
    async fn list_with_statuses(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, StoreError>;

    async fn count_for_jobs(
        &self,
        job_ids: &[Uuid],
        status: ApplicationStatus,
    ) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait JobDirectory: Send + Sync {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError>;

    async fn find_jobs(&self, ids: &[Uuid]) -> Result<Vec<Job>, StoreError>;

    async fn jobs_posted_by(&self, college_id: Uuid) -> Result<Vec<Job>, StoreError>;

    /// Deletes the job and every application referencing it. Returns the
    /// number of applications removed, or `None` if the job does not exist.
    async fn delete_job_cascade(&self, id: Uuid) -> Result<Option<u64>, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn applicant_summaries(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<ApplicantSummary>, StoreError>;

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<Uuid>, StoreError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notice: &Notice) -> Result<Notification, StoreError>;

    /// Newest first.
    async fn list_for_recipient(&self, recipient_id: Uuid)
        -> Result<Vec<Notification>, StoreError>;

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, StoreError>;
}
