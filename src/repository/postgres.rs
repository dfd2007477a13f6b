use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ApplicationStore, JobDirectory, NotificationStore, StoreError, UserDirectory};
use crate::models::application::{
    Application, ApplicationCategory, ApplicationRow, ApplicationStatus,
};
use crate::models::job::Job;
use crate::models::notification::{Notice, Notification};
use crate::models::user::{ApplicantSummary, Role};

const APPLICATION_COLUMNS: &str = "id, user_id, job_id, status, category, \
    interview_meeting_link, interview_date_time, interview_instructions, interview_confirmed_by_admin, \
    offer_letter_public_id, offer_letter_url, offer_forwarded_by_admin, \
    applied_date, version, created_at, updated_at";

const SAVE_ATTEMPTS: usize = 3;

const JOB_COLUMNS: &str = "id, title, school_name, location, salary, job_type, description, \
    posted_by, approved_by, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_application(
        &self,
        sql: &str,
        id: Uuid,
    ) -> Result<Option<Application>, StoreError> {
        let row = sqlx::query_as::<_, ApplicationRow>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Application::try_from).transpose()?)
    }
}

fn decode_all(rows: Vec<ApplicationRow>) -> Result<Vec<Application>, StoreError> {
    rows.into_iter()
        .map(|row| Application::try_from(row).map_err(StoreError::from))
        .collect()
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict("You have already applied for this job.".to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert(&self, application: &Application) -> Result<Application, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO applications (id, user_id, job_id, status, category, applied_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(application.id)
            .bind(application.user_id)
            .bind(application.job_id)
            .bind(application.status.as_str())
            .bind(application.category.as_str())
            .bind(application.applied_date)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;
        Ok(Application::try_from(row)?)
    }

    async fn insert_if_absent(
        &self,
        application: &Application,
    ) -> Result<Application, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO applications (id, user_id, job_id, status, category, applied_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, job_id) DO NOTHING
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        let select = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_id = $1 AND job_id = $2"
        );

        // A concurrent withdraw can remove the conflicting row between the
        // two statements; insert again when that happens.
        for _ in 0..SAVE_ATTEMPTS {
            let inserted = sqlx::query_as::<_, ApplicationRow>(&sql)
                .bind(application.id)
                .bind(application.user_id)
                .bind(application.job_id)
                .bind(application.status.as_str())
                .bind(application.category.as_str())
                .bind(application.applied_date)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = inserted {
                return Ok(Application::try_from(row)?);
            }

            let existing = sqlx::query_as::<_, ApplicationRow>(&select)
                .bind(application.user_id)
                .bind(application.job_id)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = existing {
                return Ok(Application::try_from(row)?);
            }
        }
        Err(StoreError::Conflict(
            "Application changed concurrently, please retry.".to_string(),
        ))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        self.fetch_one_application(&sql, id).await
    }

    async fn compare_and_swap(
        &self,
        expected_version: i32,
        next: &Application,
    ) -> Result<Option<Application>, StoreError> {
        let interview = next.interview_details.as_ref();
        let offer = next.offer_letter.as_ref();
        let sql = format!(
            r#"
            UPDATE applications
            SET
                status = $3,
                category = $4,
                interview_meeting_link = $5,
                interview_date_time = $6,
                interview_instructions = $7,
                interview_confirmed_by_admin = $8,
                offer_letter_public_id = $9,
                offer_letter_url = $10,
                offer_forwarded_by_admin = $11,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(next.id)
            .bind(expected_version)
            .bind(next.status.as_str())
            .bind(next.category.as_str())
            .bind(interview.map(|d| d.meeting_link.clone()))
            .bind(interview.map(|d| d.date_time))
            .bind(interview.and_then(|d| d.instructions.clone()))
            .bind(interview.map(|d| d.confirmed_by_admin).unwrap_or(false))
            .bind(offer.map(|o| o.public_id.clone()))
            .bind(offer.map(|o| o.url.clone()))
            .bind(offer.map(|o| o.forwarded_by_admin).unwrap_or(false))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Application::try_from).transpose()?)
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        category: Option<ApplicationCategory>,
    ) -> Result<Vec<Application>, StoreError> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
            WHERE user_id = $1 AND ($2::text IS NULL OR category = $2)
            ORDER BY updated_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(user_id)
            .bind(category.map(ApplicationCategory::as_str))
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }

    async fn list_for_jobs(
        &self,
        job_ids: &[Uuid],
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, StoreError> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
            WHERE job_id = ANY($1) AND ($2::text IS NULL OR status = $2)
            ORDER BY updated_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(job_ids.to_vec())
            .bind(status.map(ApplicationStatus::as_str))
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }

    async fn list_with_statuses(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, StoreError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
            WHERE status = ANY($1)
            ORDER BY updated_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }

    async fn count_for_jobs(
        &self,
        job_ids: &[Uuid],
        status: ApplicationStatus,
    ) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE job_id = ANY($1) AND status = $2
            "#,
        )
        .bind(job_ids.to_vec())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }
}

#[async_trait]
impl JobDirectory for PgStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn find_jobs(&self, ids: &[Uuid]) -> Result<Vec<Job>, StoreError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ANY($1)");
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn jobs_posted_by(&self, college_id: Uuid) -> Result<Vec<Job>, StoreError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE posted_by = $1 ORDER BY created_at DESC"
        );
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(college_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn delete_job_cascade(&self, id: Uuid) -> Result<Option<u64>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM applications WHERE job_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.commit().await?;
        Ok(Some(removed))
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn applicant_summaries(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<ApplicantSummary>, StoreError> {
        let rows = sqlx::query_as::<_, ApplicantSummary>(
            r#"
            SELECT u.id AS user_id, u.email, p.name, p.headline
            FROM users u
            LEFT JOIN employer_profiles p ON p.user_id = u.id
            WHERE u.id = ANY($1)
            "#,
        )
        .bind(user_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, notice: &Notice) -> Result<Notification, StoreError> {
        let row = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (recipient_id, message, link)
            VALUES ($1, $2, $3)
            RETURNING id, recipient_id, message, link, read, created_at
            "#,
        )
        .bind(notice.recipient_id)
        .bind(&notice.message)
        .bind(&notice.link)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, recipient_id, message, link, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
