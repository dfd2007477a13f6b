use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::dto::application_dto::{
    ApplicationWithJob, CollegeStats, OfferUpload, ReviewedApplication, ScheduleInterviewPayload,
    UpdateApplicationPayload,
};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationCategory, ApplicationStatus};
use crate::models::job::JobSummary;
use crate::models::notification::Notice;
use crate::models::user::{ApplicantSummary, Role};
use crate::repository::{ApplicationStore, JobDirectory, UserDirectory};
use crate::services::file_store::{FileStore, StoredFile};
use crate::services::notification_service::NotificationSink;
use crate::services::transitions::{self, Command, Outcome};

const MAX_COMMIT_ATTEMPTS: usize = 3;
const OFFER_LETTER_FOLDER: &str = "offer_letters";

/// Authenticated caller of a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// What happened to the notification side effect of a committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum NotificationOutcome {
    NotRequired,
    Queued(usize),
    Dropped(String),
}

/// A committed state change. `notification` never affects `record`.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub record: T,
    pub changed: bool,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    InterviewScheduled,
    InterviewForwarded,
    OfferForwarded,
}

#[derive(Clone)]
pub struct LifecycleService {
    applications: Arc<dyn ApplicationStore>,
    jobs: Arc<dyn JobDirectory>,
    users: Arc<dyn UserDirectory>,
    files: Arc<dyn FileStore>,
    notifier: Arc<dyn NotificationSink>,
}

fn ensure_role(actor: &Actor, allowed: &[Role], operation: &str) -> Result<()> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "role '{}' may not {}",
            actor.role, operation
        )))
    }
}

fn ensure_applicant(actor: &Actor, operation: &str) -> Result<()> {
    ensure_role(actor, &[Role::Employee, Role::Employer], operation)
}

fn not_found() -> Error {
    Error::NotFound("Application not found.".to_string())
}

fn unique_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

impl LifecycleService {
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        jobs: Arc<dyn JobDirectory>,
        users: Arc<dyn UserDirectory>,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            applications,
            jobs,
            users,
            files,
            notifier,
        }
    }

    pub async fn apply(&self, actor: &Actor, job_id: Uuid) -> Result<Application> {
        ensure_applicant(actor, "apply to jobs")?;
        let job = self
            .jobs
            .find_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found.".to_string()))?;
        if !job.is_active() {
            return Err(Error::InvalidTransition(
                "This job is not accepting applications.".to_string(),
            ));
        }

        let draft = Application::new(actor.user_id, job_id, ApplicationCategory::Applied);
        let application = self.applications.insert(&draft).await?;
        tracing::info!(application_id = %application.id, user_id = %actor.user_id, job_id = %job_id, "application submitted");
        Ok(application)
    }

    pub async fn save(&self, actor: &Actor, job_id: Uuid) -> Result<Application> {
        ensure_applicant(actor, "save jobs")?;
        if self.jobs.find_job(job_id).await?.is_none() {
            return Err(Error::NotFound("Job not found.".to_string()));
        }

        let draft = Application::new(actor.user_id, job_id, ApplicationCategory::Saved);
        let application = self.applications.insert_if_absent(&draft).await?;
        Ok(application)
    }

    pub async fn shortlist(&self, actor: &Actor, app_id: Uuid) -> Result<Committed<Application>> {
        self.run(actor, app_id, Command::Shortlist, None).await
    }

    pub async fn schedule_interview(
        &self,
        actor: &Actor,
        app_id: Uuid,
        payload: ScheduleInterviewPayload,
    ) -> Result<Committed<Application>> {
        let command = Command::ScheduleInterview {
            meeting_link: payload.meeting_link,
            date_time: payload.date_time,
            instructions: payload.instructions,
        };
        self.run(actor, app_id, command, Some(Trigger::InterviewScheduled))
            .await
    }

    /// With an offer letter the status is forced to `offer_extended`;
    /// otherwise `status` must name a canonical status.
    pub async fn update_status_after_interview(
        &self,
        actor: &Actor,
        app_id: Uuid,
        status: Option<String>,
        offer: Option<OfferUpload>,
    ) -> Result<Committed<Application>> {
        ensure_role(actor, &[Role::College], "update application status")?;

        let Some(upload) = offer else {
            let raw = status
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| Error::BadRequest("status is required".to_string()))?;
            let command = Command::RecordInterviewOutcome {
                status: raw.trim().parse::<ApplicationStatus>()?,
            };
            return self.run(actor, app_id, command, None).await;
        };

        // Refuse before writing anything when the record cannot take an offer.
        let current = self.load(actor, app_id).await?;
        let unsaved = StoredFile {
            public_id: String::new(),
            url: String::new(),
        };
        transitions::apply(&current, actor.role, Command::ExtendOffer { letter: unsaved })?;

        let letter = self
            .files
            .store(&upload.data, &upload.file_name, OFFER_LETTER_FOLDER)
            .await?;
        let public_id = letter.public_id.clone();
        let result = self
            .run(actor, app_id, Command::ExtendOffer { letter }, None)
            .await;
        if result.is_err() {
            if let Err(e) = self.files.remove(&public_id).await {
                tracing::warn!(error = %e, public_id = %public_id, "failed to remove orphaned upload");
            }
        }
        result
    }

    pub async fn forward_interview(
        &self,
        actor: &Actor,
        app_id: Uuid,
    ) -> Result<Committed<Application>> {
        self.run(
            actor,
            app_id,
            Command::ForwardInterview,
            Some(Trigger::InterviewForwarded),
        )
        .await
    }

    pub async fn forward_offer(&self, actor: &Actor, app_id: Uuid) -> Result<Committed<Application>> {
        self.run(
            actor,
            app_id,
            Command::ForwardOffer,
            Some(Trigger::OfferForwarded),
        )
        .await
    }

    /// Applicant edit of their own record. An `action` takes precedence over
    /// raw `category`/`status` values since it sets both.
    pub async fn update_application(
        &self,
        actor: &Actor,
        app_id: Uuid,
        payload: UpdateApplicationPayload,
    ) -> Result<Committed<Application>> {
        let command = match payload.action.as_deref().filter(|a| !a.is_empty()) {
            Some(action) => Command::from_action(action)?,
            None => Command::Amend {
                category: payload
                    .category
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .map(str::parse::<ApplicationCategory>)
                    .transpose()?,
                status: payload
                    .status
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<ApplicationStatus>)
                    .transpose()?,
            },
        };
        self.run(actor, app_id, command, None).await
    }

    pub async fn withdraw(&self, actor: &Actor, app_id: Uuid) -> Result<()> {
        ensure_applicant(actor, "withdraw applications")?;
        if !self.applications.delete_owned(app_id, actor.user_id).await? {
            return Err(not_found());
        }
        tracing::info!(application_id = %app_id, user_id = %actor.user_id, "application withdrawn");
        Ok(())
    }

    pub async fn list_by_category(
        &self,
        actor: &Actor,
        category: Option<&str>,
    ) -> Result<Vec<ApplicationWithJob>> {
        ensure_applicant(actor, "list applications")?;
        let category = category
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                Error::BadRequest("Category query parameter is required.".to_string())
            })?
            .parse::<ApplicationCategory>()?;

        let applications = self
            .applications
            .list_for_user(actor.user_id, Some(category))
            .await?;
        self.with_jobs(applications).await
    }

    pub async fn list_for_college_jobs(&self, actor: &Actor) -> Result<Vec<ReviewedApplication>> {
        ensure_role(actor, &[Role::College], "review applications")?;
        self.college_applications(actor.user_id, None).await
    }

    pub async fn list_hired(&self, actor: &Actor) -> Result<Vec<ReviewedApplication>> {
        ensure_role(actor, &[Role::College], "list hired candidates")?;
        self.college_applications(actor.user_id, Some(ApplicationStatus::Hired))
            .await
    }

    pub async fn count_hired(&self, job_ids: &[Uuid]) -> Result<i64> {
        if job_ids.is_empty() {
            return Ok(0);
        }
        Ok(self
            .applications
            .count_for_jobs(job_ids, ApplicationStatus::Hired)
            .await?)
    }

    pub async fn college_stats(&self, actor: &Actor, college_id: Uuid) -> Result<CollegeStats> {
        ensure_role(actor, &[Role::College, Role::Admin], "view college statistics")?;
        if actor.role == Role::College && actor.user_id != college_id {
            return Err(Error::Forbidden(
                "colleges may only view their own statistics".to_string(),
            ));
        }

        let job_ids: Vec<Uuid> = self
            .jobs
            .jobs_posted_by(college_id)
            .await?
            .iter()
            .map(|j| j.id)
            .collect();
        let hired_count = self.count_hired(&job_ids).await?;
        Ok(CollegeStats {
            college_id,
            jobs_posted: job_ids.len(),
            hired_count,
        })
    }

    pub async fn list_workflow(&self, actor: &Actor) -> Result<Vec<ReviewedApplication>> {
        ensure_role(actor, &[Role::Admin], "view the application workflow")?;
        let applications = self
            .applications
            .list_with_statuses(&ApplicationStatus::workflow())
            .await?;
        self.reviewed(applications).await
    }

    pub async fn list_for_applicant(
        &self,
        actor: &Actor,
        user_id: Uuid,
    ) -> Result<Vec<ApplicationWithJob>> {
        ensure_role(actor, &[Role::Admin], "view user applications")?;
        let applications = self.applications.list_for_user(user_id, None).await?;
        self.with_jobs(applications).await
    }

    pub async fn delete_job(&self, actor: &Actor, job_id: Uuid) -> Result<u64> {
        ensure_role(actor, &[Role::Admin], "delete jobs")?;
        let removed = self
            .jobs
            .delete_job_cascade(job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found.".to_string()))?;
        tracing::info!(job_id = %job_id, applications_removed = removed, "job deleted");
        Ok(removed)
    }

    /// Applicants see their own records and colleges see records on jobs they
    /// posted. Anything else is reported as missing.
    async fn load(&self, actor: &Actor, app_id: Uuid) -> Result<Application> {
        let app = self.applications.find(app_id).await?.ok_or_else(not_found)?;
        let visible = match actor.role {
            role if role.is_applicant() => app.user_id == actor.user_id,
            Role::College => self
                .jobs
                .find_job(app.job_id)
                .await?
                .is_some_and(|job| job.posted_by == actor.user_id),
            _ => true,
        };
        if visible {
            Ok(app)
        } else {
            Err(not_found())
        }
    }

    /// Read, transition, compare-and-swap. A lost race re-reads and
    /// re-evaluates the command against the winner's state.
    async fn run(
        &self,
        actor: &Actor,
        app_id: Uuid,
        command: Command,
        trigger: Option<Trigger>,
    ) -> Result<Committed<Application>> {
        ensure_role(actor, command.permitted_roles(), command.name())?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let current = self.load(actor, app_id).await?;
            let next = match transitions::apply(&current, actor.role, command.clone())? {
                Outcome::Unchanged => {
                    return Ok(Committed {
                        record: current,
                        changed: false,
                        notification: NotificationOutcome::NotRequired,
                    });
                }
                Outcome::Changed(next) => next,
            };

            if let Some(stored) = self
                .applications
                .compare_and_swap(current.version, &next)
                .await?
            {
                tracing::info!(
                    application_id = %app_id,
                    command = command.name(),
                    from = %current.status,
                    to = %stored.status,
                    category = %stored.category,
                    "application transitioned"
                );
                let notification = match trigger {
                    Some(trigger) => self.notify(trigger, &stored).await,
                    None => NotificationOutcome::NotRequired,
                };
                return Ok(Committed {
                    record: stored,
                    changed: true,
                    notification,
                });
            }
            tracing::warn!(application_id = %app_id, attempt, "version conflict, re-evaluating");
        }

        Err(Error::Conflict(
            "Application was modified concurrently, please retry.".to_string(),
        ))
    }

    async fn notify(&self, trigger: Trigger, application: &Application) -> NotificationOutcome {
        let notices = match self.notices_for(trigger, application).await {
            Ok(notices) => notices,
            Err(e) => {
                tracing::warn!(error = %e, application_id = %application.id, "could not build notifications");
                return NotificationOutcome::Dropped(e.to_string());
            }
        };
        if notices.is_empty() {
            return NotificationOutcome::NotRequired;
        }

        let mut queued = 0;
        let mut failure = None;
        for notice in notices {
            let recipient = notice.recipient_id;
            match self.notifier.dispatch(notice) {
                Ok(()) => queued += 1,
                Err(e) => {
                    tracing::warn!(error = %e, recipient_id = %recipient, application_id = %application.id, "notification dropped");
                    failure = Some(e.to_string());
                }
            }
        }
        match failure {
            Some(reason) => NotificationOutcome::Dropped(reason),
            None => NotificationOutcome::Queued(queued),
        }
    }

    async fn notices_for(&self, trigger: Trigger, application: &Application) -> Result<Vec<Notice>> {
        let job = self
            .jobs
            .find_job(application.job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found.".to_string()))?;

        let notices = match trigger {
            Trigger::InterviewScheduled => {
                let message = format!(
                    "{} scheduled an interview for the {} position. Please review and forward it to the candidate.",
                    job.school_name, job.title
                );
                self.users
                    .user_ids_with_role(Role::Admin)
                    .await?
                    .into_iter()
                    .map(|admin| Notice::new(admin, message.clone(), "/admin/workflow"))
                    .collect()
            }
            Trigger::InterviewForwarded => vec![Notice::new(
                application.user_id,
                format!(
                    "An interview has been scheduled for the {} position. Please check your applications for details.",
                    job.title
                ),
                "/my-jobs?category=interviews",
            )],
            Trigger::OfferForwarded => vec![Notice::new(
                application.user_id,
                format!(
                    "Congratulations! You have received an offer for the {} position.",
                    job.title
                ),
                "/my-jobs?category=offers",
            )],
        };
        Ok(notices)
    }

    async fn college_applications(
        &self,
        college_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ReviewedApplication>> {
        let job_ids: Vec<Uuid> = self
            .jobs
            .jobs_posted_by(college_id)
            .await?
            .iter()
            .map(|j| j.id)
            .collect();
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let applications = self.applications.list_for_jobs(&job_ids, status).await?;
        self.reviewed(applications).await
    }

    async fn job_summaries(&self, applications: &[Application]) -> Result<HashMap<Uuid, JobSummary>> {
        let ids = unique_ids(applications.iter().map(|a| a.job_id));
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let jobs = self.jobs.find_jobs(&ids).await?;
        Ok(jobs.iter().map(|j| (j.id, JobSummary::from(j))).collect())
    }

    async fn with_jobs(&self, applications: Vec<Application>) -> Result<Vec<ApplicationWithJob>> {
        let jobs = self.job_summaries(&applications).await?;
        Ok(applications
            .into_iter()
            .map(|application| ApplicationWithJob {
                job: jobs.get(&application.job_id).cloned(),
                application,
            })
            .collect())
    }

    async fn reviewed(&self, applications: Vec<Application>) -> Result<Vec<ReviewedApplication>> {
        let jobs = self.job_summaries(&applications).await?;
        let user_ids = unique_ids(applications.iter().map(|a| a.user_id));
        let applicants: HashMap<Uuid, ApplicantSummary> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            self.users
                .applicant_summaries(&user_ids)
                .await?
                .into_iter()
                .map(|s| (s.user_id, s))
                .collect()
        };

        Ok(applications
            .into_iter()
            .map(|application| ReviewedApplication {
                applicant: applicants.get(&application.user_id).cloned(),
                job: jobs.get(&application.job_id).cloned(),
                application,
            })
            .collect())
    }
}
