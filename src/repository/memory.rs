use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use axum::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{ApplicationStore, JobDirectory, NotificationStore, StoreError, UserDirectory};
use crate::models::application::{Application, ApplicationCategory, ApplicationStatus};
use crate::models::job::Job;
use crate::models::notification::{Notice, Notification};
use crate::models::user::{ApplicantSummary, Role};

#[derive(Default)]
struct Tables {
    applications: HashMap<Uuid, Application>,
    jobs: HashMap<Uuid, Job>,
    users: HashMap<Uuid, (Role, ApplicantSummary)>,
    notifications: Vec<Notification>,
    races: HashMap<Uuid, (usize, fn(&mut Application))>,
}

/// Map-backed store mirroring the Postgres semantics closely enough for
/// service and router tests.
#[derive(Default)]
pub(crate) struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store mutex poisoned")
    }

    pub(crate) fn add_user(&self, role: Role, email: &str, name: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        let summary = ApplicantSummary {
            user_id: id,
            email: email.to_string(),
            name: name.map(str::to_string),
            headline: None,
        };
        self.lock().users.insert(id, (role, summary));
        id
    }

    pub(crate) fn add_job(&self, posted_by: Uuid, title: &str, status: &str) -> Uuid {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            title: title.to_string(),
            school_name: "Greenfield High".to_string(),
            location: "Pune".to_string(),
            salary: None,
            job_type: Some("full_time".to_string()),
            description: None,
            posted_by,
            approved_by: None,
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = job.id;
        self.lock().jobs.insert(id, job);
        id
    }

    pub(crate) fn application(&self, id: Uuid) -> Option<Application> {
        self.lock().applications.get(&id).cloned()
    }

    pub(crate) fn application_count(&self) -> usize {
        self.lock().applications.len()
    }

    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    /// The next `times` swaps on `id` lose to a writer that applies `mutate`
    /// between the caller's read and its commit.
    pub(crate) fn race(&self, id: Uuid, times: usize, mutate: fn(&mut Application)) {
        self.lock().races.insert(id, (times, mutate));
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert(&self, application: &Application) -> Result<Application, StoreError> {
        let mut tables = self.lock();
        let duplicate = tables
            .applications
            .values()
            .any(|a| a.user_id == application.user_id && a.job_id == application.job_id);
        if duplicate {
            return Err(StoreError::Conflict(
                "You have already applied for this job.".to_string(),
            ));
        }
        tables
            .applications
            .insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn insert_if_absent(
        &self,
        application: &Application,
    ) -> Result<Application, StoreError> {
        let mut tables = self.lock();
        if let Some(existing) = tables
            .applications
            .values()
            .find(|a| a.user_id == application.user_id && a.job_id == application.job_id)
        {
            return Ok(existing.clone());
        }
        tables
            .applications
            .insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        Ok(self.lock().applications.get(&id).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected_version: i32,
        next: &Application,
    ) -> Result<Option<Application>, StoreError> {
        let mut tables = self.lock();
        let rival = match tables.races.get_mut(&next.id) {
            Some((remaining, mutate)) if *remaining > 0 => {
                *remaining -= 1;
                Some(*mutate)
            }
            _ => None,
        };
        if let (Some(mutate), Some(current)) = (rival, tables.applications.get_mut(&next.id)) {
            mutate(current);
            current.version += 1;
        }
        match tables.applications.get_mut(&next.id) {
            Some(current) if current.version == expected_version => {
                let mut stored = next.clone();
                stored.version = expected_version + 1;
                stored.updated_at = Utc::now();
                *current = stored.clone();
                Ok(Some(stored))
            }
            _ => Ok(None),
        }
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        let owned = tables
            .applications
            .get(&id)
            .is_some_and(|a| a.user_id == user_id);
        if owned {
            tables.applications.remove(&id);
        }
        Ok(owned)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        category: Option<ApplicationCategory>,
    ) -> Result<Vec<Application>, StoreError> {
        let mut rows: Vec<Application> = self
            .lock()
            .applications
            .values()
            .filter(|a| a.user_id == user_id && category.map_or(true, |c| a.category == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn list_for_jobs(
        &self,
        job_ids: &[Uuid],
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, StoreError> {
        let mut rows: Vec<Application> = self
            .lock()
            .applications
            .values()
            .filter(|a| job_ids.contains(&a.job_id) && status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn list_with_statuses(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, StoreError> {
        let mut rows: Vec<Application> = self
            .lock()
            .applications
            .values()
            .filter(|a| statuses.contains(&a.status))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn count_for_jobs(
        &self,
        job_ids: &[Uuid],
        status: ApplicationStatus,
    ) -> Result<i64, StoreError> {
        let count = self
            .lock()
            .applications
            .values()
            .filter(|a| job_ids.contains(&a.job_id) && a.status == status)
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl JobDirectory for MemoryStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.lock().jobs.get(&id).cloned())
    }

    async fn find_jobs(&self, ids: &[Uuid]) -> Result<Vec<Job>, StoreError> {
        let tables = self.lock();
        Ok(ids.iter().filter_map(|id| tables.jobs.get(id).cloned()).collect())
    }

    async fn jobs_posted_by(&self, college_id: Uuid) -> Result<Vec<Job>, StoreError> {
        Ok(self
            .lock()
            .jobs
            .values()
            .filter(|j| j.posted_by == college_id)
            .cloned()
            .collect())
    }

    async fn delete_job_cascade(&self, id: Uuid) -> Result<Option<u64>, StoreError> {
        let mut tables = self.lock();
        if tables.jobs.remove(&id).is_none() {
            return Ok(None);
        }
        let before = tables.applications.len();
        tables.applications.retain(|_, a| a.job_id != id);
        Ok(Some((before - tables.applications.len()) as u64))
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn applicant_summaries(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<ApplicantSummary>, StoreError> {
        let tables = self.lock();
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(|(_, s)| s.clone()))
            .collect())
    }

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|(_, (r, _))| *r == role)
            .map(|(id, _)| *id)
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notice: &Notice) -> Result<Notification, StoreError> {
        let row = Notification {
            id: Uuid::new_v4(),
            recipient_id: notice.recipient_id,
            message: notice.message.clone(),
            link: Some(notice.link.clone()),
            read: false,
            created_at: Utc::now(),
        };
        self.lock().notifications.push(row.clone());
        Ok(row)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut rows: Vec<Notification> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.lock();
        let mut changed = 0;
        for n in tables
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
        {
            n.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
