use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fine-grained workflow state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    InterviewScheduled,
    OfferExtended,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Shortlisted => "shortlisted",
            Self::InterviewScheduled => "interview_scheduled",
            Self::OfferExtended => "offer_extended",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }

    /// Statuses surfaced on the admin workflow board.
    pub const fn workflow() -> [Self; 4] {
        [
            Self::InterviewScheduled,
            Self::OfferExtended,
            Self::Hired,
            Self::Rejected,
        ]
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(Self::Applied),
            "shortlisted" => Ok(Self::Shortlisted),
            "interview_scheduled" => Ok(Self::InterviewScheduled),
            "offer_extended" => Ok(Self::OfferExtended),
            "hired" => Ok(Self::Hired),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownVariant::new("status", other)),
        }
    }
}

/// Inbox bucket the applicant sees, independent of status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationCategory {
    Saved,
    Applied,
    Interviews,
    Offers,
    Hired,
    Archived,
}

impl ApplicationCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::Applied => "applied",
            Self::Interviews => "interviews",
            Self::Offers => "offers",
            Self::Hired => "hired",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ApplicationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saved" => Ok(Self::Saved),
            "applied" => Ok(Self::Applied),
            "interviews" => Ok(Self::Interviews),
            "offers" => Ok(Self::Offers),
            "hired" => Ok(Self::Hired),
            "archived" => Ok(Self::Archived),
            other => Err(UnknownVariant::new("category", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} '{value}'")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewDetails {
    pub meeting_link: String,
    pub date_time: DateTime<Utc>,
    pub instructions: Option<String>,
    pub confirmed_by_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferLetter {
    pub public_id: String,
    pub url: String,
    pub forwarded_by_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub category: ApplicationCategory,
    pub interview_details: Option<InterviewDetails>,
    pub offer_letter: Option<OfferLetter>,
    pub applied_date: DateTime<Utc>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(user_id: Uuid, job_id: Uuid, category: ApplicationCategory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            job_id,
            status: ApplicationStatus::Applied,
            category,
            interview_details: None,
            offer_letter: None,
            applied_date: now,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Flat row shape of the `applications` table.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub category: String,
    pub interview_meeting_link: Option<String>,
    pub interview_date_time: Option<DateTime<Utc>>,
    pub interview_instructions: Option<String>,
    pub interview_confirmed_by_admin: bool,
    pub offer_letter_public_id: Option<String>,
    pub offer_letter_url: Option<String>,
    pub offer_forwarded_by_admin: bool,
    pub applied_date: DateTime<Utc>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = UnknownVariant;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let interview_details = match (row.interview_meeting_link, row.interview_date_time) {
            (Some(meeting_link), Some(date_time)) => Some(InterviewDetails {
                meeting_link,
                date_time,
                instructions: row.interview_instructions,
                confirmed_by_admin: row.interview_confirmed_by_admin,
            }),
            _ => None,
        };
        let offer_letter = match (row.offer_letter_public_id, row.offer_letter_url) {
            (Some(public_id), Some(url)) => Some(OfferLetter {
                public_id,
                url,
                forwarded_by_admin: row.offer_forwarded_by_admin,
            }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            job_id: row.job_id,
            status: row.status.parse()?,
            category: row.category.parse()?,
            interview_details,
            offer_letter,
            applied_date: row.applied_date,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
