use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::application::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Employer,
    Admin,
    College,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Employer => "employer",
            Self::Admin => "admin",
            Self::College => "college",
        }
    }

    /// Roles that look for jobs and own applications.
    pub const fn is_applicant(self) -> bool {
        matches!(self, Self::Employee | Self::Employer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "employer" => Ok(Self::Employer),
            "admin" => Ok(Self::Admin),
            "college" => Ok(Self::College),
            _ => Err(UnknownVariant {
                field: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// Applicant identity joined from `users` and `employer_profiles`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantSummary {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub headline: Option<String>,
}
