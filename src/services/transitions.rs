//! Application state machine.
//!
//! `apply` is a pure function from the current record and a command to the
//! next record. It knows nothing about storage or notifications; the
//! lifecycle service reads, calls `apply`, then commits with a version check.

use chrono::{DateTime, Utc};

use crate::models::application::{
    Application, ApplicationCategory, ApplicationStatus, InterviewDetails, OfferLetter,
};
use crate::models::user::Role;
use crate::services::file_store::StoredFile;

const APPLICANTS: &[Role] = &[Role::Employee, Role::Employer];
const COLLEGE: &[Role] = &[Role::College];
const ADMIN: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Shortlist,
    ScheduleInterview {
        meeting_link: String,
        date_time: DateTime<Utc>,
        instructions: Option<String>,
    },
    RecordInterviewOutcome {
        status: ApplicationStatus,
    },
    ExtendOffer {
        letter: StoredFile,
    },
    ForwardInterview,
    ForwardOffer,
    Amend {
        category: Option<ApplicationCategory>,
        status: Option<ApplicationStatus>,
    },
    AcceptOffer,
    DeclineOffer,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Shortlist => "shortlist",
            Command::ScheduleInterview { .. } => "schedule_interview",
            Command::RecordInterviewOutcome { .. } => "update_status",
            Command::ExtendOffer { .. } => "extend_offer",
            Command::ForwardInterview => "forward_interview",
            Command::ForwardOffer => "forward_offer",
            Command::Amend { .. } => "update_application",
            Command::AcceptOffer => "accept_offer",
            Command::DeclineOffer => "decline_offer",
        }
    }

    pub fn permitted_roles(&self) -> &'static [Role] {
        match self {
            Command::Shortlist
            | Command::ScheduleInterview { .. }
            | Command::RecordInterviewOutcome { .. }
            | Command::ExtendOffer { .. } => COLLEGE,
            Command::ForwardInterview | Command::ForwardOffer => ADMIN,
            Command::Amend { .. } | Command::AcceptOffer | Command::DeclineOffer => APPLICANTS,
        }
    }

    /// Parses the applicant-side `action` field.
    pub fn from_action(action: &str) -> Result<Self, TransitionError> {
        match action {
            "accept_offer" => Ok(Command::AcceptOffer),
            "decline_offer" => Ok(Command::DeclineOffer),
            other => Err(TransitionError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Changed(Application),
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("role '{role}' may not {command}")]
    RoleNotPermitted { role: Role, command: &'static str },

    #[error("cannot {command} an application that is {status}")]
    IllegalFrom {
        command: &'static str,
        status: ApplicationStatus,
    },

    #[error("cannot {command} a saved job that has not been applied to")]
    NotSubmitted { command: &'static str },

    #[error("no interview has been scheduled for this application")]
    MissingInterview,

    #[error("status offer_extended requires an offer letter upload")]
    MissingOfferLetter,

    #[error("no offer letter has been uploaded for this application")]
    NoOfferToForward,

    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

pub fn apply(
    current: &Application,
    role: Role,
    command: Command,
) -> Result<Outcome, TransitionError> {
    let name = command.name();
    if !command.permitted_roles().contains(&role) {
        return Err(TransitionError::RoleNotPermitted {
            role,
            command: name,
        });
    }

    let status = current.status;
    let illegal = || TransitionError::IllegalFrom {
        command: name,
        status,
    };

    if matches!(role, Role::College) {
        if current.category == ApplicationCategory::Saved {
            return Err(TransitionError::NotSubmitted { command: name });
        }
        if status.is_terminal() {
            return Err(illegal());
        }
    }

    let mut next = current.clone();
    match command {
        Command::Shortlist => {
            if status == ApplicationStatus::Shortlisted {
                return Ok(Outcome::Unchanged);
            }
            if status != ApplicationStatus::Applied {
                return Err(illegal());
            }
            next.status = ApplicationStatus::Shortlisted;
        }
        Command::ScheduleInterview {
            meeting_link,
            date_time,
            instructions,
        } => {
            if !matches!(
                status,
                ApplicationStatus::Applied
                    | ApplicationStatus::Shortlisted
                    | ApplicationStatus::InterviewScheduled
            ) {
                return Err(illegal());
            }
            next.status = ApplicationStatus::InterviewScheduled;
            next.category = ApplicationCategory::Interviews;
            next.interview_details = Some(InterviewDetails {
                meeting_link,
                date_time,
                instructions,
                confirmed_by_admin: false,
            });
        }
        Command::RecordInterviewOutcome { status: target } => {
            if target == status {
                return Ok(Outcome::Unchanged);
            }
            match target {
                ApplicationStatus::OfferExtended => {
                    if current.offer_letter.is_none() {
                        return Err(TransitionError::MissingOfferLetter);
                    }
                    next.category = ApplicationCategory::Offers;
                }
                ApplicationStatus::Hired => next.category = ApplicationCategory::Hired,
                ApplicationStatus::Rejected => next.category = ApplicationCategory::Archived,
                _ => {}
            }
            next.status = target;
        }
        Command::ExtendOffer { letter } => {
            next.status = ApplicationStatus::OfferExtended;
            next.category = ApplicationCategory::Offers;
            next.offer_letter = Some(OfferLetter {
                public_id: letter.public_id,
                url: letter.url,
                forwarded_by_admin: false,
            });
        }
        Command::ForwardInterview => {
            let details = next
                .interview_details
                .as_mut()
                .ok_or(TransitionError::MissingInterview)?;
            if details.confirmed_by_admin {
                return Ok(Outcome::Unchanged);
            }
            if status != ApplicationStatus::InterviewScheduled {
                return Err(illegal());
            }
            details.confirmed_by_admin = true;
        }
        Command::ForwardOffer => {
            let letter = next
                .offer_letter
                .as_mut()
                .ok_or(TransitionError::NoOfferToForward)?;
            if letter.forwarded_by_admin {
                return Ok(Outcome::Unchanged);
            }
            if !matches!(
                status,
                ApplicationStatus::OfferExtended | ApplicationStatus::Hired
            ) {
                return Err(illegal());
            }
            letter.forwarded_by_admin = true;
            next.status = ApplicationStatus::Hired;
            next.category = ApplicationCategory::Hired;
        }
        Command::Amend { category, status } => {
            if let Some(category) = category {
                next.category = category;
            }
            if let Some(status) = status {
                next.status = status;
            }
        }
        // Applicants own their record; the offer actions are shorthands for
        // the matching status/category pair and apply from any state.
        Command::AcceptOffer => {
            next.status = ApplicationStatus::Hired;
            next.category = ApplicationCategory::Hired;
        }
        Command::DeclineOffer => {
            next.status = ApplicationStatus::Rejected;
            next.category = ApplicationCategory::Archived;
        }
    }

    if next == *current {
        Ok(Outcome::Unchanged)
    } else {
        Ok(Outcome::Changed(next))
    }
}
