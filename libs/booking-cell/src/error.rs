use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use thiserror::Error;

use availability_cell::AvailabilityError;
use shared_models::ApiError;

use crate::models::StepId;

/// A single reason a step cannot be left yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    PetNotSelected,
    ServiceNotSelected,
    DateNotSelected,
    DateOutsideWindow(NaiveDate),
    TimeNotSelected,
    TimeNotOffered(NaiveTime),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::PetNotSelected => write!(f, "pet not selected"),
            ValidationIssue::ServiceNotSelected => write!(f, "service not selected"),
            ValidationIssue::DateNotSelected => write!(f, "date not selected"),
            ValidationIssue::DateOutsideWindow(date) => {
                write!(f, "date {} is outside the booking window", date)
            }
            ValidationIssue::TimeNotSelected => write!(f, "no time selected"),
            ValidationIssue::TimeNotOffered(time) => {
                write!(f, "time {} is not available", time.format("%H:%M"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub step: StepId,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(step: StepId, issues: Vec<ValidationIssue>) -> Self {
        Self { step, issues }
    }

    pub fn single(step: StepId, issue: ValidationIssue) -> Self {
        Self::new(step, vec![issue])
    }

    pub fn has(&self, issue: &ValidationIssue) -> bool {
        self.issues.contains(issue)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error("A booking submission is already in progress")]
    AlreadyInFlight,

    #[error("Booking service unreachable: {0}")]
    Network(String),

    #[error("Booking rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid booking response: {0}")]
    InvalidResponse(String),

    #[error("Booking submission interrupted: {0}")]
    Interrupted(String),
}

impl From<ApiError> for SubmissionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, message } => SubmissionError::Rejected { status, message },
            ApiError::Decode(msg) => SubmissionError::InvalidResponse(msg),
            ApiError::Network(msg) | ApiError::Timeout(msg) | ApiError::NotConfigured(msg) => {
                SubmissionError::Network(msg)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("A booking submission is in progress")]
    SubmissionInFlight,

    #[error("No booking submission is pending")]
    NoSubmissionPending,

    #[error("Booking session is closed")]
    Closed,
}

impl WizardError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            WizardError::Validation(err) => Some(err),
            _ => None,
        }
    }
}
