// libs/booking-cell/src/services/validation.rs
use availability_cell::BookingWindow;

use crate::error::{ValidationError, ValidationIssue};
use crate::models::{AppliedSlots, StepId, WizardSelection};

/// Per-step check run before the wizard moves forward. Pure: no I/O and no
/// mutation.
pub struct ValidationGate;

impl ValidationGate {
    pub fn can_advance(
        step: StepId,
        selection: &WizardSelection,
        window: &BookingWindow,
        slots: Option<&AppliedSlots>,
    ) -> Result<(), ValidationError> {
        let issues = match step {
            StepId::SelectPet => Self::pet_issues(selection),
            StepId::SelectService => Self::service_issues(selection),
            StepId::SelectDateTime => Self::date_time_issues(selection, window, slots),
            StepId::SymptomsNotes => Vec::new(),
            StepId::Confirm => {
                let mut issues = Self::pet_issues(selection);
                issues.extend(Self::service_issues(selection));
                issues.extend(Self::date_time_issues(selection, window, slots));
                issues
            }
        };

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(step, issues))
        }
    }

    fn pet_issues(selection: &WizardSelection) -> Vec<ValidationIssue> {
        match selection.pet_id {
            Some(_) => Vec::new(),
            None => vec![ValidationIssue::PetNotSelected],
        }
    }

    fn service_issues(selection: &WizardSelection) -> Vec<ValidationIssue> {
        match selection.service_type {
            Some(_) => Vec::new(),
            None => vec![ValidationIssue::ServiceNotSelected],
        }
    }

    fn date_time_issues(
        selection: &WizardSelection,
        window: &BookingWindow,
        slots: Option<&AppliedSlots>,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        match selection.date {
            None => issues.push(ValidationIssue::DateNotSelected),
            Some(date) if !window.contains(date) => {
                issues.push(ValidationIssue::DateOutsideWindow(date))
            }
            Some(_) => {}
        }

        match selection.time {
            None => issues.push(ValidationIssue::TimeNotSelected),
            Some(time) => {
                // The time must come from the list resolved for the current
                // (date, veterinarian), not from an earlier one.
                let offered = match (slots, selection.slot_key()) {
                    (Some(applied), Some(key)) => {
                        applied.key == key && applied.resolution.offers(time)
                    }
                    _ => false,
                };
                if !offered {
                    issues.push(ValidationIssue::TimeNotOffered(time));
                }
            }
        }

        issues
    }
}
