// libs/booking-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use availability_cell::{SlotKey, SlotQuery, SlotResolution};
use shared_models::{
    BookingId, HospitalId, HospitalSummary, PetId, PetSummary, VeterinarianId,
};

use crate::error::SubmissionError;

// ==============================================================================
// SELECTION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[serde(alias = "consultation", alias = "general_consultation")]
    General,
    #[serde(alias = "vaccine", alias = "shots")]
    Vaccination,
    #[serde(alias = "urgent")]
    Emergency,
    #[serde(alias = "operation")]
    Surgery,
    #[serde(alias = "teeth", alias = "scaling")]
    Dental,
    #[serde(alias = "health_check", alias = "check_up")]
    Checkup,
    Grooming,
}

impl ServiceType {
    pub const ALL: [ServiceType; 7] = [
        ServiceType::General,
        ServiceType::Vaccination,
        ServiceType::Emergency,
        ServiceType::Surgery,
        ServiceType::Dental,
        ServiceType::Checkup,
        ServiceType::Grooming,
    ];
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceType::General => write!(f, "general"),
            ServiceType::Vaccination => write!(f, "vaccination"),
            ServiceType::Emergency => write!(f, "emergency"),
            ServiceType::Surgery => write!(f, "surgery"),
            ServiceType::Dental => write!(f, "dental"),
            ServiceType::Checkup => write!(f, "checkup"),
            ServiceType::Grooming => write!(f, "grooming"),
        }
    }
}

/// Everything the user has picked so far. Fields fill in step by step and are
/// kept when the user steps back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardSelection {
    pub pet_id: Option<PetId>,
    pub service_type: Option<ServiceType>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub veterinarian_id: Option<VeterinarianId>,
    pub symptoms: String,
    pub notes: Option<String>,
}

impl WizardSelection {
    /// Key the chosen time must belong to, once a date is picked.
    pub fn slot_key(&self) -> Option<SlotKey> {
        self.date.map(|date| SlotKey {
            date,
            veterinarian_id: self.veterinarian_id.clone(),
        })
    }
}

// ==============================================================================
// WIZARD STATE
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    SelectPet,
    SelectService,
    SelectDateTime,
    SymptomsNotes,
    Confirm,
}

impl StepId {
    pub const ORDER: [StepId; 5] = [
        StepId::SelectPet,
        StepId::SelectService,
        StepId::SelectDateTime,
        StepId::SymptomsNotes,
        StepId::Confirm,
    ];

    pub fn index(self) -> usize {
        match self {
            StepId::SelectPet => 0,
            StepId::SelectService => 1,
            StepId::SelectDateTime => 2,
            StepId::SymptomsNotes => 3,
            StepId::Confirm => 4,
        }
    }

    pub fn next(self) -> Option<StepId> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<StepId> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepId::SelectPet => write!(f, "select_pet"),
            StepId::SelectService => write!(f, "select_service"),
            StepId::SelectDateTime => write!(f, "select_date_time"),
            StepId::SymptomsNotes => write!(f, "symptoms_notes"),
            StepId::Confirm => write!(f, "confirm"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending,
    Succeeded(BookingId),
    /// Last attempt failed; the wizard stays at `Confirm` and may retry.
    Failed(String),
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionState::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub step: StepId,
    pub selection: WizardSelection,
    pub submission: SubmissionState,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: StepId::SelectPet,
            selection: WizardSelection::default(),
            submission: SubmissionState::Idle,
        }
    }
}

/// Slot list last applied to the wizard, with the key it was resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSlots {
    pub key: SlotKey,
    pub resolution: SlotResolution,
}

// ==============================================================================
// TRANSITIONS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved forward. Entering the date/time step may need fresh slots.
    Moved {
        step: StepId,
        slot_query: Option<SlotQuery>,
    },
    /// `Confirm` passed validation; the payload must be submitted.
    Submit(BookingPayload),
    /// A submission is already running; nothing changed.
    SubmissionPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    Moved(StepId),
    /// Stepping back from the first step leaves the booking flow.
    ExitFlow,
}

/// What a session-level `advance` ended in.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Moved(StepId),
    Submitted(BookingId),
    SubmissionFailed(SubmissionError),
    SubmissionPending,
}

/// Exit events for the surrounding navigation shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEvent {
    Submitted(BookingId),
    Cancelled,
    SubmissionFailed(String),
}

// ==============================================================================
// WIRE MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub hospital_id: HospitalId,
    pub pet_id: PetId,
    pub date: NaiveDate,
    #[serde(with = "shared_models::time_format")]
    pub time: NaiveTime,
    pub service_type: ServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian_id: Option<VeterinarianId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
}

/// Data shown on the `Confirm` screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationSummary {
    pub hospital_id: HospitalId,
    pub hospital: Option<HospitalSummary>,
    pub pet_id: PetId,
    pub pet: Option<PetSummary>,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub veterinarian_name: Option<String>,
    pub symptoms: String,
    pub notes: Option<String>,
    pub slots_degraded: bool,
}

impl ConfirmationSummary {
    pub fn pet_label(&self) -> &str {
        self.pet.as_ref().map(|p| p.name.as_str()).unwrap_or(self.pet_id.as_str())
    }

    pub fn hospital_label(&self) -> &str {
        self.hospital
            .as_ref()
            .map(|h| h.name.as_str())
            .unwrap_or(self.hospital_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order_round_trip() {
        for step in StepId::ORDER {
            if let Some(next) = step.next() {
                assert_eq!(next.previous(), Some(step));
            }
        }
        assert_eq!(StepId::SelectPet.previous(), None);
        assert_eq!(StepId::Confirm.next(), None);
    }

    #[test]
    fn test_service_type_aliases() {
        let parsed: ServiceType = serde_json::from_str("\"consultation\"").unwrap();
        assert_eq!(parsed, ServiceType::General);
        assert_eq!(serde_json::to_string(&ServiceType::Checkup).unwrap(), "\"checkup\"");
    }

    #[test]
    fn test_service_type_display_matches_wire_name() {
        for service in ServiceType::ALL {
            let wire = serde_json::to_value(service).unwrap();
            assert_eq!(wire, service.to_string());
        }
    }

    #[test]
    fn test_payload_wire_format() {
        let payload = BookingPayload {
            hospital_id: HospitalId::from("h1"),
            pet_id: PetId::from("p1"),
            date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            service_type: ServiceType::General,
            veterinarian_id: None,
            symptoms: None,
            notes: Some("bring vaccine record".to_string()),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["hospitalId"], "h1");
        assert_eq!(value["date"], "2026-01-20");
        assert_eq!(value["time"], "09:30");
        assert_eq!(value["serviceType"], "general");
        assert!(value.get("symptoms").is_none());
        assert!(value.get("veterinarianId").is_none());
    }
}
