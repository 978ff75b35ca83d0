// libs/availability-cell/src/models.rs
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use shared_models::{HospitalId, VeterinarianId};

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// One bookable time of day at a hospital on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[serde(with = "shared_models::time_format")]
    pub time: NaiveTime,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian_id: Option<VeterinarianId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian_name: Option<String>,
}

fn default_available() -> bool {
    true
}

impl TimeSlot {
    pub fn open(time: NaiveTime) -> Self {
        Self {
            time,
            available: true,
            veterinarian_id: None,
            veterinarian_name: None,
        }
    }

    pub fn with_veterinarian(mut self, id: VeterinarianId, name: Option<String>) -> Self {
        self.veterinarian_id = Some(id);
        self.veterinarian_name = name;
        self
    }

    pub fn is_bookable(&self) -> bool {
        self.available
    }
}

/// The `(date, veterinarian)` pair a slot list was resolved for. A chosen time
/// is only meaningful together with the key that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub veterinarian_id: Option<VeterinarianId>,
}

/// A sequenced availability request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    pub sequence: u64,
    pub hospital_id: HospitalId,
    pub date: NaiveDate,
    pub veterinarian_id: Option<VeterinarianId>,
}

impl SlotQuery {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            date: self.date,
            veterinarian_id: self.veterinarian_id.clone(),
        }
    }
}

// ==============================================================================
// RESOLUTION RESULT
// ==============================================================================

/// Why the fallback template was used instead of hospital data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedCause {
    /// The hospital answered with no slots at all.
    EmptyUpstream,
    /// The availability service could not be reached or answered with an error.
    Unreachable(String),
}

impl fmt::Display for DegradedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedCause::EmptyUpstream => write!(f, "availability service returned no slots"),
            DegradedCause::Unreachable(reason) => {
                write!(f, "availability service unreachable: {}", reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotResolution {
    /// Slots came from the hospital.
    Live(Vec<TimeSlot>),
    /// Slots came from the fallback template.
    Degraded {
        slots: Vec<TimeSlot>,
        cause: DegradedCause,
    },
}

impl SlotResolution {
    pub fn slots(&self) -> &[TimeSlot] {
        match self {
            SlotResolution::Live(slots) => slots,
            SlotResolution::Degraded { slots, .. } => slots,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SlotResolution::Degraded { .. })
    }

    pub fn degraded_cause(&self) -> Option<&DegradedCause> {
        match self {
            SlotResolution::Live(_) => None,
            SlotResolution::Degraded { cause, .. } => Some(cause),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    pub fn find(&self, time: NaiveTime) -> Option<&TimeSlot> {
        self.slots().iter().find(|slot| slot.time == time)
    }

    /// True when `time` is offered and still open.
    pub fn offers(&self, time: NaiveTime) -> bool {
        self.find(time).map(TimeSlot::is_bookable).unwrap_or(false)
    }
}

// ==============================================================================
// BOOKING WINDOW
// ==============================================================================

/// Rolling window of bookable dates: `[first, first + days - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    first: NaiveDate,
    days: u32,
}

impl BookingWindow {
    pub fn new(first: NaiveDate, days: u32) -> Self {
        Self { first, days: days.max(1) }
    }

    pub fn starting_today(days: u32) -> Self {
        Self::new(Local::now().date_naive(), days)
    }

    pub fn first(&self) -> NaiveDate {
        self.first
    }

    pub fn last(&self) -> NaiveDate {
        self.first + Duration::days(i64::from(self.days) - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last()
    }
}
