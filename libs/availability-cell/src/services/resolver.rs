// libs/availability-cell/src/services/resolver.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use shared_models::{HospitalId, VeterinarianId};

use crate::error::AvailabilityError;
use crate::models::{BookingWindow, DegradedCause, SlotQuery, SlotResolution, TimeSlot};
use crate::services::fallback::FallbackSchedule;
use crate::services::source::SlotSource;

pub struct SlotResolver {
    source: Arc<dyn SlotSource>,
    fallback: FallbackSchedule,
    window: BookingWindow,
}

impl SlotResolver {
    pub fn new(source: Arc<dyn SlotSource>, window: BookingWindow) -> Self {
        Self {
            source,
            fallback: FallbackSchedule::default(),
            window,
        }
    }

    pub fn with_fallback(
        source: Arc<dyn SlotSource>,
        window: BookingWindow,
        fallback: FallbackSchedule,
    ) -> Self {
        Self { source, fallback, window }
    }

    pub fn window(&self) -> BookingWindow {
        self.window
    }

    pub async fn resolve_query(&self, query: &SlotQuery) -> Result<SlotResolution, AvailabilityError> {
        self.resolve(&query.hospital_id, query.date, query.veterinarian_id.as_ref())
            .await
    }

    /// Ordered bookable slots for a hospital and date, optionally for one
    /// veterinarian.
    ///
    /// An empty or failing upstream never blocks booking: the fallback template
    /// is used and the result is marked [`SlotResolution::Degraded`]. The
    /// veterinarian filter runs after fallback substitution, so filtering a
    /// template (which names no veterinarians) yields an empty list.
    pub async fn resolve(
        &self,
        hospital_id: &HospitalId,
        date: NaiveDate,
        veterinarian_id: Option<&VeterinarianId>,
    ) -> Result<SlotResolution, AvailabilityError> {
        if !self.window.contains(date) {
            return Err(AvailabilityError::DateOutsideWindow {
                date,
                first: self.window.first(),
                last: self.window.last(),
            });
        }

        let (slots, degraded) = match self.source.fetch_slots(hospital_id, date).await {
            Ok(slots) if !slots.is_empty() => (slots, None),
            Ok(_) => {
                warn!(
                    "Hospital {} returned no slots for {}, using fallback schedule",
                    hospital_id, date
                );
                (self.fallback.slots(), Some(DegradedCause::EmptyUpstream))
            }
            Err(e) => {
                if e.is_transport() {
                    warn!(
                        "Availability service unreachable for hospital {} on {}: {}, using fallback schedule",
                        hospital_id, date, e
                    );
                } else {
                    warn!(
                        "Availability lookup failed for hospital {} on {}: {}, using fallback schedule",
                        hospital_id, date, e
                    );
                }
                (self.fallback.slots(), Some(DegradedCause::Unreachable(e.to_string())))
            }
        };

        let slots = normalize(filter_by_veterinarian(slots, veterinarian_id));

        if slots.is_empty() {
            info!(
                "No slots for hospital {} on {} with veterinarian filter {:?}",
                hospital_id, date, veterinarian_id
            );
        } else {
            debug!("Resolved {} slots for hospital {} on {}", slots.len(), hospital_id, date);
        }

        Ok(match degraded {
            None => SlotResolution::Live(slots),
            Some(cause) => SlotResolution::Degraded { slots, cause },
        })
    }
}

fn filter_by_veterinarian(
    slots: Vec<TimeSlot>,
    veterinarian_id: Option<&VeterinarianId>,
) -> Vec<TimeSlot> {
    match veterinarian_id {
        None => slots,
        Some(vet) => slots
            .into_iter()
            .filter(|slot| slot.veterinarian_id.as_ref() == Some(vet))
            .collect(),
    }
}

/// Sorts by time and keeps the last entry for any repeated time.
fn normalize(slots: Vec<TimeSlot>) -> Vec<TimeSlot> {
    let mut by_time: BTreeMap<NaiveTime, TimeSlot> = BTreeMap::new();
    for slot in slots {
        by_time.insert(slot.time, slot);
    }
    by_time.into_values().collect()
}
