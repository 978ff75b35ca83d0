use chrono::NaiveDate;
use tracing::debug;

use shared_models::{HospitalId, VeterinarianId};

use crate::models::SlotQuery;

/// Generation counter for slot queries within one booking session.
///
/// Only the most recently issued query may have its response applied; any
/// response carrying an older sequence number is stale.
#[derive(Debug, Default)]
pub struct SlotQuerySequencer {
    latest: u64,
}

impl SlotQuerySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(
        &mut self,
        hospital_id: HospitalId,
        date: NaiveDate,
        veterinarian_id: Option<VeterinarianId>,
    ) -> SlotQuery {
        self.latest += 1;
        debug!("Issuing slot query #{} for {} on {}", self.latest, hospital_id, date);

        SlotQuery {
            sequence: self.latest,
            hospital_id,
            date,
            veterinarian_id,
        }
    }

    /// Makes every outstanding query stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        debug!("Slot queries invalidated up to #{}", self.latest);
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        sequence == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}
