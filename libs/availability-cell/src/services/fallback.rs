use chrono::{Duration, NaiveTime};

use crate::models::TimeSlot;

/// Fixed daily schedule substituted when hospital availability is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSchedule {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub interval_minutes: u32,
    /// Half-open `[start, end)` ranges with no slots.
    pub breaks: Vec<(NaiveTime, NaiveTime)>,
}

impl Default for FallbackSchedule {
    fn default() -> Self {
        Self {
            opens_at: hm(9, 0),
            closes_at: hm(18, 0),
            interval_minutes: 30,
            breaks: vec![(hm(12, 0), hm(13, 0))],
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl FallbackSchedule {
    /// Slot starts in `[opens_at, closes_at)`, skipping breaks. All slots are
    /// open and tied to no veterinarian.
    pub fn slots(&self) -> Vec<TimeSlot> {
        let step = Duration::minutes(i64::from(self.interval_minutes.max(1)));
        let mut slots = Vec::new();
        let mut current = self.opens_at;

        while current < self.closes_at {
            if !self.in_break(current) {
                slots.push(TimeSlot::open(current));
            }

            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            current = next;
        }

        slots
    }

    fn in_break(&self, time: NaiveTime) -> bool {
        self.breaks.iter().any(|(start, end)| time >= *start && time < *end)
    }
}
