//! Time slot models.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Occupancy status of a time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    /// Has remaining capacity and accepts bookings
    Available,
    /// Booked count has reached capacity
    Full,
    /// Manually closed by the doctor, regardless of count
    Blocked,
}

impl SlotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Full => "full",
            SlotStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(SlotStatus::Available),
            "full" => Some(SlotStatus::Full),
            "blocked" => Some(SlotStatus::Blocked),
            _ => None,
        }
    }
}

/// A bookable doctor-time unit with finite capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    /// Generated slot ID
    pub id: String,
    /// Doctor the slot belongs to
    pub doctor_id: String,
    /// Calendar date
    pub date: NaiveDate,
    /// Start time (the booking lookup key)
    pub start_time: NaiveTime,
    /// End time
    pub end_time: NaiveTime,
    /// Maximum number of bookings
    pub capacity: u32,
    /// Current number of live bookings
    pub booked_count: u32,
    /// Occupancy status
    pub status: SlotStatus,
}

impl TimeSlot {
    /// Create an empty, available slot.
    pub fn new(
        doctor_id: String,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        capacity: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            doctor_id,
            date,
            start_time,
            end_time,
            capacity,
            booked_count: 0,
            status: SlotStatus::Available,
        }
    }

    /// Recompute status from count vs. capacity. Blocked is left alone.
    pub fn recompute_status(&mut self) {
        if self.status == SlotStatus::Blocked {
            return;
        }
        self.status = self.derived_status();
    }

    /// Status implied by the count alone.
    pub fn derived_status(&self) -> SlotStatus {
        if self.booked_count >= self.capacity {
            SlotStatus::Full
        } else {
            SlotStatus::Available
        }
    }

    /// Whether a new booking may land on this slot.
    pub fn is_bookable(&self) -> bool {
        self.status == SlotStatus::Available && self.booked_count < self.capacity
    }

    /// Remaining seats (zero when over capacity).
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.booked_count)
    }

    /// Lookup key match: `(doctor, date, start_time)`.
    pub fn matches(&self, doctor_id: &str, date: NaiveDate, start_time: NaiveTime) -> bool {
        self.doctor_id == doctor_id && self.date == date && self.start_time == start_time
    }

    /// Take one seat. Caller checks `is_bookable` first.
    pub(crate) fn occupy(&mut self) {
        self.booked_count += 1;
        self.recompute_status();
    }

    /// Release one seat, floored at zero.
    pub(crate) fn release(&mut self) {
        self.booked_count = self.booked_count.saturating_sub(1);
        self.recompute_status();
    }

    /// Morning slots start before noon.
    pub fn is_morning(&self) -> bool {
        self.start_time.hour() < 12
    }
}

/// Parameters for creating a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSlot {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: u32,
}

/// Partial update of a slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotPatch {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub capacity: Option<u32>,
    pub status: Option<SlotStatus>,
}

impl SlotPatch {
    /// Whether the patch moves the slot's lookup key.
    pub fn moves_key(&self, slot: &TimeSlot) -> bool {
        self.date.is_some_and(|d| d != slot.date)
            || self.start_time.is_some_and(|t| t != slot.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_slot(capacity: u32) -> TimeSlot {
        TimeSlot::new(
            "d1".into(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            capacity,
        )
    }

    #[test]
    fn test_occupy_until_full() {
        let mut slot = make_slot(2);
        slot.occupy();
        assert_eq!(slot.status, SlotStatus::Available);
        slot.occupy();
        assert_eq!(slot.booked_count, 2);
        assert_eq!(slot.status, SlotStatus::Full);
        assert!(!slot.is_bookable());
    }

    #[test]
    fn test_release_floors_at_zero() {
        let mut slot = make_slot(1);
        slot.release();
        assert_eq!(slot.booked_count, 0);
        assert_eq!(slot.status, SlotStatus::Available);
    }

    #[test]
    fn test_blocked_survives_recompute() {
        let mut slot = make_slot(2);
        slot.status = SlotStatus::Blocked;
        slot.occupy();
        assert_eq!(slot.status, SlotStatus::Blocked);
        assert_eq!(slot.derived_status(), SlotStatus::Available);
        assert!(!slot.is_bookable());
    }

    #[test]
    fn test_matches_key() {
        let slot = make_slot(2);
        assert!(slot.matches("d1", slot.date, slot.start_time));
        assert!(!slot.matches("d2", slot.date, slot.start_time));
        assert!(slot.is_morning());
    }
}
