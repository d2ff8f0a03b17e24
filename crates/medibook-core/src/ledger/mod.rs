//! Scheduling ledger: the single owner of slots, appointments and
//! notifications.
//!
//! Every mutation that touches both an appointment and its slot happens
//! inside one `&mut self` call, so callers never observe a half-applied
//! booking.
//!
//! Conservation: every mutation changes a slot's `booked_count` by exactly
//! the change in non-cancelled appointments that reference it. A slot that
//! starts empty therefore always has `booked_count == seats_held`. Slots
//! loaded with a baseline count (seed data stands in for bookings made
//! elsewhere) keep that baseline on top.

mod booking;
mod notifications;
mod queries;
mod slots;

pub use notifications::*;
pub use queries::*;

use std::collections::HashMap;

use thiserror::Error;

use crate::config::LedgerConfig;
use crate::models::{Appointment, AppointmentStatus, Notification, TimeSlot};

/// Ledger errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Slot is no longer available")]
    SlotUnavailable,

    #[error("Appointment cannot be cancelled in status {0}")]
    NotCancellable(&'static str),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("A slot already exists for this doctor at {0}")]
    DuplicateSlot(String),

    #[error("Slot not found: {0}")]
    SlotNotFound(String),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl LedgerError {
    fn invalid_transition(from: AppointmentStatus, to: AppointmentStatus) -> Self {
        LedgerError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// In-memory booking ledger.
#[derive(Debug, Default)]
pub struct Ledger {
    slots: Vec<TimeSlot>,
    appointments: Vec<Appointment>,
    notifications: NotificationLog,
    doctor_names: HashMap<String, String>,
    config: LedgerConfig,
}

impl Ledger {
    /// Empty ledger.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Ledger over pre-existing records (seed data or a snapshot).
    ///
    /// Notifications are kept newest first regardless of input order.
    pub fn with_records(
        slots: Vec<TimeSlot>,
        appointments: Vec<Appointment>,
        notifications: Vec<Notification>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            slots,
            appointments,
            notifications: NotificationLog::from_records(notifications),
            doctor_names: HashMap::new(),
            config,
        }
    }

    /// Register display names used in notification text.
    pub fn set_doctor_names<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.doctor_names.extend(names);
    }

    /// Every slot, in insertion order.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Every appointment, in insertion order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    /// Look up a slot.
    pub fn slot(&self, id: &str) -> LedgerResult<&TimeSlot> {
        self.slots
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| LedgerError::SlotNotFound(id.to_string()))
    }

    /// Look up an appointment.
    pub fn appointment(&self, id: &str) -> LedgerResult<&Appointment> {
        self.appointments
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| LedgerError::AppointmentNotFound(id.to_string()))
    }

    /// Non-cancelled appointments currently referencing `slot_id`.
    pub fn seats_held(&self, slot_id: &str) -> u32 {
        self.appointments
            .iter()
            .filter(|a| a.holds_seat() && a.slot_id.as_deref() == Some(slot_id))
            .count() as u32
    }

    fn slot_index(&self, id: &str) -> LedgerResult<usize> {
        self.slots
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| LedgerError::SlotNotFound(id.to_string()))
    }

    fn appointment_index(&self, id: &str) -> LedgerResult<usize> {
        self.appointments
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| LedgerError::AppointmentNotFound(id.to_string()))
    }

    fn doctor_label(&self, doctor_id: &str) -> String {
        self.doctor_names
            .get(doctor_id)
            .cloned()
            .unwrap_or_else(|| doctor_id.to_string())
    }
}
