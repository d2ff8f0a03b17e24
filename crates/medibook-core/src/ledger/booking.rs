//! Booking, cancellation and appointment lifecycle.
//!
//! ```text
//! Scheduled ──► InProgress ──► Completed
//!     │
//!     ├──────────────────────► Completed
//!     ├──► Cancelled   (seat released)
//!     └──► NoShow
//! ```

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};

use super::{Ledger, LedgerError, LedgerResult};
use crate::models::{Appointment, AppointmentStatus, BookingRequest, Severity};

impl Ledger {
    /// Book a seat in the slot matching `(doctor, date, time)`.
    ///
    /// The first matching slot in insertion order is used. Fails with
    /// `SlotUnavailable` when there is no match or the match is full or
    /// blocked; nothing changes in that case.
    pub fn book_appointment(&mut self, request: BookingRequest) -> LedgerResult<Appointment> {
        if request.patient_id.trim().is_empty() {
            return Err(LedgerError::Validation("patient is required".into()));
        }

        let index = self
            .slots
            .iter()
            .position(|s| s.matches(&request.doctor_id, request.date, request.time));

        let Some(index) = index.filter(|&i| self.slots[i].is_bookable()) else {
            warn!(
                doctor_id = %request.doctor_id,
                date = %request.date,
                time = %request.time,
                "Booking rejected: slot unavailable"
            );
            return Err(LedgerError::SlotUnavailable);
        };

        let slot = &mut self.slots[index];
        slot.occupy();
        let slot_id = slot.id.clone();

        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            slot_id: Some(slot_id.clone()),
            date: request.date,
            time: request.time,
            status: AppointmentStatus::Scheduled,
            kind: request.kind,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now(),
            created_by: request.created_by,
        };
        self.appointments.push(appointment.clone());

        info!(
            appointment_id = %appointment.id,
            slot_id = %slot_id,
            patient_id = %appointment.patient_id,
            "Appointment booked"
        );

        let by_patient = appointment.created_by == appointment.patient_id;
        let (title, verb) = if by_patient {
            ("Appointment Booked", "confirmed")
        } else {
            ("Appointment Scheduled", "scheduled")
        };
        let message = format!(
            "Your appointment with {} on {} at {} has been {verb}.",
            self.doctor_label(&appointment.doctor_id),
            appointment.date,
            appointment.time.format("%H:%M"),
        );
        self.notify(&appointment.patient_id, title, &message, Severity::Success);

        Ok(appointment)
    }

    /// Cancel a scheduled appointment and give its seat back.
    ///
    /// The slot's status is recomputed from count vs. capacity, so a slot
    /// that is still over capacity after the release stays `Full`. A blocked
    /// slot stays blocked.
    pub fn cancel_appointment(&mut self, appointment_id: &str) -> LedgerResult<Appointment> {
        let index = self.appointment_index(appointment_id)?;
        let status = self.appointments[index].status;
        if status != AppointmentStatus::Scheduled {
            warn!(appointment_id, status = status.as_str(), "Cancellation rejected");
            return Err(LedgerError::NotCancellable(status.as_str()));
        }

        let appointment = &mut self.appointments[index];
        appointment.status = AppointmentStatus::Cancelled;
        let cancelled = appointment.clone();

        self.release_seat(cancelled.slot_id.as_deref());
        info!(appointment_id, "Appointment cancelled");

        let message = format!(
            "Your appointment with {} has been cancelled.",
            self.doctor_label(&cancelled.doctor_id)
        );
        self.notify(&cancelled.patient_id, "Appointment Cancelled", &message, Severity::Warning);

        Ok(cancelled)
    }

    /// Move an appointment along its lifecycle.
    ///
    /// Moving to `Cancelled` behaves exactly like `cancel_appointment`.
    pub fn transition_appointment(
        &mut self,
        appointment_id: &str,
        next: AppointmentStatus,
    ) -> LedgerResult<Appointment> {
        let index = self.appointment_index(appointment_id)?;
        let current = self.appointments[index].status;

        if !current.can_transition_to(next) {
            warn!(
                appointment_id,
                from = current.as_str(),
                to = next.as_str(),
                "Invalid transition"
            );
            return Err(LedgerError::invalid_transition(current, next));
        }

        if next == AppointmentStatus::Cancelled {
            return self.cancel_appointment(appointment_id);
        }

        let appointment = &mut self.appointments[index];
        appointment.status = next;
        debug!(
            appointment_id,
            from = current.as_str(),
            to = next.as_str(),
            "Appointment transitioned"
        );
        Ok(appointment.clone())
    }

    /// Move a scheduled appointment to another slot of the same doctor.
    ///
    /// The new seat is checked before the old one is released; on failure
    /// neither slot changes.
    pub fn reschedule_appointment(
        &mut self,
        appointment_id: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> LedgerResult<Appointment> {
        let index = self.appointment_index(appointment_id)?;
        let current = self.appointments[index].clone();
        if !current.is_pending() {
            warn!(appointment_id, status = current.status.as_str(), "Reschedule rejected");
            return Err(LedgerError::NotCancellable(current.status.as_str()));
        }

        let target = self
            .slots
            .iter()
            .position(|s| s.matches(&current.doctor_id, date, time));

        let Some(target) = target else {
            return Err(LedgerError::SlotUnavailable);
        };
        if current.slot_id.as_deref() == Some(self.slots[target].id.as_str()) {
            return Ok(current);
        }
        if !self.slots[target].is_bookable() {
            warn!(appointment_id, %date, %time, "Reschedule rejected: slot unavailable");
            return Err(LedgerError::SlotUnavailable);
        }

        self.release_seat(current.slot_id.as_deref());
        let slot = &mut self.slots[target];
        slot.occupy();
        let new_slot_id = slot.id.clone();

        let appointment = &mut self.appointments[index];
        appointment.slot_id = Some(new_slot_id);
        appointment.date = date;
        appointment.time = time;
        let moved = appointment.clone();

        info!(appointment_id, %date, %time, "Appointment rescheduled");

        let message = format!(
            "Your appointment with {} has moved to {} at {}.",
            self.doctor_label(&moved.doctor_id),
            date,
            time.format("%H:%M")
        );
        self.notify(&moved.patient_id, "Appointment Rescheduled", &message, Severity::Info);

        Ok(moved)
    }

    fn release_seat(&mut self, slot_id: Option<&str>) {
        let Some(slot_id) = slot_id else {
            return;
        };
        match self.slots.iter_mut().find(|s| s.id == slot_id) {
            Some(slot) => slot.release(),
            None => warn!(slot_id, "Released appointment referenced a missing slot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::models::{AppointmentType, NewSlot, SlotStatus};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn setup_ledger(capacity: u32) -> (Ledger, String) {
        let mut ledger = Ledger::new(LedgerConfig::default());
        ledger.set_doctor_names([("d1".to_string(), "Dr. Sarah Johnson".to_string())]);
        let slot = ledger
            .create_slot(NewSlot {
                doctor_id: "d1".into(),
                date: date(),
                start_time: time(9),
                end_time: time(10),
                capacity,
            })
            .unwrap();
        (ledger, slot.id)
    }

    fn request(patient: &str, hour: u32) -> BookingRequest {
        BookingRequest {
            patient_id: patient.into(),
            doctor_id: "d1".into(),
            date: date(),
            time: time(hour),
            kind: AppointmentType::Consultation,
            notes: None,
            created_by: patient.into(),
        }
    }

    #[test]
    fn test_book_fills_slot() {
        let (mut ledger, slot_id) = setup_ledger(2);

        ledger.book_appointment(request("u1", 9)).unwrap();
        assert_eq!(ledger.slot(&slot_id).unwrap().status, SlotStatus::Available);

        let appointment = ledger.book_appointment(request("u5", 9)).unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.slot_id.as_deref(), Some(slot_id.as_str()));

        let slot = ledger.slot(&slot_id).unwrap();
        assert_eq!(slot.booked_count, 2);
        assert_eq!(slot.status, SlotStatus::Full);

        assert_eq!(
            ledger.book_appointment(request("u6", 9)).unwrap_err(),
            LedgerError::SlotUnavailable
        );
        assert_eq!(ledger.appointments().len(), 2);
    }

    #[test]
    fn test_book_without_slot() {
        let (mut ledger, _) = setup_ledger(2);
        assert_eq!(
            ledger.book_appointment(request("u1", 11)).unwrap_err(),
            LedgerError::SlotUnavailable
        );
        assert!(ledger.notifications_for("u1").is_empty());
    }

    #[test]
    fn test_book_emits_notification() {
        let (mut ledger, _) = setup_ledger(2);
        ledger.book_appointment(request("u1", 9)).unwrap();

        let notes = ledger.notifications_for("u1");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Appointment Booked");
        assert_eq!(notes[0].severity, Severity::Success);
        assert_eq!(
            notes[0].message,
            "Your appointment with Dr. Sarah Johnson on 2024-03-04 at 09:00 has been confirmed."
        );

        let mut by_staff = request("u5", 9);
        by_staff.created_by = "u3".into();
        ledger.book_appointment(by_staff).unwrap();
        assert_eq!(ledger.notifications_for("u5")[0].title, "Appointment Scheduled");
    }

    #[test]
    fn test_cancel_releases_seat() {
        let (mut ledger, slot_id) = setup_ledger(2);
        ledger.book_appointment(request("u1", 9)).unwrap();
        let second = ledger.book_appointment(request("u5", 9)).unwrap();

        let cancelled = ledger.cancel_appointment(&second.id).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        let slot = ledger.slot(&slot_id).unwrap();
        assert_eq!(slot.booked_count, 1);
        assert_eq!(slot.status, SlotStatus::Available);

        let warning = ledger.notifications_for("u5")[0];
        assert_eq!(warning.title, "Appointment Cancelled");
        assert_eq!(warning.severity, Severity::Warning);
    }

    #[test]
    fn test_cancel_twice() {
        let (mut ledger, slot_id) = setup_ledger(2);
        let appointment = ledger.book_appointment(request("u1", 9)).unwrap();

        ledger.cancel_appointment(&appointment.id).unwrap();
        assert_eq!(
            ledger.cancel_appointment(&appointment.id).unwrap_err(),
            LedgerError::NotCancellable("cancelled")
        );
        assert_eq!(ledger.slot(&slot_id).unwrap().booked_count, 0);
    }

    #[test]
    fn test_cancel_keeps_block() {
        let (mut ledger, slot_id) = setup_ledger(1);
        let appointment = ledger.book_appointment(request("u1", 9)).unwrap();
        ledger.toggle_block(&slot_id).unwrap();

        ledger.cancel_appointment(&appointment.id).unwrap();
        let slot = ledger.slot(&slot_id).unwrap();
        assert_eq!(slot.booked_count, 0);
        assert_eq!(slot.status, SlotStatus::Blocked);
    }

    #[test]
    fn test_blocked_slot_rejects_booking() {
        let (mut ledger, slot_id) = setup_ledger(2);
        ledger.toggle_block(&slot_id).unwrap();
        assert_eq!(
            ledger.book_appointment(request("u1", 9)).unwrap_err(),
            LedgerError::SlotUnavailable
        );
        assert_eq!(ledger.slot(&slot_id).unwrap().booked_count, 0);
    }

    #[test]
    fn test_transitions() {
        let (mut ledger, slot_id) = setup_ledger(2);
        let appointment = ledger.book_appointment(request("u1", 9)).unwrap();

        ledger
            .transition_appointment(&appointment.id, AppointmentStatus::InProgress)
            .unwrap();
        assert_eq!(
            ledger
                .transition_appointment(&appointment.id, AppointmentStatus::Cancelled)
                .unwrap_err(),
            LedgerError::InvalidTransition {
                from: "in-progress",
                to: "cancelled"
            }
        );
        ledger
            .transition_appointment(&appointment.id, AppointmentStatus::Completed)
            .unwrap();

        // Completed visits keep their seat.
        assert_eq!(ledger.slot(&slot_id).unwrap().booked_count, 1);
        assert!(ledger
            .transition_appointment(&appointment.id, AppointmentStatus::Scheduled)
            .is_err());
    }

    #[test]
    fn test_transition_to_cancelled_releases() {
        let (mut ledger, slot_id) = setup_ledger(1);
        let appointment = ledger.book_appointment(request("u1", 9)).unwrap();

        ledger
            .transition_appointment(&appointment.id, AppointmentStatus::Cancelled)
            .unwrap();
        let slot = ledger.slot(&slot_id).unwrap();
        assert_eq!(slot.booked_count, 0);
        assert_eq!(slot.status, SlotStatus::Available);
    }

    #[test]
    fn test_reschedule() {
        let (mut ledger, first_id) = setup_ledger(1);
        let second = ledger
            .create_slot(NewSlot {
                doctor_id: "d1".into(),
                date: date(),
                start_time: time(10),
                end_time: time(11),
                capacity: 1,
            })
            .unwrap();
        let appointment = ledger.book_appointment(request("u1", 9)).unwrap();

        let moved = ledger
            .reschedule_appointment(&appointment.id, date(), time(10))
            .unwrap();
        assert_eq!(moved.slot_id.as_deref(), Some(second.id.as_str()));
        assert_eq!(moved.time, time(10));
        assert_eq!(ledger.slot(&first_id).unwrap().booked_count, 0);
        assert_eq!(ledger.slot(&second.id).unwrap().status, SlotStatus::Full);

        // Target full: nothing changes.
        let other = ledger.book_appointment(request("u5", 9)).unwrap();
        assert_eq!(
            ledger
                .reschedule_appointment(&other.id, date(), time(10))
                .unwrap_err(),
            LedgerError::SlotUnavailable
        );
        assert_eq!(ledger.slot(&first_id).unwrap().booked_count, 1);
    }

    #[test]
    fn test_deleted_slot_detaches() {
        let (mut ledger, slot_id) = setup_ledger(2);
        let appointment = ledger.book_appointment(request("u1", 9)).unwrap();

        ledger.delete_slot(&slot_id).unwrap();
        assert_eq!(ledger.appointment(&appointment.id).unwrap().slot_id, None);

        // Cancelling a detached appointment still works.
        ledger.cancel_appointment(&appointment.id).unwrap();
    }
}
