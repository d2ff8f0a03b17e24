//! Slot lifecycle: create, edit, block, delete.

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use super::{Ledger, LedgerError, LedgerResult};
use crate::models::{NewSlot, Severity, SlotPatch, SlotStatus, TimeSlot};

impl Ledger {
    /// Publish a new, empty slot.
    pub fn create_slot(&mut self, request: NewSlot) -> LedgerResult<TimeSlot> {
        validate_bounds(request.start_time, request.end_time, request.capacity)?;
        self.ensure_unique_key(&request.doctor_id, request.date, request.start_time, None)?;

        let slot = TimeSlot::new(
            request.doctor_id,
            request.date,
            request.start_time,
            request.end_time,
            request.capacity,
        );
        info!(
            slot_id = %slot.id,
            doctor_id = %slot.doctor_id,
            date = %slot.date,
            start = %slot.start_time,
            capacity = slot.capacity,
            "Slot created"
        );
        self.slots.push(slot.clone());
        Ok(slot)
    }

    /// Apply a partial edit.
    ///
    /// Capacity may drop below the current count; the slot then reads `Full`
    /// and the existing bookings stay. Moving the date or start time carries
    /// the slot's scheduled appointments along and notifies their patients.
    pub fn update_slot(&mut self, slot_id: &str, patch: SlotPatch) -> LedgerResult<TimeSlot> {
        let index = self.slot_index(slot_id)?;
        let current = self.slots[index].clone();

        let date = patch.date.unwrap_or(current.date);
        let start_time = patch.start_time.unwrap_or(current.start_time);
        let end_time = patch.end_time.unwrap_or(current.end_time);
        let capacity = patch.capacity.unwrap_or(current.capacity);
        validate_bounds(start_time, end_time, capacity)?;

        let moved = patch.moves_key(&current);
        if moved {
            self.ensure_unique_key(&current.doctor_id, date, start_time, Some(slot_id))?;
        }

        let slot = &mut self.slots[index];
        slot.date = date;
        slot.start_time = start_time;
        slot.end_time = end_time;
        slot.capacity = capacity;
        match patch.status {
            Some(SlotStatus::Blocked) => slot.status = SlotStatus::Blocked,
            Some(_) => slot.status = slot.derived_status(),
            None => slot.recompute_status(),
        }
        let updated = slot.clone();

        info!(
            slot_id,
            capacity = updated.capacity,
            booked = updated.booked_count,
            status = updated.status.as_str(),
            "Slot updated"
        );

        if moved {
            self.follow_moved_slot(index);
            return Ok(self.slots[index].clone());
        }
        Ok(updated)
    }

    /// Flip between `Blocked` and the status implied by the count.
    pub fn toggle_block(&mut self, slot_id: &str) -> LedgerResult<TimeSlot> {
        let index = self.slot_index(slot_id)?;
        let slot = &mut self.slots[index];
        slot.status = match slot.status {
            SlotStatus::Blocked => slot.derived_status(),
            SlotStatus::Available | SlotStatus::Full => SlotStatus::Blocked,
        };
        info!(slot_id, status = slot.status.as_str(), "Slot block toggled");
        Ok(slot.clone())
    }

    /// Remove a slot. Appointments that referenced it are detached and keep
    /// their own date/time and status.
    pub fn delete_slot(&mut self, slot_id: &str) -> LedgerResult<TimeSlot> {
        let index = self.slot_index(slot_id)?;
        let slot = self.slots.remove(index);

        let mut detached = 0usize;
        for appointment in self
            .appointments
            .iter_mut()
            .filter(|a| a.slot_id.as_deref() == Some(slot_id))
        {
            appointment.slot_id = None;
            detached += 1;
        }

        if detached > 0 {
            warn!(slot_id, detached, "Deleted slot had appointments; references detached");
        } else {
            info!(slot_id, "Slot deleted");
        }
        Ok(slot)
    }

    fn ensure_unique_key(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        except: Option<&str>,
    ) -> LedgerResult<()> {
        if !self.config.reject_duplicate_slots {
            return Ok(());
        }
        let clash = self
            .slots
            .iter()
            .any(|s| Some(s.id.as_str()) != except && s.matches(doctor_id, date, start_time));
        if clash {
            warn!(doctor_id, %date, %start_time, "Duplicate slot rejected");
            let key = format!("{date} {}", start_time.format("%H:%M"));
            return Err(LedgerError::DuplicateSlot(key));
        }
        Ok(())
    }

    /// Pending appointments move with the slot. Visits that already started
    /// or ended keep their recorded date/time and are detached, giving back
    /// any seat they held.
    fn follow_moved_slot(&mut self, index: usize) {
        let slot = self.slots[index].clone();
        let label = self.doctor_label(&slot.doctor_id);
        let mut affected = Vec::new();
        let mut released = 0u32;
        for appointment in self
            .appointments
            .iter_mut()
            .filter(|a| a.slot_id.as_deref() == Some(slot.id.as_str()))
        {
            if appointment.is_pending() {
                appointment.date = slot.date;
                appointment.time = slot.start_time;
                affected.push(appointment.patient_id.clone());
            } else {
                if appointment.holds_seat() {
                    released += 1;
                }
                appointment.slot_id = None;
            }
        }
        if released > 0 {
            debug!(slot_id = %slot.id, released, "Detached settled appointments from moved slot");
            for _ in 0..released {
                self.slots[index].release();
            }
        }

        let message = format!(
            "Your appointment with {label} has moved to {} at {}.",
            slot.date,
            slot.start_time.format("%H:%M")
        );
        for patient_id in affected {
            self.notify(&patient_id, "Appointment Rescheduled", &message, Severity::Info);
        }
    }
}

fn validate_bounds(start_time: NaiveTime, end_time: NaiveTime, capacity: u32) -> LedgerResult<()> {
    if capacity == 0 {
        return Err(LedgerError::Validation("capacity must be at least 1".into()));
    }
    if end_time <= start_time {
        return Err(LedgerError::Validation("end time must be after start time".into()));
    }
    Ok(())
}
