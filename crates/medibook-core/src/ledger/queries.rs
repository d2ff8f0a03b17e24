//! Read projections. Nothing here mutates the ledger.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Ledger;
use crate::models::{Appointment, AppointmentStatus, SlotStatus, TimeSlot};

/// Date window relative to `today`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateWindow {
    #[default]
    All,
    Today,
    Upcoming,
    Past,
}

impl DateWindow {
    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            DateWindow::All => true,
            DateWindow::Today => date == today,
            DateWindow::Upcoming => date >= today,
            DateWindow::Past => date < today,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(DateWindow::All),
            "today" => Some(DateWindow::Today),
            "upcoming" => Some(DateWindow::Upcoming),
            "past" => Some(DateWindow::Past),
            _ => None,
        }
    }
}

/// Staff appointment listing filter. Every `None` matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub window: DateWindow,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
}

/// One row of a doctor's patient list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSummary {
    pub patient_id: String,
    pub appointment_count: usize,
    pub last_visit: NaiveDate,
    pub last_status: AppointmentStatus,
}

impl Ledger {
    /// A patient's appointments, newest first.
    pub fn list_by_patient(&self, patient_id: &str) -> Vec<&Appointment> {
        newest_first(self.appointments.iter().filter(|a| a.patient_id == patient_id))
    }

    /// A doctor's appointments, earliest first (schedule order).
    pub fn list_by_doctor(&self, doctor_id: &str) -> Vec<&Appointment> {
        let mut list: Vec<_> = self
            .appointments
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .collect();
        list.sort_by_key(|a| a.starts_at());
        list
    }

    /// Appointments dated within `[from, to]`, earliest first.
    pub fn list_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<&Appointment> {
        let mut list: Vec<_> = self
            .appointments
            .iter()
            .filter(|a| a.date >= from && a.date <= to)
            .collect();
        list.sort_by_key(|a| a.starts_at());
        list
    }

    /// All of a doctor's slots on `date`, by start time.
    pub fn slots_for_doctor(&self, doctor_id: &str, date: NaiveDate) -> Vec<&TimeSlot> {
        let mut slots: Vec<_> = self
            .slots
            .iter()
            .filter(|s| s.doctor_id == doctor_id && s.date == date)
            .collect();
        slots.sort_by_key(|s| s.start_time);
        slots
    }

    /// Non-blocked slots for the booking picker; full ones are included so
    /// the picker can show them disabled.
    pub fn available_slots(&self, doctor_id: &str, date: NaiveDate) -> Vec<&TimeSlot> {
        self.slots_for_doctor(doctor_id, date)
            .into_iter()
            .filter(|s| s.status != SlotStatus::Blocked)
            .collect()
    }

    /// Open appointments on or after `today`, newest first.
    pub fn upcoming_for_patient(&self, patient_id: &str, today: NaiveDate) -> Vec<&Appointment> {
        newest_first(self.appointments.iter().filter(|a| {
            a.patient_id == patient_id
                && a.date >= today
                && !matches!(a.status, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
        }))
    }

    /// Past, completed or cancelled appointments, newest first.
    pub fn history_for_patient(&self, patient_id: &str, today: NaiveDate) -> Vec<&Appointment> {
        newest_first(self.appointments.iter().filter(|a| {
            a.patient_id == patient_id
                && (a.date < today
                    || matches!(
                        a.status,
                        AppointmentStatus::Cancelled | AppointmentStatus::Completed
                    ))
        }))
    }

    /// Unique patients of a doctor, in order of first appointment.
    pub fn patients_of_doctor(&self, doctor_id: &str) -> Vec<PatientSummary> {
        let mut order: Vec<&str> = Vec::new();
        let mut by_patient: HashMap<&str, PatientSummary> = HashMap::new();

        for appointment in self.appointments.iter().filter(|a| a.doctor_id == doctor_id) {
            let patient_id = appointment.patient_id.as_str();
            match by_patient.get_mut(patient_id) {
                Some(summary) => {
                    summary.appointment_count += 1;
                    if appointment.date > summary.last_visit {
                        summary.last_visit = appointment.date;
                        summary.last_status = appointment.status;
                    }
                }
                None => {
                    order.push(patient_id);
                    by_patient.insert(
                        patient_id,
                        PatientSummary {
                            patient_id: patient_id.to_string(),
                            appointment_count: 1,
                            last_visit: appointment.date,
                            last_status: appointment.status,
                        },
                    );
                }
            }
        }

        order
            .into_iter()
            .filter_map(|id| by_patient.remove(id))
            .collect()
    }

    /// Filtered listing, newest first.
    pub fn search_appointments(
        &self,
        filter: &AppointmentFilter,
        today: NaiveDate,
    ) -> Vec<&Appointment> {
        let results = newest_first(self.appointments.iter().filter(|a| {
            filter.status.map_or(true, |s| a.status == s)
                && filter.window.contains(a.date, today)
                && filter.doctor_id.as_deref().map_or(true, |d| a.doctor_id == d)
                && filter.patient_id.as_deref().map_or(true, |p| a.patient_id == p)
        }));
        debug!(matches = results.len(), "Appointment search");
        results
    }
}

fn newest_first<'a>(appointments: impl Iterator<Item = &'a Appointment>) -> Vec<&'a Appointment> {
    let mut list: Vec<_> = appointments.collect();
    list.sort_by_key(|a| Reverse(a.starts_at()));
    list
}
