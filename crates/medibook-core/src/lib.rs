//! Medibook Core Library
//!
//! Booking-consistency engine and access gate for a hospital appointment
//! system.
//!
//! # Architecture
//!
//! ```text
//!   Presentation layer (UI, native shell)
//!                 │
//!                 ▼
//!        ┌─────────────────┐
//!        │  MedibookCore   │  FFI facade, role checks
//!        └────────┬────────┘
//!                 │
//!     ┌───────────┼──────────────┬─────────────┐
//!     ▼           ▼              ▼             ▼
//!   Gate        Ledger       Directory      Report
//!   (session,   (slots,      (doctors,      (analytics
//!    roles)      bookings,    departments)   export)
//!     │          notices)
//!     ▼
//!  session_state (SQLite snapshot)
//! ```
//!
//! # Core Principle
//!
//! **A slot's booked count moves in lockstep with the seats its appointments hold.**
//! Every booking, cancellation and reschedule updates both sides in one call.
//!
//! # Modules
//!
//! - [`config`]: Runtime configuration
//! - [`db`]: SQLite key-value store for the session snapshot
//! - [`models`]: Domain types (Identity, TimeSlot, Appointment, etc.)
//! - [`gate`]: Authentication, current identity, role-gated capabilities
//! - [`ledger`]: Slots, appointments and notifications
//! - [`directory`]: Doctor profiles with fuzzy search
//! - [`report`]: Analytics snapshot with JSON/CSV export
//! - [`seed`]: Demonstration records

pub mod config;
pub mod db;
pub mod directory;
pub mod gate;
pub mod ledger;
pub mod models;
pub mod report;
pub mod seed;

// Re-export commonly used types
pub use config::{GateConfig, LedgerConfig, MedibookConfig};
pub use db::Database;
pub use directory::Directory;
pub use gate::{Account, Capability, Gate, GateError, NavEntry};
pub use ledger::{AppointmentFilter, DateWindow, Ledger, LedgerError};
pub use models::{
    Appointment, AppointmentStatus, AppointmentType, BookingRequest, Doctor, Identity, Notification,
    Role, SlotStatus, TimeSlot,
};
pub use report::AnalyticsReport;
pub use seed::Seed;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing_subscriber::EnvFilter;

use crate::directory::DirectoryError;
use crate::gate::NewAccount;
use crate::models::{IdentityProfile, NewSlot, ProfileUpdate, SlotPatch};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedibookError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<GateError> for MedibookError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::InvalidCredentials => MedibookError::InvalidCredentials,
            GateError::NotAuthenticated => MedibookError::NotAuthenticated,
            GateError::Forbidden(_) => MedibookError::Forbidden(e.to_string()),
            GateError::DuplicateEmail(_) => MedibookError::Conflict(e.to_string()),
            GateError::PasswordMismatch | GateError::WeakPassword(_) | GateError::Validation(_) => {
                MedibookError::InvalidInput(e.to_string())
            }
            GateError::Store(_) => MedibookError::StorageError(e.to_string()),
        }
    }
}

impl From<LedgerError> for MedibookError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::SlotNotFound(_)
            | LedgerError::AppointmentNotFound(_)
            | LedgerError::NotificationNotFound(_) => MedibookError::NotFound(e.to_string()),
            LedgerError::Validation(_) => MedibookError::InvalidInput(e.to_string()),
            LedgerError::SlotUnavailable
            | LedgerError::NotCancellable(_)
            | LedgerError::InvalidTransition { .. }
            | LedgerError::DuplicateSlot(_) => MedibookError::Conflict(e.to_string()),
        }
    }
}

impl From<DirectoryError> for MedibookError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::DoctorNotFound(_) => MedibookError::NotFound(e.to_string()),
            DirectoryError::UnknownDepartment(_) | DirectoryError::Validation(_) => {
                MedibookError::InvalidInput(e.to_string())
            }
        }
    }
}

impl From<db::DbError> for MedibookError {
    fn from(e: db::DbError) -> Self {
        MedibookError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for MedibookError {
    fn from(e: serde_json::Error) -> Self {
        MedibookError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedibookError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedibookError::StorageError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `filter`;
/// repeated calls are ignored.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    let fallback = filter.unwrap_or_else(|| config::DEFAULT_LOG_FILTER.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .try_init();
}

/// Open the core with its session store at `path`, loading seed data.
///
/// `config_json` overrides defaults field by field.
#[uniffi::export]
pub fn open_core(
    path: String,
    config_json: Option<String>,
) -> Result<Arc<MedibookCore>, MedibookError> {
    let config = parse_config(config_json)?;
    let store = Database::open(&path)?;
    MedibookCore::build(store, config)
}

/// Open the core with an in-memory session store (for testing).
#[uniffi::export]
pub fn open_core_in_memory(
    config_json: Option<String>,
) -> Result<Arc<MedibookCore>, MedibookError> {
    let config = parse_config(config_json)?;
    let store = Database::open_in_memory()?;
    MedibookCore::build(store, config)
}

fn parse_config(config_json: Option<String>) -> Result<MedibookConfig, MedibookError> {
    match config_json {
        Some(json) => Ok(MedibookConfig::from_json(&json)?),
        None => Ok(MedibookConfig::default()),
    }
}

// =========================================================================
// Main API Object
// =========================================================================

struct CoreState {
    gate: Gate,
    ledger: Ledger,
    directory: Directory,
}

impl CoreState {
    fn signed_in(&self) -> Result<Identity, MedibookError> {
        self.gate.current_identity().cloned().ok_or(MedibookError::NotAuthenticated)
    }

    fn require(&self, capability: Capability) -> Result<Identity, MedibookError> {
        let identity = self.signed_in()?;
        if !self.gate.can_access(capability) {
            return Err(MedibookError::Forbidden(capability.label().to_string()));
        }
        Ok(identity)
    }

    /// Doctor ID of the signed-in doctor.
    fn own_doctor_id(&self, identity: &Identity) -> Option<String> {
        self.directory.by_identity(&identity.id).map(|d| d.id.clone())
    }

    /// Slot edits: admins on any slot, doctors on their own.
    fn require_slot_owner(&self, doctor_id: &str) -> Result<(), MedibookError> {
        let identity = self.signed_in()?;
        match identity.role {
            Role::Admin => Ok(()),
            Role::Doctor if self.own_doctor_id(&identity).as_deref() == Some(doctor_id) => Ok(()),
            _ => Err(MedibookError::Forbidden("slot belongs to another doctor".into())),
        }
    }

    /// Appointment changes: staff on any, patients and doctors on their own.
    fn require_party(&self, appointment_id: &str) -> Result<(), MedibookError> {
        let identity = self.signed_in()?;
        let appointment = self.ledger.appointment(appointment_id)?;
        let allowed = match identity.role {
            Role::Receptionist | Role::Admin => true,
            Role::Patient => appointment.patient_id == identity.id,
            Role::Doctor => {
                self.own_doctor_id(&identity).as_deref() == Some(appointment.doctor_id.as_str())
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(MedibookError::Forbidden("not a party to this appointment".into()))
        }
    }

    fn to_ffi_appointment(&self, appointment: &Appointment) -> FfiAppointment {
        let doctor_name = self
            .directory
            .get(&appointment.doctor_id)
            .map(|d| d.name.clone())
            .unwrap_or_default();
        let patient_name = self
            .gate
            .find_identity(&appointment.patient_id)
            .map(|i| i.name.clone())
            .unwrap_or_default();
        FfiAppointment {
            id: appointment.id.clone(),
            patient_id: appointment.patient_id.clone(),
            patient_name,
            doctor_id: appointment.doctor_id.clone(),
            doctor_name,
            slot_id: appointment.slot_id.clone(),
            date: appointment.date.format(DATE_FORMAT).to_string(),
            time: appointment.time.format(TIME_FORMAT).to_string(),
            status: appointment.status.as_str().to_string(),
            appointment_type: appointment.kind.as_str().to_string(),
            notes: appointment.notes.clone(),
            created_by: appointment.created_by.clone(),
        }
    }
}

/// Thread-safe engine wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MedibookCore {
    state: Mutex<CoreState>,
}

impl MedibookCore {
    fn build(store: Database, config: MedibookConfig) -> Result<Arc<Self>, MedibookError> {
        let today = Utc::now().date_naive();
        let (accounts, directory, ledger) = Seed::load(today, &config);
        let gate = Gate::restore(store, accounts, config.gate.clone())?;
        Ok(Arc::new(Self {
            state: Mutex::new(CoreState { gate, ledger, directory }),
        }))
    }
}

#[uniffi::export]
impl MedibookCore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Sign in with email and password.
    pub fn sign_in(&self, email: String, password: String) -> Result<FfiIdentity, MedibookError> {
        let mut state = self.state.lock()?;
        let identity = state.gate.authenticate(&email, &password)?;
        Ok(identity.into())
    }

    /// Sign out. No-op when already signed out.
    pub fn sign_out(&self) -> Result<(), MedibookError> {
        let mut state = self.state.lock()?;
        state.gate.end_session();
        Ok(())
    }

    /// The signed-in identity, if any.
    pub fn current_identity(&self) -> Result<Option<FfiIdentity>, MedibookError> {
        let state = self.state.lock()?;
        Ok(state.gate.current_identity().cloned().map(Into::into))
    }

    /// Sidebar entries for the signed-in identity.
    pub fn navigation(&self) -> Result<Vec<FfiNavEntry>, MedibookError> {
        let state = self.state.lock()?;
        Ok(state.gate.navigation().into_iter().map(Into::into).collect())
    }

    /// Route guard: whether the signed-in identity may open `path`.
    pub fn can_access(&self, path: String) -> Result<bool, MedibookError> {
        let state = self.state.lock()?;
        Ok(Capability::from_path(&path).is_some_and(|c| state.gate.can_access(c)))
    }

    /// Edit the signed-in identity's name, phone or address.
    pub fn update_profile(
        &self,
        name: Option<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<FfiIdentity, MedibookError> {
        let mut state = self.state.lock()?;
        let identity = state.gate.update_profile(ProfileUpdate { name, phone, address })?;
        Ok(identity.into())
    }

    /// Change the signed-in identity's password.
    pub fn change_password(
        &self,
        current: String,
        new_password: String,
        confirm: String,
    ) -> Result<(), MedibookError> {
        let mut state = self.state.lock()?;
        state.gate.change_password(&current, &new_password, &confirm)?;
        Ok(())
    }

    // =========================================================================
    // User Management
    // =========================================================================

    /// Create an account (admin only).
    pub fn register_account(&self, account: FfiNewAccount) -> Result<FfiIdentity, MedibookError> {
        let mut state = self.state.lock()?;
        let request = NewAccount::try_from(account)?;
        let identity = state.gate.register(request)?;
        Ok(identity.into())
    }

    /// Search identities by name/email with an optional role filter.
    pub fn search_users(
        &self,
        query: String,
        role: Option<String>,
    ) -> Result<Vec<FfiIdentity>, MedibookError> {
        let state = self.state.lock()?;
        state.require(Capability::UserManagement)?;
        let role = role.as_deref().map(parse_role).transpose()?;
        Ok(state
            .gate
            .search_identities(&query, role)
            .into_iter()
            .cloned()
            .map(Into::into)
            .collect())
    }

    /// Identity totals by role group.
    pub fn role_counts(&self) -> Result<FfiRoleCounts, MedibookError> {
        let state = self.state.lock()?;
        state.require(Capability::UserManagement)?;
        let counts = state.gate.role_counts();
        Ok(FfiRoleCounts {
            total: counts.total as u32,
            patients: counts.patients as u32,
            doctors: counts.doctors as u32,
            staff: counts.staff as u32,
        })
    }

    // =========================================================================
    // Directory Operations
    // =========================================================================

    /// Search doctors by name or specialization.
    pub fn search_doctors(
        &self,
        query: String,
        department: Option<String>,
    ) -> Result<Vec<FfiDoctor>, MedibookError> {
        let state = self.state.lock()?;
        state.signed_in()?;
        Ok(state
            .directory
            .search(&query, department.as_deref())
            .into_iter()
            .cloned()
            .map(Into::into)
            .collect())
    }

    /// Get a doctor profile.
    pub fn get_doctor(&self, doctor_id: String) -> Result<FfiDoctor, MedibookError> {
        let state = self.state.lock()?;
        state.signed_in()?;
        Ok(state.directory.get(&doctor_id)?.clone().into())
    }

    /// Edit a doctor profile (admin only).
    pub fn update_doctor(
        &self,
        doctor_id: String,
        update: FfiDoctorUpdate,
    ) -> Result<FfiDoctor, MedibookError> {
        let mut state = self.state.lock()?;
        state.require(Capability::ManageDoctors)?;
        let doctor = state.directory.update_profile(&doctor_id, &update.into())?;
        Ok(doctor.into())
    }

    /// All departments.
    pub fn list_departments(&self) -> Result<Vec<FfiDepartment>, MedibookError> {
        let state = self.state.lock()?;
        state.signed_in()?;
        Ok(state.directory.departments().iter().cloned().map(Into::into).collect())
    }

    // =========================================================================
    // Slot Operations
    // =========================================================================

    /// Every slot of a doctor on a date.
    pub fn slots_for_doctor(
        &self,
        doctor_id: String,
        date: String,
    ) -> Result<Vec<FfiSlot>, MedibookError> {
        let state = self.state.lock()?;
        state.signed_in()?;
        let date = parse_date(&date)?;
        Ok(state
            .ledger
            .slots_for_doctor(&doctor_id, date)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Non-blocked slots for the booking picker.
    pub fn available_slots(
        &self,
        doctor_id: String,
        date: String,
    ) -> Result<Vec<FfiSlot>, MedibookError> {
        let state = self.state.lock()?;
        state.signed_in()?;
        let date = parse_date(&date)?;
        Ok(state
            .ledger
            .available_slots(&doctor_id, date)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Publish a slot.
    pub fn create_slot(&self, slot: FfiNewSlot) -> Result<FfiSlot, MedibookError> {
        let mut state = self.state.lock()?;
        state.require_slot_owner(&slot.doctor_id)?;
        let request = NewSlot::try_from(slot)?;
        let created = state.ledger.create_slot(request)?;
        Ok((&created).into())
    }

    /// Edit a slot.
    pub fn update_slot(
        &self,
        slot_id: String,
        patch: FfiSlotPatch,
    ) -> Result<FfiSlot, MedibookError> {
        let mut state = self.state.lock()?;
        let doctor_id = state.ledger.slot(&slot_id)?.doctor_id.clone();
        state.require_slot_owner(&doctor_id)?;
        let patch = SlotPatch::try_from(patch)?;
        let updated = state.ledger.update_slot(&slot_id, patch)?;
        Ok((&updated).into())
    }

    /// Block or unblock a slot.
    pub fn toggle_slot_block(&self, slot_id: String) -> Result<FfiSlot, MedibookError> {
        let mut state = self.state.lock()?;
        let doctor_id = state.ledger.slot(&slot_id)?.doctor_id.clone();
        state.require_slot_owner(&doctor_id)?;
        let slot = state.ledger.toggle_block(&slot_id)?;
        Ok((&slot).into())
    }

    /// Remove a slot.
    pub fn delete_slot(&self, slot_id: String) -> Result<(), MedibookError> {
        let mut state = self.state.lock()?;
        let doctor_id = state.ledger.slot(&slot_id)?.doctor_id.clone();
        state.require_slot_owner(&doctor_id)?;
        state.ledger.delete_slot(&slot_id)?;
        Ok(())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Book an appointment. Patients book for themselves; front-desk staff
    /// book for anyone.
    pub fn book_appointment(
        &self,
        request: FfiBookingRequest,
    ) -> Result<FfiAppointment, MedibookError> {
        let mut state = self.state.lock()?;
        let identity = state.signed_in()?;
        match identity.role {
            Role::Patient if request.patient_id == identity.id => {}
            Role::Receptionist | Role::Admin => {
                let patient = state
                    .gate
                    .find_identity(&request.patient_id)
                    .ok_or_else(|| {
                        MedibookError::NotFound(format!("patient: {}", request.patient_id))
                    })?;
                if patient.role != Role::Patient {
                    return Err(MedibookError::InvalidInput(format!(
                        "not a patient: {}",
                        request.patient_id
                    )));
                }
            }
            _ => return Err(MedibookError::Forbidden("cannot book for this patient".into())),
        }
        let request = BookingRequest {
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            date: parse_date(&request.date)?,
            time: parse_time(&request.time)?,
            kind: AppointmentType::parse(&request.appointment_type).ok_or_else(|| {
                MedibookError::InvalidInput(format!(
                    "appointment type: {}",
                    request.appointment_type
                ))
            })?,
            notes: request.notes,
            created_by: identity.id,
        };
        let appointment = state.ledger.book_appointment(request)?;
        Ok(state.to_ffi_appointment(&appointment))
    }

    /// Cancel a scheduled appointment.
    pub fn cancel_appointment(
        &self,
        appointment_id: String,
    ) -> Result<FfiAppointment, MedibookError> {
        let mut state = self.state.lock()?;
        state.require_party(&appointment_id)?;
        let appointment = state.ledger.cancel_appointment(&appointment_id)?;
        Ok(state.to_ffi_appointment(&appointment))
    }

    /// Move an appointment to a new status.
    pub fn transition_appointment(
        &self,
        appointment_id: String,
        status: String,
    ) -> Result<FfiAppointment, MedibookError> {
        let mut state = self.state.lock()?;
        state.require_party(&appointment_id)?;
        let next = AppointmentStatus::parse(&status)
            .ok_or_else(|| MedibookError::InvalidInput(format!("status: {status}")))?;
        // Patients may only cancel; visit outcomes are recorded by the clinic.
        if state.signed_in()?.role == Role::Patient && next != AppointmentStatus::Cancelled {
            return Err(MedibookError::Forbidden(format!("patients cannot mark {}", next.as_str())));
        }
        let appointment = state.ledger.transition_appointment(&appointment_id, next)?;
        Ok(state.to_ffi_appointment(&appointment))
    }

    /// Move a scheduled appointment to another slot of the same doctor.
    pub fn reschedule_appointment(
        &self,
        appointment_id: String,
        date: String,
        time: String,
    ) -> Result<FfiAppointment, MedibookError> {
        let mut state = self.state.lock()?;
        state.require_party(&appointment_id)?;
        let appointment =
            state
                .ledger
                .reschedule_appointment(&appointment_id, parse_date(&date)?, parse_time(&time)?)?;
        Ok(state.to_ffi_appointment(&appointment))
    }

    /// Signed-in patient's appointments: `today`, `upcoming`, `past` or `all`.
    pub fn my_appointments(&self, window: String) -> Result<Vec<FfiAppointment>, MedibookError> {
        let state = self.state.lock()?;
        let identity = state.require(Capability::MyAppointments)?;
        let today = Utc::now().date_naive();
        let list = match parse_window(&window)? {
            DateWindow::Upcoming => state.ledger.upcoming_for_patient(&identity.id, today),
            DateWindow::Past => state.ledger.history_for_patient(&identity.id, today),
            DateWindow::Today => state
                .ledger
                .list_by_patient(&identity.id)
                .into_iter()
                .filter(|a| a.date == today)
                .collect(),
            DateWindow::All => state.ledger.list_by_patient(&identity.id),
        };
        Ok(list.into_iter().map(|a| state.to_ffi_appointment(a)).collect())
    }

    /// Signed-in doctor's schedule, earliest first.
    pub fn my_schedule(&self) -> Result<Vec<FfiAppointment>, MedibookError> {
        let state = self.state.lock()?;
        let identity = state.require(Capability::MySchedule)?;
        let Some(doctor_id) = state.own_doctor_id(&identity) else {
            return Ok(Vec::new());
        };
        Ok(state
            .ledger
            .list_by_doctor(&doctor_id)
            .into_iter()
            .map(|a| state.to_ffi_appointment(a))
            .collect())
    }

    /// Unique patients of the signed-in doctor.
    pub fn my_patients(&self) -> Result<Vec<FfiPatientSummary>, MedibookError> {
        let state = self.state.lock()?;
        let identity = state.require(Capability::MyPatients)?;
        let Some(doctor_id) = state.own_doctor_id(&identity) else {
            return Ok(Vec::new());
        };
        Ok(state
            .ledger
            .patients_of_doctor(&doctor_id)
            .into_iter()
            .map(|summary| FfiPatientSummary {
                name: state
                    .gate
                    .find_identity(&summary.patient_id)
                    .map(|i| i.name.clone())
                    .unwrap_or_default(),
                patient_id: summary.patient_id,
                appointment_count: summary.appointment_count as u32,
                last_visit: summary.last_visit.format(DATE_FORMAT).to_string(),
                last_status: summary.last_status.as_str().to_string(),
            })
            .collect())
    }

    /// Staff listing with optional status and date window filters.
    pub fn search_appointments(
        &self,
        status: Option<String>,
        window: Option<String>,
    ) -> Result<Vec<FfiAppointment>, MedibookError> {
        let state = self.state.lock()?;
        state.require(Capability::AllAppointments)?;
        let filter = AppointmentFilter {
            status: status
                .as_deref()
                .filter(|s| *s != "all")
                .map(|s| {
                    AppointmentStatus::parse(s)
                        .ok_or_else(|| MedibookError::InvalidInput(format!("status: {s}")))
                })
                .transpose()?,
            window: window.as_deref().map(parse_window).transpose()?.unwrap_or_default(),
            ..Default::default()
        };
        let today = Utc::now().date_naive();
        Ok(state
            .ledger
            .search_appointments(&filter, today)
            .into_iter()
            .map(|a| state.to_ffi_appointment(a))
            .collect())
    }

    // =========================================================================
    // Notification Operations
    // =========================================================================

    /// Signed-in identity's notifications, newest first.
    pub fn notifications(&self) -> Result<Vec<FfiNotification>, MedibookError> {
        let state = self.state.lock()?;
        let identity = state.signed_in()?;
        Ok(state
            .ledger
            .notifications_for(&identity.id)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub fn unread_count(&self) -> Result<u32, MedibookError> {
        let state = self.state.lock()?;
        let identity = state.signed_in()?;
        Ok(state.ledger.unread_count(&identity.id) as u32)
    }

    /// Mark one of the signed-in identity's notifications read.
    pub fn mark_notification_read(&self, notification_id: String) -> Result<(), MedibookError> {
        let mut state = self.state.lock()?;
        let identity = state.signed_in()?;
        let owned = state
            .ledger
            .notifications_for(&identity.id)
            .iter()
            .any(|n| n.id == notification_id);
        if !owned {
            return Err(MedibookError::NotFound(notification_id));
        }
        state.ledger.mark_read(&notification_id)?;
        Ok(())
    }

    /// Mark all of the signed-in identity's notifications read.
    pub fn mark_all_notifications_read(&self) -> Result<u32, MedibookError> {
        let mut state = self.state.lock()?;
        let identity = state.signed_in()?;
        Ok(state.ledger.mark_all_read(&identity.id) as u32)
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Analytics snapshot as pretty JSON (admin only).
    pub fn analytics_json(&self) -> Result<String, MedibookError> {
        let state = self.state.lock()?;
        state.require(Capability::Analytics)?;
        let today = Utc::now().date_naive();
        let report = AnalyticsReport::build(&state.ledger, &state.directory, &state.gate, today);
        Ok(report.to_json()?)
    }

    /// Analytics snapshot as CSV (admin only).
    pub fn analytics_csv(&self) -> Result<String, MedibookError> {
        let state = self.state.lock()?;
        state.require(Capability::Analytics)?;
        let today = Utc::now().date_naive();
        let report = AnalyticsReport::build(&state.ledger, &state.directory, &state.gate, today);
        Ok(report.to_csv())
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, MedibookError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| MedibookError::InvalidInput(format!("date: {s}")))
}

fn parse_time(s: &str) -> Result<NaiveTime, MedibookError> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|_| MedibookError::InvalidInput(format!("time: {s}")))
}

fn parse_role(s: &str) -> Result<Role, MedibookError> {
    Role::parse(s).ok_or_else(|| MedibookError::InvalidInput(format!("role: {s}")))
}

fn parse_window(s: &str) -> Result<DateWindow, MedibookError> {
    DateWindow::parse(s).ok_or_else(|| MedibookError::InvalidInput(format!("date window: {s}")))
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe identity.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub specialization: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
}

impl From<Identity> for FfiIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            name: identity.name,
            role: identity.role.as_str().to_string(),
            phone: identity.profile.phone,
            department: identity.profile.department,
            specialization: identity.profile.specialization,
            date_of_birth: identity.profile.date_of_birth,
            address: identity.profile.address,
        }
    }
}

/// FFI-safe account creation request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAccount {
    pub email: String,
    pub name: String,
    pub role: String,
    pub password: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub specialization: Option<String>,
}

impl TryFrom<FfiNewAccount> for NewAccount {
    type Error = MedibookError;

    fn try_from(account: FfiNewAccount) -> Result<Self, Self::Error> {
        Ok(NewAccount {
            email: account.email,
            name: account.name,
            role: parse_role(&account.role)?,
            secret: account.password,
            profile: IdentityProfile {
                phone: account.phone,
                department: account.department,
                specialization: account.specialization,
                ..Default::default()
            },
        })
    }
}

/// FFI-safe role totals.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRoleCounts {
    pub total: u32,
    pub patients: u32,
    pub doctors: u32,
    pub staff: u32,
}

/// FFI-safe navigation entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNavEntry {
    pub label: String,
    pub path: String,
}

impl From<NavEntry> for FfiNavEntry {
    fn from(entry: NavEntry) -> Self {
        Self {
            label: entry.label.to_string(),
            path: entry.path.to_string(),
        }
    }
}

/// FFI-safe doctor profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: String,
    pub identity_id: String,
    pub name: String,
    pub email: String,
    pub specialization: String,
    pub department: String,
    pub experience_years: u32,
    pub education: String,
    pub bio: String,
    pub consultation_fee: u32,
    pub rating: f64,
    pub review_count: u32,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            identity_id: doctor.identity_id,
            name: doctor.name,
            email: doctor.email,
            specialization: doctor.specialization,
            department: doctor.department,
            experience_years: doctor.experience_years,
            education: doctor.education,
            bio: doctor.bio,
            consultation_fee: doctor.consultation_fee,
            rating: doctor.rating,
            review_count: doctor.review_count,
        }
    }
}

/// FFI-safe doctor profile edit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctorUpdate {
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub experience_years: Option<u32>,
    pub education: Option<String>,
    pub bio: Option<String>,
    pub consultation_fee: Option<u32>,
}

impl From<FfiDoctorUpdate> for models::DoctorUpdate {
    fn from(update: FfiDoctorUpdate) -> Self {
        models::DoctorUpdate {
            specialization: update.specialization,
            department: update.department,
            experience_years: update.experience_years,
            education: update.education,
            bio: update.bio,
            consultation_fee: update.consultation_fee,
        }
    }
}

/// FFI-safe department.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDepartment {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<models::Department> for FfiDepartment {
    fn from(department: models::Department) -> Self {
        Self {
            id: department.id,
            name: department.name,
            description: department.description,
        }
    }
}

/// FFI-safe time slot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSlot {
    pub id: String,
    pub doctor_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: u32,
    pub booked_count: u32,
    pub status: String,
}

impl From<&TimeSlot> for FfiSlot {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            id: slot.id.clone(),
            doctor_id: slot.doctor_id.clone(),
            date: slot.date.format(DATE_FORMAT).to_string(),
            start_time: slot.start_time.format(TIME_FORMAT).to_string(),
            end_time: slot.end_time.format(TIME_FORMAT).to_string(),
            capacity: slot.capacity,
            booked_count: slot.booked_count,
            status: slot.status.as_str().to_string(),
        }
    }
}

/// FFI-safe slot creation request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewSlot {
    pub doctor_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: u32,
}

impl TryFrom<FfiNewSlot> for NewSlot {
    type Error = MedibookError;

    fn try_from(slot: FfiNewSlot) -> Result<Self, Self::Error> {
        Ok(NewSlot {
            doctor_id: slot.doctor_id,
            date: parse_date(&slot.date)?,
            start_time: parse_time(&slot.start_time)?,
            end_time: parse_time(&slot.end_time)?,
            capacity: slot.capacity,
        })
    }
}

/// FFI-safe slot edit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSlotPatch {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<u32>,
    pub status: Option<String>,
}

impl TryFrom<FfiSlotPatch> for SlotPatch {
    type Error = MedibookError;

    fn try_from(patch: FfiSlotPatch) -> Result<Self, Self::Error> {
        Ok(SlotPatch {
            date: patch.date.as_deref().map(parse_date).transpose()?,
            start_time: patch.start_time.as_deref().map(parse_time).transpose()?,
            end_time: patch.end_time.as_deref().map(parse_time).transpose()?,
            capacity: patch.capacity,
            status: patch
                .status
                .as_deref()
                .map(|s| {
                    SlotStatus::parse(s)
                        .ok_or_else(|| MedibookError::InvalidInput(format!("slot status: {s}")))
                })
                .transpose()?,
        })
    }
}

/// FFI-safe booking request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBookingRequest {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    pub appointment_type: String,
    pub notes: Option<String>,
}

/// FFI-safe appointment with display names resolved.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub slot_id: Option<String>,
    pub date: String,
    pub time: String,
    pub status: String,
    pub appointment_type: String,
    pub notes: Option<String>,
    pub created_by: String,
}

/// FFI-safe row of a doctor's patient list.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientSummary {
    pub patient_id: String,
    pub name: String,
    pub appointment_count: u32,
    pub last_visit: String,
    pub last_status: String,
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub severity: String,
    pub read: bool,
    pub created_at: String,
}

impl From<&Notification> for FfiNotification {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.clone(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            severity: notification.severity.as_str().to_string(),
            read: notification.read,
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}
