//! Appointment models and the appointment status state machine.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Appointment status.
///
/// ```text
/// scheduled ──► in-progress ──► completed
///     │
///     ├──────────────────────► completed
///     ├──────────────────────► cancelled
///     └──────────────────────► no-show
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "in-progress" => Some(AppointmentStatus::InProgress),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "no-show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    /// Completed, cancelled and no-show accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Statuses reachable in one step.
    pub fn allowed_transitions(self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::InProgress,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::InProgress => &[AppointmentStatus::Completed],
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => &[],
        }
    }

    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

/// Kind of visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    Emergency,
    WalkIn,
}

impl AppointmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentType::Consultation => "consultation",
            AppointmentType::FollowUp => "follow-up",
            AppointmentType::Emergency => "emergency",
            AppointmentType::WalkIn => "walk-in",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consultation" => Some(AppointmentType::Consultation),
            "follow-up" => Some(AppointmentType::FollowUp),
            "emergency" => Some(AppointmentType::Emergency),
            "walk-in" => Some(AppointmentType::WalkIn),
            _ => None,
        }
    }
}

/// A patient-doctor booking bound to one time slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Generated appointment ID
    pub id: String,
    /// Patient identity ID
    pub patient_id: String,
    /// Doctor ID
    pub doctor_id: String,
    /// Slot this appointment occupies; `None` once the slot is deleted
    pub slot_id: Option<String>,
    /// Appointment date (mirrors the slot)
    pub date: NaiveDate,
    /// Appointment time (mirrors the slot's start time)
    pub time: NaiveTime,
    /// Lifecycle status
    pub status: AppointmentStatus,
    /// Kind of visit
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    /// Free-text notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Identity that made the booking (patient or staff)
    pub created_by: String,
}

impl Appointment {
    /// Whether the appointment still counts against its slot's capacity.
    /// Only cancellation gives the seat back.
    pub fn holds_seat(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    /// Whether the appointment is still open for cancellation or rescheduling.
    pub fn is_pending(&self) -> bool {
        self.status == AppointmentStatus::Scheduled
    }

    /// Sort key: date then time.
    pub fn starts_at(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time)
    }
}

/// Booking request submitted to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub notes: Option<String>,
    /// Identity placing the booking
    pub created_by: String,
}
