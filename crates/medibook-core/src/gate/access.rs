//! Role-gated capabilities and navigation.
//!
//! Default-deny: no identity never reaches anything. An empty role set means
//! "any authenticated identity".

use serde::{Deserialize, Serialize};

use crate::models::{Identity, Role};

const ANY: &[Role] = &[];
const PATIENT: &[Role] = &[Role::Patient];
const DOCTOR: &[Role] = &[Role::Doctor];
const RECEPTIONIST: &[Role] = &[Role::Receptionist];
const STAFF: &[Role] = &[Role::Receptionist, Role::Admin];
const ADMIN: &[Role] = &[Role::Admin];

/// A protected view or action reachable from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Dashboard,
    FindDoctors,
    MyAppointments,
    AppointmentHistory,
    MySchedule,
    MyPatients,
    Availability,
    CentralScheduling,
    AllAppointments,
    Patients,
    ManageDoctors,
    Departments,
    Analytics,
    UserManagement,
    Settings,
    Notifications,
}

impl Capability {
    /// Every capability, in navigation display order.
    pub const ALL: [Capability; 16] = [
        Capability::Dashboard,
        Capability::FindDoctors,
        Capability::MyAppointments,
        Capability::AppointmentHistory,
        Capability::MySchedule,
        Capability::MyPatients,
        Capability::Availability,
        Capability::CentralScheduling,
        Capability::AllAppointments,
        Capability::Patients,
        Capability::ManageDoctors,
        Capability::Departments,
        Capability::Analytics,
        Capability::UserManagement,
        Capability::Settings,
        Capability::Notifications,
    ];

    /// Roles allowed to reach this capability (empty = any signed-in identity).
    pub fn required_roles(self) -> &'static [Role] {
        match self {
            Capability::Dashboard | Capability::Settings | Capability::Notifications => ANY,
            Capability::FindDoctors
            | Capability::MyAppointments
            | Capability::AppointmentHistory => PATIENT,
            Capability::MySchedule | Capability::MyPatients | Capability::Availability => DOCTOR,
            Capability::CentralScheduling => RECEPTIONIST,
            Capability::AllAppointments | Capability::Patients => STAFF,
            Capability::ManageDoctors
            | Capability::Departments
            | Capability::Analytics
            | Capability::UserManagement => ADMIN,
        }
    }

    /// Route path.
    pub fn path(self) -> &'static str {
        match self {
            Capability::Dashboard => "/dashboard",
            Capability::FindDoctors => "/doctors",
            Capability::MyAppointments => "/appointments",
            Capability::AppointmentHistory => "/history",
            Capability::MySchedule => "/schedule",
            Capability::MyPatients => "/my-patients",
            Capability::Availability => "/availability",
            Capability::CentralScheduling => "/scheduling",
            Capability::AllAppointments => "/all-appointments",
            Capability::Patients => "/patients",
            Capability::ManageDoctors => "/manage-doctors",
            Capability::Departments => "/departments",
            Capability::Analytics => "/analytics",
            Capability::UserManagement => "/users",
            Capability::Settings => "/settings",
            Capability::Notifications => "/notifications",
        }
    }

    /// Navigation label.
    pub fn label(self) -> &'static str {
        match self {
            Capability::Dashboard => "Dashboard",
            Capability::FindDoctors => "Find Doctors",
            Capability::MyAppointments => "My Appointments",
            Capability::AppointmentHistory => "Appointment History",
            Capability::MySchedule => "My Schedule",
            Capability::MyPatients => "My Patients",
            Capability::Availability => "Availability",
            Capability::CentralScheduling => "Central Scheduling",
            Capability::AllAppointments => "All Appointments",
            Capability::Patients => "Patients",
            Capability::ManageDoctors => "Doctors",
            Capability::Departments => "Departments",
            Capability::Analytics => "Analytics",
            Capability::UserManagement => "User Management",
            Capability::Settings => "Settings",
            Capability::Notifications => "Notifications",
        }
    }

    /// Notifications is reached from the header, not the sidebar.
    pub fn in_navigation(self) -> bool {
        self != Capability::Notifications
    }

    /// Resolve a route path (trailing slash tolerated).
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        Self::ALL.into_iter().find(|c| c.path() == trimmed)
    }
}

/// True iff `identity` is present and its role is in `required`
/// (or `required` is empty).
pub fn authorize(required: &[Role], identity: Option<&Identity>) -> bool {
    match identity {
        None => false,
        Some(identity) => required.is_empty() || required.contains(&identity.role),
    }
}

/// Capability check for an optional identity.
pub fn can_access(capability: Capability, identity: Option<&Identity>) -> bool {
    authorize(capability.required_roles(), identity)
}

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub capability: Capability,
    pub label: &'static str,
    pub path: &'static str,
}

/// Sidebar entries visible to `role`, in display order.
pub fn navigation_for(role: Role) -> Vec<NavEntry> {
    Capability::ALL
        .into_iter()
        .filter(|c| c.in_navigation())
        .filter(|c| {
            let required = c.required_roles();
            required.is_empty() || required.contains(&role)
        })
        .map(|c| NavEntry {
            capability: c,
            label: c.label(),
            path: c.path(),
        })
        .collect()
}
