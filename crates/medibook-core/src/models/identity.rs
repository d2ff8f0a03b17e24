//! Identity and role models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a signed-in identity. Closed set, never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Receptionist,
    Admin,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Role; 4] = [Role::Patient, Role::Doctor, Role::Receptionist, Role::Admin];

    /// Storage/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Admin => "admin",
        }
    }

    /// Parse from the storage representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "receptionist" => Some(Role::Receptionist),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Receptionist => "Receptionist",
            Role::Admin => "Administrator",
        }
    }

    /// Receptionists and admins count as staff.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Receptionist | Role::Admin)
    }
}

/// Optional profile fields carried by an identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentityProfile {
    /// Contact phone number
    pub phone: Option<String>,
    /// Department (doctors only)
    pub department: Option<String>,
    /// Specialization (doctors only)
    pub specialization: Option<String>,
    /// Date of birth (patients only)
    pub date_of_birth: Option<String>,
    /// Postal address
    pub address: Option<String>,
}

/// An authenticatable account's public record.
///
/// The credential secret never lives here; the gate keeps it beside the
/// identity so the persisted session snapshot cannot leak it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    /// Stable identity ID
    pub id: String,
    /// Login email (exact match on authentication)
    pub email: String,
    /// Display name
    pub name: String,
    /// Exactly one role
    pub role: Role,
    /// Optional profile fields
    #[serde(default)]
    pub profile: IdentityProfile,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Create a new identity with a generated ID.
    pub fn new(email: String, name: String, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name,
            role,
            profile: IdentityProfile::default(),
            created_at: Utc::now(),
        }
    }

    /// Case-insensitive substring match on name or email.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.email.to_lowercase().contains(&query)
    }
}

/// Partial edit of the current identity's own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_strings() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("nurse"), None);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Receptionist).unwrap();
        assert_eq!(json, "\"receptionist\"");
    }

    #[test]
    fn test_new_identity() {
        let identity = Identity::new("a@b.com".into(), "Ann".into(), Role::Patient);
        assert_eq!(identity.id.len(), 36); // UUID format
        assert_eq!(identity.role, Role::Patient);
        assert!(identity.profile.phone.is_none());
    }

    #[test]
    fn test_matches_query() {
        let identity =
            Identity::new("emily@hospital.com".into(), "Emily Davis".into(), Role::Receptionist);
        assert!(identity.matches_query("davis"));
        assert!(identity.matches_query("HOSPITAL"));
        assert!(identity.matches_query(""));
        assert!(!identity.matches_query("smith"));
    }
}
