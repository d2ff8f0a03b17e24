//! Doctor profile models.

use serde::{Deserialize, Serialize};

/// A doctor profile, 1:1 with an identity of role doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    /// Doctor ID (referenced by slots and appointments)
    pub id: String,
    /// Owning identity ID
    pub identity_id: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Specialization (e.g., "Interventional Cardiology")
    pub specialization: String,
    /// Department name
    pub department: String,
    /// Years of experience
    pub experience_years: u32,
    /// Education summary
    pub education: String,
    /// Free-text biography
    pub bio: String,
    /// Consultation fee in whole currency units
    pub consultation_fee: u32,
    /// Average review rating (0-5)
    pub rating: f64,
    /// Number of reviews behind the rating
    pub review_count: u32,
}

impl Doctor {
    /// Create a doctor profile with required fields.
    pub fn new(
        identity_id: String,
        name: String,
        specialization: String,
        department: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            identity_id,
            name,
            email: String::new(),
            specialization,
            department,
            experience_years: 0,
            education: String::new(),
            bio: String::new(),
            consultation_fee: 0,
            rating: 0.0,
            review_count: 0,
        }
    }

    /// Apply a partial profile update.
    pub fn apply(&mut self, update: &DoctorUpdate) {
        if let Some(specialization) = &update.specialization {
            self.specialization = specialization.clone();
        }
        if let Some(department) = &update.department {
            self.department = department.clone();
        }
        if let Some(years) = update.experience_years {
            self.experience_years = years;
        }
        if let Some(education) = &update.education {
            self.education = education.clone();
        }
        if let Some(bio) = &update.bio {
            self.bio = bio.clone();
        }
        if let Some(fee) = update.consultation_fee {
            self.consultation_fee = fee;
        }
    }
}

/// Partial update of a doctor's profile fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorUpdate {
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub experience_years: Option<u32>,
    pub education: Option<String>,
    pub bio: Option<String>,
    pub consultation_fee: Option<u32>,
}

/// A hospital department.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_partial_update() {
        let mut doctor = Doctor::new(
            "u2".into(),
            "Dr. Sarah Johnson".into(),
            "Cardiology".into(),
            "Cardiology".into(),
        );
        doctor.consultation_fee = 200;

        doctor.apply(&DoctorUpdate {
            bio: Some("Board-certified cardiologist".into()),
            consultation_fee: Some(220),
            ..Default::default()
        });

        assert_eq!(doctor.bio, "Board-certified cardiologist");
        assert_eq!(doctor.consultation_fee, 220);
        assert_eq!(doctor.department, "Cardiology");
    }
}
