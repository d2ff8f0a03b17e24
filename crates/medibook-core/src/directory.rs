//! Doctor directory with fuzzy search.
//!
//! Ranking: a case-insensitive substring hit on name or specialization
//! scores 1.0; otherwise the best word-level fuzzy score is used
//! (Jaro-Winkler 60%, normalized Levenshtein 40%).

use strsim::{jaro_winkler, normalized_levenshtein};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Department, Doctor, DoctorUpdate};

/// Minimum fuzzy score for a non-substring hit.
const MIN_SCORE: f64 = 0.80;

/// Directory errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Unknown department: {0}")]
    UnknownDepartment(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Doctor profiles and departments.
#[derive(Debug, Default, Clone)]
pub struct Directory {
    doctors: Vec<Doctor>,
    departments: Vec<Department>,
}

impl Directory {
    pub fn new(doctors: Vec<Doctor>, departments: Vec<Department>) -> Self {
        Self { doctors, departments }
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    /// Look up a doctor by ID.
    pub fn get(&self, id: &str) -> DirectoryResult<&Doctor> {
        self.doctors
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| DirectoryError::DoctorNotFound(id.to_string()))
    }

    /// The doctor profile behind a signed-in identity.
    pub fn by_identity(&self, identity_id: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.identity_id == identity_id)
    }

    /// Doctors in a department.
    pub fn in_department(&self, department: &str) -> Vec<&Doctor> {
        self.doctors.iter().filter(|d| d.department == department).collect()
    }

    /// Edit a doctor's profile. The department, if changed, must exist.
    pub fn update_profile(&mut self, id: &str, update: &DoctorUpdate) -> DirectoryResult<Doctor> {
        if let Some(department) = &update.department {
            if !self.departments.iter().any(|d| &d.name == department) {
                return Err(DirectoryError::UnknownDepartment(department.clone()));
            }
        }
        if update.specialization.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(DirectoryError::Validation("specialization cannot be empty".into()));
        }

        let doctor = self
            .doctors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DirectoryError::DoctorNotFound(id.to_string()))?;
        doctor.apply(update);
        info!(doctor_id = id, "Doctor profile updated");
        Ok(doctor.clone())
    }

    /// Search by name or specialization, best match first.
    ///
    /// An empty query lists every doctor (optionally within `department`),
    /// highest rated first.
    pub fn search(&self, query: &str, department: Option<&str>) -> Vec<&Doctor> {
        let query = query.trim().to_lowercase();
        let mut scored: Vec<(f64, &Doctor)> = self
            .doctors
            .iter()
            .filter(|d| department.map_or(true, |dep| d.department == dep))
            .filter_map(|d| {
                if query.is_empty() {
                    return Some((1.0, d));
                }
                let score = match_score(&query, d);
                (score >= MIN_SCORE).then_some((score, d))
            })
            .collect();

        scored.sort_by(|(sa, da), (sb, db)| {
            sb.total_cmp(sa).then_with(|| db.rating.total_cmp(&da.rating))
        });
        debug!(query = %query, hits = scored.len(), "Doctor search");
        scored.into_iter().map(|(_, d)| d).collect()
    }
}

fn match_score(query: &str, doctor: &Doctor) -> f64 {
    let name = doctor.name.to_lowercase();
    let specialization = doctor.specialization.to_lowercase();
    if name.contains(query) || specialization.contains(query) {
        return 1.0;
    }

    name.split_whitespace()
        .chain(specialization.split_whitespace())
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(|word| fuzzy_match(query, word))
        .fold(0.0, f64::max)
}

fn fuzzy_match(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}
