//! Hospital analytics snapshot for the admin dashboard.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::directory::Directory;
use crate::gate::Gate;
use crate::ledger::Ledger;
use crate::models::AppointmentStatus;

/// Days covered by the trend series, today included.
const TREND_DAYS: i64 = 7;

/// Point-in-time analytics over the ledger and directory.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    /// Date the report was computed for
    pub generated_on: NaiveDate,
    /// Identities with the patient role
    pub total_patients: usize,
    /// Doctor profiles in the directory
    pub total_doctors: usize,
    /// Every appointment, any status
    pub total_appointments: usize,
    /// Appointment count per status
    pub by_status: Vec<StatusCount>,
    /// Appointments dated today
    pub today: TodaySummary,
    /// Per-department load and revenue
    pub departments: Vec<DepartmentStat>,
    /// Appointments per day for the last week
    pub trend: Vec<DayCount>,
    /// Mean doctor rating (0 when there are no doctors)
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: AppointmentStatus,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodaySummary {
    pub total: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentStat {
    pub department: String,
    pub doctors: usize,
    pub appointments: usize,
    /// Sum of consultation fees over completed appointments
    pub revenue: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub appointments: usize,
}

impl AnalyticsReport {
    /// Compute the report as of `today`.
    pub fn build(ledger: &Ledger, directory: &Directory, gate: &Gate, today: NaiveDate) -> Self {
        let appointments = ledger.appointments();

        let by_status = AppointmentStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: appointments.iter().filter(|a| a.status == status).count(),
            })
            .collect();

        let mut today_summary = TodaySummary::default();
        for appointment in appointments.iter().filter(|a| a.date == today) {
            today_summary.total += 1;
            match appointment.status {
                AppointmentStatus::Scheduled | AppointmentStatus::InProgress => {
                    today_summary.scheduled += 1
                }
                AppointmentStatus::Completed => today_summary.completed += 1,
                AppointmentStatus::Cancelled => today_summary.cancelled += 1,
                AppointmentStatus::NoShow => {}
            }
        }

        let doctor_department: HashMap<&str, (&str, u32)> = directory
            .doctors()
            .iter()
            .map(|d| (d.id.as_str(), (d.department.as_str(), d.consultation_fee)))
            .collect();

        let departments = directory
            .departments()
            .iter()
            .map(|department| {
                let name = department.name.as_str();
                let mut stat = DepartmentStat {
                    department: department.name.clone(),
                    doctors: directory.in_department(name).len(),
                    appointments: 0,
                    revenue: 0,
                };
                for appointment in appointments {
                    let Some(&(dept, fee)) = doctor_department.get(appointment.doctor_id.as_str())
                    else {
                        continue;
                    };
                    if dept != name {
                        continue;
                    }
                    stat.appointments += 1;
                    if appointment.status == AppointmentStatus::Completed {
                        stat.revenue += u64::from(fee);
                    }
                }
                stat
            })
            .collect();

        let trend = (0..TREND_DAYS)
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                DayCount {
                    date,
                    appointments: appointments.iter().filter(|a| a.date == date).count(),
                }
            })
            .collect();

        let doctors = directory.doctors();
        let average_rating = if doctors.is_empty() {
            0.0
        } else {
            doctors.iter().map(|d| d.rating).sum::<f64>() / doctors.len() as f64
        };

        Self {
            generated_on: today,
            total_patients: gate.role_counts().patients,
            total_doctors: doctors.len(),
            total_appointments: appointments.len(),
            by_status,
            today: today_summary,
            departments,
            trend,
            average_rating,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV as `section,key,value` rows.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("section,key,value\n");
        csv.push_str(&format!("summary,total_patients,{}\n", self.total_patients));
        csv.push_str(&format!("summary,total_doctors,{}\n", self.total_doctors));
        csv.push_str(&format!("summary,total_appointments,{}\n", self.total_appointments));
        csv.push_str(&format!("summary,average_rating,{:.2}\n", self.average_rating));

        for entry in &self.by_status {
            csv.push_str(&format!("status,{},{}\n", entry.status.as_str(), entry.count));
        }

        csv.push_str(&format!("today,total,{}\n", self.today.total));
        csv.push_str(&format!("today,scheduled,{}\n", self.today.scheduled));
        csv.push_str(&format!("today,completed,{}\n", self.today.completed));
        csv.push_str(&format!("today,cancelled,{}\n", self.today.cancelled));

        for stat in &self.departments {
            let name = escape_csv(&stat.department);
            csv.push_str(&format!("department_appointments,{},{}\n", name, stat.appointments));
            csv.push_str(&format!("department_revenue,{},{}\n", name, stat.revenue));
        }

        for day in &self.trend {
            csv.push_str(&format!("trend,{},{}\n", day.date, day.appointments));
        }

        csv
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GateConfig, LedgerConfig};
    use crate::db::Database;
    use crate::gate::Account;
    use crate::models::{Appointment, AppointmentType, Department, Doctor, Identity, Role};
    use chrono::{NaiveTime, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn appointment(
        id: &str,
        doctor: &str,
        date: NaiveDate,
        status: AppointmentStatus,
    ) -> Appointment {
        Appointment {
            id: id.into(),
            patient_id: "u1".into(),
            doctor_id: doctor.into(),
            slot_id: None,
            date,
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            status,
            kind: AppointmentType::Consultation,
            notes: None,
            created_at: Utc::now(),
            created_by: "u1".into(),
        }
    }

    fn setup() -> (Ledger, Directory, Gate) {
        let mut cardio = Doctor::new(
            "u2".into(),
            "Dr. Sarah Johnson".into(),
            "Cardiology".into(),
            "Cardiology".into(),
        );
        cardio.id = "d1".into();
        cardio.consultation_fee = 200;
        cardio.rating = 4.9;
        let mut neuro = Doctor::new(
            "u7".into(),
            "Dr. Michael Chen".into(),
            "Neurology".into(),
            "Neurology, Brain".into(),
        );
        neuro.id = "d2".into();
        neuro.consultation_fee = 180;
        neuro.rating = 4.7;

        let directory = Directory::new(
            vec![cardio, neuro],
            vec![
                Department {
                    id: "dept1".into(),
                    name: "Cardiology".into(),
                    description: String::new(),
                },
                Department {
                    id: "dept2".into(),
                    name: "Neurology, Brain".into(),
                    description: String::new(),
                },
            ],
        );

        let yesterday = today() - Duration::days(1);
        let ledger = Ledger::with_records(
            vec![],
            vec![
                appointment("a1", "d1", today(), AppointmentStatus::Scheduled),
                appointment("a2", "d1", yesterday, AppointmentStatus::Completed),
                appointment("a3", "d2", today(), AppointmentStatus::Cancelled),
                appointment("a4", "d2", yesterday, AppointmentStatus::Completed),
                appointment("a5", "d1", today() - Duration::days(30), AppointmentStatus::Completed),
            ],
            vec![],
            LedgerConfig::default(),
        );

        let patient = Identity::new("p@x.com".into(), "P".into(), Role::Patient);
        let admin = Identity::new("a@x.com".into(), "A".into(), Role::Admin);
        let accounts = vec![
            Account::new(patient, "password123", 1),
            Account::new(admin, "password123", 1),
        ];
        let store = Database::open_in_memory().unwrap();
        let gate = Gate::restore(store, accounts, GateConfig::default()).unwrap();

        (ledger, directory, gate)
    }

    #[test]
    fn test_build_report() {
        let (ledger, directory, gate) = setup();
        let report = AnalyticsReport::build(&ledger, &directory, &gate, today());

        assert_eq!(report.total_patients, 1);
        assert_eq!(report.total_doctors, 2);
        assert_eq!(report.total_appointments, 5);
        assert_eq!(
            report.today,
            TodaySummary {
                total: 2,
                scheduled: 1,
                completed: 0,
                cancelled: 1
            }
        );

        let completed = report
            .by_status
            .iter()
            .find(|s| s.status == AppointmentStatus::Completed)
            .unwrap();
        assert_eq!(completed.count, 3);

        assert_eq!(report.departments[0].appointments, 3);
        assert_eq!(report.departments[0].revenue, 400);
        assert_eq!(report.departments[1].revenue, 180);

        assert_eq!(report.trend.len(), 7);
        assert_eq!(report.trend.last().map(|d| d.appointments), Some(2));
        assert_eq!(report.trend[5].appointments, 2);
        assert_eq!(report.trend[0].date, today() - Duration::days(6));
        assert!((report.average_rating - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_csv_export() {
        let (ledger, directory, gate) = setup();
        let csv = AnalyticsReport::build(&ledger, &directory, &gate, today()).to_csv();

        assert!(csv.starts_with("section,key,value\n"));
        assert!(csv.contains("summary,average_rating,4.80\n"));
        assert!(csv.contains("status,no-show,0\n"));
        assert!(csv.contains("department_revenue,\"Neurology, Brain\",180\n"));
        assert!(csv.contains("trend,2024-03-10,2\n"));
    }

    #[test]
    fn test_json_export() {
        let (ledger, directory, gate) = setup();
        let json = AnalyticsReport::build(&ledger, &directory, &gate, today()).to_json().unwrap();
        assert!(json.contains("\"total_appointments\": 5"));
        assert!(json.contains("\"status\": \"in-progress\""));
    }
}
