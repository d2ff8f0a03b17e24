//! Demonstration records loaded on a fresh start.
//!
//! Dates are relative to `today`, so the demo always shows appointments for
//! today, tomorrow and the recent past. Slot counts are deterministic.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use tracing::info;

use crate::config::MedibookConfig;
use crate::directory::Directory;
use crate::gate::Account;
use crate::ledger::Ledger;
use crate::models::{
    Appointment, AppointmentStatus, AppointmentType, Department, Doctor, Identity, IdentityProfile,
    Notification, Role, Severity, TimeSlot,
};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "password123";

/// Seats per seeded slot.
const SLOT_CAPACITY: u32 = 2;

/// Start times offered each working day; each slot ends when the next begins.
const SLOT_TIMES: [(u32, u32); 12] = [
    (9, 0),
    (9, 30),
    (10, 0),
    (10, 30),
    (11, 0),
    (11, 30),
    (14, 0),
    (14, 30),
    (15, 0),
    (15, 30),
    (16, 0),
    (16, 30),
];

/// End of the last slot of the day.
const DAY_END: (u32, u32) = (17, 0);

/// Seed data builder.
pub struct Seed;

impl Seed {
    /// Accounts, directory and ledger as of `today`.
    pub fn load(today: NaiveDate, config: &MedibookConfig) -> (Vec<Account>, Directory, Ledger) {
        let accounts = Self::accounts(config.gate.hash_iterations);
        let directory = Directory::new(Self::doctors(), Self::departments());

        let mut slots = Self::slots(today, config.seed_days);
        let appointments = bind_appointments(Self::appointments(today), &mut slots);

        let mut ledger = Ledger::with_records(
            slots,
            appointments,
            Self::notifications(),
            config.ledger.clone(),
        );
        ledger.set_doctor_names(
            directory
                .doctors()
                .iter()
                .map(|d| (d.id.clone(), d.name.clone())),
        );

        info!(
            accounts = accounts.len(),
            doctors = directory.doctors().len(),
            slots = ledger.slots().len(),
            appointments = ledger.appointments().len(),
            "Seed data loaded"
        );
        (accounts, directory, ledger)
    }

    /// Demo accounts, all with [`DEMO_PASSWORD`].
    pub fn accounts(iterations: u32) -> Vec<Account> {
        let rows: [(&str, &str, &str, Role, (i32, u32, u32), IdentityProfile); 6] = [
            (
                "u1",
                "patient@hospital.com",
                "John Smith",
                Role::Patient,
                (2024, 1, 15),
                IdentityProfile {
                    phone: Some("+1 234 567 8900".into()),
                    date_of_birth: Some("1985-06-15".into()),
                    address: Some("123 Main St, New York, NY 10001".into()),
                    ..Default::default()
                },
            ),
            (
                "u2",
                "doctor@hospital.com",
                "Dr. Sarah Johnson",
                Role::Doctor,
                (2023, 6, 1),
                IdentityProfile {
                    phone: Some("+1 234 567 8901".into()),
                    department: Some("Cardiology".into()),
                    specialization: Some("Interventional Cardiology".into()),
                    ..Default::default()
                },
            ),
            (
                "u3",
                "receptionist@hospital.com",
                "Emily Davis",
                Role::Receptionist,
                (2023, 8, 15),
                IdentityProfile {
                    phone: Some("+1 234 567 8902".into()),
                    ..Default::default()
                },
            ),
            (
                "u4",
                "admin@hospital.com",
                "Michael Brown",
                Role::Admin,
                (2023, 1, 1),
                IdentityProfile {
                    phone: Some("+1 234 567 8903".into()),
                    ..Default::default()
                },
            ),
            (
                "u5",
                "jane.patient@email.com",
                "Jane Wilson",
                Role::Patient,
                (2024, 2, 10),
                IdentityProfile {
                    phone: Some("+1 234 567 8904".into()),
                    date_of_birth: Some("1990-03-22".into()),
                    address: Some("456 Oak Ave, Brooklyn, NY 11201".into()),
                    ..Default::default()
                },
            ),
            (
                "u6",
                "robert.patient@email.com",
                "Robert Taylor",
                Role::Patient,
                (2024, 3, 5),
                IdentityProfile {
                    phone: Some("+1 234 567 8905".into()),
                    date_of_birth: Some("1978-11-08".into()),
                    address: Some("789 Pine Rd, Queens, NY 11375".into()),
                    ..Default::default()
                },
            ),
        ];

        rows.into_iter()
            .map(|(id, email, name, role, (y, m, d), profile)| {
                let identity = Identity {
                    id: id.into(),
                    email: email.into(),
                    name: name.into(),
                    role,
                    profile,
                    created_at: midnight(y, m, d),
                };
                Account::new(identity, DEMO_PASSWORD, iterations)
            })
            .collect()
    }

    pub fn departments() -> Vec<Department> {
        [
            ("1", "Cardiology", "Heart and cardiovascular system"),
            ("2", "Neurology", "Brain and nervous system"),
            ("3", "Orthopedics", "Bones, joints, and muscles"),
            ("4", "Pediatrics", "Children's health"),
            ("5", "Dermatology", "Skin conditions"),
            ("6", "General Medicine", "Primary care"),
            ("7", "Ophthalmology", "Eye care"),
            ("8", "Dentistry", "Dental care"),
        ]
        .into_iter()
        .map(|(id, name, description)| Department {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        })
        .collect()
    }

    pub fn doctors() -> Vec<Doctor> {
        let rows = [
            (
                "d1",
                "u2",
                "Dr. Sarah Johnson",
                "doctor@hospital.com",
                "Interventional Cardiology",
                "Cardiology",
                15,
                "MD from Harvard Medical School",
                "Board-certified cardiologist treating complex heart conditions \
                 with minimally invasive cardiac procedures.",
                4.9,
                328,
                200,
            ),
            (
                "d2",
                "u7",
                "Dr. Michael Chen",
                "michael.chen@hospital.com",
                "Pediatric Neurology",
                "Neurology",
                12,
                "MD from Johns Hopkins University",
                "Pediatric neurologist specializing in epilepsy and developmental disorders.",
                4.8,
                256,
                180,
            ),
            (
                "d3",
                "u8",
                "Dr. Amanda Foster",
                "amanda.foster@hospital.com",
                "Sports Medicine",
                "Orthopedics",
                10,
                "MD from Stanford University",
                "Sports injuries and rehabilitation for athletes returning to active lifestyles.",
                4.7,
                189,
                175,
            ),
            (
                "d4",
                "u9",
                "Dr. James Williams",
                "james.williams@hospital.com",
                "General Pediatrics",
                "Pediatrics",
                18,
                "MD from Yale School of Medicine",
                "Comprehensive care for infants through adolescents.",
                4.9,
                412,
                150,
            ),
            (
                "d5",
                "u10",
                "Dr. Lisa Park",
                "lisa.park@hospital.com",
                "Cosmetic Dermatology",
                "Dermatology",
                8,
                "MD from Columbia University",
                "Medical dermatology and cosmetic procedures.",
                4.6,
                167,
                220,
            ),
            (
                "d6",
                "u11",
                "Dr. Robert Martinez",
                "robert.martinez@hospital.com",
                "Internal Medicine",
                "General Medicine",
                20,
                "MD from UCLA",
                "Internist focused on preventive medicine and chronic conditions.",
                4.8,
                534,
                140,
            ),
        ];

        rows.into_iter()
            .map(|row| {
                let (id, identity_id, name, email, specialization, department) =
                    (row.0, row.1, row.2, row.3, row.4, row.5);
                let mut doctor = Doctor::new(
                    identity_id.into(),
                    name.into(),
                    specialization.into(),
                    department.into(),
                );
                doctor.id = id.into();
                doctor.email = email.into();
                doctor.experience_years = row.6;
                doctor.education = row.7.into();
                doctor.bio = row.8.into();
                doctor.rating = row.9;
                doctor.review_count = row.10;
                doctor.consultation_fee = row.11;
                doctor
            })
            .collect()
    }

    /// Weekday slots for every seeded doctor over `days` days from `today`.
    ///
    /// Booked counts are a demo baseline: seats taken outside this ledger,
    /// so `booked_count` may exceed `Ledger::seats_held` for these slots.
    pub fn slots(today: NaiveDate, days: u32) -> Vec<TimeSlot> {
        let times: Vec<NaiveTime> = SLOT_TIMES
            .iter()
            .chain(std::iter::once(&DAY_END))
            .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
            .collect();

        let mut slots = Vec::new();
        for doctor in Self::doctors() {
            for day in 0..days {
                let date = today + Duration::days(i64::from(day));
                if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                    continue;
                }
                for (index, pair) in times.windows(2).enumerate() {
                    // Baseline occupancy with no backing appointments.
                    let booked_count = (day as usize + index) as u32 % (SLOT_CAPACITY + 1);
                    let mut slot =
                        TimeSlot::new(doctor.id.clone(), date, pair[0], pair[1], SLOT_CAPACITY);
                    slot.id = format!("slot-{}-{}-{}", doctor.id, day, index);
                    slot.booked_count = booked_count;
                    slot.recompute_status();
                    slots.push(slot);
                }
            }
        }
        slots
    }

    /// Demo appointments, unbound (`slot_id = None`).
    pub fn appointments(today: NaiveDate) -> Vec<Appointment> {
        let rows = [
            (
                "apt1",
                "u1",
                "d1",
                0,
                (9, 0),
                AppointmentStatus::Scheduled,
                AppointmentType::Consultation,
                Some("Regular checkup for heart condition"),
                (2024, 1, 10),
                "u1",
            ),
            (
                "apt2",
                "u5",
                "d2",
                0,
                (10, 30),
                AppointmentStatus::InProgress,
                AppointmentType::FollowUp,
                Some("Follow-up for migraine treatment"),
                (2024, 1, 8),
                "u3",
            ),
            (
                "apt3",
                "u6",
                "d3",
                -1,
                (14, 0),
                AppointmentStatus::Completed,
                AppointmentType::Consultation,
                Some("Knee pain evaluation"),
                (2024, 1, 5),
                "u6",
            ),
            (
                "apt4",
                "u1",
                "d4",
                1,
                (11, 0),
                AppointmentStatus::Scheduled,
                AppointmentType::Consultation,
                None,
                (2024, 1, 12),
                "u1",
            ),
            (
                "apt5",
                "u5",
                "d5",
                -2,
                (15, 30),
                AppointmentStatus::Cancelled,
                AppointmentType::Consultation,
                Some("Skin rash examination - Patient cancelled"),
                (2024, 1, 3),
                "u5",
            ),
            (
                "apt6",
                "u6",
                "d6",
                2,
                (9, 30),
                AppointmentStatus::Scheduled,
                AppointmentType::FollowUp,
                None,
                (2024, 1, 14),
                "u3",
            ),
        ];

        rows.into_iter()
            .filter_map(
                |(id, patient, doctor, offset, (h, m), status, kind, notes, created, created_by)| {
                    let (y, mo, d) = created;
                    Some(Appointment {
                        id: id.into(),
                        patient_id: patient.into(),
                        doctor_id: doctor.into(),
                        slot_id: None,
                        date: today + Duration::days(offset),
                        time: NaiveTime::from_hms_opt(h, m, 0)?,
                        status,
                        kind,
                        notes: notes.map(String::from),
                        created_at: midnight(y, mo, d),
                        created_by: created_by.into(),
                    })
                },
            )
            .collect()
    }

    pub fn notifications() -> Vec<Notification> {
        let now = Utc::now();
        [
            (
                "n1",
                "u1",
                "Appointment Reminder",
                "Your appointment with Dr. Sarah Johnson is tomorrow at 09:00 AM",
                Severity::Info,
                false,
                0,
            ),
            (
                "n2",
                "u1",
                "Appointment Confirmed",
                "Your appointment has been confirmed for Dr. James Williams",
                Severity::Success,
                true,
                1,
            ),
            (
                "n3",
                "u2",
                "New Patient Assigned",
                "A new patient has booked an appointment for today",
                Severity::Info,
                false,
                0,
            ),
            (
                "n4",
                "u3",
                "Walk-in Patient",
                "A walk-in patient is waiting at the reception",
                Severity::Warning,
                false,
                0,
            ),
        ]
        .into_iter()
        .map(|(id, identity_id, title, message, severity, read, days_ago)| {
            let mut notification =
                Notification::new(identity_id.into(), title.into(), message.into(), severity);
            notification.id = id.into();
            notification.read = read;
            notification.created_at = now - Duration::days(days_ago);
            notification
        })
        .collect()
    }
}

/// Point each appointment at its `(doctor, date, time)` slot, if one exists.
/// A seat-holding appointment always counts in its slot.
fn bind_appointments(
    mut appointments: Vec<Appointment>,
    slots: &mut [TimeSlot],
) -> Vec<Appointment> {
    for appointment in &mut appointments {
        let Some(slot) = slots
            .iter_mut()
            .find(|s| s.matches(&appointment.doctor_id, appointment.date, appointment.time))
        else {
            continue;
        };
        appointment.slot_id = Some(slot.id.clone());
        if appointment.holds_seat() && slot.booked_count == 0 {
            slot.occupy();
        }
    }
    appointments
}

fn midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now)
}
