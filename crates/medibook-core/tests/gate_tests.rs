//! Session gate and FFI facade integration tests.

use medibook_core::config::GateConfig;
use medibook_core::db::Database;
use medibook_core::gate::{authorize, Capability, Gate, GateError};
use medibook_core::models::{Identity, Role};
use medibook_core::seed::{Seed, DEMO_PASSWORD};
use medibook_core::{open_core, open_core_in_memory, FfiBookingRequest, MedibookError};
use proptest::prelude::*;

const FAST_CONFIG: &str = r#"{"gate": {"hash_iterations": 1}}"#;

fn fast_gate_config() -> GateConfig {
    GateConfig {
        hash_iterations: 1,
        ..GateConfig::default()
    }
}

fn seeded_gate(store: Database) -> Gate {
    Gate::restore(store, Seed::accounts(1), fast_gate_config()).unwrap()
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

#[test]
fn test_failed_login_keeps_state() {
    let mut gate = seeded_gate(Database::open_in_memory().unwrap());

    let result = gate.authenticate("x@y.com", "wrong");

    assert!(matches!(result, Err(GateError::InvalidCredentials)));
    assert_eq!(
        result.unwrap_err().to_string(),
        "Invalid email or password"
    );
    assert!(gate.current_identity().is_none());
}

#[test]
fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.db");

    {
        let mut gate = seeded_gate(Database::open(&path).unwrap());
        gate.authenticate("doctor@hospital.com", DEMO_PASSWORD).unwrap();
    }

    let gate = seeded_gate(Database::open(&path).unwrap());
    let identity = gate.current_identity().unwrap();
    assert_eq!(identity.id, "u2");
    assert_eq!(identity.role, Role::Doctor);
    assert!(gate.can_access(Capability::Availability));
    assert!(!gate.can_access(Capability::FindDoctors));
}

#[test]
fn test_sign_out_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.db");

    {
        let mut gate = seeded_gate(Database::open(&path).unwrap());
        gate.authenticate("admin@hospital.com", DEMO_PASSWORD).unwrap();
        gate.end_session();
    }

    let gate = seeded_gate(Database::open(&path).unwrap());
    assert!(gate.current_identity().is_none());
}

proptest! {
    #[test]
    fn prop_admin_set_admits_only_admins(role in role_strategy()) {
        let identity = Identity::new("someone@hospital.com".into(), "Someone".into(), role);
        prop_assert_eq!(authorize(&[Role::Admin], Some(&identity)), role == Role::Admin);
    }

    #[test]
    fn prop_empty_set_admits_any_identity(role in role_strategy()) {
        let identity = Identity::new("someone@hospital.com".into(), "Someone".into(), role);
        prop_assert!(authorize(&[], Some(&identity)));
        prop_assert!(!authorize(&[], None));
    }

    #[test]
    fn prop_required_set_membership(
        required in prop::collection::vec(role_strategy(), 0..4),
        role in role_strategy(),
    ) {
        let identity = Identity::new("someone@hospital.com".into(), "Someone".into(), role);
        let expected = required.is_empty() || required.contains(&role);
        prop_assert_eq!(authorize(&required, Some(&identity)), expected);
        prop_assert!(!authorize(&required, None));
    }
}

#[test]
fn test_core_requires_sign_in() {
    let core = open_core_in_memory(Some(FAST_CONFIG.into())).unwrap();

    assert!(matches!(core.notifications(), Err(MedibookError::NotAuthenticated)));
    assert!(!core.can_access("/dashboard".into()).unwrap());
    assert!(core.navigation().unwrap().is_empty());
}

#[test]
fn test_core_patient_flow() {
    let core = open_core_in_memory(Some(FAST_CONFIG.into())).unwrap();
    let identity = core.sign_in("patient@hospital.com".into(), DEMO_PASSWORD.into()).unwrap();
    assert_eq!(identity.role, "patient");

    assert!(core.can_access("/appointments".into()).unwrap());
    assert!(!core.can_access("/analytics".into()).unwrap());
    assert!(matches!(core.analytics_json(), Err(MedibookError::Forbidden(_))));

    // Booking for someone else is refused.
    let foreign = FfiBookingRequest {
        patient_id: "u5".into(),
        doctor_id: "d1".into(),
        date: "2024-03-04".into(),
        time: "09:00".into(),
        appointment_type: "consultation".into(),
        notes: None,
    };
    assert!(matches!(core.book_appointment(foreign), Err(MedibookError::Forbidden(_))));

    let own = core.my_appointments("all".into()).unwrap();
    assert!(own.iter().all(|a| a.patient_id == "u1"));
    assert_eq!(own.len(), 2);

    let bad_window = core.my_appointments("someday".into());
    assert!(matches!(bad_window, Err(MedibookError::InvalidInput(_))));

    core.sign_out().unwrap();
    assert!(core.current_identity().unwrap().is_none());
}

#[test]
fn test_core_admin_analytics_and_users() {
    let core = open_core_in_memory(Some(FAST_CONFIG.into())).unwrap();
    core.sign_in("admin@hospital.com".into(), DEMO_PASSWORD.into()).unwrap();

    let counts = core.role_counts().unwrap();
    assert_eq!(counts.total, 6);
    assert_eq!(counts.patients, 3);
    assert_eq!(counts.staff, 2);

    let patients = core.search_users("".into(), Some("patient".into())).unwrap();
    assert_eq!(patients.len(), 3);

    let json = core.analytics_json().unwrap();
    assert!(json.contains("\"total_appointments\": 6"));
    assert!(core.analytics_csv().unwrap().starts_with("section,key,value"));
}

#[test]
fn test_core_wrong_password() {
    let core = open_core_in_memory(Some(FAST_CONFIG.into())).unwrap();
    let result = core.sign_in("patient@hospital.com".into(), "nope".into());
    assert!(matches!(result, Err(MedibookError::InvalidCredentials)));
}

#[test]
fn test_core_reopens_session_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("core.db").to_string_lossy().to_string();

    {
        let core = open_core(path.clone(), Some(FAST_CONFIG.into())).unwrap();
        core.sign_in("receptionist@hospital.com".into(), DEMO_PASSWORD.into()).unwrap();
    }

    let core = open_core(path, Some(FAST_CONFIG.into())).unwrap();
    let identity = core.current_identity().unwrap().unwrap();
    assert_eq!(identity.name, "Emily Davis");
    assert!(core.can_access("/scheduling".into()).unwrap());
}

fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn staff_booking(patient_id: &str, date: &str, time: &str) -> FfiBookingRequest {
    FfiBookingRequest {
        patient_id: patient_id.into(),
        doctor_id: "d1".into(),
        date: date.into(),
        time: time.into(),
        appointment_type: "consultation".into(),
        notes: None,
    }
}

#[test]
fn test_core_patient_can_only_cancel() {
    let core = open_core_in_memory(Some(FAST_CONFIG.into())).unwrap();
    core.sign_in("patient@hospital.com".into(), DEMO_PASSWORD.into()).unwrap();

    for status in ["completed", "in-progress", "no-show"] {
        let result = core.transition_appointment("apt1".into(), status.into());
        assert!(matches!(result, Err(MedibookError::Forbidden(_))), "{status}");
    }

    let cancelled = core.transition_appointment("apt1".into(), "cancelled".into()).unwrap();
    assert_eq!(cancelled.status, "cancelled");
}

#[test]
fn test_core_doctor_records_visit_outcome() {
    let core = open_core_in_memory(Some(FAST_CONFIG.into())).unwrap();
    core.sign_in("doctor@hospital.com".into(), DEMO_PASSWORD.into()).unwrap();

    let completed = core.transition_appointment("apt1".into(), "completed".into()).unwrap();
    assert_eq!(completed.status, "completed");
}

#[test]
fn test_core_staff_books_only_for_patients() {
    let core = open_core_in_memory(Some(FAST_CONFIG.into())).unwrap();
    core.sign_in("receptionist@hospital.com".into(), DEMO_PASSWORD.into()).unwrap();

    let admin = core.book_appointment(staff_booking("u4", &today(), "09:00"));
    assert!(matches!(admin, Err(MedibookError::InvalidInput(_))));

    let ghost = core.book_appointment(staff_booking("ghost", &today(), "09:00"));
    assert!(matches!(ghost, Err(MedibookError::NotFound(_))));

    // Seeded weekdays always have an open slot for d1.
    let open = (0..7)
        .map(|offset| {
            (chrono::Utc::now().date_naive() + chrono::Duration::days(offset))
                .format("%Y-%m-%d")
                .to_string()
        })
        .flat_map(|date| core.slots_for_doctor("d1".into(), date).unwrap())
        .find(|slot| slot.status == "available")
        .unwrap();
    let booked = core
        .book_appointment(staff_booking("u5", &open.date, &open.start_time))
        .unwrap();
    assert_eq!(booked.patient_id, "u5");
    assert_eq!(booked.patient_name, "Jane Wilson");
    assert_eq!(booked.created_by, "u3");
}

#[test]
fn test_core_today_window_keeps_only_today() {
    let core = open_core_in_memory(Some(FAST_CONFIG.into())).unwrap();
    core.sign_in("patient@hospital.com".into(), DEMO_PASSWORD.into()).unwrap();

    let todays = core.my_appointments("today".into()).unwrap();
    assert_eq!(todays.len(), 1);
    assert_eq!(todays[0].id, "apt1");
    assert!(todays.iter().all(|a| a.date == today()));

    assert_eq!(core.my_appointments("all".into()).unwrap().len(), 2);
}

#[test]
fn test_core_reopen_ignores_forged_snapshot_role() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("core.db");

    {
        let store = Database::open(&path).unwrap();
        let mut forged = Seed::accounts(1)
            .into_iter()
            .find(|a| a.identity.id == "u1")
            .unwrap()
            .identity;
        forged.role = Role::Admin;
        store.save_snapshot("hospital_user", &forged).unwrap();
    }

    let core = open_core(path.to_string_lossy().to_string(), Some(FAST_CONFIG.into())).unwrap();
    let identity = core.current_identity().unwrap().unwrap();
    assert_eq!(identity.role, "patient");
    assert!(!core.can_access("/analytics".into()).unwrap());
    assert!(matches!(core.analytics_json(), Err(MedibookError::Forbidden(_))));
}
