use chrono::NaiveDate;
use homecare_analytics::{
    age_distribution, labelled_workload, priority_distribution, workload, AgeBucket,
    DEFAULT_AGE_BUCKET_WIDTH,
};
use homecare_records::{PatientDetails, Priority, RecordStore, ScheduleDetails, StaffDetails, StaffRole};

#[test]
fn one_high_priority_visit_counts_toward_its_nurse() {
    let store = RecordStore::open_in_memory().unwrap();
    let patient = store
        .create_patient(
            PatientDetails {
                name: "A. Said".into(),
                age: 70,
                ..Default::default()
            },
            "admin",
        )
        .unwrap();
    let nurse = store
        .create_staff(StaffDetails::new("N. Ali", StaffRole::Nurse), "admin")
        .unwrap();
    let idle = store
        .create_staff(StaffDetails::new("R. Khan", StaffRole::CareGiver), "admin")
        .unwrap();

    let start = NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let mut visit = ScheduleDetails::new(patient.id, nurse.id, start, 30);
    visit.priority = Priority::High;
    let visit = store.create_schedule(visit, "doctor").unwrap();
    assert_eq!(visit.details.duration_minutes, 30);

    let snap = store.snapshot().unwrap();
    let load = workload(&snap.staff, &snap.schedules);
    assert_eq!(load[&nurse.id], 1);
    assert_eq!(load[&idle.id], 0);

    let ages = age_distribution(&snap.patients, DEFAULT_AGE_BUCKET_WIDTH);
    assert_eq!(ages[&AgeBucket::containing(70, DEFAULT_AGE_BUCKET_WIDTH)], 1);
    assert_eq!(ages.len(), 1);

    assert_eq!(priority_distribution(&snap.schedules)[&Priority::High], 1);

    let labelled = labelled_workload(&snap.staff, &snap.schedules);
    assert_eq!(labelled[0].name, "N. Ali");
    assert_eq!(labelled[0].visits, 1);
}
