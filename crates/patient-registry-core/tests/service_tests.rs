//! Patient service integration tests, run against every storage backend.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use patient_registry_core::{
    DeliveryError, InMemoryRepository, Notification, Patient, PatientService,
    RecordingSubscriber, ServiceError, SqliteRepository, Subscriber, Violation,
};

fn services() -> Vec<(&'static str, PatientService)> {
    vec![
        (
            "memory",
            PatientService::new(Box::new(InMemoryRepository::new())),
        ),
        (
            "sqlite",
            PatientService::new(Box::new(SqliteRepository::open_in_memory().unwrap())),
        ),
    ]
}

fn make_patient(id: i64) -> Patient {
    Patient::new(id, "abc", "surat", "fever", 12345, (2024, 2, 12))
}

/// Appends `"<name>: <message>"` to a log shared between subscribers.
struct LoggingSubscriber {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl Subscriber for LoggingSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}: {}", self.name, notification.message));
        Ok(())
    }
}

struct FailingSubscriber;

impl Subscriber for FailingSubscriber {
    fn name(&self) -> &str {
        "failing"
    }

    fn receive(&self, _: &Notification) -> Result<(), DeliveryError> {
        Err(DeliveryError::Rejected("connection reset".into()))
    }
}

struct PanickingSubscriber;

impl Subscriber for PanickingSubscriber {
    fn name(&self) -> &str {
        "panicking"
    }

    fn receive(&self, _: &Notification) -> Result<(), DeliveryError> {
        panic!("subscriber bug");
    }
}

fn messages(notifications: &[Notification]) -> Vec<&str> {
    notifications.iter().map(|n| n.message.as_str()).collect()
}

#[test]
fn test_create_example_scenario() {
    for (backend, service) in services() {
        service.create_patient(make_patient(1)).unwrap();

        let patients = service.get_patients().unwrap();
        assert_eq!(patients.len(), 1, "{backend}");
        assert_eq!(patients[0].id, 1);
        assert_eq!(patients[0].name, "abc");
        assert!(patients[0].created_at.timestamp() > 0, "{backend}");
        assert_eq!(patients[0].created_at, patients[0].updated_at, "{backend}");
    }
}

#[test]
fn test_caller_timestamps_are_replaced() {
    for (backend, service) in services() {
        let mut patient = make_patient(1);
        patient.stamp_created(Utc::now() - Duration::days(365));

        let before = Utc::now();
        service.create_patient(patient).unwrap();
        let after = Utc::now();

        let stored = service.get_patient(1).unwrap();
        assert!(stored.created_at >= before && stored.created_at <= after, "{backend}");
    }
}

#[test]
fn test_invalid_create_has_no_side_effects() {
    for (backend, service) in services() {
        let sub = Arc::new(RecordingSubscriber::new("sub"));
        service.add_subscriber(sub.clone()).unwrap();

        let patient = Patient::new(-1, "", "surat", "fever", 0, (2024, 14, 12));
        match service.create_patient(patient) {
            Err(ServiceError::Validation(e)) => assert_eq!(
                e.violations(),
                &[
                    Violation::NonPositiveId,
                    Violation::EmptyName,
                    Violation::ZeroPhone,
                    Violation::MonthOutOfRange,
                ],
                "{backend}"
            ),
            other => panic!("{backend}: expected validation error, got {:?}", other),
        }

        assert!(service.get_patients().unwrap().is_empty(), "{backend}");
        assert!(sub.notifications().is_empty(), "{backend}");
    }
}

#[test]
fn test_invalid_update_leaves_record_untouched() {
    for (backend, service) in services() {
        service.create_patient(make_patient(1)).unwrap();
        let before = service.get_patients().unwrap();

        let mut patient = make_patient(1);
        patient.address.clear();
        patient.date = 40;
        match service.update_patient(patient) {
            Err(ServiceError::Validation(e)) => assert_eq!(
                e.violations(),
                &[Violation::DateOutOfRange, Violation::EmptyAddress],
                "{backend}"
            ),
            other => panic!("{backend}: expected validation error, got {:?}", other),
        }

        assert_eq!(service.get_patients().unwrap(), before, "{backend}");
    }
}

#[test]
fn test_read_is_idempotent() {
    for (backend, service) in services() {
        service.create_patient(make_patient(2)).unwrap();
        service.create_patient(make_patient(1)).unwrap();

        let first = service.get_patients().unwrap();
        let second = service.get_patients().unwrap();
        assert_eq!(first, second, "{backend}");
        assert_eq!(first.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}

#[test]
fn test_duplicate_create() {
    for (backend, service) in services() {
        service.create_patient(make_patient(1)).unwrap();
        let before = service.get_patients().unwrap();

        let mut again = make_patient(1);
        again.name = "other".into();
        assert!(
            matches!(service.create_patient(again), Err(ServiceError::DuplicateKey(1))),
            "{backend}"
        );
        assert_eq!(service.get_patients().unwrap(), before, "{backend}");
    }
}

#[test]
fn test_not_found_symmetry() {
    for (backend, service) in services() {
        service.create_patient(make_patient(1)).unwrap();
        let before = service.get_patients().unwrap();

        assert!(
            matches!(service.update_patient(make_patient(9)), Err(ServiceError::NotFound(9))),
            "{backend}"
        );
        assert!(
            matches!(service.delete_patient(9), Err(ServiceError::NotFound(9))),
            "{backend}"
        );
        assert!(
            matches!(service.get_patient(9), Err(ServiceError::NotFound(9))),
            "{backend}"
        );
        assert_eq!(service.get_patients().unwrap(), before, "{backend}");
    }
}

#[test]
fn test_update_preserves_created_at() {
    for (backend, service) in services() {
        service.create_patient(make_patient(1)).unwrap();
        let original = service.get_patient(1).unwrap();

        let mut changed = make_patient(1);
        changed.disease = "cold".into();
        changed.created_at = original.created_at - Duration::days(10);

        let started = Utc::now();
        service.update_patient(changed).unwrap();
        let returned = Utc::now();

        let stored = service.get_patient(1).unwrap();
        assert_eq!(stored.disease, "cold", "{backend}");
        assert_eq!(stored.created_at, original.created_at, "{backend}");
        assert!(stored.updated_at >= started, "{backend}");
        assert!(stored.updated_at <= returned, "{backend}");
    }
}

#[test]
fn test_delete_removes_record() {
    for (backend, service) in services() {
        service.create_patient(make_patient(1)).unwrap();
        service.create_patient(make_patient(2)).unwrap();

        service.delete_patient(1).unwrap();

        let ids: Vec<i64> = service.get_patients().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2], "{backend}");
    }
}

#[test]
fn test_fan_out_order_and_snapshots() {
    for (backend, service) in services() {
        let first = Arc::new(RecordingSubscriber::new("first"));
        let second = Arc::new(RecordingSubscriber::new("second"));
        service.add_subscriber(first.clone()).unwrap();
        service.add_subscriber(second.clone()).unwrap();

        service.create_patient(make_patient(1)).unwrap();
        let after_create = service.get_patients().unwrap();

        let mut changed = make_patient(1);
        changed.name = "xyz".into();
        service.update_patient(changed).unwrap();
        let after_update = service.get_patients().unwrap();

        service.delete_patient(1).unwrap();

        let expected = vec![
            "New patient added with id: 1",
            "Patient updated with id: 1",
            "Patient removed with id: 1",
        ];
        for sub in [&first, &second] {
            let received = sub.notifications();
            assert_eq!(messages(&received), expected, "{backend}");
            assert_eq!(received[0].patients, after_create, "{backend}");
            assert_eq!(received[1].patients, after_update, "{backend}");
            assert!(received[2].patients.is_empty(), "{backend}");
        }
    }
}

#[test]
fn test_delivery_follows_registration_order() {
    for (backend, service) in services() {
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            service
                .add_subscriber(Arc::new(LoggingSubscriber {
                    name: name.to_string(),
                    log: Arc::clone(&log),
                }))
                .unwrap();
        }

        service.create_patient(make_patient(1)).unwrap();
        service.delete_patient(1).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first: New patient added with id: 1",
                "second: New patient added with id: 1",
                "third: New patient added with id: 1",
                "first: Patient removed with id: 1",
                "second: Patient removed with id: 1",
                "third: Patient removed with id: 1",
            ],
            "{backend}"
        );
    }
}

#[test]
fn test_subscriber_failures_do_not_fail_mutations() {
    for (backend, service) in services() {
        let before = Arc::new(RecordingSubscriber::new("before"));
        let after = Arc::new(RecordingSubscriber::new("after"));
        service.add_subscriber(before.clone()).unwrap();
        service.add_subscriber(Arc::new(FailingSubscriber)).unwrap();
        service.add_subscriber(Arc::new(PanickingSubscriber)).unwrap();
        service.add_subscriber(after.clone()).unwrap();

        service.create_patient(make_patient(1)).unwrap();
        let mut changed = make_patient(1);
        changed.disease = "cold".into();
        service.update_patient(changed).unwrap();
        service.delete_patient(1).unwrap();

        let expected = vec![
            "New patient added with id: 1",
            "Patient updated with id: 1",
            "Patient removed with id: 1",
        ];
        assert_eq!(messages(&before.notifications()), expected, "{backend}");
        assert_eq!(messages(&after.notifications()), expected, "{backend}");
        assert_eq!(service.subscriber_count(), 4, "{backend}");
        assert!(service.get_patients().unwrap().is_empty(), "{backend}");
    }
}

#[test]
fn test_failed_operations_do_not_notify() {
    for (backend, service) in services() {
        let sub = Arc::new(RecordingSubscriber::new("sub"));
        service.add_subscriber(sub.clone()).unwrap();

        service.create_patient(make_patient(1)).unwrap();
        let _ = service.create_patient(make_patient(1));
        let _ = service.update_patient(make_patient(5));
        let _ = service.delete_patient(5);
        let _ = service.get_patients();
        let _ = service.get_patient(1);

        assert_eq!(sub.notifications().len(), 1, "{backend}");
    }
}

#[test]
fn test_subscriber_lifecycle() {
    for (backend, service) in services() {
        assert!(
            matches!(
                service.add_subscriber(Arc::new(RecordingSubscriber::new(""))),
                Err(ServiceError::EmptyIdentity)
            ),
            "{backend}"
        );
        assert_eq!(service.subscriber_count(), 0);

        let ghost = RecordingSubscriber::new("ghost");
        match service.remove_subscriber(&ghost) {
            Err(ServiceError::SubscriberNotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("{backend}: expected subscriber not found, got {:?}", other),
        }

        let sub = Arc::new(RecordingSubscriber::new("sub"));
        service.add_subscriber(sub.clone()).unwrap();
        service.remove_subscriber(sub.as_ref()).unwrap();
        assert_eq!(service.subscriber_count(), 0);

        service.create_patient(make_patient(1)).unwrap();
        assert!(sub.notifications().is_empty(), "{backend}");
    }
}

#[test]
fn test_concurrent_creates_single_winner() {
    for (backend, service) in services() {
        let service = Arc::new(service);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || service.create_patient(make_patient(1)).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1, "{backend}");
        assert_eq!(service.get_patients().unwrap().len(), 1, "{backend}");
    }
}
