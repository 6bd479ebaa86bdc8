//! Patient service: validation, timestamping, persistence and fan-out.
//!
//! Pipeline for every mutation:
//!
//! ```text
//! caller → validate → stamp → repository write → snapshot → each subscriber
//! ```
//!
//! The write is committed before any subscriber is called; nothing that
//! happens during fan-out can fail the mutation.

mod subscribers;

pub use subscribers::*;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Notification, Patient};
use crate::repository::{PatientRepository, RepositoryError};
use crate::validation::{self, ValidationError};

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Duplicate id: {0}")]
    DuplicateKey(i64),

    #[error("Patient not found: {0}")]
    NotFound(i64),

    #[error("Subscriber name cannot be empty")]
    EmptyIdentity,

    #[error("Subscriber not found: {0}")]
    SubscriberNotFound(String),

    #[error("Storage fault: {0}")]
    Storage(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::DuplicateKey(id) => ServiceError::DuplicateKey(id),
            RepositoryError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<SubscriptionError> for ServiceError {
    fn from(e: SubscriptionError) -> Self {
        match e {
            SubscriptionError::EmptyIdentity => ServiceError::EmptyIdentity,
            SubscriptionError::NotFound(name) => ServiceError::SubscriberNotFound(name),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Orchestrates every patient operation.
///
/// The repository is injected once at construction. The service holds no
/// record state of its own and is safe to share behind an `Arc`.
///
/// Mutations are serialized from the repository write through the end of
/// fan-out, so subscribers see events in commit order and each snapshot is
/// the collection right after its own change.
pub struct PatientService {
    repository: Box<dyn PatientRepository>,
    subscribers: SubscriberSet,
    mutations: Mutex<()>,
}

impl PatientService {
    pub fn new(repository: Box<dyn PatientRepository>) -> Self {
        Self {
            repository,
            subscribers: SubscriberSet::new(),
            mutations: Mutex::new(()),
        }
    }

    // Guards no data, so a poisoned lock is still usable.
    fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate, stamp both timestamps and store a new patient.
    pub fn create_patient(&self, mut patient: Patient) -> ServiceResult<()> {
        validation::validate(&patient)?;

        let _ordered = self.lock_mutations();
        patient.stamp_created(Utc::now());
        self.repository.create(&patient)?;

        info!(id = patient.id, created_at = %patient.created_at, "Patient created");
        self.notify(format!("New patient added with id: {}", patient.id));
        Ok(())
    }

    pub fn get_patients(&self) -> ServiceResult<Vec<Patient>> {
        Ok(self.repository.read_all()?)
    }

    pub fn get_patient(&self, id: i64) -> ServiceResult<Patient> {
        Ok(self.repository.read_one(id)?)
    }

    /// Validate and replace an existing patient.
    ///
    /// Validation runs before the existence check. The stored `created_at` is
    /// kept by the repository whatever the caller submits.
    pub fn update_patient(&self, mut patient: Patient) -> ServiceResult<()> {
        validation::validate(&patient)?;

        let _ordered = self.lock_mutations();
        patient.stamp_updated(Utc::now());
        self.repository.update(&patient)?;

        info!(id = patient.id, updated_at = %patient.updated_at, "Patient updated");
        self.notify(format!("Patient updated with id: {}", patient.id));
        Ok(())
    }

    pub fn delete_patient(&self, id: i64) -> ServiceResult<()> {
        let _ordered = self.lock_mutations();
        self.repository.delete(id)?;

        info!(id, "Patient removed");
        self.notify(format!("Patient removed with id: {}", id));
        Ok(())
    }

    /// Register a subscriber for every later notification.
    pub fn add_subscriber(&self, subscriber: Arc<dyn Subscriber>) -> ServiceResult<()> {
        let name = subscriber.name().to_string();
        self.subscribers.add(subscriber)?;
        info!(subscriber = %name, "Subscriber added");
        Ok(())
    }

    /// Unregister the first subscriber sharing `subscriber`'s name.
    pub fn remove_subscriber(&self, subscriber: &dyn Subscriber) -> ServiceResult<()> {
        self.remove_subscriber_by_name(subscriber.name())
    }

    pub fn remove_subscriber_by_name(&self, name: &str) -> ServiceResult<()> {
        self.subscribers.remove_by_name(name)?;
        info!(subscriber = %name, "Subscriber removed");
        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Snapshot the store and deliver `message` to every subscriber.
    ///
    /// Blocks until each delivery has been attempted. A failed snapshot
    /// abandons the notification; it is logged and never returned.
    fn notify(&self, message: String) {
        let patients = match self.repository.read_all() {
            Ok(patients) => patients,
            Err(e) => {
                warn!(error = %e, message = %message, "Failed to read patients for notification");
                return;
            }
        };

        self.subscribers
            .broadcast(&Notification::new(message, patients));
    }
}
