//! Patient Registry Core Library
//!
//! Patient records with validation on every write, pluggable storage, and
//! real-time change notifications.
//!
//! # Architecture
//!
//! ```text
//!     create / update / delete
//!                │
//!                ▼
//!     ┌─────────────────────┐
//!     │   PatientService    │── validate ──▶ aggregated ValidationError
//!     └──────────┬──────────┘
//!                │ stamp timestamps
//!                ▼
//!     ┌─────────────────────┐
//!     │  PatientRepository  │  InMemoryRepository | SqliteRepository
//!     └──────────┬──────────┘
//!                │ committed → snapshot of all records
//!                ▼
//!     ┌─────────────────────┐
//!     │    SubscriberSet    │── in registration order ──▶ each Subscriber
//!     └─────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, Notification)
//! - [`validation`]: Field rules, collected rather than fail-fast
//! - [`db`]: SQLite database layer
//! - [`repository`]: Storage trait and its in-memory / SQLite backends
//! - [`service`]: Orchestration and notification fan-out
//! - [`config`]: Backend selection at startup

pub mod config;
pub mod db;
pub mod models;
pub mod repository;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use config::{RegistryConfig, StorageBackend};
pub use db::Database;
pub use models::{Notification, Patient};
pub use repository::{InMemoryRepository, PatientRepository, RepositoryError, SqliteRepository};
pub use service::{
    DeliveryError, JsonLinesSubscriber, PatientService, RecordingSubscriber, ServiceError,
    Subscriber,
};
pub use validation::{validate, ValidationError, Violation};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate id: {0}")]
    DuplicateKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ServiceError> for RegistryError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(v) => RegistryError::Validation(v.to_string()),
            ServiceError::DuplicateKey(id) => RegistryError::DuplicateKey(id.to_string()),
            ServiceError::NotFound(id) => RegistryError::NotFound(format!("patient {}", id)),
            ServiceError::SubscriberNotFound(name) => {
                RegistryError::NotFound(format!("subscriber {}", name))
            }
            ServiceError::EmptyIdentity => {
                RegistryError::InvalidInput("subscriber name cannot be empty".into())
            }
            ServiceError::Storage(e) => RegistryError::Storage(e.to_string()),
        }
    }
}

impl From<RepositoryError> for RegistryError {
    fn from(e: RepositoryError) -> Self {
        ServiceError::from(e).into()
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a SQLite-backed registry at the given path.
#[uniffi::export]
pub fn open_registry(path: String) -> Result<Arc<PatientRegistry>, RegistryError> {
    let service = RegistryConfig::sqlite(path).build_service()?;
    Ok(Arc::new(PatientRegistry { service }))
}

/// Create an in-memory registry (for testing).
#[uniffi::export]
pub fn open_registry_in_memory() -> Result<Arc<PatientRegistry>, RegistryError> {
    let service = RegistryConfig::in_memory().build_service()?;
    Ok(Arc::new(PatientRegistry { service }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PatientRegistry {
    service: PatientService,
}

#[uniffi::export]
impl PatientRegistry {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(&self, patient: FfiPatientInput) -> Result<(), RegistryError> {
        Ok(self.service.create_patient(patient.into())?)
    }

    /// List all patients.
    pub fn get_patients(&self) -> Result<Vec<FfiPatient>, RegistryError> {
        let patients = self.service.get_patients()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: i64) -> Result<FfiPatient, RegistryError> {
        Ok(self.service.get_patient(id)?.into())
    }

    /// Replace an existing patient's fields.
    pub fn update_patient(&self, patient: FfiPatientInput) -> Result<(), RegistryError> {
        Ok(self.service.update_patient(patient.into())?)
    }

    /// Delete a patient by id.
    pub fn delete_patient(&self, id: i64) -> Result<(), RegistryError> {
        Ok(self.service.delete_patient(id)?)
    }

    // =========================================================================
    // Subscriber Operations
    // =========================================================================

    /// Register a host-implemented subscriber.
    pub fn add_subscriber(&self, subscriber: Arc<dyn FfiSubscriber>) -> Result<(), RegistryError> {
        let bridge = ForeignSubscriber {
            name: subscriber.name(),
            inner: subscriber,
        };
        Ok(self.service.add_subscriber(Arc::new(bridge))?)
    }

    /// Remove the first subscriber registered under `name`.
    pub fn remove_subscriber(&self, name: String) -> Result<(), RegistryError> {
        Ok(self.service.remove_subscriber_by_name(&name)?)
    }

    pub fn subscriber_count(&self) -> u32 {
        self.service.subscriber_count() as u32
    }
}

// =========================================================================
// Foreign Subscribers
// =========================================================================

/// Subscriber implemented by the host application.
#[uniffi::export(with_foreign)]
pub trait FfiSubscriber: Send + Sync {
    fn name(&self) -> String;
    fn receive(&self, notification: FfiNotification);
}

struct ForeignSubscriber {
    name: String,
    inner: Arc<dyn FfiSubscriber>,
}

impl Subscriber for ForeignSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.inner.receive(notification.clone().into());
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient fields supplied by the caller.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientInput {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub disease: String,
    pub phone: i64,
    pub year: i32,
    pub month: i32,
    pub date: i32,
}

impl From<FfiPatientInput> for Patient {
    fn from(input: FfiPatientInput) -> Self {
        Patient::new(
            input.id,
            input.name,
            input.address,
            input.disease,
            input.phone,
            (input.year, input.month, input.date),
        )
    }
}

/// FFI-safe patient. Timestamps are RFC 3339.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub disease: String,
    pub phone: i64,
    pub year: i32,
    pub month: i32,
    pub date: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            address: patient.address,
            disease: patient.disease,
            phone: patient.phone,
            year: patient.year,
            month: patient.month,
            date: patient.date,
            created_at: patient.created_at.to_rfc3339(),
            updated_at: patient.updated_at.to_rfc3339(),
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub message: String,
    pub patients: Vec<FfiPatient>,
}

impl From<Notification> for FfiNotification {
    fn from(notification: Notification) -> Self {
        Self {
            message: notification.message,
            patients: notification.patients.into_iter().map(|p| p.into()).collect(),
        }
    }
}
