//! Storage abstraction for patient records.
//!
//! Two backends implement [`PatientRepository`]: [`InMemoryRepository`] and
//! [`SqliteRepository`]. Both classify failures identically, so callers never
//! need to know which one they hold.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use thiserror::Error;

use crate::db::DbError;
use crate::models::Patient;

/// Repository errors.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Duplicate id: {0}")]
    DuplicateKey(i64),

    #[error("Patient not found: {0}")]
    NotFound(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Repository lock poisoned")]
    LockPoisoned,
}

impl<T> From<std::sync::PoisonError<T>> for RepositoryError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        RepositoryError::LockPoisoned
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Keyed patient storage.
///
/// Implementations must be thread-safe and make every write a single atomic
/// step against the identifier it touches.
pub trait PatientRepository: Send + Sync {
    /// Store a new record verbatim, timestamps included.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the id is already present.
    fn create(&self, patient: &Patient) -> RepositoryResult<()>;

    /// Every record, ordered by id. Empty when there are none.
    fn read_all(&self) -> RepositoryResult<Vec<Patient>>;

    /// # Errors
    ///
    /// `NotFound` if no record has this id.
    fn read_one(&self, id: i64) -> RepositoryResult<Patient>;

    /// Replace every mutable field of the record with the same id, keeping the
    /// stored `created_at` whatever the incoming value is.
    ///
    /// # Errors
    ///
    /// `NotFound` if no record has this id.
    fn update(&self, patient: &Patient) -> RepositoryResult<()>;

    /// # Errors
    ///
    /// `NotFound` if no record has this id.
    fn delete(&self, id: i64) -> RepositoryResult<()>;
}
