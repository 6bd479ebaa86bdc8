//! SQLite-backed repository.

use std::path::Path;
use std::sync::Mutex;

use super::{PatientRepository, RepositoryError, RepositoryResult};
use crate::db::{Database, DbError};
use crate::models::Patient;

/// Durable patient storage on top of [`Database`].
///
/// Writes are single conditional statements; a zero row count is reported
/// as `NotFound`.
pub struct SqliteRepository {
    db: Mutex<Database>,
}

impl SqliteRepository {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open or create a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> RepositoryResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

impl PatientRepository for SqliteRepository {
    fn create(&self, patient: &Patient) -> RepositoryResult<()> {
        let db = self.db.lock()?;
        db.insert_patient(patient).map_err(|e| match e {
            DbError::DuplicateKey(id) => RepositoryError::DuplicateKey(id),
            other => RepositoryError::Storage(other),
        })
    }

    fn read_all(&self) -> RepositoryResult<Vec<Patient>> {
        let db = self.db.lock()?;
        Ok(db.list_patients()?)
    }

    fn read_one(&self, id: i64) -> RepositoryResult<Patient> {
        let db = self.db.lock()?;
        db.get_patient(id)?.ok_or(RepositoryError::NotFound(id))
    }

    fn update(&self, patient: &Patient) -> RepositoryResult<()> {
        let db = self.db.lock()?;
        if db.update_patient(patient)? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(patient.id))
        }
    }

    fn delete(&self, id: i64) -> RepositoryResult<()> {
        let db = self.db.lock()?;
        if db.delete_patient(id)? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(id))
        }
    }
}
