//! In-memory repository.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{PatientRepository, RepositoryError, RepositoryResult};
use crate::models::Patient;

/// Patient storage held in process memory. Each operation runs inside one
/// critical section.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    patients: Mutex<BTreeMap<i64, Patient>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatientRepository for InMemoryRepository {
    fn create(&self, patient: &Patient) -> RepositoryResult<()> {
        let mut patients = self.patients.lock()?;
        match patients.entry(patient.id) {
            Entry::Occupied(_) => Err(RepositoryError::DuplicateKey(patient.id)),
            Entry::Vacant(slot) => {
                slot.insert(patient.clone());
                Ok(())
            }
        }
    }

    fn read_all(&self) -> RepositoryResult<Vec<Patient>> {
        let patients = self.patients.lock()?;
        Ok(patients.values().cloned().collect())
    }

    fn read_one(&self, id: i64) -> RepositoryResult<Patient> {
        let patients = self.patients.lock()?;
        patients
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    fn update(&self, patient: &Patient) -> RepositoryResult<()> {
        let mut patients = self.patients.lock()?;
        let stored = patients
            .get_mut(&patient.id)
            .ok_or(RepositoryError::NotFound(patient.id))?;

        let created_at = stored.created_at;
        *stored = patient.clone();
        stored.created_at = created_at;
        Ok(())
    }

    fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut patients = self.patients.lock()?;
        patients
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }
}
