//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{is_unique_violation, Database, DbError, DbResult};
use crate::models::Patient;

const PATIENT_COLUMNS: &str =
    "id, name, address, disease, phone, year, month, date, created_at, updated_at";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        disease: row.get(3)?,
        phone: row.get(4)?,
        year: row.get(5)?,
        month: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Database {
    /// Insert a new patient, timestamps included as given.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        let result = self.conn.execute(
            r#"
            INSERT INTO patients (
                id, name, address, disease, phone,
                year, month, date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                patient.id,
                patient.name,
                patient.address,
                patient.disease,
                patient.phone,
                patient.year,
                patient.month,
                patient.date,
                patient.created_at,
                patient.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(DbError::DuplicateKey(patient.id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Update an existing patient. `created_at` is never written.
    ///
    /// Returns `false` when no row carries the patient's id.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                address = ?3,
                disease = ?4,
                phone = ?5,
                year = ?6,
                month = ?7,
                date = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.address,
                patient.disease,
                patient.phone,
                patient.year,
                patient.month,
                patient.date,
                patient.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients, ordered by id.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id"))?;

        let rows = stmt.query_map([], patient_from_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient. Returns `false` when nothing was deleted.
    pub fn delete_patient(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
