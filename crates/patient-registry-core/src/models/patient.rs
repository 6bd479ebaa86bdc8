//! Patient models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A patient record keyed by an externally assigned identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Caller-supplied identifier, never generated here
    pub id: i64,
    /// Patient name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Disease or diagnosis
    pub disease: String,
    /// Contact number
    pub phone: i64,
    /// Year of the record date
    pub year: i32,
    /// Month of the record date (1-12)
    pub month: i32,
    /// Day of the record date (1-31)
    pub date: i32,
    /// Creation timestamp, stamped by the service
    pub created_at: DateTime<Utc>,
    /// Last update timestamp, stamped by the service
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Create a patient with every caller-owned field. Timestamps start at the
    /// epoch until the service stamps them.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        address: impl Into<String>,
        disease: impl Into<String>,
        phone: i64,
        (year, month, date): (i32, i32, i32),
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            disease: disease.into(),
            phone,
            year,
            month,
            date,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Set both timestamps to `now`.
    pub fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
    }

    /// Refresh the update timestamp only.
    pub fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
