//! Change notification delivered to subscribers.

use serde::{Deserialize, Serialize};

use super::Patient;

/// A state-change message plus the full record snapshot taken right after
/// the change committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub message: String,
    #[serde(rename = "newPatients")]
    pub patients: Vec<Patient>,
}

impl Notification {
    pub fn new(message: impl Into<String>, patients: Vec<Patient>) -> Self {
        Self {
            message: message.into(),
            patients,
        }
    }

    /// Export as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
