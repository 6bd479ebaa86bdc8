//! Field-level validation for patient records.
//!
//! Every check runs; the result lists all violations in a fixed order.

use std::fmt;

use thiserror::Error;

use crate::models::Patient;

/// A single violated field rule.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Violation {
    #[error("id should be positive")]
    NonPositiveId,

    #[error("name cannot be empty")]
    EmptyName,

    #[error("disease cannot be empty")]
    EmptyDisease,

    #[error("contact number cannot be zero")]
    ZeroPhone,

    #[error("year cannot be zero")]
    ZeroYear,

    #[error("month should be between 1 and 12")]
    MonthOutOfRange,

    #[error("date should be between 1 and 31")]
    DateOutOfRange,

    #[error("address cannot be empty")]
    EmptyAddress,
}

/// Aggregated validation failure: one error carrying every violated rule,
/// in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Human-readable messages, one per violation.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Collect every rule the record breaks.
///
/// Order is fixed: id, name, disease, phone, year, month, date, address.
/// Month and date are range-checked independently; no calendar check.
pub fn violations(patient: &Patient) -> Vec<Violation> {
    let checks = [
        (patient.id <= 0, Violation::NonPositiveId),
        (patient.name.is_empty(), Violation::EmptyName),
        (patient.disease.is_empty(), Violation::EmptyDisease),
        (patient.phone == 0, Violation::ZeroPhone),
        (patient.year == 0, Violation::ZeroYear),
        (!(1..=12).contains(&patient.month), Violation::MonthOutOfRange),
        (!(1..=31).contains(&patient.date), Violation::DateOutOfRange),
        (patient.address.is_empty(), Violation::EmptyAddress),
    ];

    checks
        .into_iter()
        .filter_map(|(failed, violation)| failed.then_some(violation))
        .collect()
}

/// Validate a record, failing with every violation at once.
pub fn validate(patient: &Patient) -> Result<(), ValidationError> {
    let violations = violations(patient);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}
