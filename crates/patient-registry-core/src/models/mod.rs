//! Domain models for the patient registry.

mod notification;
mod patient;

pub use notification::*;
pub use patient::*;
