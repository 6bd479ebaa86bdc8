//! Startup configuration.
//!
//! The storage backend is chosen once when the process starts and injected
//! into the service; nothing switches it afterwards.

use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::repository::{InMemoryRepository, PatientRepository, RepositoryResult, SqliteRepository};
use crate::service::PatientService;

/// Environment variable holding the SQLite database path.
pub const DB_PATH_ENV: &str = "PATIENT_REGISTRY_DB";

/// Where patient records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    Sqlite { path: PathBuf },
}

/// Registry configuration resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub storage: StorageBackend,
}

impl RegistryConfig {
    pub fn in_memory() -> Self {
        Self {
            storage: StorageBackend::InMemory,
        }
    }

    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageBackend::Sqlite { path: path.into() },
        }
    }

    /// Read `PATIENT_REGISTRY_DB`; unset or empty means in-memory.
    pub fn from_env() -> Self {
        Self::from_db_path(env::var(DB_PATH_ENV).ok())
    }

    fn from_db_path(path: Option<String>) -> Self {
        match path {
            Some(path) if !path.trim().is_empty() => Self::sqlite(path),
            _ => Self::in_memory(),
        }
    }

    /// Build the configured repository.
    pub fn open_repository(&self) -> RepositoryResult<Box<dyn PatientRepository>> {
        match &self.storage {
            StorageBackend::InMemory => {
                info!("Using in-memory patient storage");
                Ok(Box::new(InMemoryRepository::new()))
            }
            StorageBackend::Sqlite { path } => {
                info!(path = %path.display(), "Using SQLite patient storage");
                Ok(Box::new(SqliteRepository::open(path)?))
            }
        }
    }

    /// Build a service backed by the configured repository.
    pub fn build_service(&self) -> RepositoryResult<PatientService> {
        Ok(PatientService::new(self.open_repository()?))
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
