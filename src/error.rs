//! Application-wide error types.

use thiserror::Error;

use crate::registry::types::CommitteeAddress;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),
}

/// Errors raised by the registry and its collaborators.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The bootup source could not supply its records. Fatal to bootstrap only.
    #[error("cannot load bootup records: {0}")]
    BootupLoad(String),

    #[error("cannot save bootup records: {0}")]
    BootupSave(String),

    #[error("invalid committee address: {0}")]
    InvalidAddress(String),
}

/// Per-record registration failures. Never fatal; bootstrap skips them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("committee already registered: {0}")]
    Duplicate(CommitteeAddress),

    #[error("committee factory produced no handle for {0}")]
    FactoryRefused(CommitteeAddress),
}
