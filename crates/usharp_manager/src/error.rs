//! Error types for the managed assembly subsystem

use thiserror::Error;
use usharp_core::CoreError;

/// Result type for manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;

/// Errors that can occur while generating managed types
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Object model error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// `finish_assembly_load` without a matching `begin_assembly_load`
    #[error("Assembly '{0}' is not being loaded")]
    AssemblyNotLoading(String),

    /// Package does not exist or was unloaded
    #[error("Package '{0}' not found")]
    PackageNotFound(String),
}
