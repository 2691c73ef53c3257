//! Error types for the export surface

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised while wiring the export table
#[derive(Debug, Error)]
pub enum ExportError {
    /// Bindings can only be installed once per process
    #[error("Export bindings are already installed")]
    AlreadyInstalled,

    /// Layout registered with an alignment that isn't a power of two
    #[error("Struct '{name}' has invalid alignment {alignment}")]
    InvalidAlignment { name: String, alignment: usize },
}
