//! Error types for the compiler bridge

use std::path::PathBuf;
use thiserror::Error;
use usharp_core::BlueprintKind;

/// Result type for compiler bridge operations
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Errors that can occur while wiring the compiler bridge
#[derive(Debug, Error)]
pub enum CompilerError {
    /// Another factory already owns this blueprint kind
    #[error("A compiler context factory for {0:?} blueprints is already registered")]
    FactoryAlreadyRegistered(BlueprintKind),

    /// Settings file could not be read
    #[error("Failed to read settings '{path}': {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file could not be parsed
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] toml::de::Error),
}
