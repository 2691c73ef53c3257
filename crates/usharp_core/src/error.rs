//! Error types shared across the bridge

use thiserror::Error;

use crate::reflection::TypeName;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the core object model
#[derive(Debug, Error)]
pub enum CoreError {
    /// Reference points at an object that no longer exists
    #[error("Stale {kind} reference")]
    StaleReference { kind: &'static str },

    /// A type with the same qualified name is already registered
    #[error("Type '{0}' is already registered")]
    DuplicateType(TypeName),

    /// No type with this qualified name
    #[error("Type '{0}' not found")]
    TypeNotFound(TypeName),

    /// Supplied parent class is missing or stale
    #[error("Super class of '{0}' is not a live class")]
    InvalidSuperClass(TypeName),

    /// Reparenting would make a class its own ancestor
    #[error("Class '{0}' cannot derive from itself or one of its descendants")]
    CyclicInheritance(TypeName),
}

impl CoreError {
    /// Create a stale reference error for the object type `T`
    pub fn stale<T>() -> Self {
        let name = std::any::type_name::<T>();
        CoreError::StaleReference {
            kind: name.rsplit("::").next().unwrap_or(name),
        }
    }
}
