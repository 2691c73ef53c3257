//! # usharp_manager - Managed Assembly Subsystem
//!
//! Owns the reflection objects generated for managed assemblies and raises
//! the notifications the rest of the bridge reacts to.
//!
//! ## Flow
//!
//! ```text
//! begin_assembly_load("Game")
//!     define_class / define_struct / define_enum   ──▶ OnNewClass / OnNewStruct / OnNewEnum
//!     process_pending_classes                      ──▶ OnProcessedPendingClasses
//! finish_assembly_load("Game")                     ──▶ OnManagedAssemblyLoaded
//! ```
//!
//! While any assembly is between `begin` and `finish`,
//! [`AssemblyLoadGate::is_loading_any_assembly`](usharp_core::AssemblyLoadGate)
//! reports true and recompilation is held back.

mod database;
mod error;
mod events;
mod load_state;
mod manager;

pub use database::{TypeDatabase, ENGINE_ASSEMBLY};
pub use error::{ManagerError, Result};
pub use events::*;
pub use load_state::AssemblyLoadState;
pub use manager::{ClassDefinition, ManagedManager};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ManagerError, Result};
    pub use crate::events::{
        ManagedAssemblyLoadedEvent, NewClassEvent, NewEnumEvent, NewStructEvent,
        ProcessedPendingClassesEvent,
    };
    pub use crate::load_state::AssemblyLoadState;
    pub use crate::manager::{ClassDefinition, ManagedManager};
}
