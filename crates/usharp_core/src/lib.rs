//! # usharp_core - Managed Bridge Core
//!
//! Primitives shared by every part of the managed-runtime bridge:
//! - [`GcHandle`]: tagged reference into the managed heap
//! - [`ObjectRef`]: generational reference to an engine object
//! - Reflection descriptors for generated classes, structs and enums
//! - [`ObjectModel`] / [`AssemblyLoadGate`]: engine queries the bridge relies on

pub mod error;
pub mod handle;
pub mod model;
pub mod object;
pub mod reflection;

pub use error::{CoreError, Result};
pub use handle::{GcHandle, GcHandleIntPtr, GcHandleReleaser, GcHandleType};
pub use model::{AssemblyLoadGate, ObjectModel};
pub use object::{ObjectRef, ObjectTable};
pub use reflection::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CoreError, Result};
    pub use crate::handle::{GcHandle, GcHandleIntPtr, GcHandleReleaser, GcHandleType};
    pub use crate::model::{AssemblyLoadGate, ObjectModel};
    pub use crate::object::{ObjectRef, ObjectTable};
    pub use crate::reflection::{
        Blueprint, BlueprintKind, BlueprintRef, ClassRef, EnumRef, ManagedClass, ManagedEnum,
        ManagedReference, ManagedReferences, ManagedStruct, Package, PackageRef, StructRef,
        TypeName,
    };
}
