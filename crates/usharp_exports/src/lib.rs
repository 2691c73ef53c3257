//! # usharp_exports - Managed Runtime Exports
//!
//! Stateless marshaling helpers the managed runtime calls across the FFI
//! boundary: struct size and copy, native class/struct lookup by name, and
//! accessors for the asset manager and the managed callback table.
//!
//! The safe functions ([`native_struct_size`], [`native_class_from_name`], ...)
//! are usable directly; [`export_table`] wraps them as `extern "C"` entry
//! points backed by the [`ExportBindings`] installed at startup.

pub mod bindings;
pub mod callbacks;
pub mod error;
pub mod ffi;
pub mod lookup;
pub mod struct_ops;

pub use bindings::{asset_manager, install, is_installed, managed_callbacks, ExportBindings};
pub use callbacks::{AssetManagerPtr, DisposeFn, FreeHandleFn, LookupManagedTypeFn, ManagedCallbacks};
pub use error::{ExportError, Result};
pub use ffi::{export_table, ExportTable, USHARP_EXPORTS_VERSION};
pub use lookup::{native_class_from_name, native_struct_from_name, NativeTypeLookup};
pub use struct_ops::{
    native_copy, native_struct_size, CppStructOps, NativeStruct, StructCopyFn, StructLayouts,
};
