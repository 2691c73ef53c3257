//! C ABI entry points handed to the managed runtime
//!
//! Reflection objects cross the boundary as the raw bits of their
//! [`ObjectRef`](usharp_core::ObjectRef); a null reference is `u64::MAX`.

use std::ffi::{c_char, c_int, c_void, CStr};

use usharp_core::{ClassRef, StructRef};

use crate::bindings;
use crate::callbacks::ManagedCallbacks;
use crate::lookup::{native_class_from_name, native_struct_from_name};

/// Layout version of [`ExportTable`]
pub const USHARP_EXPORTS_VERSION: u32 = 1;

pub type GetNativeStructSizeFn = unsafe extern "C" fn(strukt: u64) -> c_int;
pub type NativeCopyFn = unsafe extern "C" fn(strukt: u64, src: *const c_void, dest: *mut c_void) -> bool;
pub type GetNativeTypeFromNameFn = unsafe extern "C" fn(
    assembly: *const c_char,
    namespace: *const c_char,
    name: *const c_char,
) -> u64;
pub type GetAssetManagerFn = extern "C" fn() -> *mut c_void;
pub type GetManagedCallbacksFn = extern "C" fn() -> *const ManagedCallbacks;

/// Function table the managed runtime binds its imports to
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ExportTable {
    pub version: u32,
    pub get_native_struct_size: GetNativeStructSizeFn,
    pub native_copy: NativeCopyFn,
    pub get_native_class_from_name: GetNativeTypeFromNameFn,
    pub get_native_struct_from_name: GetNativeTypeFromNameFn,
    pub get_asset_manager: GetAssetManagerFn,
    pub get_managed_callbacks: GetManagedCallbacksFn,
}

/// Build the table of exported entry points
pub fn export_table() -> ExportTable {
    ExportTable {
        version: USHARP_EXPORTS_VERSION,
        get_native_struct_size: usharp_get_native_struct_size,
        native_copy: usharp_native_copy,
        get_native_class_from_name: usharp_get_native_class_from_name,
        get_native_struct_from_name: usharp_get_native_struct_from_name,
        get_asset_manager: usharp_get_asset_manager,
        get_managed_callbacks: usharp_get_managed_callbacks,
    }
}

/// Size of a registered struct, or 0 if unknown
unsafe extern "C" fn usharp_get_native_struct_size(strukt: u64) -> c_int {
    let size = bindings::bindings()
        .and_then(|b| b.layouts.struct_size(StructRef::from_bits(strukt)))
        .unwrap_or(0);
    c_int::try_from(size).unwrap_or(c_int::MAX)
}

unsafe extern "C" fn usharp_native_copy(strukt: u64, src: *const c_void, dest: *mut c_void) -> bool {
    if src.is_null() || dest.is_null() {
        return false;
    }
    match bindings::bindings() {
        Some(b) => b
            .layouts
            .copy(StructRef::from_bits(strukt), src as *const u8, dest as *mut u8),
        None => false,
    }
}

unsafe extern "C" fn usharp_get_native_class_from_name(
    assembly: *const c_char,
    namespace: *const c_char,
    name: *const c_char,
) -> u64 {
    let class = match (bindings::bindings(), type_name_parts(assembly, namespace, name)) {
        (Some(b), Some((assembly, namespace, name))) => {
            native_class_from_name(b.lookup.as_ref(), assembly, namespace, name)
        }
        _ => None,
    };
    class.unwrap_or_else(ClassRef::null).to_bits()
}

unsafe extern "C" fn usharp_get_native_struct_from_name(
    assembly: *const c_char,
    namespace: *const c_char,
    name: *const c_char,
) -> u64 {
    let strukt = match (bindings::bindings(), type_name_parts(assembly, namespace, name)) {
        (Some(b), Some((assembly, namespace, name))) => {
            native_struct_from_name(b.lookup.as_ref(), assembly, namespace, name)
        }
        _ => None,
    };
    strukt.unwrap_or_else(StructRef::null).to_bits()
}

extern "C" fn usharp_get_asset_manager() -> *mut c_void {
    bindings::asset_manager().as_ptr()
}

extern "C" fn usharp_get_managed_callbacks() -> *const ManagedCallbacks {
    bindings::managed_callbacks().map_or(std::ptr::null(), |callbacks| {
        callbacks as *const ManagedCallbacks
    })
}

/// Borrow the three name strings. A null namespace means the global namespace.
unsafe fn type_name_parts<'a>(
    assembly: *const c_char,
    namespace: *const c_char,
    name: *const c_char,
) -> Option<(&'a str, &'a str, &'a str)> {
    let assembly = c_str(assembly)?;
    let name = c_str(name)?;
    let namespace = if namespace.is_null() {
        ""
    } else {
        c_str(namespace)?
    };
    Some((assembly, namespace, name))
}

unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("Managed runtime passed a non UTF-8 name: {}", e);
            None
        }
    }
}
