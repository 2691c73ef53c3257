//! Native struct layout and copy
//!
//! The managed side marshals structs by value, so it needs the native size
//! and a way to copy one instance over another. Structs with C++ ops use the
//! ops' size and custom copy; plain structs fall back to their reflected size.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::ptr;

use usharp_core::{StructRef, TypeName};

use crate::error::{ExportError, Result};

/// Copies `count` values from `src` over the initialized values at `dest`.
/// Returns false if the copy could not be performed.
pub type StructCopyFn = unsafe fn(dest: *mut u8, src: *const u8, count: usize) -> bool;

/// Type-erased operations of a native struct type
#[derive(Clone, Copy, Debug)]
pub struct CppStructOps {
    size: usize,
    alignment: usize,
    copy: Option<StructCopyFn>,
}

impl CppStructOps {
    /// Ops for a bitwise-copyable struct of `size` bytes
    pub fn new(size: usize, alignment: usize) -> Self {
        Self {
            size,
            alignment,
            copy: None,
        }
    }

    /// Ops for a `Copy` Rust type
    pub fn of<T: Copy>() -> Self {
        Self::of_size::<T>()
    }

    /// Ops for a type whose copy has to go through `Clone`
    pub fn of_clone<T: Clone>() -> Self {
        Self::of_size::<T>().with_copy(clone_values::<T>)
    }

    fn of_size<T>() -> Self {
        Self::new(std::mem::size_of::<T>(), std::mem::align_of::<T>())
    }

    pub fn with_copy(mut self, copy: StructCopyFn) -> Self {
        self.copy = Some(copy);
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn has_copy(&self) -> bool {
        self.copy.is_some()
    }

    /// Run the custom copy, if any.
    ///
    /// # Safety
    ///
    /// `dest` and `src` must point to `count` valid, aligned values of the
    /// type these ops describe, and must not overlap.
    pub unsafe fn copy(&self, dest: *mut u8, src: *const u8, count: usize) -> bool {
        match self.copy {
            Some(copy) => copy(dest, src, count),
            None => false,
        }
    }
}

unsafe fn clone_values<T: Clone>(dest: *mut u8, src: *const u8, count: usize) -> bool {
    let src = src as *const T;
    let dest = dest as *mut T;
    for i in 0..count {
        *dest.add(i) = (*src.add(i)).clone();
    }
    true
}

/// Native view of a reflected struct
#[derive(Clone, Debug)]
pub struct NativeStruct {
    pub name: TypeName,
    /// Size computed from reflected properties
    pub structure_size: usize,
    pub cpp_ops: Option<CppStructOps>,
}

impl NativeStruct {
    /// A struct described only by reflection
    pub fn reflected(name: TypeName, structure_size: usize) -> Self {
        Self {
            name,
            structure_size,
            cpp_ops: None,
        }
    }

    /// A struct backed by a native type
    pub fn with_ops(name: TypeName, ops: CppStructOps) -> Self {
        Self {
            name,
            structure_size: ops.size(),
            cpp_ops: Some(ops),
        }
    }
}

/// Size the managed side must allocate for one instance
pub fn native_struct_size(strukt: &NativeStruct) -> usize {
    match &strukt.cpp_ops {
        Some(ops) => ops.size(),
        None => strukt.structure_size,
    }
}

/// Copy one instance of `strukt` from `src` to `dest`.
///
/// Uses the custom copy when the ops provide one and a bitwise copy of the
/// ops' size otherwise. Structs without ops can't be copied natively and
/// return false.
///
/// # Safety
///
/// `src` and `dest` must point to valid, non-overlapping instances of the
/// struct, at least [`native_struct_size`] bytes long.
pub unsafe fn native_copy(strukt: &NativeStruct, src: *const u8, dest: *mut u8) -> bool {
    let Some(ops) = &strukt.cpp_ops else {
        return false;
    };

    if ops.has_copy() {
        ops.copy(dest, src, 1)
    } else {
        ptr::copy_nonoverlapping(src, dest, ops.size());
        true
    }
}

/// Native layouts of the structs the managed side marshals, by reflection object
#[derive(Debug, Default)]
pub struct StructLayouts {
    layouts: RwLock<HashMap<StructRef, NativeStruct>>,
}

impl StructLayouts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the layout of `strukt`, replacing any previous one
    pub fn register(&self, strukt: StructRef, layout: NativeStruct) -> Result<Option<NativeStruct>> {
        if let Some(ops) = &layout.cpp_ops {
            if !ops.alignment().is_power_of_two() {
                return Err(ExportError::InvalidAlignment {
                    name: layout.name.to_string(),
                    alignment: ops.alignment(),
                });
            }
        }
        Ok(self.layouts.write().insert(strukt, layout))
    }

    pub fn remove(&self, strukt: StructRef) -> Option<NativeStruct> {
        self.layouts.write().remove(&strukt)
    }

    pub fn get(&self, strukt: StructRef) -> Option<NativeStruct> {
        self.layouts.read().get(&strukt).cloned()
    }

    pub fn struct_size(&self, strukt: StructRef) -> Option<usize> {
        self.layouts.read().get(&strukt).map(native_struct_size)
    }

    /// [`native_copy`] for a registered struct; false if it isn't registered.
    ///
    /// # Safety
    ///
    /// Same as [`native_copy`].
    pub unsafe fn copy(&self, strukt: StructRef, src: *const u8, dest: *mut u8) -> bool {
        let layout = self.layouts.read().get(&strukt).cloned();
        match layout {
            Some(layout) => native_copy(&layout, src, dest),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.layouts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    #[repr(C)]
    struct Vector {
        x: f32,
        y: f32,
        z: f32,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Tagged {
        label: String,
        weight: u32,
    }

    fn name(n: &str) -> TypeName {
        TypeName::new("Engine", "", n)
    }

    #[test]
    fn test_size_prefers_cpp_ops() {
        let mut strukt = NativeStruct::reflected(name("Vector"), 16);
        assert_eq!(native_struct_size(&strukt), 16);

        strukt.cpp_ops = Some(CppStructOps::of::<Vector>());
        assert_eq!(native_struct_size(&strukt), 12);
    }

    #[test]
    fn test_bitwise_copy_without_custom_copy() {
        let strukt = NativeStruct::with_ops(name("Vector"), CppStructOps::of::<Vector>());
        let src = Vector { x: 1.0, y: 2.0, z: 3.0 };
        let mut dest = Vector::default();

        let copied = unsafe {
            native_copy(
                &strukt,
                &src as *const Vector as *const u8,
                &mut dest as *mut Vector as *mut u8,
            )
        };
        assert!(copied);
        assert_eq!(dest, src);
    }

    #[test]
    fn test_custom_copy_is_used() {
        let strukt = NativeStruct::with_ops(name("Tagged"), CppStructOps::of_clone::<Tagged>());
        let src = Tagged {
            label: "door".to_string(),
            weight: 7,
        };
        let mut dest = Tagged::default();

        let copied = unsafe {
            native_copy(
                &strukt,
                &src as *const Tagged as *const u8,
                &mut dest as *mut Tagged as *mut u8,
            )
        };
        assert!(copied);
        assert_eq!(dest, src);
    }

    #[test]
    fn test_copy_without_ops_fails() {
        let strukt = NativeStruct::reflected(name("Opaque"), 8);
        let src = [1u8; 8];
        let mut dest = [0u8; 8];

        let copied = unsafe { native_copy(&strukt, src.as_ptr(), dest.as_mut_ptr()) };
        assert!(!copied);
        assert_eq!(dest, [0u8; 8]);
    }

    #[test]
    fn test_layout_registry() {
        let layouts = StructLayouts::new();
        let vector = StructRef::new(3, 0);
        assert_eq!(layouts.struct_size(vector), None);

        layouts
            .register(vector, NativeStruct::with_ops(name("Vector"), CppStructOps::of::<Vector>()))
            .unwrap();
        assert_eq!(layouts.struct_size(vector), Some(12));

        let bad = NativeStruct::with_ops(name("Bad"), CppStructOps::new(4, 3));
        assert!(matches!(
            layouts.register(StructRef::new(4, 0), bad),
            Err(ExportError::InvalidAlignment { alignment: 3, .. })
        ));
        assert_eq!(layouts.len(), 1);
    }
}
