//! Integration tests for usharp_exports
//!
//! Bindings are process-wide, so everything that touches the installed
//! table lives in one test.

use std::ffi::{c_void, CString};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use usharp_core::prelude::*;
use usharp_exports::*;
use usharp_manager::{ClassDefinition, ManagedManager};

static FREED: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn free_handle(_handle: GcHandleIntPtr, _kind: GcHandleType) {
    FREED.fetch_add(1, Ordering::SeqCst);
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
struct Transform {
    location: [f32; 3],
    scale: f32,
}

#[test]
fn test_export_table_forwards_to_installed_bindings() {
    let _ = env_logger::builder().is_test(true).try_init();

    let table = export_table();
    assert_eq!(table.version, USHARP_EXPORTS_VERSION);

    // Nothing installed yet
    assert!((table.get_managed_callbacks)().is_null());
    assert!((table.get_asset_manager)().is_null());
    assert_eq!(unsafe { (table.get_native_struct_size)(0) }, 0);

    let manager = Arc::new(ManagedManager::new());
    let door = manager
        .define_class(ClassDefinition::new(TypeName::new("Game", "Game", "Door")))
        .unwrap()
        .unwrap();
    let transform = manager
        .define_struct(ManagedStruct::new(TypeName::new("Engine", "", "Transform")))
        .unwrap();

    let layouts = Arc::new(StructLayouts::new());
    layouts
        .register(
            transform,
            NativeStruct::with_ops(
                TypeName::new("Engine", "", "Transform"),
                CppStructOps::of::<Transform>(),
            ),
        )
        .unwrap();

    let mut asset_manager_slot = 0u64;
    let asset_manager_ptr =
        AssetManagerPtr::from_raw(&mut asset_manager_slot as *mut u64 as *mut c_void);
    let lookup: Arc<dyn NativeTypeLookup> = manager.clone();
    install(
        ExportBindings::new(lookup, Arc::clone(&layouts))
            .with_asset_manager(asset_manager_ptr)
            .with_callbacks(ManagedCallbacks {
                free_handle: Some(free_handle),
                ..Default::default()
            }),
    )
    .unwrap();
    assert!(is_installed());

    // Second installation is rejected
    let again: Arc<dyn NativeTypeLookup> = manager.clone();
    assert!(matches!(
        install(ExportBindings::new(again, Arc::new(StructLayouts::new()))),
        Err(ExportError::AlreadyInstalled)
    ));

    // Accessors
    assert_eq!((table.get_asset_manager)(), asset_manager_ptr.as_ptr());
    assert_eq!(asset_manager(), asset_manager_ptr);
    let callbacks = (table.get_managed_callbacks)();
    assert!(!callbacks.is_null());

    let mut handle = GcHandle::strong(GcHandleIntPtr::from_addr(0x5000));
    handle.dispose(unsafe { &*callbacks });
    handle.dispose(unsafe { &*callbacks });
    assert_eq!(FREED.load(Ordering::SeqCst), 1);

    // Lookup by name
    let game = CString::new("Game").unwrap();
    let engine = CString::new("Engine").unwrap();
    let door_name = CString::new("Door").unwrap();
    let transform_name = CString::new("Transform").unwrap();

    let class_bits = unsafe {
        (table.get_native_class_from_name)(game.as_ptr(), game.as_ptr(), door_name.as_ptr())
    };
    assert_eq!(ClassRef::from_bits(class_bits), door);

    let struct_bits = unsafe {
        (table.get_native_struct_from_name)(
            engine.as_ptr(),
            std::ptr::null(),
            transform_name.as_ptr(),
        )
    };
    assert_eq!(StructRef::from_bits(struct_bits), transform);

    let missing = unsafe {
        (table.get_native_class_from_name)(game.as_ptr(), std::ptr::null(), door_name.as_ptr())
    };
    assert!(ClassRef::from_bits(missing).is_null());
    let no_name = unsafe {
        (table.get_native_class_from_name)(game.as_ptr(), game.as_ptr(), std::ptr::null())
    };
    assert!(ClassRef::from_bits(no_name).is_null());

    // Struct size and copy
    let size = unsafe { (table.get_native_struct_size)(transform.to_bits()) };
    assert_eq!(size as usize, std::mem::size_of::<Transform>());

    let src = Transform {
        location: [1.0, 2.0, 3.0],
        scale: 0.5,
    };
    let mut dest = Transform::default();
    let copied = unsafe {
        (table.native_copy)(
            transform.to_bits(),
            &src as *const Transform as *const c_void,
            &mut dest as *mut Transform as *mut c_void,
        )
    };
    assert!(copied);
    assert_eq!(dest, src);

    let unknown = unsafe {
        (table.native_copy)(
            StructRef::new(77, 0).to_bits(),
            &src as *const Transform as *const c_void,
            &mut dest as *mut Transform as *mut c_void,
        )
    };
    assert!(!unknown);
    assert!(!unsafe {
        (table.native_copy)(transform.to_bits(), std::ptr::null(), std::ptr::null_mut())
    });
}
