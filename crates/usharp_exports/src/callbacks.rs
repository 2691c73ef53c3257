//! Callback table supplied by the managed runtime

use std::ffi::c_void;

use usharp_core::{GcHandleIntPtr, GcHandleReleaser, GcHandleType};

/// Releases a GC handle allocated by the managed runtime
pub type FreeHandleFn = unsafe extern "C" fn(handle: GcHandleIntPtr, kind: GcHandleType);

/// Runs `Dispose` on the managed object behind a handle
pub type DisposeFn = unsafe extern "C" fn(handle: GcHandleIntPtr);

/// Looks up a managed type by name inside an assembly handle
pub type LookupManagedTypeFn =
    unsafe extern "C" fn(assembly: GcHandleIntPtr, full_name: *const u8) -> GcHandleIntPtr;

/// Function pointers the managed runtime hands over at startup.
///
/// Entries the runtime did not provide are `None`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ManagedCallbacks {
    pub free_handle: Option<FreeHandleFn>,
    pub dispose: Option<DisposeFn>,
    pub lookup_managed_type: Option<LookupManagedTypeFn>,
}

impl ManagedCallbacks {
    /// Run `Dispose` on the managed object. Returns false if unavailable.
    pub fn dispose_object(&self, handle: GcHandleIntPtr) -> bool {
        match (self.dispose, handle.is_null()) {
            (Some(dispose), false) => {
                // Safety: the runtime registered this entry for handles it issued
                unsafe { dispose(handle) };
                true
            }
            _ => false,
        }
    }
}

impl GcHandleReleaser for ManagedCallbacks {
    fn release_handle(&self, handle: GcHandleIntPtr, kind: GcHandleType) {
        match self.free_handle {
            // Safety: the runtime registered this entry for handles it issued
            Some(free_handle) => unsafe { free_handle(handle, kind) },
            None => log::warn!(
                "Managed runtime has no free_handle callback, leaking {:?} handle {:?}",
                kind,
                handle
            ),
        }
    }
}

/// Opaque pointer to the engine's asset manager
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetManagerPtr(*mut c_void);

impl AssetManagerPtr {
    pub const NULL: Self = Self(std::ptr::null_mut());

    pub fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

// Safety: the asset manager is an engine singleton; the pointer is only
// passed through, never dereferenced here.
unsafe impl Send for AssetManagerPtr {}
unsafe impl Sync for AssetManagerPtr {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use usharp_core::GcHandle;

    static FREED: AtomicUsize = AtomicUsize::new(0);
    static DISPOSED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_free(_handle: GcHandleIntPtr, _kind: GcHandleType) {
        FREED.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn count_dispose(_handle: GcHandleIntPtr) {
        DISPOSED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_handle_released_once_through_callbacks() {
        let callbacks = ManagedCallbacks {
            free_handle: Some(count_free),
            ..Default::default()
        };

        let mut handle = GcHandle::strong(GcHandleIntPtr::from_addr(0x1000));
        handle.dispose(&callbacks);
        handle.dispose(&callbacks);

        assert!(handle.is_null());
        assert_eq!(FREED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispose_object_needs_callback_and_handle() {
        let missing = ManagedCallbacks::default();
        assert!(!missing.dispose_object(GcHandleIntPtr::from_addr(0x20)));

        let callbacks = ManagedCallbacks {
            dispose: Some(count_dispose),
            ..Default::default()
        };
        assert!(!callbacks.dispose_object(GcHandleIntPtr::NULL));
        assert!(callbacks.dispose_object(GcHandleIntPtr::from_addr(0x20)));
        assert_eq!(DISPOSED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_free_handle_is_tolerated() {
        let mut handle = GcHandle::weak(GcHandleIntPtr::from_addr(0x40));
        handle.dispose(&ManagedCallbacks::default());
        assert!(handle.is_null());
    }
}
