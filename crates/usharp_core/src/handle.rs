//! Cross-runtime GC handles
//!
//! A [`GcHandle`] is the only way native code refers to an object living in
//! the managed heap. Raw native pointers never cross the runtime boundary;
//! the managed runtime hands out an opaque address plus a strength tag and
//! expects it back when the native owner lets go.

use core::fmt;
use core::ptr;

/// Strength of a reference into the managed heap
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GcHandleType {
    /// No managed object
    #[default]
    Null,
    /// Keeps the managed object alive while native code retains the handle
    Strong,
    /// Allows the managed runtime to collect the object
    Weak,
    /// Keeps the object alive and forbids relocation
    Pinned,
}

impl GcHandleType {
    /// Whether this strength roots the managed object
    #[inline]
    pub const fn is_rooting(self) -> bool {
        matches!(self, GcHandleType::Strong | GcHandleType::Pinned)
    }
}

/// Machine-word address of a managed object, as exchanged over FFI
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcHandleIntPtr(*mut u8);

const _: () = assert!(core::mem::size_of::<GcHandleIntPtr>() == core::mem::size_of::<*mut u8>());

impl GcHandleIntPtr {
    /// The null address
    pub const NULL: Self = Self(ptr::null_mut());

    /// Wrap a raw address received from the managed runtime
    #[inline]
    pub const fn from_raw(ptr: *mut u8) -> Self {
        Self(ptr)
    }

    /// Wrap an integer address (as produced by `GCHandle.ToIntPtr`)
    #[inline]
    pub fn from_addr(addr: usize) -> Self {
        Self(addr as *mut u8)
    }

    /// The raw address
    #[inline]
    pub const fn as_ptr(self) -> *mut u8 {
        self.0
    }

    /// The address as an integer
    #[inline]
    pub fn addr(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for GcHandleIntPtr {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for GcHandleIntPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.addr())
    }
}

// Safety: the address is an opaque token owned by the managed runtime and is
// never dereferenced on the native side.
unsafe impl Send for GcHandleIntPtr {}
unsafe impl Sync for GcHandleIntPtr {}

/// Something that can drop a managed reference on behalf of native code.
///
/// Implemented by the managed callback table; tests use recording fakes.
pub trait GcHandleReleaser {
    /// Release `handle`, which was obtained with strength `kind`
    fn release_handle(&self, handle: GcHandleIntPtr, kind: GcHandleType);
}

/// Tagged reference into the managed heap.
///
/// Not `Copy` or `Clone`: moving a handle between owners goes through
/// [`GcHandle::take`], overwriting one goes through [`GcHandle::replace`],
/// so two native owners can't both believe they must dispose it.
#[must_use = "a non-null GcHandle has to be disposed"]
pub struct GcHandle {
    handle: GcHandleIntPtr,
    kind: GcHandleType,
}

impl GcHandle {
    /// A handle referring to nothing
    #[inline]
    pub const fn null() -> Self {
        Self {
            handle: GcHandleIntPtr::NULL,
            kind: GcHandleType::Null,
        }
    }

    /// Adopt a handle received from the managed runtime.
    ///
    /// A null address always yields a `Null` handle, whatever `kind` says.
    pub fn new(handle: GcHandleIntPtr, kind: GcHandleType) -> Self {
        if handle.is_null() {
            return Self::null();
        }
        Self { handle, kind }
    }

    /// Adopt a strong handle
    pub fn strong(handle: GcHandleIntPtr) -> Self {
        Self::new(handle, GcHandleType::Strong)
    }

    /// Adopt a weak handle
    pub fn weak(handle: GcHandleIntPtr) -> Self {
        Self::new(handle, GcHandleType::Weak)
    }

    /// Adopt a pinned handle
    pub fn pinned(handle: GcHandleIntPtr) -> Self {
        Self::new(handle, GcHandleType::Pinned)
    }

    /// True iff the address is null, regardless of the tag
    #[inline]
    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    #[inline]
    pub fn is_weak_pointer(&self) -> bool {
        self.kind == GcHandleType::Weak
    }

    #[inline]
    pub fn kind(&self) -> GcHandleType {
        self.kind
    }

    /// The address, for marshaling or identity checks. Does not transfer ownership.
    #[inline]
    pub fn raw(&self) -> GcHandleIntPtr {
        self.handle
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.handle.as_ptr()
    }

    /// Move the handle out, leaving `self` null
    pub fn take(&mut self) -> GcHandle {
        core::mem::replace(self, GcHandle::null())
    }

    /// Store `other` in `self` and hand back the previous value.
    ///
    /// The previous value is not disposed; the caller owns it.
    #[must_use = "the previous handle must be disposed by the caller"]
    pub fn replace(&mut self, other: GcHandle) -> GcHandle {
        core::mem::replace(self, other)
    }

    /// Release the managed reference and reset to null.
    ///
    /// Calling this on a null handle (including one already disposed) does nothing.
    pub fn dispose(&mut self, releaser: &dyn GcHandleReleaser) {
        if self.is_null() {
            return;
        }

        let released = self.take();
        releaser.release_handle(released.handle, released.kind);
        // Ownership went back to the managed runtime with the release call
        core::mem::forget(released);
    }

    /// Give up ownership without releasing, returning the raw parts.
    ///
    /// Used when the handle is handed back across the FFI boundary.
    pub fn into_raw(self) -> (GcHandleIntPtr, GcHandleType) {
        let parts = (self.handle, self.kind);
        core::mem::forget(self);
        parts
    }
}

impl Default for GcHandle {
    fn default() -> Self {
        Self::null()
    }
}

/// Handles compare by address only, so a weak and a strong handle to the
/// same managed object are equal.
impl PartialEq for GcHandle {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for GcHandle {}

impl core::hash::Hash for GcHandle {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl fmt::Debug for GcHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "GcHandle(null)")
        } else {
            write!(f, "GcHandle({:?}, {:?})", self.handle, self.kind)
        }
    }
}

impl Drop for GcHandle {
    fn drop(&mut self) {
        if !self.is_null() && self.kind.is_rooting() {
            log::warn!(
                "{:?} handle {:?} dropped without dispose; the managed object stays rooted",
                self.kind,
                self.handle
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingReleaser {
        released: RefCell<Vec<(GcHandleIntPtr, GcHandleType)>>,
    }

    impl GcHandleReleaser for RecordingReleaser {
        fn release_handle(&self, handle: GcHandleIntPtr, kind: GcHandleType) {
            self.released.borrow_mut().push((handle, kind));
        }
    }

    #[test]
    fn test_null_address_is_null_for_every_tag() {
        for kind in [
            GcHandleType::Null,
            GcHandleType::Strong,
            GcHandleType::Weak,
            GcHandleType::Pinned,
        ] {
            let mut handle = GcHandle::new(GcHandleIntPtr::NULL, kind);
            assert!(handle.is_null());
            assert_eq!(handle.kind(), GcHandleType::Null);

            let releaser = RecordingReleaser::default();
            handle.dispose(&releaser);
            assert!(releaser.released.borrow().is_empty());
        }
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let releaser = RecordingReleaser::default();
        let mut handle = GcHandle::strong(GcHandleIntPtr::from_addr(0x1000));

        handle.dispose(&releaser);
        handle.dispose(&releaser);

        assert!(handle.is_null());
        assert_eq!(
            *releaser.released.borrow(),
            vec![(GcHandleIntPtr::from_addr(0x1000), GcHandleType::Strong)]
        );
    }

    #[test]
    fn test_equality_ignores_tag() {
        let mut strong = GcHandle::strong(GcHandleIntPtr::from_addr(0x40));
        let weak = GcHandle::weak(GcHandleIntPtr::from_addr(0x40));
        let mut other = GcHandle::strong(GcHandleIntPtr::from_addr(0x80));

        assert_eq!(strong, weak);
        assert_ne!(strong, other);
        assert!(weak.is_weak_pointer());
        assert!(!strong.is_weak_pointer());

        let releaser = RecordingReleaser::default();
        strong.dispose(&releaser);
        other.dispose(&releaser);
    }

    #[test]
    fn test_take_and_replace_transfer_ownership() {
        let releaser = RecordingReleaser::default();
        let mut owner = GcHandle::pinned(GcHandleIntPtr::from_addr(0x10));

        let mut moved = owner.take();
        assert!(owner.is_null());
        assert_eq!(moved.kind(), GcHandleType::Pinned);

        let mut previous = moved.replace(GcHandle::strong(GcHandleIntPtr::from_addr(0x20)));
        assert_eq!(previous.raw(), GcHandleIntPtr::from_addr(0x10));
        assert_eq!(moved.raw(), GcHandleIntPtr::from_addr(0x20));

        previous.dispose(&releaser);
        moved.dispose(&releaser);
        assert_eq!(releaser.released.borrow().len(), 2);
    }

    #[test]
    fn test_into_raw_skips_release() {
        let handle = GcHandle::weak(GcHandleIntPtr::from_addr(0x99));
        let (ptr, kind) = handle.into_raw();
        assert_eq!(ptr.addr(), 0x99);
        assert_eq!(kind, GcHandleType::Weak);
    }
}
