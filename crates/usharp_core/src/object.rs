//! Generational references to engine objects
//!
//! Classes, blueprints, structs and enums are referred to by [`ObjectRef`]
//! rather than by pointer. A reference whose generation no longer matches
//! its slot points at an object that was destroyed (typically an old class
//! generation replaced by reinstancing) and resolves to nothing.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// A typed, generational reference to an engine object of type `T`
#[repr(transparent)]
pub struct ObjectRef<T> {
    /// Lower 32 bits: index, upper 32 bits: generation
    bits: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ObjectRef<T> {
    /// Create a reference from index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            bits: (generation as u64) << 32 | index as u64,
            _marker: PhantomData,
        }
    }

    /// A reference to nothing
    #[inline]
    pub const fn null() -> Self {
        Self {
            bits: u64::MAX,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bits == u64::MAX
    }

    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits as u32
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        (self.bits >> 32) as u32
    }

    /// Raw bits, for passing across FFI
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            bits,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for ObjectRef<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ObjectRef<T> {}

impl<T> PartialEq for ObjectRef<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T> Eq for ObjectRef<T> {}

impl<T> Hash for ObjectRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T> fmt::Debug for ObjectRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = core::any::type_name::<T>();
        let short = name.rsplit("::").next().unwrap_or(name);
        if self.is_null() {
            write!(f, "{}(null)", short)
        } else {
            write!(f, "{}({}v{})", short, self.index(), self.generation())
        }
    }
}

impl<T> Default for ObjectRef<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// Slot storage that hands out [`ObjectRef`]s and detects stale ones
pub struct ObjectTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

impl<T> ObjectTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Insert a value and get a reference to it
    pub fn insert(&mut self, value: T) -> ObjectRef<T> {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return ObjectRef::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        ObjectRef::new(index, 0)
    }

    /// Remove a value. Every outstanding reference to it becomes stale.
    pub fn remove(&mut self, object: ObjectRef<T>) -> Option<T> {
        let slot = self.live_slot_mut(object)?;
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(object.index());
        self.len -= 1;
        value
    }

    pub fn get(&self, object: ObjectRef<T>) -> Option<&T> {
        if object.is_null() {
            return None;
        }
        let slot = self.slots.get(object.index() as usize)?;
        if slot.generation != object.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, object: ObjectRef<T>) -> Option<&mut T> {
        self.live_slot_mut(object)?.value.as_mut()
    }

    /// Whether `object` still refers to a live value
    pub fn contains(&self, object: ObjectRef<T>) -> bool {
        self.get(object).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over live references and values, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|v| (ObjectRef::new(i as u32, slot.generation), v))
        })
    }

    fn live_slot_mut(&mut self, object: ObjectRef<T>) -> Option<&mut Slot<T>> {
        if object.is_null() {
            return None;
        }
        let slot = self.slots.get_mut(object.index() as usize)?;
        if slot.generation != object.generation() || slot.value.is_none() {
            return None;
        }
        Some(slot)
    }
}

impl<T> Default for ObjectTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
