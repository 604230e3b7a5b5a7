use std::{alloc::Layout, any::TypeId, ptr, ptr::NonNull};

use crate::ecs::component::{self, Component};
use crate::ecs::storage::Arena;

/// A slot is one arena allocation sized for a single component value.
///
/// The arena only hands out raw bytes. The slot is how the store constructs a value into that
/// memory and destroys it again, routing through the component's [`Info`](component::Info)
/// lifecycle table so it works with or without compile-time type knowledge.
///
/// `Slot` is `Copy` and does not track whether its memory is initialized: every constructing
/// method expects uninitialized memory and [`Slot::destroy`] expects a live value.
///
/// # Example
///
/// ```ignore
/// let info = registry.info(id)?;
/// let slot = Slot::alloc(&arena, &info);
/// unsafe { slot.write(Position { x: 1.0, y: 2.0 }) };
/// // ...
/// unsafe { slot.destroy() };
/// ```
#[derive(Debug, Copy, Clone)]
pub struct Slot<'a> {
    /// A pointer to the slot's memory.
    ptr: NonNull<u8>,

    // The info about the component type living in this slot.
    info: &'a component::Info,
}

impl<'a> Slot<'a> {
    /// Construct a slot over existing memory.
    #[inline]
    pub fn new(ptr: NonNull<u8>, info: &'a component::Info) -> Self {
        Self { ptr, info }
    }

    /// Allocate uninitialized memory for one value of the component described by `info`.
    #[inline]
    pub fn alloc(arena: &Arena, info: &'a component::Info) -> Self {
        Self::new(arena.allocate_layout(info.layout()), info)
    }

    /// Get a pointer to the raw data.
    #[inline]
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Get the component info for this slot.
    #[inline]
    pub fn info(&self) -> &'a component::Info {
        self.info
    }

    /// Move `value` into the slot.
    ///
    /// # Safety
    /// The slot's memory must be uninitialized, otherwise the old value leaks.
    ///
    /// # Panics
    /// In debug builds, panics if type `C` doesn't match the slot's component type.
    #[inline]
    pub unsafe fn write<C: Component>(self, value: C) {
        ensure_type::<C>(self.info);

        unsafe { ptr::write(self.ptr.as_ptr() as *mut C, value) };
    }

    /// Copy-construct the value at `src` into the slot.
    ///
    /// # Safety
    /// The slot's memory must be uninitialized and `src` must point to a live value of the
    /// slot's component type.
    #[inline]
    pub unsafe fn copy_from(self, src: NonNull<u8>) {
        unsafe { self.info.copy(self.ptr, src) };
    }

    /// Move-construct the value at `src` into the slot. `src` is left moved-out.
    ///
    /// # Safety
    /// The slot's memory must be uninitialized and `src` must point to a live value of the
    /// slot's component type that is never used or dropped afterwards.
    #[inline]
    pub unsafe fn move_from(self, src: NonNull<u8>) {
        unsafe { self.info.relocate(self.ptr, src) };
    }

    /// Destroy the value in the slot. The memory stays with the arena.
    ///
    /// # Safety
    /// The slot must hold a live value, which must not be used afterwards.
    #[inline]
    pub unsafe fn destroy(self) {
        unsafe { self.info.drop_in_place(self.ptr) };
    }
}

/// Ensure the type `C` is valid for this slot.
#[cfg(debug_assertions)]
pub fn ensure_type<C: Component>(info: &component::Info) {
    debug_assert!(
        TypeId::of::<C>() == info.type_id(),
        "Type mismatch: attempted to use type {} with a slot storing {}",
        std::any::type_name::<C>(),
        info.type_name()
    );
    debug_assert!(
        Layout::new::<C>() == info.layout(),
        "component layout does not match slot layout"
    );
}

#[cfg(not(debug_assertions))]
#[inline(always)]
pub fn ensure_type<C: Component>(_info: &component::Info) {
    // No-op in release builds
}
