use std::alloc::Layout;
use std::any::TypeId;
use std::ptr::NonNull;
use std::{mem, ptr};

use crate::ecs::component::{Component, Id};

/// The type-erased lifecycle table of a registered component.
///
/// One `Info` is instantiated per component type at registration time and stored in the registry,
/// indexed by [`Id`]. It carries everything the store needs to construct, relocate and destroy a
/// value of that type when only the id is known at runtime.
#[derive(Debug, Clone, Copy)]
pub struct Info {
    /// The unique component ID.
    id: Id,

    /// The TypeId of the component.
    type_id: TypeId,

    /// The Rust type name, for diagnostics.
    type_name: &'static str,

    /// The memory layout of the component.
    layout: Layout,

    /// Clone the value at `src` into uninitialized memory at `dst`.
    copy_fn: unsafe fn(NonNull<u8>, NonNull<u8>),

    /// Move the value at `src` into uninitialized memory at `dst`. `src` is left moved-out.
    move_fn: unsafe fn(NonNull<u8>, NonNull<u8>),

    // The drop function for the component, might be a no-op.
    drop_fn: unsafe fn(NonNull<u8>),
}

impl Info {
    /// Construct the lifecycle table for type `C`.
    pub(crate) fn new<C: Component>(id: Id) -> Self {
        let drop_fn = if mem::needs_drop::<C>() {
            Self::drop_impl::<C>
        } else {
            Self::drop_noop
        };
        Self {
            id,
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
            layout: Layout::new::<C>(),
            copy_fn: Self::copy_impl::<C>,
            move_fn: Self::move_impl::<C>,
            drop_fn,
        }
    }

    /// Get the component ID for this type.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the TypeId for this type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Get the Rust type name of this component.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Get the memory layout for this type.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Determine if this component is zero-sized type.
    #[inline]
    pub fn is_zero_sized(&self) -> bool {
        self.layout.size() == 0
    }

    /// Copy-construct a value into `dst` from the value at `src`.
    ///
    /// # Safety
    /// - `src` must point to a valid, initialized value of this component type.
    /// - `dst` must be uninitialized memory valid for this component's layout.
    #[inline]
    pub unsafe fn copy(&self, dst: NonNull<u8>, src: NonNull<u8>) {
        unsafe { (self.copy_fn)(dst, src) }
    }

    /// Move-construct a value into `dst` from the value at `src`.
    ///
    /// After this call `src` is logically uninitialized and must not be dropped.
    ///
    /// # Safety
    /// - `src` must point to a valid, initialized value of this component type.
    /// - `dst` must be uninitialized memory valid for this component's layout and must not
    ///   overlap `src`.
    #[inline]
    pub unsafe fn relocate(&self, dst: NonNull<u8>, src: NonNull<u8>) {
        unsafe { (self.move_fn)(dst, src) }
    }

    /// Destroy the value at `ptr` in place. The memory itself is not released.
    ///
    /// # Safety
    /// `ptr` must point to a valid, initialized value of this component type that is not used
    /// again afterwards.
    #[inline]
    pub unsafe fn drop_in_place(&self, ptr: NonNull<u8>) {
        unsafe { (self.drop_fn)(ptr) }
    }

    /// Copy implementation, routed through `Clone`.
    unsafe fn copy_impl<C: Clone>(dst: NonNull<u8>, src: NonNull<u8>) {
        // SAFETY: Caller ensures src points to a valid C and dst is writable for a C.
        unsafe {
            let value = src.cast::<C>().as_ref().clone();
            dst.cast::<C>().write(value);
        }
    }

    /// Move implementation. A Rust move is a bitwise copy that ends the source's lifetime.
    unsafe fn move_impl<C>(dst: NonNull<u8>, src: NonNull<u8>) {
        // SAFETY: Caller ensures src points to a valid C, dst is writable and they don't overlap.
        unsafe {
            ptr::copy_nonoverlapping(src.cast::<C>().as_ptr(), dst.cast::<C>().as_ptr(), 1);
        }
    }

    /// Drop implementation for types that need drop.
    unsafe fn drop_impl<C>(ptr: NonNull<u8>) {
        // SAFETY: Caller ensures ptr points to a valid initialized C
        unsafe {
            ptr::drop_in_place(ptr.as_ptr() as *mut C);
        }
    }

    /// No-op drop for types that don't need drop.
    unsafe fn drop_noop(_ptr: NonNull<u8>) {}
}
