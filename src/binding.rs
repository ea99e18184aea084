use core::{
    alloc::{Allocator, Layout},
    mem,
    ptr::NonNull,
};

use alloc::alloc::Global;
use std::alloc::System;

use crate::{error::Error, map::block_capacity};

/// Allocator queries a [`Deque`](crate::Deque) consults when two containers
/// exchange their storage.
///
/// `PROPAGATE_ON_COPY`, `PROPAGATE_ON_SWAP` and `PROPAGATE_ON_MOVE` say
/// whether the allocator travels with the contents in
/// [`clone_from`](Clone::clone_from), [`swap_with`](crate::Deque::swap_with)
/// and [`take_from`](crate::Deque::take_from). When an allocator does not
/// propagate, storage can still change hands in O(1) as long as
/// [`is_equal`](AllocPolicy::is_equal) reports that either allocator can free
/// what the other one allocated. Otherwise the elements are moved one by one.
pub trait AllocPolicy: Allocator {
    const PROPAGATE_ON_COPY: bool = false;
    const PROPAGATE_ON_SWAP: bool = false;
    const PROPAGATE_ON_MOVE: bool = false;

    /// Returns true if memory allocated by `self` may be deallocated through
    /// `other` and vice versa.
    fn is_equal(&self, other: &Self) -> bool;
}

impl AllocPolicy for Global {
    const PROPAGATE_ON_COPY: bool = true;
    const PROPAGATE_ON_SWAP: bool = true;
    const PROPAGATE_ON_MOVE: bool = true;

    #[inline]
    fn is_equal(&self, _: &Self) -> bool {
        true
    }
}

impl AllocPolicy for System {
    const PROPAGATE_ON_COPY: bool = true;
    const PROPAGATE_ON_SWAP: bool = true;
    const PROPAGATE_ON_MOVE: bool = true;

    #[inline]
    fn is_equal(&self, _: &Self) -> bool {
        true
    }
}

impl<A: AllocPolicy + ?Sized> AllocPolicy for &A {
    const PROPAGATE_ON_COPY: bool = A::PROPAGATE_ON_COPY;
    const PROPAGATE_ON_SWAP: bool = A::PROPAGATE_ON_SWAP;
    const PROPAGATE_ON_MOVE: bool = A::PROPAGATE_ON_MOVE;

    #[inline]
    fn is_equal(&self, other: &Self) -> bool {
        (**self).is_equal(*other)
    }
}

#[inline]
pub(crate) fn block_layout<T>() -> Result<Layout, Error> {
    match Layout::array::<T>(block_capacity::<T>()) {
        Ok(l) if l.size() <= isize::MAX as usize => Ok(l),
        _ => Err(Error::CapacityOverflow),
    }
}

/// Allocates one uninitialized block. Blocks of zero-sized types are never
/// backed by memory.
pub(crate) fn allocate_block<T, A: Allocator>(alloc: &A) -> Result<NonNull<T>, Error> {
    if mem::size_of::<T>() == 0 {
        return Ok(NonNull::dangling());
    }
    let layout = block_layout::<T>()?;
    alloc.allocate(layout).map(NonNull::cast).map_err(|_| Error::AllocError { layout })
}

/// # Safety
/// `block` must have come from [`allocate_block`] with an allocator equal to
/// `alloc`, and every element in it must already be dropped or moved out.
pub(crate) unsafe fn deallocate_block<T, A: Allocator>(block: NonNull<T>, alloc: &A) {
    if mem::size_of::<T>() == 0 {
        return;
    }
    // the layout was validated when the block was allocated
    let layout = Layout::from_size_align_unchecked(
        mem::size_of::<T>() * block_capacity::<T>(),
        mem::align_of::<T>(),
    );
    alloc.deallocate(block.cast(), layout);
}
