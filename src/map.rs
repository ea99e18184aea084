use core::{
    alloc::{Allocator, Layout},
    mem,
    ptr::{self, NonNull},
};

use crate::error::Error;

/// Target size of a block in bytes.
pub(crate) const BLOCK_BYTES: usize = 4096;

/// No block holds fewer elements than this, however large `T` is.
pub(crate) const MIN_BLOCK_CAPACITY: usize = 16;

/// Number of pointer slots the block map starts out with.
pub(crate) const MIN_MAP_CAPACITY: usize = 8;

/// Number of elements a single block holds.
#[inline]
pub(crate) const fn block_capacity<T>() -> usize {
    let size = mem::size_of::<T>();
    if size == 0 {
        BLOCK_BYTES
    } else if size <= BLOCK_BYTES / MIN_BLOCK_CAPACITY {
        BLOCK_BYTES / size
    } else {
        MIN_BLOCK_CAPACITY
    }
}

/// Maps a raw position (`start + index`) to the block it lives in, relative to
/// the first in-use map slot, and the offset inside that block.
#[inline]
pub(crate) const fn locate<T>(pos: usize) -> (usize, usize) {
    let cap = block_capacity::<T>();
    (pos / cap, pos % cap)
}

/// Number of blocks needed to hold `len` elements starting at offset `start`
/// of the first block.
#[inline]
pub(crate) const fn blocks_for<T>(start: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (start + len - 1) / block_capacity::<T>() + 1
    }
}

/// The directory of blocks.
///
/// A raw buffer of `cap` block pointers of which `[head, head + len)` are in
/// use, front to back in logical order. The spare slots on either side let
/// blocks be added at both ends without shifting the others. The map never
/// owns the blocks' contents and doesn't store an allocator; the deque passes
/// its own in and is responsible for freeing both blocks and buffer.
pub(crate) struct BlockMap<T> {
    buf: NonNull<NonNull<T>>,
    cap: usize,
    head: usize,
    len: usize,
}

impl<T> BlockMap<T> {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self { buf: NonNull::dangling(), cap: 0, head: 0, len: 0 }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub(crate) const fn back_spare(&self) -> usize {
        self.cap - self.head - self.len
    }

    /// Pointer to the `i`th in-use slot. `i == self.len()` yields the slot one
    /// past the last block, which may only be used for pointer arithmetic.
    #[inline]
    pub(crate) fn slot(&self, i: usize) -> *mut NonNull<T> {
        debug_assert!(i <= self.len);
        // SAFETY: head + len <= cap, so this stays inside the buffer or one past it
        unsafe { self.buf.as_ptr().add(self.head + i) }
    }

    /// # Safety
    /// `i` must be smaller than `self.len()`.
    #[inline]
    pub(crate) unsafe fn block(&self, i: usize) -> NonNull<T> {
        debug_assert!(i < self.len);
        *self.slot(i)
    }

    pub(crate) fn try_push_back<A: Allocator>(
        &mut self,
        block: NonNull<T>,
        alloc: &A,
    ) -> Result<(), Error> {
        if self.back_spare() == 0 {
            self.try_reserve(0, 1, alloc)?;
        }
        unsafe { self.buf.as_ptr().add(self.head + self.len).write(block) };
        self.len += 1;
        Ok(())
    }

    pub(crate) fn try_push_front<A: Allocator>(
        &mut self,
        block: NonNull<T>,
        alloc: &A,
    ) -> Result<(), Error> {
        if self.head == 0 {
            self.try_reserve(1, 0, alloc)?;
        }
        self.head -= 1;
        unsafe { self.buf.as_ptr().add(self.head).write(block) };
        self.len += 1;
        Ok(())
    }

    #[inline]
    pub(crate) fn pop_back(&mut self) -> Option<NonNull<T>> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { self.buf.as_ptr().add(self.head + self.len).read() })
    }

    #[inline]
    pub(crate) fn pop_front(&mut self) -> Option<NonNull<T>> {
        if self.len == 0 {
            return None;
        }
        let block = unsafe { self.buf.as_ptr().add(self.head).read() };
        self.head += 1;
        self.len -= 1;
        Some(block)
    }

    /// Makes sure there are at least `front` spare slots before the in-use run
    /// and `back` spare slots after it.
    ///
    /// A map that is at most half full is re-centered in place; otherwise the
    /// buffer is reallocated to at least twice its size with the free slots
    /// split evenly between both ends. Either way only block pointers move.
    /// On error the map is unchanged.
    pub(crate) fn try_reserve<A: Allocator>(
        &mut self,
        front: usize,
        back: usize,
        alloc: &A,
    ) -> Result<(), Error> {
        if self.head >= front && self.back_spare() >= back {
            return Ok(());
        }
        let required = self
            .len
            .checked_add(front)
            .and_then(|n| n.checked_add(back))
            .ok_or(Error::CapacityOverflow)?;

        if required <= self.cap / 2 {
            let new_head = front + (self.cap - required) / 2;
            let buf = self.buf.as_ptr();
            unsafe { ptr::copy(buf.add(self.head), buf.add(new_head), self.len) };
            self.head = new_head;
            return Ok(());
        }

        let new_cap = required.max(self.cap.saturating_mul(2)).max(MIN_MAP_CAPACITY);
        self.try_realloc(new_cap, front + (new_cap - required) / 2, alloc)
    }

    /// Shrinks the buffer to exactly the in-use run. Failing to allocate the
    /// smaller buffer leaves the map as it is.
    pub(crate) fn shrink_to_fit<A: Allocator>(&mut self, alloc: &A) {
        if self.cap == self.len {
            return;
        }
        if self.len == 0 {
            unsafe { self.deallocate(alloc) };
            return;
        }
        let _ = self.try_realloc(self.len, 0, alloc);
    }

    /// Frees the pointer buffer.
    ///
    /// # Safety
    /// All blocks must have been popped and deallocated already.
    pub(crate) unsafe fn deallocate<A: Allocator>(&mut self, alloc: &A) {
        debug_assert!(self.len == 0);
        self.free_buffer(alloc);
        *self = Self::new();
    }

    fn try_realloc<A: Allocator>(
        &mut self,
        new_cap: usize,
        new_head: usize,
        alloc: &A,
    ) -> Result<(), Error> {
        debug_assert!(new_head + self.len <= new_cap);
        let layout = Self::layout(new_cap)?;
        let new_buf: NonNull<NonNull<T>> =
            alloc.allocate(layout).map_err(|_| Error::AllocError { layout })?.cast();

        unsafe {
            ptr::copy_nonoverlapping(
                self.buf.as_ptr().add(self.head),
                new_buf.as_ptr().add(new_head),
                self.len,
            );
            self.free_buffer(alloc);
        }

        self.buf = new_buf;
        self.cap = new_cap;
        self.head = new_head;
        Ok(())
    }

    #[inline]
    fn layout(cap: usize) -> Result<Layout, Error> {
        match Layout::array::<NonNull<T>>(cap) {
            Ok(l) if l.size() <= isize::MAX as usize => Ok(l),
            _ => Err(Error::CapacityOverflow),
        }
    }

    unsafe fn free_buffer<A: Allocator>(&mut self, alloc: &A) {
        if self.cap != 0 {
            // the layout was checked when the buffer was allocated
            let layout = Layout::from_size_align_unchecked(
                mem::size_of::<NonNull<T>>() * self.cap,
                mem::align_of::<NonNull<T>>(),
            );
            alloc.deallocate(self.buf.cast(), layout);
        }
    }
}
