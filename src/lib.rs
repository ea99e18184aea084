#![feature(allocator_api, slice_range, trusted_len, iter_advance_by, extend_one)]

//! A double-ended queue stored as a directory of fixed-size blocks.
//!
//! [`Deque`] keeps its elements in blocks of [`Deque::BLOCK_CAPACITY`] slots
//! each, referenced from a growable array of block pointers (the block map).
//! Pushing at either end is amortized O(1) and never moves existing elements:
//! when the map runs out of room only the block pointers are copied, so
//! references to elements stay put. Indexing is O(1) and inserting or removing
//! in the middle shifts whichever side of the position is shorter.
//!
//! Every storage request goes through the deque's [`Allocator`]. The
//! [`AllocPolicy`] trait decides whether two deques with different allocator
//! instances may trade storage in O(1) or have to move elements one by one.

extern crate alloc;

mod binding;
mod error;
mod iter;
mod map;

#[cfg(test)]
mod tests;

pub use binding::AllocPolicy;
pub use error::{Error, Result};
pub use iter::{Blocks, Drain, IntoIter, Iter, IterMut};

use alloc::{
    alloc::{Allocator, Global},
    vec::Vec,
};

use std::io;

use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    iter as core_iter,
    marker::PhantomData,
    mem,
    ops::{Index, IndexMut, RangeBounds},
    ptr, slice,
};

use binding::{allocate_block, deallocate_block};
use error::handle_error;
use iter::{Cursor, Segments};
use map::{block_capacity, blocks_for, locate, BlockMap};

pub struct Deque<T, A: Allocator = Global> {
    map: BlockMap<T>,
    // offset of the front element inside the first block
    start: usize,
    len: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

impl<T> Deque<T> {
    #[inline]
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates a deque holding `len` default values.
    #[inline]
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        Self::with_len_in(len, Global)
    }

    /// Creates a deque holding `n` clones of `elem`.
    #[inline]
    pub fn from_elem(elem: T, n: usize) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(elem, n, Global)
    }
}

impl<T, A: Allocator> Deque<T, A> {
    /// Number of elements stored in each block.
    pub const BLOCK_CAPACITY: usize = block_capacity::<T>();

    #[inline]
    pub const fn new_in(alloc: A) -> Self {
        Self { map: BlockMap::new(), start: 0, len: 0, alloc, _marker: PhantomData }
    }

    pub fn with_len_in(len: usize, alloc: A) -> Self
    where
        T: Default,
    {
        let mut this = Self::new_in(alloc);
        this.resize_with(len, T::default);
        this
    }

    pub fn from_elem_in(elem: T, n: usize, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut this = Self::new_in(alloc);
        this.resize(n, elem);
        this
    }

    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Self {
        let mut this = Self::new_in(alloc);
        this.extend(iter);
        this
    }

    /// Copies the elements into a new deque backed by `alloc`. The new block
    /// map gets room for the blocks the copy needs, and never fewer than 8
    /// slots.
    pub fn clone_in<B: Allocator>(&self, alloc: B) -> Deque<T, B>
    where
        T: Clone,
    {
        let mut out = Deque::new_in(alloc);
        let blocks = blocks_for::<T>(0, self.len);
        if let Err(err) = out.map.try_reserve(0, blocks, &out.alloc) {
            handle_error(err)
        }
        out.extend(self.iter().cloned());
        out
    }

    /// Rebinds the deque to `alloc`. The storage is kept when `alloc` compares
    /// equal to the current allocator; otherwise every element is moved into
    /// storage allocated by `alloc`.
    pub fn move_in(self, alloc: A) -> Self
    where
        A: AllocPolicy,
    {
        if self.alloc.is_equal(&alloc) {
            let mut this = self;
            drop(mem::replace(&mut this.alloc, alloc));
            this
        } else {
            let mut out = Self::new_in(alloc);
            out.extend(self);
            out
        }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The largest length a deque of `T` can theoretically reach.
    #[inline]
    pub const fn max_size(&self) -> usize {
        let size = mem::size_of::<T>();
        isize::MAX as usize / if size == 0 { 1 } else { size }
    }

    /// Number of element slots in the blocks currently held.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.map.len() * Self::BLOCK_CAPACITY
    }

    #[inline]
    pub const fn block_count(&self) -> usize {
        self.map.len()
    }

    /// Number of block pointer slots in the block map, used or not.
    #[inline]
    pub const fn map_capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Free slots before the front element in the first block.
    #[inline]
    pub const fn front_spare(&self) -> usize {
        if self.map.is_empty() {
            0
        } else {
            self.start
        }
    }

    /// Free slots after the back element in the held blocks.
    #[inline]
    pub const fn back_spare(&self) -> usize {
        self.capacity() - self.start - self.len
    }

    #[inline]
    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    /// # Safety
    /// `pos` must be a raw position inside the held blocks.
    #[inline]
    unsafe fn ptr_at(&self, pos: usize) -> *mut T {
        let (block, offset) = locate::<T>(pos);
        self.map.block(block).as_ptr().add(offset)
    }

    /// # Safety
    /// `idx` must be smaller than `self.capacity() - self.start`.
    #[inline]
    pub(crate) unsafe fn ptr_at_idx(&self, idx: usize) -> *mut T {
        self.ptr_at(self.start + idx)
    }

    /// `idx` may be at most `self.len()`; the cursor at `len` is the end position.
    #[inline]
    pub(crate) fn cursor(&self, idx: usize) -> Cursor<T> {
        Cursor::new(&self.map, self.start + idx)
    }

    #[inline]
    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            Some(unsafe { &*self.ptr_at(self.start) })
        }
    }

    #[inline]
    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            Some(unsafe { &*self.ptr_at(self.start + self.len - 1) })
        }
    }

    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            None
        } else {
            Some(unsafe { &mut *self.ptr_at(self.start) })
        }
    }

    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            None
        } else {
            Some(unsafe { &mut *self.ptr_at(self.start + self.len - 1) })
        }
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&T> {
        if idx >= self.len {
            None
        } else {
            Some(unsafe { self.get_unchecked(idx) })
        }
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        if idx >= self.len {
            None
        } else {
            Some(unsafe { self.get_unchecked_mut(idx) })
        }
    }

    /// Bounds-checked access.
    ///
    /// # Errors
    /// Returns [`Error::OutOfRange`] if `idx >= self.len()`.
    #[inline]
    pub fn at(&self, idx: usize) -> Result<&T> {
        self.get(idx).ok_or(Error::OutOfRange { index: idx, len: self.len })
    }

    /// Bounds-checked mutable access.
    ///
    /// # Errors
    /// Returns [`Error::OutOfRange`] if `idx >= self.len()`.
    #[inline]
    pub fn at_mut(&mut self, idx: usize) -> Result<&mut T> {
        let len = self.len;
        self.get_mut(idx).ok_or(Error::OutOfRange { index: idx, len })
    }

    /// # Safety
    /// Callers must ensure that `idx < self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, idx: usize) -> &T {
        debug_assert!(idx < self.len);
        &*self.ptr_at_idx(idx)
    }

    /// # Safety
    /// Callers must ensure that `idx < self.len()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, idx: usize) -> &mut T {
        debug_assert!(idx < self.len);
        &mut *self.ptr_at_idx(idx)
    }

    #[inline]
    pub fn swap(&mut self, i: usize, j: usize) {
        if i >= self.len || j >= self.len {
            panic!(
                "swap indices out of bounds: tried to swap {i} and {j} on a Deque of length {}",
                self.len
            );
        }
        unsafe { self.swap_unchecked(i, j) }
    }

    /// # Safety
    /// `i` and `j` must be smaller than `self.len()`
    #[inline]
    pub unsafe fn swap_unchecked(&mut self, i: usize, j: usize) {
        ptr::swap(self.ptr_at_idx(i), self.ptr_at_idx(j))
    }

    #[cold]
    fn try_grow_back(&mut self) -> Result<()> {
        if self.len >= self.max_size() {
            return Err(Error::CapacityOverflow);
        }
        let block = allocate_block::<T, A>(&self.alloc)?;
        if let Err(err) = self.map.try_push_back(block, &self.alloc) {
            unsafe { deallocate_block(block, &self.alloc) };
            return Err(err);
        }
        Ok(())
    }

    #[cold]
    fn try_grow_front(&mut self) -> Result<()> {
        if self.len >= self.max_size() {
            return Err(Error::CapacityOverflow);
        }
        let block = allocate_block::<T, A>(&self.alloc)?;
        if let Err(err) = self.map.try_push_front(block, &self.alloc) {
            unsafe { deallocate_block(block, &self.alloc) };
            return Err(err);
        }
        self.start += Self::BLOCK_CAPACITY;
        Ok(())
    }

    /// Makes sure the slot right after the back element exists. An empty
    /// deque restarts at the beginning of its first block.
    #[inline]
    fn try_reserve_back_slot(&mut self) -> Result<()> {
        if self.len == 0 {
            self.start = 0;
        }
        if self.back_spare() == 0 {
            self.try_grow_back()?;
        }
        Ok(())
    }

    /// Makes sure the slot right before the front element exists and moves
    /// `start` onto it. An empty deque restarts at the end of its first block.
    #[inline]
    fn try_reserve_front_slot(&mut self) -> Result<()> {
        if self.len == 0 && !self.map.is_empty() {
            self.start = Self::BLOCK_CAPACITY;
        } else if self.start == 0 {
            self.try_grow_front()?;
        }
        self.start -= 1;
        Ok(())
    }

    /// Pre-sizes the block map so that `additional` more elements can be
    /// pushed at the back without reallocating it.
    fn try_reserve_map_back(&mut self, additional: usize) -> Result<()> {
        let len = self.len.checked_add(additional).ok_or(Error::CapacityOverflow)?;
        if len > self.max_size() {
            return Err(Error::CapacityOverflow);
        }
        let extra = blocks_for::<T>(self.start, len).saturating_sub(self.map.len());
        self.map.try_reserve(0, extra, &self.alloc)
    }

    /// Releases blocks past the one holding the back element. The first block
    /// is kept even when the deque is empty.
    fn trim_back(&mut self) {
        let needed = blocks_for::<T>(self.start, self.len).max(1);
        while self.map.len() > needed {
            if let Some(block) = self.map.pop_back() {
                unsafe { deallocate_block(block, &self.alloc) };
            }
        }
    }

    /// Releases blocks that `start` has moved past.
    fn trim_front(&mut self) {
        while self.start >= Self::BLOCK_CAPACITY {
            if self.map.len() <= 1 {
                // only reachable once the deque is empty
                self.start = 0;
                break;
            }
            if let Some(block) = self.map.pop_front() {
                unsafe { deallocate_block(block, &self.alloc) };
            }
            self.start -= Self::BLOCK_CAPACITY;
        }
    }

    /// Returns every block and the map itself to the allocator. Elements must
    /// have been dropped or moved out already.
    fn release_storage(&mut self) {
        while let Some(block) = self.map.pop_back() {
            unsafe { deallocate_block(block, &self.alloc) };
        }
        unsafe { self.map.deallocate(&self.alloc) };
        self.start = 0;
    }

    #[inline]
    pub fn push_back(&mut self, val: T) {
        if let Err(err) = self.try_push_back(val) {
            handle_error(err)
        }
    }

    #[inline]
    pub fn push_front(&mut self, val: T) {
        if let Err(err) = self.try_push_front(val) {
            handle_error(err)
        }
    }

    /// Appends an element, reporting allocation failure instead of aborting.
    ///
    /// # Errors
    /// On failure the deque is unchanged and `val` is dropped.
    #[inline]
    pub fn try_push_back(&mut self, val: T) -> Result<()> {
        self.try_reserve_back_slot()?;

        // SAFETY: the slot after the back element is inside a held block now
        unsafe { self.ptr_at(self.start + self.len).write(val) };
        self.len += 1;
        Ok(())
    }

    /// Prepends an element, reporting allocation failure instead of aborting.
    ///
    /// # Errors
    /// On failure the deque is unchanged and `val` is dropped.
    #[inline]
    pub fn try_push_front(&mut self, val: T) -> Result<()> {
        self.try_reserve_front_slot()?;

        unsafe { self.ptr_at(self.start).write(val) };
        self.len += 1;
        Ok(())
    }

    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let val = unsafe { self.ptr_at(self.start).read() };
        self.start += 1;
        self.len -= 1;
        if self.start == Self::BLOCK_CAPACITY {
            self.trim_front();
        }

        Some(val)
    }

    #[inline]
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        self.len -= 1;
        let val = unsafe { self.ptr_at(self.start + self.len).read() };
        if (self.start + self.len) % Self::BLOCK_CAPACITY == 0 {
            self.trim_back();
        }

        Some(val)
    }

    /// Moves `count` elements from raw position `src` to raw position `dst`
    /// one contiguous run at a time. Overlap in either direction is fine.
    ///
    /// # Safety
    /// Both ranges must lie inside the held blocks.
    unsafe fn copy_range(&self, src: usize, dst: usize, count: usize) {
        if mem::size_of::<T>() == 0 || src == dst || count == 0 {
            return;
        }
        let cap = Self::BLOCK_CAPACITY;

        if dst < src {
            let (mut src, mut dst, mut left) = (src, dst, count);
            while left > 0 {
                let n = left.min(cap - src % cap).min(cap - dst % cap);
                ptr::copy(self.ptr_at(src), self.ptr_at(dst), n);
                src += n;
                dst += n;
                left -= n;
            }
        } else {
            let (mut src_end, mut dst_end, mut left) = (src + count, dst + count, count);
            while left > 0 {
                let n = left.min((src_end - 1) % cap + 1).min((dst_end - 1) % cap + 1);
                src_end -= n;
                dst_end -= n;
                left -= n;
                ptr::copy(self.ptr_at(src_end), self.ptr_at(dst_end), n);
            }
        }
    }

    /// Closes a gap of `gap` vacated slots that sits after `head_len` and
    /// before `tail_len` live elements, by moving the shorter side.
    ///
    /// # Safety
    /// The slots `[head_len, head_len + gap)` must hold no live elements and
    /// `head_len + gap + tail_len` must not exceed the held slots after `start`.
    pub(crate) unsafe fn close_gap(&mut self, head_len: usize, gap: usize, tail_len: usize) {
        if head_len < tail_len {
            self.copy_range(self.start, self.start + gap, head_len);
            self.start += gap;
            self.len = head_len + tail_len;
            self.trim_front();
        } else {
            self.copy_range(self.start + head_len + gap, self.start + head_len, tail_len);
            self.len = head_len + tail_len;
            self.trim_back();
        }
    }

    /// Drops the elements at indices `[from, to)` block by block. The length
    /// is not touched.
    unsafe fn drop_range(&mut self, from: usize, to: usize) {
        struct Dropper<'a, T>(&'a mut Segments<T>);

        impl<'a, T> Drop for Dropper<'a, T> {
            fn drop(&mut self) {
                for seg in &mut *self.0 {
                    unsafe { ptr::drop_in_place(seg) }
                }
            }
        }

        let mut segments = Segments::new(self.cursor(from), self.cursor(to));
        while let Some(seg) = segments.next() {
            let guard = Dropper(&mut segments);
            ptr::drop_in_place(seg);
            mem::forget(guard);
        }
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.cursor(0), self.cursor(self.len))
    }

    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.cursor(0), self.cursor(self.len))
    }

    #[inline]
    pub fn range<R: RangeBounds<usize>>(&self, r: R) -> Iter<'_, T> {
        let r = slice::range(r, ..self.len);
        Iter::new(self.cursor(r.start), self.cursor(r.end))
    }

    #[inline]
    pub fn range_mut<R: RangeBounds<usize>>(&mut self, r: R) -> IterMut<'_, T> {
        let r = slice::range(r, ..self.len);
        IterMut::new(self.cursor(r.start), self.cursor(r.end))
    }

    /// Iterates over the elements as contiguous slices, one per block.
    #[inline]
    pub fn blocks(&self) -> Blocks<'_, T> {
        Blocks::new(self.cursor(0), self.cursor(self.len))
    }

    pub fn append(&mut self, other: &mut Self) {
        self.extend(other.drain(..));
    }

    #[inline]
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) {
        self.retain_mut(|t| f(t))
    }

    pub fn retain_mut<F: FnMut(&mut T) -> bool>(&mut self, mut f: F) {
        let len = self.len();
        let mut idx = 0;
        let mut cur = 0;

        while cur < len {
            if !f(unsafe { self.get_unchecked_mut(cur) }) {
                cur += 1;
                break;
            }
            cur += 1;
            idx += 1;
        }

        while cur < len {
            if !f(unsafe { self.get_unchecked_mut(cur) }) {
                cur += 1;
                continue;
            }

            unsafe { self.swap_unchecked(cur, idx) };
            cur += 1;
            idx += 1;
        }

        if cur != idx {
            self.truncate(idx);
        }
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        struct TrimGuard<'a, T, A: Allocator>(&'a mut Deque<T, A>);

        impl<'a, T, A: Allocator> Drop for TrimGuard<'a, T, A> {
            fn drop(&mut self) {
                self.0.trim_back()
            }
        }

        let old_len = mem::replace(&mut self.len, len);
        let guard = TrimGuard(self);
        if mem::needs_drop::<T>() {
            unsafe { guard.0.drop_range(len, old_len) }
        }
    }

    /// Drops every element. One block stays allocated for the next pushes;
    /// use [`shrink_to_fit`](Self::shrink_to_fit) to give it back too.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
        self.start = 0;
    }

    /// Releases the blocks and map slots the elements don't need. An empty
    /// deque gives back all of its memory.
    pub fn shrink_to_fit(&mut self) {
        if self.is_empty() {
            self.release_storage();
        } else {
            self.trim_back();
            self.map.shrink_to_fit(&self.alloc);
        }
    }

    #[inline]
    pub fn binary_search(&self, t: &T) -> core::result::Result<usize, usize>
    where
        T: Ord,
    {
        self.binary_search_by(|e| e.cmp(t))
    }

    #[inline]
    pub fn binary_search_by_key<'a, B: Ord, F: FnMut(&'a T) -> B>(
        &'a self,
        b: &B,
        mut f: F,
    ) -> core::result::Result<usize, usize> {
        self.binary_search_by(|e| f(e).cmp(b))
    }

    pub fn binary_search_by<'a, F: FnMut(&'a T) -> Ordering>(
        &'a self,
        mut f: F,
    ) -> core::result::Result<usize, usize> {
        let (mut left, mut right) = (0, self.len);
        while left < right {
            let mid = left + (right - left) / 2;
            match f(unsafe { self.get_unchecked(mid) }) {
                Ordering::Less => left = mid + 1,
                Ordering::Greater => right = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(left)
    }

    #[inline]
    pub fn partition_point<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        self.binary_search_by(|x| if pred(x) { Ordering::Less } else { Ordering::Greater })
            .unwrap_or_else(|i| i)
    }

    #[inline]
    pub fn contains(&self, t: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|e| e == t)
    }

    #[inline]
    pub fn drain<R: RangeBounds<usize>>(&mut self, range: R) -> Drain<'_, T, A> {
        let range = slice::range(range, ..self.len);
        let (start, len) = (range.start, range.end - range.start);
        let orig_len = mem::replace(&mut self.len, start);

        Drain {
            deque: self,
            orig_len,
            drain_start: start,
            drain_len: len,
            idx: start,
            remaining: len,
        }
    }

    /// Inserts `val` at `idx`, shifting the shorter side of the deque.
    ///
    /// # Panics
    /// Panics if `idx > self.len()`.
    pub fn insert(&mut self, idx: usize, val: T) {
        if let Err(err) = self.try_insert(idx, val) {
            handle_error(err)
        }
    }

    /// Inserts `val` at `idx`. Any block needed is acquired before an element
    /// moves, so a failed insert leaves the deque untouched.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if `idx > self.len()`, or the allocation error.
    /// `val` is dropped in either case.
    pub fn try_insert(&mut self, idx: usize, val: T) -> Result<()> {
        if idx > self.len {
            return Err(Error::OutOfRange { index: idx, len: self.len });
        }
        let k = self.len - idx;
        if idx < k {
            self.try_reserve_front_slot()?;
            unsafe { self.copy_range(self.start + 1, self.start, idx) }
        } else {
            self.try_reserve_back_slot()?;
            unsafe { self.copy_range(self.start + idx, self.start + idx + 1, k) }
        }
        unsafe { self.ptr_at(self.start + idx).write(val) };
        self.len += 1;
        Ok(())
    }

    /// Inserts every element of `iter` at `idx`, in order.
    ///
    /// The new elements are pushed at whichever end is closer to `idx` and
    /// rotated into place, so the cost is the length of the iterator plus the
    /// shorter side. If the iterator panics the deque is restored to what it
    /// was before the call.
    ///
    /// # Panics
    /// Panics if `idx > self.len()`.
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, idx: usize, iter: I) {
        if idx > self.len {
            handle_error(Error::OutOfRange { index: idx, len: self.len })
        }

        struct Rollback<'a, T, A: Allocator> {
            deque: &'a mut Deque<T, A>,
            at_front: bool,
            added: usize,
        }

        impl<'a, T, A: Allocator> Drop for Rollback<'a, T, A> {
            fn drop(&mut self) {
                for _ in 0..self.added {
                    if self.at_front {
                        drop(self.deque.pop_front());
                    } else {
                        drop(self.deque.pop_back());
                    }
                }
            }
        }

        let iter = iter.into_iter();
        let old_len = self.len;
        let at_front = idx < old_len - idx;
        let mut guard = Rollback { deque: self, at_front, added: 0 };

        if at_front {
            for val in iter {
                guard.deque.push_front(val);
                guard.added += 1;
            }
        } else {
            let _ = guard.deque.try_reserve_map_back(iter.size_hint().0);
            for val in iter {
                guard.deque.push_back(val);
                guard.added += 1;
            }
        }

        let added = mem::replace(&mut guard.added, 0);
        let deque = &mut *guard.deque;
        if at_front {
            // [new (reversed), old[..idx], old[idx..]]
            deque.reverse_range(0, added);
            deque.rotate_range_left(0, added + idx, added);
        } else {
            // [old[..idx], old[idx..], new]
            deque.rotate_range_left(idx, old_len + added, old_len - idx);
        }
    }

    fn reverse_range(&mut self, from: usize, to: usize) {
        let (mut i, mut j) = (from, to);
        while i + 1 < j {
            j -= 1;
            unsafe { self.swap_unchecked(i, j) };
            i += 1;
        }
    }

    fn rotate_range_left(&mut self, from: usize, to: usize, mid: usize) {
        self.reverse_range(from, from + mid);
        self.reverse_range(from + mid, to);
        self.reverse_range(from, to);
    }

    /// Removes and returns the element at `idx`, shifting the shorter side.
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        if idx >= self.len {
            return None;
        }

        let val = unsafe { self.ptr_at_idx(idx).read() };

        let k = self.len - idx - 1;
        unsafe { self.close_gap(idx, 1, k) };

        Some(val)
    }

    pub fn split_off(&mut self, at: usize) -> Deque<T, A>
    where
        A: Clone,
    {
        if at > self.len {
            panic!("tried to split a deque of length {} at index {at}", self.len);
        }

        let mut result = Deque::new_in(self.alloc.clone());
        result.extend(self.drain(at..));
        result
    }

    #[inline]
    pub fn resize(&mut self, new_len: usize, val: T)
    where
        T: Clone,
    {
        self.resize_with(new_len, || val.clone())
    }

    /// Resizes to `new_len`, filling new slots with values from `generator`.
    ///
    /// If `generator` panics, the elements it already produced are dropped in
    /// reverse order and the deque is back at its old length.
    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, mut generator: F) {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }

        struct Rollback<'a, T, A: Allocator> {
            deque: &'a mut Deque<T, A>,
            len: usize,
        }

        impl<'a, T, A: Allocator> Drop for Rollback<'a, T, A> {
            fn drop(&mut self) {
                while self.deque.len > self.len {
                    drop(self.deque.pop_back());
                }
            }
        }

        if let Err(err) = self.try_reserve_map_back(new_len - self.len) {
            handle_error(err)
        }

        let mut guard = Rollback { len: self.len, deque: self };
        while guard.deque.len < new_len {
            let val = generator();
            guard.deque.push_back(val);
        }
        guard.len = new_len;
    }

    /// Replaces the contents with the elements of `iter`, overwriting the
    /// existing elements in place before growing or truncating.
    pub fn assign<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let mut iter = iter.into_iter();
        let mut written = 0;
        for slot in self.iter_mut() {
            match iter.next() {
                Some(val) => *slot = val,
                None => break,
            }
            written += 1;
        }
        if written < self.len {
            self.truncate(written);
        } else {
            self.extend(iter);
        }
    }

    #[inline]
    pub fn assign_elem(&mut self, n: usize, val: T)
    where
        T: Clone,
    {
        self.assign(core_iter::repeat(val).take(n))
    }

    #[inline]
    pub fn rotate_left(&mut self, mid: usize) {
        assert!(mid <= self.len);
        let k = self.len - mid;
        if mid <= k {
            for _ in 0..mid {
                if let Some(val) = self.pop_front() {
                    self.push_back(val);
                }
            }
        } else {
            for _ in 0..k {
                if let Some(val) = self.pop_back() {
                    self.push_front(val);
                }
            }
        }
    }

    #[inline]
    pub fn rotate_right(&mut self, mid: usize) {
        assert!(mid <= self.len);
        self.rotate_left(self.len - mid)
    }

    #[inline]
    pub fn swap_remove_back(&mut self, idx: usize) -> Option<T> {
        if idx >= self.len {
            return None;
        }

        unsafe { self.swap_unchecked(idx, self.len - 1) };
        self.pop_back()
    }

    #[inline]
    pub fn swap_remove_front(&mut self, idx: usize) -> Option<T> {
        if idx >= self.len {
            return None;
        }

        unsafe { self.swap_unchecked(idx, 0) };
        self.pop_front()
    }

    /// Exchanges the contents of two deques.
    ///
    /// Storage changes hands in O(1) when the allocator propagates on swap
    /// (the allocators are exchanged too) or when both allocators compare
    /// equal. Otherwise each deque keeps its allocator and its storage and the
    /// elements are exchanged one by one.
    pub fn swap_with(&mut self, other: &mut Self)
    where
        A: AllocPolicy,
    {
        if A::PROPAGATE_ON_SWAP {
            mem::swap(self, other);
        } else if self.alloc.is_equal(&other.alloc) {
            self.swap_storage(other);
        } else {
            self.swap_elements(other);
        }
    }

    /// Moves the contents of `other` into `self`, leaving `other` empty and
    /// dropping what `self` held.
    ///
    /// This is O(1) when the allocator propagates on move or when both
    /// allocators compare equal; otherwise the elements are moved one by one
    /// into storage from `self`'s allocator.
    pub fn take_from(&mut self, other: &mut Self)
    where
        A: AllocPolicy,
    {
        self.clear();
        if A::PROPAGATE_ON_MOVE {
            self.release_storage();
            mem::swap(self, other);
        } else if self.alloc.is_equal(&other.alloc) {
            self.release_storage();
            self.swap_storage(other);
        } else {
            self.extend(other.drain(..));
        }
    }

    #[inline]
    fn swap_storage(&mut self, other: &mut Self) {
        mem::swap(&mut self.map, &mut other.map);
        mem::swap(&mut self.start, &mut other.start);
        mem::swap(&mut self.len, &mut other.len);
    }

    fn swap_elements(&mut self, other: &mut Self) {
        let common = self.len.min(other.len);
        for i in 0..common {
            unsafe { ptr::swap(self.ptr_at_idx(i), other.ptr_at_idx(i)) };
        }
        let (short, long) = if self.len < other.len { (self, other) } else { (other, self) };
        short.extend(long.drain(common..));
    }

    /// Copies as much of `slice` as possible to the back, stopping at the
    /// first failed allocation. Returns the number of elements copied.
    fn copy_in(&mut self, slice: &[T]) -> (usize, Result<()>)
    where
        T: Copy,
    {
        let mut written = 0;
        while written < slice.len() {
            if let Err(err) = self.try_reserve_back_slot() {
                return (written, Err(err));
            }
            let end = self.start + self.len;
            let room = Self::BLOCK_CAPACITY - end % Self::BLOCK_CAPACITY;
            let n = room.min(slice.len() - written);
            unsafe {
                ptr::copy_nonoverlapping(slice.as_ptr().add(written), self.ptr_at(end), n);
            }
            self.len += n;
            written += n;
        }
        (written, Ok(()))
    }

    /// Appends a copy of `slice`, filling each block with a single copy.
    pub fn extend_from_slice(&mut self, slice: &[T])
    where
        T: Copy,
    {
        let _ = self.try_reserve_map_back(slice.len());
        if let (_, Err(err)) = self.copy_in(slice) {
            handle_error(err)
        }
    }
}

impl<T, A: Allocator> Drop for Deque<T, A> {
    fn drop(&mut self) {
        struct ReleaseGuard<'a, T, A: Allocator>(&'a mut Deque<T, A>);

        impl<'a, T, A: Allocator> Drop for ReleaseGuard<'a, T, A> {
            fn drop(&mut self) {
                self.0.release_storage();
            }
        }

        let len = mem::replace(&mut self.len, 0);
        let guard = ReleaseGuard(self);
        if mem::needs_drop::<T>() {
            unsafe { guard.0.drop_range(0, len) };
        }
    }
}

impl<T> From<Vec<T>> for Deque<T> {
    #[inline]
    fn from(v: Vec<T>) -> Self {
        Self::from_iter(v)
    }
}

impl<T, A: Allocator> From<Deque<T, A>> for Vec<T> {
    fn from(d: Deque<T, A>) -> Self {
        let mut vec = Vec::with_capacity(d.len);
        vec.extend(d);
        vec
    }
}

impl<T, const N: usize> From<[T; N]> for Deque<T> {
    #[inline]
    fn from(arr: [T; N]) -> Self {
        Self::from_iter(arr)
    }
}

impl<T, A: Allocator> Extend<T> for Deque<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        // only a hint; a failure here resurfaces from push_back
        let _ = self.try_reserve_map_back(iter.size_hint().0);
        iter.for_each(|val| self.push_back(val));
    }

    #[inline]
    fn extend_one(&mut self, item: T) {
        self.push_back(item)
    }

    #[inline]
    fn extend_reserve(&mut self, additional: usize) {
        let _ = self.try_reserve_map_back(additional);
    }
}

impl<'a, T: 'a + Copy, A: Allocator> Extend<&'a T> for Deque<T, A> {
    #[inline]
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }

    #[inline]
    fn extend_one(&mut self, item: &'a T) {
        self.push_back(*item)
    }

    #[inline]
    fn extend_reserve(&mut self, additional: usize) {
        let _ = self.try_reserve_map_back(additional);
    }
}

impl<T> FromIterator<T> for Deque<T> {
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, Global)
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Deque<T, A> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Clone, A: AllocPolicy + Clone> Clone for Deque<T, A> {
    #[inline]
    fn clone(&self) -> Self {
        self.clone_in(self.alloc.clone())
    }

    /// Overwrites the elements in place, then truncates or extends. An
    /// allocator that propagates on copy replaces `self`'s; if the two don't
    /// compare equal, the old storage is returned to the old allocator first.
    fn clone_from(&mut self, source: &Self) {
        if A::PROPAGATE_ON_COPY {
            if !self.alloc.is_equal(&source.alloc) {
                self.clear();
                self.release_storage();
            }
            self.alloc = source.alloc.clone();
        }
        self.assign(source.iter().cloned())
    }
}

impl<T> Default for Deque<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq<U>, U, A: Allocator, B: Allocator> PartialEq<Deque<U, B>> for Deque<T, A> {
    fn eq(&self, other: &Deque<U, B>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: PartialEq<U>, U, A: Allocator> PartialEq<[U]> for Deque<T, A> {
    #[inline]
    fn eq(&self, other: &[U]) -> bool {
        self.len == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: PartialEq<U>, U, A: Allocator, const N: usize> PartialEq<[U; N]> for Deque<T, A> {
    #[inline]
    fn eq(&self, other: &[U; N]) -> bool {
        self == other.as_slice()
    }
}

impl<T: PartialOrd, A: Allocator> PartialOrd for Deque<T, A> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other)
    }
}

impl<T: Ord, A: Allocator> Ord for Deque<T, A> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other)
    }
}

impl<T: Eq, A: Allocator> Eq for Deque<T, A> {}

impl<T: Hash, A: Allocator> Hash for Deque<T, A> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        self.iter().for_each(|t| t.hash(state));
    }
}

impl<T, A: Allocator> Index<usize> for Deque<T, A> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Some(t) => t,
            None => handle_error(Error::OutOfRange { index, len: self.len }),
        }
    }
}

impl<T, A: Allocator> IndexMut<usize> for Deque<T, A> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let len = self.len;
        match self.get_mut(index) {
            Some(t) => t,
            None => handle_error(Error::OutOfRange { index, len }),
        }
    }
}

unsafe impl<T: Send, A: Allocator + Send> Send for Deque<T, A> {}

unsafe impl<T: Sync, A: Allocator + Sync> Sync for Deque<T, A> {}

impl<A: Allocator> io::Write for Deque<u8, A> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = self.try_reserve_map_back(buf.len());
        match self.copy_in(buf) {
            (0, Err(_)) if !buf.is_empty() => Err(io::Error::from(io::ErrorKind::OutOfMemory)),
            (n, _) => Ok(n),
        }
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<A: Allocator> io::Read for Deque<u8, A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let front = match self.blocks().next() {
            Some(block) => block,
            None => return Ok(0),
        };
        let n = front.len().min(buf.len());
        buf[..n].copy_from_slice(&front[..n]);
        self.start += n;
        self.len -= n;
        self.trim_front();
        Ok(n)
    }

    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let len = self.len;
        buf.reserve(len);
        self.blocks().for_each(|block| buf.extend_from_slice(block));
        self.clear();
        Ok(len)
    }
}

impl<T, A: Allocator> IntoIterator for Deque<T, A> {
    type Item = T;

    type IntoIter = IntoIter<T, A>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self)
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Deque<T, A> {
    type Item = &'a T;

    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Deque<T, A> {
    type Item = &'a mut T;

    type IntoIter = IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
