use core::{
    alloc::Allocator,
    fmt,
    iter::{FusedIterator, TrustedLen},
    marker::PhantomData,
    mem,
    num::NonZeroUsize,
    ptr::{self, NonNull},
};

use crate::{
    map::{block_capacity, locate, BlockMap},
    AllocPolicy, Deque,
};

/// A position in the logical sequence: a pointer to a block map slot plus the
/// offset inside the block that slot points to.
///
/// Offsets are always kept below the block capacity, so two cursors into the
/// same map denote the same position exactly when their fields are equal. The
/// slot pointer may point one past the last in-use slot (the end position of a
/// deque whose last block is full); such a cursor is never dereferenced.
pub(crate) struct Cursor<T> {
    slot: *const NonNull<T>,
    offset: usize,
}

impl<T> Clone for Cursor<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<T> {}

impl<T> PartialEq for Cursor<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.offset == other.offset
    }
}

impl<T> Eq for Cursor<T> {}

impl<T> Cursor<T> {
    const CAP: usize = block_capacity::<T>();

    /// `pos` is a raw position (`start + index`) no further than one past the
    /// last slot of the held blocks.
    #[inline]
    pub(crate) fn new(map: &BlockMap<T>, pos: usize) -> Self {
        let (block, offset) = locate::<T>(pos);
        Self { slot: map.slot(block), offset }
    }

    /// # Safety
    /// The cursor must denote an element position, not the end.
    #[inline]
    pub(crate) unsafe fn ptr(self) -> *mut T {
        (*self.slot).as_ptr().add(self.offset)
    }

    #[inline]
    pub(crate) unsafe fn step(&mut self) {
        self.offset += 1;
        if self.offset == Self::CAP {
            self.slot = self.slot.add(1);
            self.offset = 0;
        }
    }

    #[inline]
    pub(crate) unsafe fn step_back(&mut self) {
        if self.offset == 0 {
            self.slot = self.slot.sub(1);
            self.offset = Self::CAP - 1;
        } else {
            self.offset -= 1;
        }
    }

    #[inline]
    pub(crate) unsafe fn advance(&mut self, n: usize) {
        let offset = self.offset + n;
        self.slot = self.slot.add(offset / Self::CAP);
        self.offset = offset % Self::CAP;
    }

    #[inline]
    pub(crate) unsafe fn retreat(&mut self, n: usize) {
        if n <= self.offset {
            self.offset -= n;
        } else {
            let back = n - self.offset;
            let blocks = (back + Self::CAP - 1) / Self::CAP;
            self.slot = self.slot.sub(blocks);
            self.offset = blocks * Self::CAP - back;
        }
    }

    /// Number of positions from `self` forward to `later`.
    #[inline]
    pub(crate) fn distance_to(self, later: Self) -> usize {
        let slots = (later.slot as usize - self.slot as usize) / mem::size_of::<NonNull<T>>();
        slots * Self::CAP + later.offset - self.offset
    }

    /// Number of positions left in the current block.
    #[inline]
    pub(crate) fn block_room(self) -> usize {
        Self::CAP - self.offset
    }
}

/// Walks `[front, back)` one contiguous block run at a time.
pub(crate) struct Segments<T> {
    front: Cursor<T>,
    back: Cursor<T>,
}

impl<T> Segments<T> {
    #[inline]
    pub(crate) fn new(front: Cursor<T>, back: Cursor<T>) -> Self {
        Self { front, back }
    }
}

impl<T> Iterator for Segments<T> {
    type Item = *mut [T];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let n = self.front.block_room().min(self.front.distance_to(self.back));
        unsafe {
            let seg = ptr::slice_from_raw_parts_mut(self.front.ptr(), n);
            self.front.advance(n);
            Some(seg)
        }
    }
}

impl<T> FusedIterator for Segments<T> {}

/// An iterator over the elements of a [`Deque`].
///
/// Created by [`Deque::iter`] and [`Deque::range`]. Positioning is O(1)
/// (`nth`, `advance_by`, `len`) and crosses block boundaries transparently.
pub struct Iter<'a, T> {
    front: Cursor<T>,
    back: Cursor<T>,
    _marker: PhantomData<&'a T>,
}

/// A mutable iterator over the elements of a [`Deque`].
pub struct IterMut<'a, T> {
    front: Cursor<T>,
    back: Cursor<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iter<'a, T> {
    #[inline]
    pub(crate) fn new(front: Cursor<T>, back: Cursor<T>) -> Self {
        Self { front, back, _marker: PhantomData }
    }
}

impl<'a, T> IterMut<'a, T> {
    #[inline]
    pub(crate) fn new(front: Cursor<T>, back: Cursor<T>) -> Self {
        Self { front, back, _marker: PhantomData }
    }

    #[inline]
    pub fn as_iter(&self) -> Iter<'_, T> {
        Iter::new(self.front, self.back)
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        unsafe {
            let ptr = self.front.ptr();
            self.front.step();
            Some(&*ptr)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.len() {
            self.front = self.back;
            return None;
        }
        unsafe { self.front.advance(n) };
        self.next()
    }

    #[inline]
    fn advance_by(&mut self, n: usize) -> Result<(), NonZeroUsize> {
        let step = n.min(self.len());
        unsafe { self.front.advance(step) };
        NonZeroUsize::new(n - step).map_or(Ok(()), Err)
    }

    #[inline]
    fn count(self) -> usize {
        self.len()
    }

    #[inline]
    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }

    #[inline]
    fn fold<B, F>(self, init: B, mut f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        Segments::new(self.front, self.back)
            .fold(init, |acc, seg| unsafe { (*seg).iter() }.fold(acc, &mut f))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        unsafe {
            self.back.step_back();
            Some(&*self.back.ptr())
        }
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.len() {
            self.back = self.front;
            return None;
        }
        unsafe { self.back.retreat(n) };
        self.next_back()
    }

    #[inline]
    fn advance_back_by(&mut self, n: usize) -> Result<(), NonZeroUsize> {
        let step = n.min(self.len());
        unsafe { self.back.retreat(step) };
        NonZeroUsize::new(n - step).map_or(Ok(()), Err)
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {
    #[inline]
    fn len(&self) -> usize {
        self.front.distance_to(self.back)
    }
}

impl<'a, T> FusedIterator for Iter<'a, T> {}

unsafe impl<'a, T> TrustedLen for Iter<'a, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    #[inline]
    fn clone(&self) -> Self {
        Self::new(self.front, self.back)
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for Iter<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&DebugList(self.clone())).finish()
    }
}

unsafe impl<'a, T: Sync> Send for Iter<'a, T> {}
unsafe impl<'a, T: Sync> Sync for Iter<'a, T> {}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        unsafe {
            let ptr = self.front.ptr();
            self.front.step();
            Some(&mut *ptr)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.len() {
            self.front = self.back;
            return None;
        }
        unsafe { self.front.advance(n) };
        self.next()
    }

    #[inline]
    fn advance_by(&mut self, n: usize) -> Result<(), NonZeroUsize> {
        let step = n.min(self.len());
        unsafe { self.front.advance(step) };
        NonZeroUsize::new(n - step).map_or(Ok(()), Err)
    }

    #[inline]
    fn count(self) -> usize {
        self.len()
    }

    #[inline]
    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }

    #[inline]
    fn fold<B, F>(self, init: B, mut f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        Segments::new(self.front, self.back)
            .fold(init, |acc, seg| unsafe { (*seg).iter_mut() }.fold(acc, &mut f))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        unsafe {
            self.back.step_back();
            Some(&mut *self.back.ptr())
        }
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.len() {
            self.back = self.front;
            return None;
        }
        unsafe { self.back.retreat(n) };
        self.next_back()
    }

    #[inline]
    fn advance_back_by(&mut self, n: usize) -> Result<(), NonZeroUsize> {
        let step = n.min(self.len());
        unsafe { self.back.retreat(step) };
        NonZeroUsize::new(n - step).map_or(Ok(()), Err)
    }
}

impl<'a, T> ExactSizeIterator for IterMut<'a, T> {
    #[inline]
    fn len(&self) -> usize {
        self.front.distance_to(self.back)
    }
}

impl<'a, T> FusedIterator for IterMut<'a, T> {}

unsafe impl<'a, T> TrustedLen for IterMut<'a, T> {}

impl<'a, T: fmt::Debug> fmt::Debug for IterMut<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IterMut").field(&DebugList(self.as_iter())).finish()
    }
}

unsafe impl<'a, T: Send> Send for IterMut<'a, T> {}
unsafe impl<'a, T: Sync> Sync for IterMut<'a, T> {}

struct DebugList<'a, T>(Iter<'a, T>);

impl<'a, T: fmt::Debug> fmt::Debug for DebugList<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.clone()).finish()
    }
}

/// An iterator over the contiguous runs of a [`Deque`], one per block.
///
/// Created by [`Deque::blocks`].
pub struct Blocks<'a, T> {
    segments: Segments<T>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Blocks<'a, T> {
    #[inline]
    pub(crate) fn new(front: Cursor<T>, back: Cursor<T>) -> Self {
        Self { segments: Segments::new(front, back), _marker: PhantomData }
    }
}

impl<'a, T> Iterator for Blocks<'a, T> {
    type Item = &'a [T];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.segments.next().map(|seg| unsafe { &*seg })
    }
}

impl<'a, T> FusedIterator for Blocks<'a, T> {}

impl<'a, T> Clone for Blocks<'a, T> {
    #[inline]
    fn clone(&self) -> Self {
        Self::new(self.segments.front, self.segments.back)
    }
}

unsafe impl<'a, T: Sync> Send for Blocks<'a, T> {}
unsafe impl<'a, T: Sync> Sync for Blocks<'a, T> {}

/// An owning iterator over the elements of a [`Deque`].
#[derive(Debug)]
pub struct IntoIter<T, A: Allocator>(pub(crate) Deque<T, A>);

impl<T: Clone, A: AllocPolicy + Clone> Clone for IntoIter<T, A> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len, Some(self.0.len))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.pop_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {
    #[inline]
    fn len(&self) -> usize {
        self.0.len
    }
}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

unsafe impl<T, A: Allocator> TrustedLen for IntoIter<T, A> {}

/// A draining iterator over a range of a [`Deque`].
///
/// Created by [`Deque::drain`]. While it lives the deque's length covers only
/// the elements before the range; dropping it closes the gap by moving
/// whichever side of the range is shorter and releases the blocks that end up
/// empty.
pub struct Drain<'a, T, A: Allocator> {
    pub(crate) deque: &'a mut Deque<T, A>,
    pub(crate) orig_len: usize,
    pub(crate) drain_start: usize,
    pub(crate) drain_len: usize,
    pub(crate) idx: usize,
    pub(crate) remaining: usize,
}

impl<'a, T, A: Allocator> Iterator for Drain<'a, T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = unsafe { self.deque.ptr_at_idx(self.idx) };
        self.idx += 1;
        self.remaining -= 1;
        unsafe { Some(ptr::read(ptr)) }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, A: Allocator> DoubleEndedIterator for Drain<'a, T, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let ptr = unsafe { self.deque.ptr_at_idx(self.idx + self.remaining) };
        unsafe { Some(ptr::read(ptr)) }
    }
}

impl<'a, T, A: Allocator> ExactSizeIterator for Drain<'a, T, A> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<'a, T, A: Allocator> FusedIterator for Drain<'a, T, A> {}

unsafe impl<'a, T, A: Allocator> TrustedLen for Drain<'a, T, A> {}

impl<'a, T: fmt::Debug, A: Allocator> fmt::Debug for Drain<'a, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let iter = Iter::new(
            self.deque.cursor(self.idx),
            self.deque.cursor(self.idx + self.remaining),
        );
        f.debug_tuple("Drain").field(&DebugList(iter)).finish()
    }
}

impl<'a, T, A: Allocator> Drop for Drain<'a, T, A> {
    fn drop(&mut self) {
        struct DropGuard<'a, 'b, T, A: Allocator>(&'a mut Drain<'b, T, A>);

        impl<'a, 'b, T, A: Allocator> Drop for DropGuard<'a, 'b, T, A> {
            fn drop(&mut self) {
                for _ in &mut self.0 {}

                let head_len = self.0.drain_start;
                let tail_len = self.0.orig_len - self.0.drain_start - self.0.drain_len;
                unsafe { self.0.deque.close_gap(head_len, self.0.drain_len, tail_len) };
            }
        }

        while let Some(item) = self.next() {
            let guard = DropGuard(self);
            drop(item);
            mem::forget(guard);
        }

        DropGuard(self);
    }
}
