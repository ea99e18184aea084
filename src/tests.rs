use core::{
    alloc::{AllocError, Allocator, Layout},
    cell::Cell,
    fmt::Debug,
    ptr::NonNull,
};

use alloc::{alloc::Global, rc::Rc, vec::Vec};

use std::{
    collections::VecDeque,
    io::{Read, Write},
    panic::{catch_unwind, AssertUnwindSafe},
};

use crate::{map::blocks_for, AllocPolicy, Deque, Error};

#[derive(Default)]
struct Stats {
    allocs: Cell<usize>,
    frees: Cell<usize>,
    // number of allocations that still succeed, `None` for unlimited
    fail_after: Cell<Option<usize>>,
}

impl Stats {
    fn live(&self) -> usize {
        self.allocs.get() - self.frees.get()
    }
}

/// Counts allocations and can be told to start failing. Two instances are
/// equal when they share an id.
#[derive(Clone)]
struct TestAlloc {
    id: usize,
    stats: Rc<Stats>,
}

impl TestAlloc {
    fn new(id: usize) -> Self {
        Self { id, stats: Rc::default() }
    }
}

unsafe impl Allocator for TestAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if let Some(n) = self.stats.fail_after.get() {
            if n == 0 {
                return Err(AllocError);
            }
            self.stats.fail_after.set(Some(n - 1));
        }
        self.stats.allocs.set(self.stats.allocs.get() + 1);
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.stats.frees.set(self.stats.frees.get() + 1);
        Global.deallocate(ptr, layout)
    }
}

impl AllocPolicy for TestAlloc {
    fn is_equal(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A [`TestAlloc`] that travels with the contents on copy-assignment.
#[derive(Clone)]
struct CopyAlloc(TestAlloc);

unsafe impl Allocator for CopyAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.0.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.0.deallocate(ptr, layout)
    }
}

impl AllocPolicy for CopyAlloc {
    const PROPAGATE_ON_COPY: bool = true;

    fn is_equal(&self, other: &Self) -> bool {
        self.0.is_equal(&other.0)
    }
}

/// 256 bytes, so a block holds only 16 of them.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Fat(u32, [u8; 252]);

fn fat(n: u32) -> Fat {
    Fat(n, [n as u8; 252])
}

struct Counted<'a>(&'a Cell<usize>);

impl Drop for Counted<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Panics on clone once its fuse has burnt down.
struct Bomb<'a> {
    fuse: &'a Cell<usize>,
    drops: &'a Cell<usize>,
}

impl Clone for Bomb<'_> {
    fn clone(&self) -> Self {
        if self.fuse.get() == 0 {
            panic!("bomb went off");
        }
        self.fuse.set(self.fuse.get() - 1);
        Bomb { fuse: self.fuse, drops: self.drops }
    }
}

impl Drop for Bomb<'_> {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

fn check<T, A: Allocator>(d: &Deque<T, A>) {
    let cap = Deque::<T, A>::BLOCK_CAPACITY;
    if d.map.is_empty() {
        assert_eq!(d.len, 0);
        assert_eq!(d.start, 0);
    } else {
        assert!(d.start < cap, "start {} outside the first block", d.start);
        assert!(d.start + d.len <= d.map.len() * cap);
        assert_eq!(d.map.len(), blocks_for::<T>(d.start, d.len).max(1));
        assert!(d.map.capacity() >= d.map.len());
    }
    assert_eq!(d.iter().count(), d.len());
    assert_eq!(d.iter().rev().count(), d.len());
    assert_eq!(d.blocks().map(<[T]>::len).sum::<usize>(), d.len());
}

fn assert_same<T: PartialEq + Debug, A: Allocator>(d: &Deque<T, A>, v: &VecDeque<T>) {
    assert_eq!(d.len(), v.len());
    assert!(d.iter().eq(v.iter()), "{d:?} != {v:?}");
}

#[test]
fn block_capacity_by_element_size() {
    assert_eq!(Deque::<u8>::BLOCK_CAPACITY, 4096);
    assert_eq!(Deque::<u64>::BLOCK_CAPACITY, 512);
    assert_eq!(Deque::<Fat>::BLOCK_CAPACITY, 16);
    assert_eq!(Deque::<[u8; 1000]>::BLOCK_CAPACITY, 16);
    assert_eq!(Deque::<()>::BLOCK_CAPACITY, 4096);
}

#[test]
fn new_does_not_allocate() {
    let alloc = TestAlloc::new(0);
    let d = Deque::<u32, _>::new_in(alloc.clone());
    assert_eq!(d.len(), 0);
    assert_eq!(d.capacity(), 0);
    assert_eq!(d.map_capacity(), 0);
    assert_eq!(d.front(), None);
    assert_eq!(d.back(), None);
    assert_eq!(alloc.stats.allocs.get(), 0);
    check(&d);
}

#[test]
fn fifo_1000() {
    let mut d = Deque::new();
    for i in 1..=1000 {
        d.push_back(i);
    }
    check(&d);
    for i in 1..=1000 {
        assert_eq!(d.pop_front(), Some(i));
    }
    assert_eq!(d.pop_front(), None);
    check(&d);
}

#[test]
fn lifo_both_ends() {
    let mut d = Deque::new();
    for i in 0..100 {
        d.push_front(fat(i));
    }
    check(&d);
    for i in (0..100).rev() {
        assert_eq!(d.pop_front(), Some(fat(i)));
        check(&d);
    }

    for i in 0..100 {
        d.push_back(fat(i));
    }
    for i in (0..100).rev() {
        assert_eq!(d.pop_back(), Some(fat(i)));
        check(&d);
    }
    assert!(d.is_empty());
}

#[test]
fn insert_into_run_of_a() {
    let mut d: Deque<char> = Deque::from_elem('a', 10);
    d.insert(5, 'x');
    assert_eq!(d.iter().collect::<String>(), "aaaaaxaaaaa");
    assert_eq!(d.len(), 11);
}

#[test]
fn insert_remove_round_trip() {
    let base: Vec<u32> = (0..80).collect();
    for idx in 0..=base.len() {
        let mut d: Deque<Fat> = base.iter().map(|&n| fat(n)).collect();
        d.insert(idx, fat(999));
        check(&d);
        assert_eq!(d[idx], fat(999));
        assert_eq!(d.remove(idx), Some(fat(999)));
        check(&d);
        assert!(d.iter().map(|f| f.0).eq(base.iter().copied()));
    }
}

#[test]
fn insert_into_empty() {
    let mut d = Deque::new();
    d.insert(0, 1);
    d.insert(1, 3);
    d.insert(1, 2);
    d.insert(0, 0);
    assert_eq!(d, [0, 1, 2, 3]);
    assert_eq!(d.try_insert(5, 9), Err(Error::OutOfRange { index: 5, len: 4 }));
    assert_eq!(d, [0, 1, 2, 3]);
    check(&d);
}

#[test]
fn clear_twice() {
    let alloc = TestAlloc::new(0);
    let mut d: Deque<Fat, TestAlloc> = Deque::new_in(alloc.clone());
    d.extend((0..50).map(fat));
    d.clear();
    check(&d);
    assert_eq!(d.block_count(), 1);
    assert_eq!(d.front_spare(), 0);
    assert_eq!(d.back_spare(), 16);
    d.clear();
    check(&d);
    assert!(d.is_empty());
    assert_eq!(d.block_count(), 1);

    d.shrink_to_fit();
    assert_eq!(d.block_count(), 0);
    assert_eq!(d.map_capacity(), 0);
    assert_eq!(alloc.stats.live(), 0);
    check(&d);
}

#[test]
fn index_order_matches_iteration() {
    let d: Deque<u64> = (0..3000).collect();
    assert_eq!(d.len(), d.iter().count());
    for (i, x) in d.iter().enumerate() {
        assert_eq!(&d[i], x);
        assert_eq!(d.get(i), Some(x));
    }
    assert_eq!(d.get(3000), None);
    assert_eq!(d.at(3000), Err(Error::OutOfRange { index: 3000, len: 3000 }));
    assert_eq!(d.at(2999), Ok(&2999));
}

#[test]
#[should_panic(expected = "out of range")]
fn index_past_end_panics() {
    let d: Deque<i32> = (0..3).collect();
    let _ = d[3];
}

#[test]
fn back_address_survives_push_front() {
    let mut d = Deque::new();
    d.push_back(fat(7));
    let back = d.back().map(|f| f as *const Fat);
    // enough to grow the map several times
    for i in 0..2000 {
        d.push_front(fat(i));
    }
    assert_eq!(d.back().map(|f| f as *const Fat), back);
    assert_eq!(d.back(), Some(&fat(7)));
    check(&d);
}

#[test]
fn pushing_past_a_block_allocates_once() {
    let alloc = TestAlloc::new(0);
    let mut d = Deque::new_in(alloc.clone());
    let cap = Deque::<u64, TestAlloc>::BLOCK_CAPACITY;
    for i in 0..cap as u64 {
        d.push_back(i);
    }
    // the map and the first block
    assert_eq!(alloc.stats.allocs.get(), 2);
    let map_cap = d.map_capacity();
    let addrs: Vec<*const u64> = d.iter().map(|x| x as *const u64).collect();

    d.push_back(cap as u64);
    assert_eq!(alloc.stats.allocs.get(), 3);
    assert_eq!(d.map_capacity(), map_cap);
    assert_eq!(d.block_count(), 2);
    assert!(d.iter().map(|x| x as *const u64).take(cap).eq(addrs.into_iter()));
    check(&d);

    drop(d);
    assert_eq!(alloc.stats.live(), 0);
}

#[test]
fn failed_block_allocation_leaves_deque_unchanged() {
    let alloc = TestAlloc::new(0);
    let mut d: Deque<Fat, TestAlloc> = Deque::new_in(alloc.clone());
    d.extend((0..16).map(fat));
    assert_eq!(d.back_spare(), 0);

    alloc.stats.fail_after.set(Some(0));
    assert!(matches!(d.try_push_back(fat(16)), Err(Error::AllocError { .. })));
    assert!(matches!(d.try_push_front(fat(16)), Err(Error::AllocError { .. })));
    assert!(matches!(d.try_insert(3, fat(16)), Err(Error::AllocError { .. })));
    assert!(d.iter().map(|f| f.0).eq(0..16));
    check(&d);

    alloc.stats.fail_after.set(None);
    d.push_back(fat(16));
    assert_eq!(d.len(), 17);
}

#[test]
fn failed_map_growth_returns_the_block() {
    let alloc = TestAlloc::new(0);
    let mut d: Deque<Fat, TestAlloc> = Deque::new_in(alloc.clone());
    // five blocks fill the back half of the initial map
    for i in 0..80 {
        d.push_back(fat(i));
    }
    assert_eq!(d.block_count(), 5);
    let live = alloc.stats.live();

    // the block succeeds, the map reallocation does not
    alloc.stats.fail_after.set(Some(1));
    assert!(matches!(d.try_push_back(fat(80)), Err(Error::AllocError { .. })));
    assert_eq!(alloc.stats.live(), live);
    assert_eq!(d.block_count(), 5);
    assert_eq!(d.len(), 80);
    check(&d);

    alloc.stats.fail_after.set(None);
    d.push_back(fat(80));
    assert!(d.iter().map(|f| f.0).eq(0..81));
}

#[test]
fn failed_front_map_growth_returns_the_block() {
    let alloc = TestAlloc::new(0);
    let mut d: Deque<Fat, TestAlloc> = Deque::new_in(alloc.clone());
    // four blocks fill the front half of the initial map
    for i in 0..64 {
        d.push_front(fat(i));
    }
    assert_eq!(d.block_count(), 4);
    assert_eq!(d.front_spare(), 0);
    assert_eq!(d.map_capacity(), 8);
    let live = alloc.stats.live();

    alloc.stats.fail_after.set(Some(1));
    assert!(matches!(d.try_push_front(fat(64)), Err(Error::AllocError { .. })));
    assert_eq!(alloc.stats.live(), live);
    assert_eq!(d.block_count(), 4);
    assert_eq!(d.map_capacity(), 8);
    assert!(d.iter().map(|f| f.0).eq((0..64).rev()));
    check(&d);

    alloc.stats.fail_after.set(None);
    d.push_front(fat(64));
    assert!(d.iter().map(|f| f.0).eq((0..65).rev()));
    check(&d);
}

#[test]
fn block_boundary_push_pop_reallocates_each_time() {
    let alloc = TestAlloc::new(0);
    let mut d: Deque<Fat, TestAlloc> = Deque::new_in(alloc.clone());
    for i in 0..16 {
        d.push_back(fat(i));
    }
    let allocs = alloc.stats.allocs.get();

    for i in 0..1000 {
        d.push_back(fat(i));
        assert_eq!(d.block_count(), 2);
        assert_eq!(d.pop_back(), Some(fat(i)));
        assert_eq!(d.block_count(), 1);
    }
    assert_eq!(alloc.stats.allocs.get(), allocs + 1000);
    check(&d);
}

#[test]
fn resize_rolls_back_on_panic() {
    let drops = Cell::new(0);
    let mut d = Deque::new();
    d.push_back(Counted(&drops));
    let mut made = 0;

    let res = catch_unwind(AssertUnwindSafe(|| {
        d.resize_with(2000, || {
            if made == 600 {
                panic!("generator failed");
            }
            made += 1;
            Counted(&drops)
        })
    }));
    assert!(res.is_err());
    assert_eq!(d.len(), 1);
    assert_eq!(drops.get(), 600);
    assert_eq!(d.block_count(), 1);
    check(&d);

    drop(d);
    assert_eq!(drops.get(), 601);
}

#[test]
fn panicking_clone_drops_partial_copy() {
    let fuse = Cell::new(usize::MAX);
    let drops = Cell::new(0);
    let d: Deque<Bomb> = (0..10).map(|_| Bomb { fuse: &fuse, drops: &drops }).collect();
    assert_eq!(drops.get(), 0);

    fuse.set(4);
    let res = catch_unwind(AssertUnwindSafe(|| d.clone()));
    assert!(res.is_err());
    assert_eq!(drops.get(), 4);

    drop(d);
    assert_eq!(drops.get(), 14);
}

#[test]
fn truncate_and_drop_run_destructors() {
    let drops = Cell::new(0);
    let mut d = Deque::new();
    for _ in 0..1500 {
        d.push_front(Counted(&drops));
    }
    d.truncate(1000);
    assert_eq!(drops.get(), 500);
    check(&d);
    drop(d.pop_back());
    drop(d.pop_front());
    assert_eq!(drops.get(), 502);
    drop(d);
    assert_eq!(drops.get(), 1500);
}

#[test]
fn swap_with_unequal_allocators_moves_elements() {
    let (a1, a2) = (TestAlloc::new(1), TestAlloc::new(2));
    let mut x = Deque::from_iter_in([1, 2, 3], a1.clone());
    let mut y = Deque::from_iter_in([4, 5], a2.clone());

    x.swap_with(&mut y);
    assert_eq!(x, [4, 5]);
    assert_eq!(y, [1, 2, 3]);
    assert_eq!(x.allocator().id, 1);
    assert_eq!(y.allocator().id, 2);
    check(&x);
    check(&y);

    drop((x, y));
    assert_eq!(a1.stats.live(), 0);
    assert_eq!(a2.stats.live(), 0);
}

#[test]
fn swap_with_equal_allocators_swaps_storage() {
    let alloc = TestAlloc::new(1);
    let mut x = Deque::from_iter_in((0..100).map(fat), alloc.clone());
    let mut y = Deque::from_iter_in([fat(1000)], alloc.clone());
    let front = x.front().map(|f| f as *const Fat);
    let allocs = alloc.stats.allocs.get();

    x.swap_with(&mut y);
    assert_eq!(y.front().map(|f| f as *const Fat), front);
    assert_eq!(x, [fat(1000)]);
    assert_eq!(y.len(), 100);
    assert_eq!(alloc.stats.allocs.get(), allocs);
}

#[test]
fn swap_with_propagating_allocator() {
    let mut x: Deque<i32> = (0..10).collect();
    let mut y: Deque<i32> = (10..15).collect();
    x.swap_with(&mut y);
    assert_eq!(x, [10, 11, 12, 13, 14]);
    assert!(y.iter().copied().eq(0..10));
}

#[test]
fn take_from_moves_or_steals() {
    let (a1, a2) = (TestAlloc::new(1), TestAlloc::new(2));

    let mut x = Deque::from_iter_in(0..10, a1.clone());
    let mut y = Deque::from_iter_in(100..200, a1.clone());
    let front = y.front().map(|v| v as *const i32);
    x.take_from(&mut y);
    assert!(x.iter().copied().eq(100..200));
    assert_eq!(x.front().map(|v| v as *const i32), front);
    assert!(y.is_empty());
    check(&x);
    check(&y);

    let mut z = Deque::from_iter_in(0..5, a2.clone());
    z.take_from(&mut x);
    assert!(z.iter().copied().eq(100..200));
    assert_eq!(z.allocator().id, 2);
    assert!(x.is_empty());
    check(&z);

    drop((x, y, z));
    assert_eq!(a1.stats.live(), 0);
    assert_eq!(a2.stats.live(), 0);
}

#[test]
fn move_in_keeps_storage_for_equal_allocators() {
    let d = Deque::from_iter_in(0..100, TestAlloc::new(1));
    let front = d.front().map(|v| v as *const i32);
    let d = d.move_in(TestAlloc::new(1));
    assert_eq!(d.front().map(|v| v as *const i32), front);

    let other = TestAlloc::new(2);
    let d = d.move_in(other.clone());
    assert!(d.iter().copied().eq(0..100));
    assert!(other.stats.allocs.get() > 0);
    assert_eq!(d.allocator().id, 2);
}

#[test]
fn clone_in_sizes_the_map() {
    let src: Deque<Fat> = (0..100).map(fat).collect();
    let alloc = TestAlloc::new(3);
    let copy = src.clone_in(alloc.clone());
    assert_eq!(copy, src);
    assert_eq!(copy.block_count(), 7);
    assert_eq!(copy.map_capacity(), 8);
    // map plus seven blocks
    assert_eq!(alloc.stats.allocs.get(), 8);
    check(&copy);
}

#[test]
fn clone_from_propagates_allocator() {
    let (a1, a2) = (CopyAlloc(TestAlloc::new(1)), CopyAlloc(TestAlloc::new(2)));
    let src = Deque::from_iter_in((0..100).map(fat), a1.clone());
    let mut dst = Deque::from_iter_in((0..10).map(fat), a2.clone());

    dst.clone_from(&src);
    assert_eq!(dst.allocator().0.id, 1);
    assert_eq!(a2.0.stats.live(), 0);
    assert_eq!(dst, src);
    check(&dst);

    drop((src, dst));
    assert_eq!(a1.0.stats.live(), 0);
    assert_eq!(a2.0.stats.live(), 0);
}

#[test]
fn clone_from_keeps_non_propagating_allocator() {
    let (a1, a2) = (TestAlloc::new(1), TestAlloc::new(2));
    let src = Deque::from_iter_in(0..100, a1.clone());
    let mut dst = Deque::from_iter_in(0..10, a2.clone());
    let front = dst.front().map(|v| v as *const i32);

    dst.clone_from(&src);
    assert_eq!(dst.allocator().id, 2);
    assert_eq!(dst.front().map(|v| v as *const i32), front);
    assert!(dst.iter().copied().eq(0..100));
    check(&dst);

    drop((src, dst));
    assert_eq!(a1.stats.live(), 0);
    assert_eq!(a2.stats.live(), 0);
}

#[test]
fn assign_reuses_elements() {
    let mut d: Deque<u32> = (0..1000).collect();
    d.assign(0..10);
    assert!(d.iter().copied().eq(0..10));
    check(&d);
    d.assign(0..2000);
    assert!(d.iter().copied().eq(0..2000));
    d.assign_elem(3, 7);
    assert_eq!(d, [7, 7, 7]);

    let mut e = Deque::new();
    e.clone_from(&d);
    assert_eq!(e, d);
    check(&e);
}

#[test]
fn insert_iter_both_paths() {
    let mut d: Deque<u32> = (0..10).collect();
    d.insert_iter(2, [100, 101, 102]);
    assert_eq!(d, [0, 1, 100, 101, 102, 2, 3, 4, 5, 6, 7, 8, 9]);
    check(&d);

    d.insert_iter(11, [200, 201]);
    assert_eq!(d, [0, 1, 100, 101, 102, 2, 3, 4, 5, 6, 7, 200, 201, 8, 9]);
    check(&d);

    let mut e: Deque<Fat> = (0..40).map(fat).collect();
    e.insert_iter(5, (1000..1100).map(fat));
    let expected: Vec<u32> = (0..5).chain(1000..1100).chain(5..40).collect();
    assert!(e.iter().map(|f| f.0).eq(expected.iter().copied()));
    check(&e);

    let mut empty = Deque::new();
    empty.insert_iter(0, 0..3);
    assert_eq!(empty, [0, 1, 2]);
}

#[test]
fn insert_iter_restores_on_panic() {
    for idx in [1, 30] {
        let mut d: Deque<Fat> = (0..40).map(fat).collect();
        let res = catch_unwind(AssertUnwindSafe(|| {
            d.insert_iter(idx, (0..50).map(|i| if i == 20 { panic!("iterator failed") } else { fat(i) }))
        }));
        assert!(res.is_err());
        assert!(d.iter().map(|f| f.0).eq(0..40));
        check(&d);
    }
}

#[test]
fn drain_middle_and_ends() {
    let mut d: Deque<Fat> = (0..200).map(fat).collect();
    let drained: Vec<u32> = d.drain(50..120).map(|f| f.0).collect();
    assert!(drained.iter().copied().eq(50..120));
    assert!(d.iter().map(|f| f.0).eq((0..50).chain(120..200)));
    check(&d);

    let mut it = d.drain(100..);
    assert_eq!(it.next_back().map(|f| f.0), Some(199));
    assert_eq!(it.next().map(|f| f.0), Some(170));
    assert_eq!(it.len(), 28);
    drop(it);
    assert!(d.iter().map(|f| f.0).eq((0..50).chain(120..170)));
    check(&d);

    drop(d.drain(..10));
    assert!(d.iter().map(|f| f.0).eq((10..50).chain(120..170)));
    check(&d);

    d.drain(..);
    assert!(d.is_empty());
    check(&d);
}

#[test]
fn drain_drops_unyielded_elements() {
    let drops = Cell::new(0);
    let mut d: Deque<Counted> = (0..1000).map(|_| Counted(&drops)).collect();
    let mut it = d.drain(300..900);
    drop(it.next());
    drop(it);
    assert_eq!(drops.get(), 600);
    assert_eq!(d.len(), 400);
    check(&d);
}

#[test]
fn iterators_cross_blocks() {
    let d: Deque<Fat> = (0..100).map(fat).collect();
    assert_eq!(d.iter().nth(37).map(|f| f.0), Some(37));
    assert_eq!(d.iter().rev().nth(37).map(|f| f.0), Some(62));
    assert_eq!(d.iter().last().map(|f| f.0), Some(99));
    assert_eq!(d.range(10..90).len(), 80);
    assert!(d.range(10..90).map(|f| f.0).eq(10..90));
    assert!(d.range(10..90).rev().map(|f| f.0).eq((10..90).rev()));

    let mut it = d.iter();
    assert!(it.advance_by(33).is_ok());
    assert!(it.advance_back_by(33).is_ok());
    assert_eq!(it.len(), 34);
    assert_eq!(it.next().map(|f| f.0), Some(33));
    assert_eq!(it.next_back().map(|f| f.0), Some(66));
    assert!(it.advance_by(100).is_err());
    assert_eq!(it.next(), None);

    let sum = d.iter().fold(0, |acc, f| acc + f.0);
    assert_eq!(sum, (0..100).sum());

    let lens: Vec<usize> = d.blocks().map(<[Fat]>::len).collect();
    assert_eq!(lens, [16, 16, 16, 16, 16, 16, 4]);
}

#[test]
fn iter_mut_and_range_mut() {
    let mut d: Deque<u64> = (0..2000).collect();
    d.iter_mut().for_each(|x| *x *= 2);
    for x in d.range_mut(1000..) {
        *x += 1;
    }
    assert!(d.iter().take(1000).copied().eq((0..1000).map(|x| x * 2)));
    assert!(d.iter().skip(1000).copied().eq((1000..2000).map(|x| x * 2 + 1)));
    *d.front_mut().unwrap() = 5;
    *d.back_mut().unwrap() = 6;
    assert_eq!(d[0], 5);
    assert_eq!(d[1999], 6);
}

#[test]
fn zero_sized_elements() {
    let mut d = Deque::new();
    for _ in 0..10_000 {
        d.push_back(());
    }
    assert_eq!(d.len(), 10_000);
    assert_eq!(d.block_count(), 3);
    assert_eq!(d.iter().count(), 10_000);
    d.insert(5000, ());
    assert_eq!(d.remove(0), Some(()));
    drop(d.drain(10..9000));
    assert_eq!(d.len(), 1010);
    check(&d);
}

#[test]
fn rotate_and_swap_remove() {
    let mut d: Deque<u32> = (0..100).collect();
    d.rotate_left(30);
    assert!(d.iter().copied().eq((30..100).chain(0..30)));
    d.rotate_right(30);
    assert!(d.iter().copied().eq(0..100));

    assert_eq!(d.swap_remove_back(10), Some(10));
    assert_eq!(d[10], 99);
    assert_eq!(d.swap_remove_front(20), Some(20));
    assert_eq!(d[19], 0);
    assert_eq!(d.swap_remove_back(500), None);
    check(&d);
}

#[test]
fn retain_split_append() {
    let mut d: Deque<u32> = (0..1000).collect();
    d.retain(|x| x % 3 == 0);
    assert!(d.iter().copied().eq((0..1000).filter(|x| x % 3 == 0)));
    check(&d);

    let mut tail = d.split_off(100);
    assert_eq!(d.len(), 100);
    assert_eq!(tail.front(), Some(&300));
    check(&d);
    check(&tail);

    d.append(&mut tail);
    assert!(tail.is_empty());
    assert!(d.iter().copied().eq((0..1000).filter(|x| x % 3 == 0)));
}

#[test]
fn searching() {
    let d: Deque<u64> = (0..3000).map(|x| x * 2).collect();
    assert_eq!(d.binary_search(&1000), Ok(500));
    assert_eq!(d.binary_search(&1001), Err(501));
    assert_eq!(d.binary_search_by_key(&40, |x| x / 2), Ok(40));
    assert_eq!(d.partition_point(|&x| x < 2500), 1250);
    assert!(d.contains(&5998));
    assert!(!d.contains(&5999));
}

#[test]
fn comparisons_and_formatting() {
    let a: Deque<i32> = (0..5).collect();
    let b = Deque::from([0, 1, 2, 3, 4]);
    let c = Deque::from(vec![0, 1, 2, 3, 5]);
    assert_eq!(a, b);
    assert!(a < c);
    assert_eq!(format!("{a:?}"), "[0, 1, 2, 3, 4]");
    assert_eq!(Vec::from(c), [0, 1, 2, 3, 5]);
    assert_eq!(Deque::<u8>::with_len(3), [0, 0, 0]);
}

#[test]
fn byte_io() {
    let data: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
    let mut d: Deque<u8> = Deque::new();
    d.write_all(&data).unwrap();
    assert_eq!(d.len(), 10_000);
    check(&d);

    let mut buf = [0; 100];
    assert_eq!(d.read(&mut buf).unwrap(), 100);
    assert_eq!(&buf[..], &data[..100]);
    check(&d);

    let mut rest = Vec::new();
    assert_eq!(d.read_to_end(&mut rest).unwrap(), 9_900);
    assert_eq!(rest, &data[100..]);
    assert!(d.is_empty());
}

#[test]
fn random_ops_match_vecdeque() {
    let rng = fastrand::Rng::with_seed(0x5eed);
    let alloc = TestAlloc::new(0);
    let mut d: Deque<Fat, TestAlloc> = Deque::new_in(alloc.clone());
    let mut v: VecDeque<Fat> = VecDeque::new();

    for step in 0..20_000u32 {
        let len = v.len();
        match rng.u8(..16) {
            0..=2 => {
                d.push_back(fat(step));
                v.push_back(fat(step));
            }
            3..=5 => {
                d.push_front(fat(step));
                v.push_front(fat(step));
            }
            6 => assert_eq!(d.pop_back(), v.pop_back()),
            7 => assert_eq!(d.pop_front(), v.pop_front()),
            8 => {
                let i = rng.usize(..=len);
                d.insert(i, fat(step));
                v.insert(i, fat(step));
            }
            9 if len > 0 => {
                let i = rng.usize(..len);
                assert_eq!(d.remove(i), v.remove(i));
            }
            10 if len > 0 => {
                let (i, j) = (rng.usize(..len), rng.usize(..len));
                let (lo, hi) = (i.min(j), i.max(j));
                assert!(d.drain(lo..hi).eq(v.drain(lo..hi)));
            }
            11 => {
                let i = rng.usize(..=len);
                let n = rng.usize(..40) as u32;
                d.insert_iter(i, (0..n).map(fat));
                for (k, x) in (0..n).map(fat).enumerate() {
                    v.insert(i + k, x);
                }
            }
            12 if len > 0 => {
                let (i, j) = (rng.usize(..len), rng.usize(..len));
                d.swap(i, j);
                v.swap(i, j);
            }
            13 => {
                let n = rng.usize(..len + 20);
                d.resize(n, fat(step));
                v.resize(n, fat(step));
            }
            14 => {
                if rng.u8(..20) == 0 {
                    d.clear();
                    v.clear();
                }
                if rng.bool() {
                    d.shrink_to_fit();
                }
            }
            _ => {
                if len > 0 {
                    let i = rng.usize(..len);
                    assert_eq!(d.get(i), v.get(i));
                }
                assert_eq!(d.front(), v.front());
                assert_eq!(d.back(), v.back());
            }
        }
        check(&d);
        assert_same(&d, &v);
    }

    drop(d);
    assert_eq!(alloc.stats.live(), 0);
}
