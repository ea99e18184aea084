#![no_main]
use std::{collections::VecDeque, mem};

use arbitrary::Arbitrary;
use blockdeque::Deque;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Append,
    Assign(Vec<i32>),
    Back,
    BinarySearch(i32),
    Blocks,
    Clear,
    Contains(i32),
    Drain(usize, usize, Vec<DrainOp>),
    Equals,
    Front,
    Get(usize),
    Insert(usize, i32),
    InsertIter(usize, Vec<i32>),
    Iter(Vec<IterOp>),
    PopBack,
    PopFront,
    PushBack(i32),
    PushFront(i32),
    Range(usize, usize),
    Remove(usize),
    Resize(u16, i32),
    Retain(i32),
    RotateLeft(usize),
    RotateRight(usize),
    ShrinkToFit,
    SplitOff(usize),
    Swap(usize, usize),
    SwapRemoveBack(usize),
    SwapRemoveFront(usize),
    SwapWith,
    Truncate(usize),
}

const MAX_LEN: usize = 1000000;

#[derive(Arbitrary, Debug)]
enum DrainOp {
    Next,
    NextBack,
    Drop,
}

#[derive(Arbitrary, Debug)]
enum IterOp {
    Next,
    NextBack,
    Nth(u16),
    NthBack(u16),
}

fuzz_target!(|data: Vec<Op>| { fuzz(&data) });

/// Maps `(a, b)` onto a sorted range inside `0..len`. `len` must be nonzero.
fn sorted_range(a: usize, b: usize, len: usize) -> (usize, usize) {
    let (mut lo, mut hi) = (a % len, b % len);
    if lo > hi {
        mem::swap(&mut lo, &mut hi);
    }
    (lo, hi)
}

fn fuzz(data: &[Op]) {
    let (mut d1, mut d2) = (Deque::<i32>::new(), Deque::<i32>::new());
    let (mut v1, mut v2) = (VecDeque::<i32>::new(), VecDeque::<i32>::new());

    for op in data {
        match op {
            Op::Append => {
                d1.append(&mut d2);
                v1.append(&mut v2);
            }
            Op::SplitOff(i) => {
                if !v1.is_empty() {
                    let i = i % v1.len();
                    d2 = d1.split_off(i);
                    v2 = v1.split_off(i);
                }
            }
            Op::SwapWith => {
                d1.swap_with(&mut d2);
                mem::swap(&mut v1, &mut v2);
            }
            op => {
                apply(op, &mut d1, &mut v1);
                apply(op, &mut d2, &mut v2);
            }
        }
        assert!(d1.iter().eq(v1.iter()));
        assert!(d2.iter().eq(v2.iter()));
    }
}

fn apply(op: &Op, d: &mut Deque<i32>, v: &mut VecDeque<i32>) {
    match op {
        Op::Append | Op::SplitOff(_) | Op::SwapWith => unreachable!(),
        Op::Assign(items) => {
            d.assign(items.iter().copied());
            v.clear();
            v.extend(items.iter().copied());
        }
        Op::Back => assert_eq!(d.back(), v.back()),
        Op::BinarySearch(x) => {
            let mut sorted: Vec<i32> = v.iter().copied().collect();
            sorted.sort();
            d.assign(sorted.iter().copied());
            v.clear();
            v.extend(sorted.iter().copied());
            assert_eq!(d.binary_search(x).is_ok(), v.binary_search(x).is_ok());
            assert_eq!(d.partition_point(|y| y < x), v.partition_point(|y| y < x));
        }
        Op::Blocks => {
            assert!(d.blocks().flatten().eq(v.iter()));
        }
        Op::Clear => {
            d.clear();
            v.clear();
        }
        Op::Contains(x) => assert_eq!(d.contains(x), v.contains(x)),
        Op::Drain(min, max, ops) => {
            if v.is_empty() {
                return;
            }
            let (lo, hi) = sorted_range(*min, *max, v.len());
            let mut d_drain = d.drain(lo..hi);
            let mut v_drain = v.drain(lo..hi);

            for op in ops {
                match op {
                    DrainOp::Next => assert_eq!(d_drain.next(), v_drain.next()),
                    DrainOp::NextBack => assert_eq!(d_drain.next_back(), v_drain.next_back()),
                    DrainOp::Drop => break,
                }
            }
        }
        Op::Equals => assert!(d.iter().eq(v.iter())),
        Op::Front => assert_eq!(d.front(), v.front()),
        &Op::Get(i) => {
            assert_eq!(d.get(i), v.get(i));
            assert_eq!(d.at(i).ok(), v.get(i));
            if !v.is_empty() {
                let i = i % v.len();
                assert_eq!(d.get(i), v.get(i));
                assert_eq!(d[i], v[i]);
            }
        }
        &Op::Insert(i, x) => {
            if v.len() < MAX_LEN {
                let i = i % (v.len() + 1);
                d.insert(i, x);
                v.insert(i, x);
            }
        }
        Op::InsertIter(i, items) => {
            if v.len() < MAX_LEN {
                let i = i % (v.len() + 1);
                d.insert_iter(i, items.iter().copied());
                for (k, &x) in items.iter().enumerate() {
                    v.insert(i + k, x);
                }
            }
        }
        Op::Iter(ops) => {
            let mut d_iter = d.iter();
            let mut v_iter = v.iter();
            for op in ops {
                match *op {
                    IterOp::Next => assert_eq!(d_iter.next(), v_iter.next()),
                    IterOp::NextBack => assert_eq!(d_iter.next_back(), v_iter.next_back()),
                    IterOp::Nth(n) => assert_eq!(d_iter.nth(n.into()), v_iter.nth(n.into())),
                    IterOp::NthBack(n) => {
                        assert_eq!(d_iter.nth_back(n.into()), v_iter.nth_back(n.into()))
                    }
                }
                assert_eq!(d_iter.len(), v_iter.len());
            }
        }
        Op::PopBack => assert_eq!(d.pop_back(), v.pop_back()),
        Op::PopFront => assert_eq!(d.pop_front(), v.pop_front()),
        &Op::PushBack(x) => {
            if v.len() < MAX_LEN {
                d.push_back(x);
                v.push_back(x);
            }
        }
        &Op::PushFront(x) => {
            if v.len() < MAX_LEN {
                d.push_front(x);
                v.push_front(x);
            }
        }
        &Op::Range(min, max) => {
            if !v.is_empty() {
                let (lo, hi) = sorted_range(min, max, v.len());
                assert!(d.range(lo..hi).eq(v.range(lo..hi)));
                assert!(d.range(lo..hi).rev().eq(v.range(lo..hi).rev()));
            }
        }
        &Op::Remove(i) => {
            assert_eq!(d.remove(i), v.remove(i));
            if !v.is_empty() {
                let i = i % v.len();
                assert_eq!(d.remove(i), v.remove(i));
            }
        }
        &Op::Resize(n, x) => {
            d.resize(n.into(), x);
            v.resize(n.into(), x);
        }
        Op::Retain(max) => {
            d.retain(|x| x <= max);
            v.retain(|x| x <= max);
        }
        &Op::RotateLeft(i) => {
            if !v.is_empty() {
                let i = i % v.len();
                d.rotate_left(i);
                v.rotate_left(i);
            }
        }
        &Op::RotateRight(i) => {
            if !v.is_empty() {
                let i = i % v.len();
                d.rotate_right(i);
                v.rotate_right(i);
            }
        }
        Op::ShrinkToFit => {
            d.shrink_to_fit();
            v.shrink_to_fit();
        }
        &Op::Swap(i, j) => {
            if !v.is_empty() {
                let (i, j) = (i % v.len(), j % v.len());
                d.swap(i, j);
                v.swap(i, j);
            }
        }
        &Op::SwapRemoveBack(i) => {
            assert_eq!(d.swap_remove_back(i), v.swap_remove_back(i));
            if !v.is_empty() {
                let i = i % v.len();
                assert_eq!(d.swap_remove_back(i), v.swap_remove_back(i));
            }
        }
        &Op::SwapRemoveFront(i) => {
            assert_eq!(d.swap_remove_front(i), v.swap_remove_front(i));
            if !v.is_empty() {
                let i = i % v.len();
                assert_eq!(d.swap_remove_front(i), v.swap_remove_front(i));
            }
        }
        &Op::Truncate(i) => {
            d.truncate(i);
            v.truncate(i);
        }
    }
}
