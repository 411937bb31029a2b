//! Traversal queue
//!
//! A fixed-capacity ring buffer of `Window`s. Capacity is a power of two so
//! indices wrap with a mask. The buffer is filled once at setup and only
//! overwritten afterwards, so pushing and popping never allocate.

use crate::rasterizer::{intersect, Segment};
use crate::world::SectorId;

/// A sector seen through a screen-column range.
///
/// `top` and `bottom` hold the inherited silhouette at the two range ends
/// (`[at x1, at x2]`); between them the bound is a straight line. Screen Y
/// grows downward, so `top` is the smaller value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Window {
    pub sector: SectorId,
    pub x1: i32,
    pub x2: i32,
    pub top: [f32; 2],
    pub bottom: [f32; 2],
}

impl Window {
    /// Inherited top bound at column `x`
    pub fn top_at(&self, x: i32) -> f32 {
        silhouette_at(self.x1, self.x2, self.top, x)
    }

    /// Inherited bottom bound at column `x`
    pub fn bottom_at(&self, x: i32) -> f32 {
        silhouette_at(self.x1, self.x2, self.bottom, x)
    }
}

/// Intersect the vertical line at `x` with the bound line through
/// `(x1, ys[0])` and `(x2, ys[1])`. A single-column window has a vertical
/// bound line, which never intersects; its left value is used instead.
fn silhouette_at(x1: i32, x2: i32, ys: [f32; 2], x: i32) -> f32 {
    let probe = Segment::from_coords(x as f32, 0.0, x as f32, 1.0);
    let bound = Segment::from_coords(x1 as f32, ys[0], x2 as f32, ys[1]);
    intersect(probe, bound).map(|p| p.y).unwrap_or(ys[0])
}

/// Fixed-capacity FIFO with mask-based wraparound.
///
/// One slot is kept free to tell full from empty, so a queue built with
/// capacity `n` holds at most `n - 1` items.
#[derive(Debug, Clone)]
pub struct RingQueue<T> {
    slots: Vec<T>,
    head: usize,
    tail: usize,
    mask: usize,
}

impl<T: Copy + Default> RingQueue<T> {
    /// `capacity` is rounded up to a power of two (minimum 2)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        Self {
            slots: vec![T::default(); capacity],
            head: 0,
            tail: 0,
            mask: capacity - 1,
        }
    }

    /// Append to the tail. Returns false (and drops `item`) when full.
    pub fn push(&mut self, item: T) -> bool {
        let next = (self.tail + 1) & self.mask;
        if next == self.head {
            return false;
        }
        self.slots[self.tail] = item;
        self.tail = next;
        true
    }

    /// Take from the head
    pub fn pop(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        let item = self.slots[self.head];
        self.head = (self.head + 1) & self.mask;
        Some(item)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    pub fn len(&self) -> usize {
        self.tail.wrapping_sub(self.head) & self.mask
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Maximum number of queued items
    pub fn capacity(&self) -> usize {
        self.mask
    }
}
