//! Bounded lock-free MPMC ring buffer.
//!
//! Vyukov sequence-number scheme: each cell carries a sequence counter
//! encoding its state relative to the shared head and tail. A producer
//! may write the cell at `tail` when `seq == tail`; a consumer may read
//! the cell at `head` when `seq == head + 1`. Claiming is a CAS on the
//! shared counter, publication is a release store on the cell sequence.
//!
//! Capacity is a power of two so the index mask replaces a modulo. This
//! is the one module in the workspace that uses `unsafe`; every block
//! carries its safety argument.

// Sequence arithmetic deliberately reinterprets u64 differences as i64
#![allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Error returned for a ring capacity that is not a non-zero power of two.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("ring capacity {0} is not a non-zero power of two")]
pub struct RingCapacityError(pub usize);

struct Cell<T> {
    sequence: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded multi-producer multi-consumer queue.
///
/// Both operations are non-blocking and lock-free: a stalled thread can
/// delay at most the single cell it has claimed, never the whole ring.
pub struct RingBuffer<T> {
    mask: u64,
    cells: Box<[Cell<T>]>,
    head: AtomicU64,
    tail: AtomicU64,
}

// SAFETY: a cell's value is only touched by the thread that won the
// corresponding head/tail CAS, and ownership hand-off is ordered by the
// acquire/release protocol on the cell sequence.
unsafe impl<T: Send> Send for RingBuffer<T> {}
// SAFETY: as above; shared access never aliases a cell value.
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Create a ring with `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Result<Self, RingCapacityError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(RingCapacityError(capacity));
        }
        let cells = (0..capacity)
            .map(|i| Cell {
                sequence: AtomicU64::new(i as u64),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        Ok(Self {
            mask: capacity as u64 - 1,
            cells,
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
        })
    }

    /// Number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.mask as usize + 1
    }

    /// Number of committed items; approximate under concurrent access.
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.saturating_sub(head) as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blocking enqueue. Hands the value back when the ring is full.
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut tail = self.tail.load(Ordering::Relaxed);
        loop {
            let cell = &self.cells[(tail & self.mask) as usize];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(tail) as i64;

            if diff == 0 {
                match self.tail.compare_exchange_weak(
                    tail,
                    tail.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: winning the CAS on `tail` grants this
                        // thread exclusive write access to the cell until
                        // the sequence store below publishes it.
                        unsafe {
                            (*cell.value.get()).write(value);
                        }
                        cell.sequence.store(tail.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => tail = current,
                }
            } else if diff < 0 {
                return Err(value);
            } else {
                tail = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Non-blocking dequeue.
    pub fn pop(&self) -> Option<T> {
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            let cell = &self.cells[(head & self.mask) as usize];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(head.wrapping_add(1)) as i64;

            if diff == 0 {
                match self.head.compare_exchange_weak(
                    head,
                    head.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: winning the CAS on `head` grants this
                        // thread exclusive read access, and the producer
                        // that published this sequence value initialized
                        // the slot.
                        let value = unsafe { (*cell.value.get()).assume_init_read() };
                        // Release the cell for the next lap.
                        cell.sequence
                            .store(head.wrapping_add(self.mask + 1), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => head = current,
                }
            } else if diff < 0 {
                return None;
            } else {
                head = self.head.load(Ordering::Relaxed);
            }
        }
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // Drain committed values so their destructors run.
        while self.pop().is_some() {}
    }
}
