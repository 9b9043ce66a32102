//! Lock-free SPSC block queue for captured waveforms
//!
//! A fixed number of fixed-size sample blocks, allocated once and reused
//! cyclically. The producer side runs inside the real-time audio callback
//! and must never block, allocate, or spin; when the queue is full a push
//! is simply dropped, and when it is empty a pop is a no-op. Occasional
//! dropped blocks are imperceptible on a visualization feed, while a
//! blocked audio thread is not an option.
//!
//! ## Index protocol
//!
//! Two monotonically increasing block counters: the producer owns
//! `write_pos`, the consumer owns `read_pos`, occupancy is
//! `write_pos - read_pos` (wrapping). Each side publishes its counter with
//! Release after finishing its copy and observes the other side's counter
//! with Acquire, so a claimed slot's samples are always fully visible to
//! whichever side the slot is handed to. The in-flight slot ranges of the
//! two sides are disjoint by this arithmetic, which is what makes the
//! unsynchronized sample storage sound.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{SCOPE_BLOCK_SIZE, SCOPE_QUEUE_BLOCKS};

/// Fixed-capacity FIFO of sample blocks shared between one producer and
/// one consumer
///
/// # Concurrency contract
///
/// Exactly one thread may call [`push_block`](Self::push_block) and exactly
/// one thread may call [`pop_block`](Self::pop_block) for the lifetime of
/// the queue. Concurrent calls from the two sides are safe; two concurrent
/// producers or two concurrent consumers are not, and nothing inside the
/// queue detects that misuse. This is an API contract, not an internal
/// lock.
pub struct ScopeBlockQueue {
    /// Flat sample storage, `num_blocks * block_size` cells
    storage: Box<[UnsafeCell<f32>]>,
    /// Samples per block
    block_size: usize,
    /// Number of block slots
    num_blocks: usize,
    /// Blocks ever pushed; owned by the producer, Release on publish
    write_pos: AtomicUsize,
    /// Blocks ever popped; owned by the consumer, Release on release
    read_pos: AtomicUsize,
}

// Sample cells are only ever touched by the side that currently owns the
// containing slot under the index protocol above.
unsafe impl Send for ScopeBlockQueue {}
unsafe impl Sync for ScopeBlockQueue {}

impl ScopeBlockQueue {
    /// Create a queue of `num_blocks` slots of `block_size` samples each
    ///
    /// All sample memory is allocated here, zero-filled, and never
    /// reallocated afterwards.
    ///
    /// # Panics
    /// Panics if `num_blocks` or `block_size` is zero. Queue geometry is a
    /// construction-time decision, not a runtime condition.
    pub fn new(num_blocks: usize, block_size: usize) -> Self {
        assert!(num_blocks > 0, "queue needs at least one block");
        assert!(block_size > 0, "blocks need at least one sample");

        let storage = (0..num_blocks * block_size)
            .map(|_| UnsafeCell::new(0.0))
            .collect();

        Self {
            storage,
            block_size,
            num_blocks,
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
        }
    }

    /// Create a queue with the library's scope defaults (5 blocks x 512)
    pub fn with_defaults() -> Self {
        Self::new(SCOPE_QUEUE_BLOCKS, SCOPE_BLOCK_SIZE)
    }

    /// Samples per block
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of block slots
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Number of filled blocks pending consumption
    ///
    /// Advisory only: under concurrent use the value may be stale by the
    /// time the caller acts on it.
    pub fn len(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Whether no filled blocks are pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push one block from the producer side
    ///
    /// Claims one writable slot if any is free, copies
    /// `min(block_size, samples.len())` samples into it, and publishes it
    /// as filled. When the queue is full the push is dropped and `false`
    /// is returned; nothing blocks and nothing is overwritten. Samples
    /// beyond `samples.len()` in the slot keep whatever the previous cycle
    /// left there (silence on a fresh queue).
    ///
    /// Producer thread only. O(block_size), never allocates.
    pub fn push_block(&self, samples: &[f32]) -> bool {
        debug_assert!(samples.len() <= self.block_size);

        let write = self.write_pos.load(Ordering::Relaxed);
        let read = self.read_pos.load(Ordering::Acquire);
        if write.wrapping_sub(read) >= self.num_blocks {
            // Full: drop-on-full policy, the next capture gets its chance.
            return false;
        }

        let base = (write % self.num_blocks) * self.block_size;
        let count = samples.len().min(self.block_size);
        for (i, &sample) in samples.iter().take(count).enumerate() {
            // Safety: the slot at `write` is unpublished, so only this
            // producer can touch its cells right now.
            unsafe {
                *self.storage[base + i].get() = sample;
            }
        }

        self.write_pos.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Pop one block from the consumer side
    ///
    /// Claims the oldest filled slot if any, copies the full block into
    /// `destination`, and releases the slot back to the producer. When the
    /// queue is empty nothing is claimed, `destination` is left untouched,
    /// and `false` is returned.
    ///
    /// Consumer thread only. `destination` must hold at least
    /// `block_size` samples.
    pub fn pop_block(&self, destination: &mut [f32]) -> bool {
        debug_assert!(destination.len() >= self.block_size);

        let read = self.read_pos.load(Ordering::Relaxed);
        let write = self.write_pos.load(Ordering::Acquire);
        if write.wrapping_sub(read) == 0 {
            return false;
        }

        let base = (read % self.num_blocks) * self.block_size;
        let count = self.block_size.min(destination.len());
        for (i, out) in destination.iter_mut().take(count).enumerate() {
            // Safety: the slot at `read` is published and unreleased, so
            // only this consumer can touch its cells right now.
            *out = unsafe { *self.storage[base + i].get() };
        }

        self.read_pos.store(read.wrapping_add(1), Ordering::Release);
        true
    }
}
