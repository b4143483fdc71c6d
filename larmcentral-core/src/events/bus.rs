//! Thread-safe intake bus for producer-to-engine event passing.
//!
//! A lock-free, single-producer single-consumer ring buffer using atomic
//! head/tail counters. Producers funnel through one pump task (preserving
//! per-source submission order); the engine is the only consumer, which
//! keeps event application serialized by construction.
//!
//! Key properties:
//! - Power-of-two capacity for cheap index masking
//! - Cache-line aligned counters to prevent false sharing
//! - Explicit backpressure via [`EventError::QueueFull`]
//! - Close signal so drain loops can terminate cleanly

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

use super::intake::DispatchEvent;

/// Intake bus error conditions.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Intake queue capacity exceeded")]
    QueueFull,
    #[error("Invalid capacity (must be a power of two)")]
    InvalidCapacity,
    #[error("Intake bus closed")]
    Closed,
}

/// Cache-line aligned atomic counter to prevent false sharing
#[repr(align(64))]
struct AlignedCounter(AtomicU64);

impl AlignedCounter {
    #[inline]
    fn new(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }
}

struct InnerBus {
    buffer: Box<[UnsafeCell<Option<DispatchEvent>>]>,
    head: AlignedCounter,
    tail: AlignedCounter,
    mask: usize,
    closed: AtomicBool,
}

/// Lock-free SPSC ring buffer carrying [`DispatchEvent`]s.
pub struct EventBus {
    inner: Arc<InnerBus>,
}

impl EventBus {
    /// Creates a new intake bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Must be a power of two for efficient modulo operations.
    pub fn with_capacity(capacity: usize) -> Result<Self, EventError> {
        if !capacity.is_power_of_two() {
            return Err(EventError::InvalidCapacity);
        }

        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(None))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            inner: Arc::new(InnerBus {
                buffer,
                head: AlignedCounter::new(0),
                tail: AlignedCounter::new(0),
                mask: capacity - 1,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Creates a new handle to the shared bus.
    #[inline]
    pub fn share(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Attempts to enqueue an event.
    ///
    /// # Safety
    ///
    /// Uses unsafe code for interior mutability guarded by atomic counters;
    /// correctness requires a single submitting task.
    #[inline]
    pub fn send(&self, event: DispatchEvent) -> Result<(), EventError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(EventError::Closed);
        }

        let head = self.inner.head.0.load(Ordering::Relaxed);
        let tail = self.inner.tail.0.load(Ordering::Acquire);

        if head - tail >= self.inner.buffer.len() as u64 {
            return Err(EventError::QueueFull);
        }

        // SAFETY: Exclusive write access ensured by atomic counters
        unsafe {
            let idx = (head as usize) & self.inner.mask;
            *self.inner.buffer[idx].get() = Some(event)
        }

        self.inner.head.0.store(head + 1, Ordering::Release);
        Ok(())
    }

    /// Enqueue an event, yielding until a slot frees up.
    #[inline]
    pub fn send_blocking(&self, event: DispatchEvent) -> Result<(), EventError> {
        loop {
            match self.send(event.clone()) {
                Ok(()) => return Ok(()),
                Err(EventError::QueueFull) => {
                    std::thread::yield_now();
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Attempts to dequeue the oldest event; `None` if the queue is empty.
    #[inline]
    pub fn recv(&self) -> Option<DispatchEvent> {
        let tail = self.inner.tail.0.load(Ordering::Relaxed);
        let head = self.inner.head.0.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        // SAFETY: Exclusive read access ensured by atomic counters
        let event = unsafe {
            let idx = (tail as usize) & self.inner.mask;
            (*self.inner.buffer[idx].get()).take()
        };

        self.inner.tail.0.store(tail + 1, Ordering::Release);
        event
    }

    /// Signals that no further events will be submitted. Queued events
    /// remain retrievable.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    /// Whether the bus is closed *and* fully drained.
    pub fn is_exhausted(&self) -> bool {
        let head = self.inner.head.0.load(Ordering::Acquire);
        let tail = self.inner.tail.0.load(Ordering::Acquire);
        self.inner.closed.load(Ordering::Acquire) && head == tail
    }

    /// Number of events currently queued.
    pub fn len(&self) -> usize {
        let head = self.inner.head.0.load(Ordering::Acquire);
        let tail = self.inner.tail.0.load(Ordering::Acquire);
        (head - tail) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// SAFETY: Thread safety ensured by atomic counters and Arc
unsafe impl Send for InnerBus {}
unsafe impl Sync for InnerBus {}
