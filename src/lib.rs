//! # Cask: Mutex-Guarded FIFO Queues
//!
//! Cask provides a small family of concurrency-safe FIFO queues built over a
//! plain backing sequence and a single lock per instance. Two engines do the
//! work:
//!
//! - a **growable** engine that compacts consumed slots in place before it
//!   reallocates, and
//! - a **circular** engine with a reserved sentinel slot, so full and empty are
//!   told apart by index comparison alone.
//!
//! ## Queue Types
//!
//! | Type                | Engine    | When full                                  |
//! |---------------------|-----------|--------------------------------------------|
//! | [`DynamicQueue`]    | growable  | compacts, otherwise grows (never fails)    |
//! | [`BoundedQueue`]    | growable  | compacts, grows up to a maximum, rejects   |
//! | [`CircularQueue`]   | circular  | rejects with [`QueueError::Full`]          |
//! | [`RingBuffer`]      | circular  | evicts the oldest element                  |
//!
//! ### 1. Dynamic Queue
//!
//! ```rust
//! use cask::DynamicQueue;
//!
//! let queue = DynamicQueue::new(2);
//! for i in 0..5 {
//!     queue.enqueue(i);
//! }
//!
//! assert_eq!(queue.capacity(), 8);
//! assert_eq!(queue.dequeue(), Some(0));
//! ```
//!
//! ### 2. Circular Queue
//!
//! ```rust
//! use cask::{CircularQueue, QueueError};
//!
//! let queue = CircularQueue::new(2);
//! queue.enqueue("a").unwrap();
//! queue.enqueue("b").unwrap();
//!
//! let rejected = queue.enqueue("c").unwrap_err();
//! assert_eq!(rejected.kind(), &QueueError::Full { capacity: 2 });
//! assert_eq!(rejected.into_inner(), "c");
//! ```
//!
//! ### 3. Ring Buffer
//!
//! ```rust
//! use cask::RingBuffer;
//!
//! let ring = RingBuffer::new(3);
//! for line in ["a", "b", "c"] {
//!     ring.enqueue(line);
//! }
//!
//! assert_eq!(ring.enqueue("d"), Some("a"));
//! assert_eq!(ring.drain(), vec!["b", "c", "d"]);
//! ```
//!
//! ## Choosing a Shape at Runtime
//!
//! Every queue implements the capability traits in [`traits`], and
//! [`AnyQueue`] wraps whichever shape the builder was asked for:
//!
//! ```rust
//! use cask::{
//!     QueueShape, queue,
//!     traits::{QueueConsumer, QueueProducer},
//! };
//!
//! # fn main() -> Result<(), cask::QueueError> {
//! let (producer, consumer) = queue::<u64>()
//!     .capacity(16)
//!     .max_capacity(64)
//!     .shape(QueueShape::Bounded)
//!     .channels()?;
//!
//! producer.enqueue(7).unwrap();
//! assert_eq!(consumer.dequeue(), Some(7));
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! Each queue owns one [`parking_lot::Mutex`]; every operation, reads included,
//! takes it for the duration of the call. Queues are `Send + Sync` whenever the
//! element type is `Send`, so they can be shared through an [`Arc`] or through
//! the producer/consumer handles in [`handle`].
//!
//! ## Logging
//!
//! Growth, compaction, resize and eviction events are emitted through
//! `tracing` when the `tracing` feature is enabled. Call [`init_tracing`] to
//! install a subscriber for quick debugging.
//!
//! [`Arc`]: std::sync::Arc
#![deny(
    missing_docs,
    unused_imports,
    unused_variables,
    dead_code,
    unreachable_code,
    unused_must_use
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Fixed-capacity circular queue that rejects items when full.
///
/// Also home to the sentinel-slot ring storage shared with [`ring`].
pub mod circular;

/// Growable queues that compact consumed slots before reallocating.
///
/// This module provides the unbounded [`DynamicQueue`] and the capped
/// [`BoundedQueue`].
///
/// [`DynamicQueue`]: dynamic::DynamicQueue
/// [`BoundedQueue`]: dynamic::BoundedQueue
pub mod dynamic;

/// Cloneable producer and consumer handles over an `Arc`-shared queue.
pub mod handle;

/// Overwrite-on-full ring buffer.
pub mod ring;

/// Runtime shape selection: [`QueueShape`], [`AnyQueue`] and the builder.
///
/// [`QueueShape`]: shape::QueueShape
/// [`AnyQueue`]: shape::AnyQueue
pub mod shape;

/// Common traits for queue producers, consumers, and factories.
///
/// This module defines the capability interface shared by every queue shape:
/// [`QueueProducer`], [`QueueConsumer`], [`Queue`] and [`QueueFactory`].
///
/// [`QueueProducer`]: traits::QueueProducer
/// [`QueueConsumer`]: traits::QueueConsumer
/// [`Queue`]: traits::Queue
/// [`QueueFactory`]: traits::QueueFactory
pub mod traits;

mod trace;

pub use circular::CircularQueue;
pub use dynamic::{BoundedQueue, DynamicQueue};
pub use ring::RingBuffer;
pub use shape::{AnyQueue, QueueBuilder, QueueShape, queue};
pub use trace::init_tracing;

use std::fmt;
use thiserror::Error;

/// Default percentage of a growable queue's capacity that must already have
/// been dequeued before a full queue compacts instead of reallocating.
pub const DEFAULT_SHIFT_PERCENT: u32 = 50;

/// Capacities below this double on growth; at or above it they grow by 25%.
const GROWTH_THRESHOLD: usize = 1024;

/// Errors that can occur during queue operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    /// A circular queue has no free slot left.
    ///
    /// Only [`CircularQueue`] reports this; a [`RingBuffer`] evicts instead.
    #[error("queue full: capacity of {capacity} reached")]
    Full {
        /// The usable capacity of the queue that rejected the item.
        capacity: usize,
    },

    /// A bounded queue is at its maximum capacity and has no consumed prefix
    /// left to compact.
    #[error("bounded queue full: cannot grow beyond max capacity of {max_capacity}")]
    CapacityExceeded {
        /// The configured ceiling of the queue.
        max_capacity: usize,
    },

    /// The requested capacity configuration is not usable.
    #[error("invalid capacity: {reason}")]
    InvalidCapacity {
        /// What was wrong with the configuration.
        reason: &'static str,
    },
}

/// An item that could not be enqueued, along with the reason.
///
/// The queue hands ownership of the rejected item back to the caller rather
/// than dropping it.
///
/// # Examples
///
/// ```
/// use cask::{BoundedQueue, QueueError};
///
/// # fn main() -> Result<(), QueueError> {
/// let queue = BoundedQueue::new(1, 1)?;
/// queue.enqueue(String::from("kept")).unwrap();
///
/// let err = queue.enqueue(String::from("rejected")).unwrap_err();
/// assert_eq!(err.to_string(), "bounded queue full: cannot grow beyond max capacity of 1");
/// assert_eq!(err.into_inner(), "rejected");
/// # Ok(())
/// # }
/// ```
#[derive(Error, PartialEq, Eq)]
#[error("{kind}")]
pub struct EnqueueError<T> {
    item: T,
    kind: QueueError,
}

impl<T> EnqueueError<T> {
    pub(crate) const fn new(item: T, kind: QueueError) -> Self {
        Self { item, kind }
    }

    /// Why the item was rejected.
    pub const fn kind(&self) -> &QueueError {
        &self.kind
    }

    /// Borrow the rejected item.
    pub const fn item(&self) -> &T {
        &self.item
    }

    /// Take the rejected item back.
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnqueueError")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Next capacity for a growable queue that ran out of room.
///
/// Small queues double so the cost per insertion stays constant; large ones
/// grow by a quarter to bound the memory overshoot.
pub(crate) const fn grown_capacity(capacity: usize) -> usize {
    if capacity == 0 {
        1
    } else if capacity < GROWTH_THRESHOLD {
        capacity << 1
    } else {
        capacity + capacity / 4
    }
}

/// Advance a ring index by one slot, wrapping at `slots`.
#[inline]
pub(crate) const fn wrap_next(index: usize, slots: usize) -> usize {
    if index + 1 == slots { 0 } else { index + 1 }
}
