use crate::{
    EnqueueError,
    circular::RingSlots,
    trace::trace,
    traits::{Queue, QueueConsumer, QueueProducer},
};
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::fmt;

/// Fixed-capacity FIFO that overwrites its oldest item when full.
///
/// Shares the sentinel-slot ring of [`CircularQueue`](crate::CircularQueue)
/// but never rejects an item: enqueuing into a full ring evicts the head
/// first. Useful when only the most recent items matter, such as the tail of
/// a log.
///
/// # Examples
///
/// ```
/// use cask::RingBuffer;
///
/// let ring = RingBuffer::new(3);
/// assert_eq!(ring.enqueue('a'), None);
/// assert_eq!(ring.enqueue('b'), None);
/// assert_eq!(ring.enqueue('c'), None);
///
/// // Full: 'a' makes room for 'd'.
/// assert_eq!(ring.enqueue('d'), Some('a'));
/// assert_eq!(ring.dequeue(), Some('b'));
/// ```
pub struct RingBuffer<T> {
    state: CachePadded<Mutex<RingSlots<T>>>,
}

impl<T> RingBuffer<T> {
    /// Create an empty ring holding at most `capacity` items.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: CachePadded::new(Mutex::new(RingSlots::new(capacity))),
        }
    }

    /// Add an item at the tail, evicting the oldest item if the ring is full.
    ///
    /// # Returns
    /// The evicted item, if any
    pub fn enqueue(&self, item: T) -> Option<T> {
        let mut state = self.state.lock();
        let evicted = state.push_overwrite(item);
        if evicted.is_some() {
            trace!(capacity = state.capacity(), "ring full, evicted oldest item");
        }
        evicted
    }

    /// Remove and return the head element.
    pub fn dequeue(&self) -> Option<T> {
        self.state.lock().pop()
    }

    /// Remove the head element only if `predicate` accepts it.
    pub fn dequeue_if<F>(&self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        self.state.lock().pop_if(predicate)
    }

    /// Clone the head element without removing it.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.state.lock().peek().cloned()
    }

    /// Run `f` on the head element without removing it.
    pub fn peek_with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.state.lock().peek().map(f)
    }

    /// Check whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    /// Whether the next [`enqueue`](Self::enqueue) will evict.
    pub fn is_full(&self) -> bool {
        self.state.lock().is_full()
    }

    /// Number of items in the ring.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Maximum number of items the ring holds.
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity()
    }

    /// Discard every item and re-anchor the ring at slot 0.
    pub fn reset(&self) {
        self.state.lock().reset();
    }

    /// Change the capacity, keeping the items in order.
    ///
    /// Same rules as [`CircularQueue::resize`](crate::CircularQueue::resize).
    pub fn resize(&self, capacity: usize) -> usize {
        self.state.lock().resize(capacity)
    }

    /// Remove every item, returning them oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().drain()
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RingBuffer")
            .field("capacity", &state.capacity())
            .field("len", &state.len())
            .finish_non_exhaustive()
    }
}

impl<T> QueueProducer<T> for RingBuffer<T> {
    /// Never fails; an evicted item is dropped.
    fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        drop(RingBuffer::enqueue(self, item));
        Ok(())
    }
}

impl<T> QueueConsumer<T> for RingBuffer<T> {
    fn dequeue(&self) -> Option<T> {
        RingBuffer::dequeue(self)
    }

    fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        RingBuffer::peek(self)
    }

    fn dequeue_if<F>(&self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        RingBuffer::dequeue_if(self, predicate)
    }

    fn is_empty(&self) -> bool {
        RingBuffer::is_empty(self)
    }

    fn len(&self) -> usize {
        RingBuffer::len(self)
    }
}

impl<T> Queue<T> for RingBuffer<T> {
    fn is_full(&self) -> bool {
        RingBuffer::is_full(self)
    }

    fn capacity(&self) -> usize {
        RingBuffer::capacity(self)
    }

    fn reset(&self) {
        RingBuffer::reset(self);
    }

    fn resize(&self, capacity: usize) -> usize {
        RingBuffer::resize(self, capacity)
    }
}
