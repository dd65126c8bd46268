use crate::{
    EnqueueError, QueueError,
    trace::{debug, trace},
    traits::{Queue, QueueConsumer, QueueProducer},
    wrap_next,
};
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::fmt;

/// Fixed ring of `capacity + 1` slots with wrapping head and tail indices.
///
/// One slot is always left unused so that `head == tail` means empty and
/// `head == tail + 1` (wrapped) means full, without keeping a count. Every
/// method assumes the caller holds the lock of the queue that owns the ring;
/// the type never leaves the crate.
pub(crate) struct RingSlots<T> {
    items: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    initial_capacity: usize,
}

impl<T> RingSlots<T> {
    /// Capacities below 1 are raised to 1; a zero-capacity ring would be
    /// empty and full at once.
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Self::blank(capacity + 1),
            head: 0,
            tail: 0,
            initial_capacity: capacity,
        }
    }

    fn blank(slots: usize) -> Box<[Option<T>]> {
        (0..slots).map(|_| None).collect()
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        wrap_next(index, self.items.len())
    }

    pub(crate) fn capacity(&self) -> usize {
        self.items.len() - 1
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub(crate) fn is_full(&self) -> bool {
        self.head == self.advance(self.tail)
    }

    pub(crate) fn len(&self) -> usize {
        if self.tail < self.head {
            self.tail + self.items.len() - self.head
        } else {
            self.tail - self.head
        }
    }

    /// Caller checks `is_full` first.
    fn write(&mut self, item: T) {
        self.items[self.tail] = Some(item);
        self.tail = self.advance(self.tail);
    }

    /// Append, handing the item back if there is no free slot.
    pub(crate) fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.write(item);
        Ok(())
    }

    /// Append, evicting and returning the oldest item if the ring is full.
    pub(crate) fn push_overwrite(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() { self.pop() } else { None };
        self.write(item);
        evicted
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.items[self.head].take();
        self.head = self.advance(self.head);
        item
    }

    pub(crate) fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.items[self.head].as_ref()
    }

    pub(crate) fn pop_if<F>(&mut self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        if predicate(self.peek()?) {
            self.pop()
        } else {
            None
        }
    }

    /// Re-anchor at slot 0 and clear every slot, not only the live ones.
    pub(crate) fn reset(&mut self) {
        trace!(discarded = self.len(), capacity = self.capacity(), "resetting ring");
        self.head = 0;
        self.tail = 0;
        self.items.iter_mut().for_each(|slot| *slot = None);
    }

    /// Move the live items, in order, into a fresh ring.
    ///
    /// `0` asks for the initial capacity. The result never drops below the
    /// number of live items.
    pub(crate) fn resize(&mut self, requested: usize) -> usize {
        let current = self.capacity();
        if requested == current || (requested == 0 && current == self.initial_capacity) {
            return current;
        }

        let live = self.len();
        let target = (if requested == 0 { self.initial_capacity } else { requested }).max(live);
        if target == current {
            return current;
        }

        debug!(from = current, to = target, requested, live, "resizing ring");
        let mut items = Self::blank(target + 1);
        for slot in items.iter_mut().take(live) {
            *slot = self.pop();
        }
        self.items = items;
        self.head = 0;
        self.tail = live;
        target
    }

    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len());
        while let Some(item) = self.pop() {
            items.push(item);
        }
        items
    }

    #[cfg(test)]
    pub(crate) const fn positions(&self) -> (usize, usize) {
        (self.head, self.tail)
    }
}

/// Fixed-capacity FIFO queue over a circular buffer.
///
/// Enqueuing into a full queue fails with [`QueueError::Full`] and hands the
/// item back; nothing is ever overwritten. For the evicting variant see
/// [`RingBuffer`](crate::RingBuffer).
///
/// # Examples
///
/// ```
/// use cask::CircularQueue;
///
/// let queue = CircularQueue::new(4);
/// for i in 0..4 {
///     queue.enqueue(i).unwrap();
/// }
/// assert!(queue.is_full());
///
/// assert_eq!(queue.dequeue(), Some(0));
/// assert!(!queue.is_full());
///
/// queue.enqueue(4).unwrap();
/// let err = queue.enqueue(5).unwrap_err();
/// assert!(err.to_string().starts_with("queue full"));
/// ```
pub struct CircularQueue<T> {
    state: CachePadded<Mutex<RingSlots<T>>>,
}

impl<T> CircularQueue<T> {
    /// Create an empty queue holding at most `capacity` items.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: CachePadded::new(Mutex::new(RingSlots::new(capacity))),
        }
    }

    /// Add an item at the tail.
    ///
    /// Fails with [`QueueError::Full`] when every slot is taken; the queue is
    /// left untouched and the item is returned inside the error.
    pub fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        let mut state = self.state.lock();
        state.push(item).map_err(|item| {
            EnqueueError::new(item, QueueError::Full {
                capacity: state.capacity(),
            })
        })
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

    /// Check whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    /// Check whether every slot is taken.
    pub fn is_full(&self) -> bool {
        self.state.lock().is_full()
    }

    /// Number of items in the queue, always within `0..=capacity`.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity()
    }

    /// Discard every item and re-anchor the ring at slot 0.
    pub fn reset(&self) {
        self.state.lock().reset();
    }

    /// Change the capacity, keeping the items in order.
    ///
    /// `0` restores the capacity the queue was created with. The capacity
    /// never drops below the current number of items.
    ///
    /// # Returns
    /// The capacity in effect afterwards
    pub fn resize(&self, capacity: usize) -> usize {
        self.state.lock().resize(capacity)
    }

    /// Remove every item, returning them in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().drain()
    }
}

impl<T> fmt::Debug for CircularQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CircularQueue")
            .field("capacity", &state.capacity())
            .field("len", &state.len())
            .finish_non_exhaustive()
    }
}

impl<T> QueueProducer<T> for CircularQueue<T> {
    fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        CircularQueue::enqueue(self, item)
    }
}

impl<T> QueueConsumer<T> for CircularQueue<T> {
    fn dequeue(&self) -> Option<T> {
        CircularQueue::dequeue(self)
    }

    fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        CircularQueue::peek(self)
    }

    fn dequeue_if<F>(&self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        CircularQueue::dequeue_if(self, predicate)
    }

    fn is_empty(&self) -> bool {
        CircularQueue::is_empty(self)
    }

    fn len(&self) -> usize {
        CircularQueue::len(self)
    }
}

impl<T> Queue<T> for CircularQueue<T> {
    fn is_full(&self) -> bool {
        CircularQueue::is_full(self)
    }

    fn capacity(&self) -> usize {
        CircularQueue::capacity(self)
    }

    fn reset(&self) {
        CircularQueue::reset(self);
    }

    fn resize(&self, capacity: usize) -> usize {
        CircularQueue::resize(self, capacity)
    }
}
