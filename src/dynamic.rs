use crate::{
    DEFAULT_SHIFT_PERCENT, EnqueueError, QueueError, grown_capacity,
    trace::{debug, trace},
    traits::{Queue, QueueConsumer, QueueProducer},
};
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::fmt;

/// How a growable queue reacts once its backing storage is full and
/// compaction did not free a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Growth {
    /// Reallocate with the amortized growth rule.
    Unbounded,
    /// Reallocate up to `max_capacity`, then compact whatever was consumed,
    /// then reject.
    Bounded { max_capacity: usize },
}

/// Backing storage and indices of a growable queue.
///
/// Only ever reached through the owning queue's mutex, so none of these
/// methods lock anything themselves.
///
/// `items[..head]` holds slots that were already dequeued (always `None`),
/// `items[head..]` holds the live window. `items.len()` never exceeds
/// `capacity`, so pushing never makes the `Vec` reallocate behind our back.
struct Slots<T> {
    items: Vec<Option<T>>,
    head: usize,
    capacity: usize,
    initial_capacity: usize,
    shift_percent: u32,
    growth: Growth,
}

impl<T> Slots<T> {
    fn new(capacity: usize, shift_percent: u32, growth: Growth) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            head: 0,
            capacity,
            initial_capacity: capacity,
            shift_percent: shift_percent.min(100),
            growth,
        }
    }

    fn len(&self) -> usize {
        self.items.len() - self.head
    }

    fn is_empty(&self) -> bool {
        self.head == self.items.len()
    }

    fn is_full(&self) -> bool {
        match self.growth {
            Growth::Unbounded => false,
            Growth::Bounded { max_capacity } => {
                self.capacity >= max_capacity
                    && self.head == 0
                    && self.items.len() == self.capacity
            },
        }
    }

    /// Move the live window to the front if at least `threshold` slots have
    /// been consumed. Never reallocates.
    fn shift(&mut self, threshold: usize) -> bool {
        if self.head == 0 || self.head < threshold {
            return false;
        }
        trace!(
            consumed = self.head,
            live = self.len(),
            capacity = self.capacity,
            "compacting live window"
        );
        self.items.drain(..self.head);
        self.head = 0;
        true
    }

    fn shift_threshold(&self) -> usize {
        self.capacity * self.shift_percent as usize / 100
    }

    /// Copy the live window into fresh storage of `capacity` slots.
    fn reallocate(&mut self, capacity: usize) {
        let mut items = Vec::with_capacity(capacity);
        items.extend(self.items.drain(self.head..));
        self.items = items;
        self.head = 0;
        self.capacity = capacity;
    }

    /// Guarantee a free slot at the tail, or report why there is none.
    ///
    /// State is only touched on the paths that succeed.
    fn make_room(&mut self) -> Result<(), QueueError> {
        if self.items.len() < self.capacity || self.shift(self.shift_threshold()) {
            return Ok(());
        }

        match self.growth {
            Growth::Unbounded => {
                let next = grown_capacity(self.capacity);
                debug!(from = self.capacity, to = next, "growing queue");
                self.reallocate(next);
                Ok(())
            },
            Growth::Bounded { max_capacity } if self.capacity < max_capacity => {
                let next = grown_capacity(self.capacity).min(max_capacity);
                debug!(from = self.capacity, to = next, max_capacity, "growing bounded queue");
                self.reallocate(next);
                Ok(())
            },
            Growth::Bounded { max_capacity } => {
                if self.shift(1) {
                    Ok(())
                } else {
                    Err(QueueError::CapacityExceeded { max_capacity })
                }
            },
        }
    }

    fn push(&mut self, item: T) -> Result<(), EnqueueError<T>> {
        if let Err(kind) = self.make_room() {
            return Err(EnqueueError::new(item, kind));
        }
        self.items.push(Some(item));
        Ok(())
    }

    fn pop(&mut self) -> Option<T> {
        let item = self.items.get_mut(self.head).and_then(Option::take)?;
        self.head += 1;
        if self.head == self.items.len() {
            // Emptied: reclaim the consumed prefix for free.
            self.items.clear();
            self.head = 0;
        }
        Some(item)
    }

    fn peek(&self) -> Option<&T> {
        self.items.get(self.head).and_then(Option::as_ref)
    }

    fn pop_if<F>(&mut self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        if predicate(self.peek()?) {
            self.pop()
        } else {
            None
        }
    }

    fn reset(&mut self) {
        trace!(discarded = self.len(), capacity = self.capacity, "resetting queue");
        self.items.clear();
        self.head = 0;
    }

    fn resize(&mut self, target: usize) -> usize {
        let live = self.len();
        let mut capacity = self.initial_capacity.max(live + live / 4).max(target);
        if let Growth::Bounded { max_capacity } = self.growth {
            capacity = capacity.min(max_capacity);
        }
        debug!(from = self.capacity, to = capacity, requested = target, live, "resizing queue");
        self.reallocate(capacity);
        capacity
    }

    fn drain(&mut self) -> Vec<T> {
        let items = self.items.drain(self.head..).flatten().collect();
        self.items.clear();
        self.head = 0;
        items
    }
}

/// Unbounded growable FIFO queue.
///
/// Items live in a contiguous backing sequence with a head index that only
/// moves forward. When the sequence is full the queue first tries to
/// compact, moving the live window over the already-dequeued prefix, and only
/// reallocates if less than `shift_percent` of the capacity has been
/// consumed. Growth doubles small queues and adds 25% to queues of 1024 slots
/// or more. The queue never shrinks on its own; see [`resize`](Self::resize).
///
/// Under steady enqueue/dequeue churn the consumed prefix keeps crossing the
/// shift threshold, so the queue settles at a fixed capacity and stops
/// allocating.
///
/// # Examples
///
/// ```
/// use cask::DynamicQueue;
///
/// let queue = DynamicQueue::with_shift_percent(10, 50);
/// for i in 0..10 {
///     queue.enqueue(i);
/// }
/// for _ in 0..6 {
///     queue.dequeue();
/// }
///
/// // Six of ten slots are consumed, past the 50% threshold: compact, don't grow.
/// queue.enqueue(10);
/// queue.enqueue(11);
/// assert_eq!(queue.capacity(), 10);
/// assert_eq!(queue.len(), 6);
/// ```
pub struct DynamicQueue<T> {
    state: CachePadded<Mutex<Slots<T>>>,
}

impl<T> DynamicQueue<T> {
    /// Create an empty queue with room for `capacity` items before it first
    /// has to compact or grow, using [`DEFAULT_SHIFT_PERCENT`].
    pub fn new(capacity: usize) -> Self {
        Self::with_shift_percent(capacity, DEFAULT_SHIFT_PERCENT)
    }

    /// Create an empty queue with an explicit shift percentage.
    ///
    /// Values above 100 are clamped to 100.
    pub fn with_shift_percent(capacity: usize, shift_percent: u32) -> Self {
        Self {
            state: CachePadded::new(Mutex::new(Slots::new(
                capacity,
                shift_percent,
                Growth::Unbounded,
            ))),
        }
    }

    /// Set the percentage of capacity that must be consumed before a full
    /// queue compacts instead of growing. Values above 100 are clamped to 100.
    ///
    /// `0` compacts whenever anything has been consumed; `100` only compacts
    /// once the whole capacity has been consumed.
    pub fn set_shift_percent(&self, percent: u32) {
        self.state.lock().shift_percent = percent.min(100);
    }

    /// Current shift percentage.
    pub fn shift_percent(&self) -> u32 {
        self.state.lock().shift_percent
    }

    /// Add an item at the tail, compacting or growing as needed.
    pub fn enqueue(&self, item: T) {
        let pushed = self.state.lock().push(item);
        // Unbounded growth always makes room.
        debug_assert!(pushed.is_ok(), "unbounded queue rejected an item");
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

    /// Always `false`: an unbounded queue can always make room.
    pub const fn is_full(&self) -> bool {
        false
    }

    /// Number of items in the queue.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Number of slots in the backing storage, consumed ones included.
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    /// Discard every item. The capacity is kept; use
    /// [`resize`](Self::resize) to shrink.
    pub fn reset(&self) {
        self.state.lock().reset();
    }

    /// Reallocate to the largest of the initial capacity, 1.25 times the
    /// current item count, and `capacity`. Items keep their order and move to
    /// the front of the new storage.
    ///
    /// Passing `0` shrinks the queue as far as the first two bounds allow.
    ///
    /// # Returns
    /// The new capacity
    pub fn resize(&self, capacity: usize) -> usize {
        self.state.lock().resize(capacity)
    }

    /// Remove every item, returning them in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().drain()
    }
}

impl<T> Default for DynamicQueue<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> fmt::Debug for DynamicQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DynamicQueue")
            .field("capacity", &state.capacity)
            .field("len", &state.len())
            .field("shift_percent", &state.shift_percent)
            .finish_non_exhaustive()
    }
}

impl<T> QueueProducer<T> for DynamicQueue<T> {
    fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        DynamicQueue::enqueue(self, item);
        Ok(())
    }
}

impl<T> QueueConsumer<T> for DynamicQueue<T> {
    fn dequeue(&self) -> Option<T> {
        DynamicQueue::dequeue(self)
    }

    fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        DynamicQueue::peek(self)
    }

    fn dequeue_if<F>(&self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        DynamicQueue::dequeue_if(self, predicate)
    }

    fn is_empty(&self) -> bool {
        DynamicQueue::is_empty(self)
    }

    fn len(&self) -> usize {
        DynamicQueue::len(self)
    }
}

impl<T> Queue<T> for DynamicQueue<T> {
    fn is_full(&self) -> bool {
        DynamicQueue::is_full(self)
    }

    fn capacity(&self) -> usize {
        DynamicQueue::capacity(self)
    }

    fn reset(&self) {
        DynamicQueue::reset(self);
    }

    fn resize(&self, capacity: usize) -> usize {
        DynamicQueue::resize(self, capacity)
    }
}

/// Growable FIFO queue with a hard ceiling.
///
/// Behaves like [`DynamicQueue`] until its capacity reaches `max_capacity`.
/// From then on a full queue compacts whenever any prefix has been consumed,
/// whatever the shift percentage, and otherwise rejects the item with
/// [`QueueError::CapacityExceeded`], handing it back to the caller.
///
/// # Examples
///
/// ```
/// use cask::{BoundedQueue, QueueError};
///
/// # fn main() -> Result<(), QueueError> {
/// let queue = BoundedQueue::new(2, 4)?;
/// for i in 0..4 {
///     queue.enqueue(i).unwrap();
/// }
/// assert!(queue.is_full());
///
/// let err = queue.enqueue(4).unwrap_err();
/// assert_eq!(err.kind(), &QueueError::CapacityExceeded { max_capacity: 4 });
///
/// // Consuming one item frees a slot that compaction can reuse.
/// assert_eq!(queue.dequeue(), Some(0));
/// queue.enqueue(err.into_inner()).unwrap();
/// assert_eq!(queue.capacity(), 4);
/// # Ok(())
/// # }
/// ```
pub struct BoundedQueue<T> {
    state: CachePadded<Mutex<Slots<T>>>,
    max_capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue that starts with `capacity` slots and never
    /// grows past `max_capacity`, using [`DEFAULT_SHIFT_PERCENT`].
    ///
    /// Fails when `max_capacity` is zero or smaller than `capacity`.
    pub fn new(capacity: usize, max_capacity: usize) -> Result<Self, QueueError> {
        Self::with_shift_percent(capacity, max_capacity, DEFAULT_SHIFT_PERCENT)
    }

    /// Create an empty bounded queue with an explicit shift percentage.
    pub fn with_shift_percent(
        capacity: usize,
        max_capacity: usize,
        shift_percent: u32,
    ) -> Result<Self, QueueError> {
        if max_capacity == 0 {
            return Err(QueueError::InvalidCapacity {
                reason: "max capacity must be at least 1",
            });
        }
        if capacity > max_capacity {
            return Err(QueueError::InvalidCapacity {
                reason: "initial capacity exceeds max capacity",
            });
        }
        Ok(Self {
            state: CachePadded::new(Mutex::new(Slots::new(
                capacity,
                shift_percent,
                Growth::Bounded { max_capacity },
            ))),
            max_capacity,
        })
    }

    /// Set the shift percentage used while the queue can still grow. Values
    /// above 100 are clamped to 100.
    pub fn set_shift_percent(&self, percent: u32) {
        self.state.lock().shift_percent = percent.min(100);
    }

    /// Current shift percentage.
    pub fn shift_percent(&self) -> u32 {
        self.state.lock().shift_percent
    }

    /// The ceiling the queue will not grow past.
    pub const fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Add an item at the tail, compacting or growing as allowed.
    ///
    /// Fails with [`QueueError::CapacityExceeded`] when the queue is at its
    /// ceiling with nothing consumed; the queue is left untouched.
    pub fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        self.state.lock().push(item)
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

    /// Whether the next [`enqueue`](Self::enqueue) would be rejected.
    pub fn is_full(&self) -> bool {
        self.state.lock().is_full()
    }

    /// Number of items in the queue.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Number of slots in the backing storage, consumed ones included.
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    /// Discard every item, keeping the capacity.
    pub fn reset(&self) {
        self.state.lock().reset();
    }

    /// Reallocate like [`DynamicQueue::resize`], clamped to the ceiling.
    ///
    /// # Returns
    /// The new capacity
    pub fn resize(&self, capacity: usize) -> usize {
        self.state.lock().resize(capacity)
    }

    /// Remove every item, returning them in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().drain()
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &state.capacity)
            .field("max_capacity", &self.max_capacity)
            .field("len", &state.len())
            .finish_non_exhaustive()
    }
}

impl<T> QueueProducer<T> for BoundedQueue<T> {
    fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        BoundedQueue::enqueue(self, item)
    }
}

impl<T> QueueConsumer<T> for BoundedQueue<T> {
    fn dequeue(&self) -> Option<T> {
        BoundedQueue::dequeue(self)
    }

    fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        BoundedQueue::peek(self)
    }

    fn dequeue_if<F>(&self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        BoundedQueue::dequeue_if(self, predicate)
    }

    fn is_empty(&self) -> bool {
        BoundedQueue::is_empty(self)
    }

    fn len(&self) -> usize {
        BoundedQueue::len(self)
    }
}

impl<T> Queue<T> for BoundedQueue<T> {
    fn is_full(&self) -> bool {
        BoundedQueue::is_full(self)
    }

    fn capacity(&self) -> usize {
        BoundedQueue::capacity(self)
    }

    fn reset(&self) {
        BoundedQueue::reset(self);
    }

    fn resize(&self, capacity: usize) -> usize {
        BoundedQueue::resize(self, capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::HashSet,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tokio::task;

    fn head_of<T>(queue: &DynamicQueue<T>) -> usize {
        queue.state.lock().head
    }

    #[test]
    fn grows_by_doubling() {
        let q = DynamicQueue::new(2);
        let mut seen = vec![q.capacity()];
        for i in 0..5 {
            q.enqueue(i);
            let cap = q.capacity();
            if seen.last() != Some(&cap) {
                seen.push(cap);
            }
        }
        assert_eq!(seen, vec![2, 4, 8]);
        assert_eq!(q.len(), 5);
        assert_eq!(q.capacity(), 8);
    }

    #[test]
    fn grows_by_quarter_past_threshold() {
        let q = DynamicQueue::new(1024);
        for i in 0..1025 {
            q.enqueue(i);
        }
        assert_eq!(q.capacity(), 1280);
    }

    #[test]
    fn zero_capacity_queue_grows() {
        let q = DynamicQueue::default();
        assert_eq!(q.capacity(), 0);
        q.enqueue('a');
        assert_eq!(q.capacity(), 1);
        q.enqueue('b');
        assert_eq!(q.capacity(), 2);
        assert_eq!(q.drain(), vec!['a', 'b']);
    }

    #[test]
    fn compacts_instead_of_growing() {
        let q = DynamicQueue::with_shift_percent(10, 50);
        for i in 0..10 {
            q.enqueue(i);
        }
        for i in 0..6 {
            assert_eq!(q.dequeue(), Some(i));
        }
        assert_eq!(head_of(&q), 6);

        q.enqueue(10);
        q.enqueue(11);

        assert_eq!(q.capacity(), 10);
        assert_eq!(head_of(&q), 0);
        assert_eq!(q.drain(), vec![6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn grows_when_below_shift_threshold() {
        let q = DynamicQueue::with_shift_percent(10, 50);
        for i in 0..10 {
            q.enqueue(i);
        }
        for _ in 0..4 {
            q.dequeue();
        }
        q.enqueue(10);
        assert_eq!(q.capacity(), 20);
        assert_eq!(head_of(&q), 0);
        assert_eq!(q.peek(), Some(4));
    }

    #[test]
    fn zero_shift_percent_compacts_on_any_consumption() {
        let q = DynamicQueue::with_shift_percent(4, 0);
        for i in 0..4 {
            q.enqueue(i);
        }
        q.dequeue();
        q.enqueue(4);
        assert_eq!(q.capacity(), 4);

        // Nothing consumed: there is nothing to compact, so it grows.
        q.enqueue(5);
        assert_eq!(q.capacity(), 8);
    }

    #[test]
    fn shift_percent_is_clamped() {
        let q: DynamicQueue<u8> = DynamicQueue::with_shift_percent(4, 250);
        assert_eq!(q.shift_percent(), 100);
        q.set_shift_percent(30);
        assert_eq!(q.shift_percent(), 30);
        q.set_shift_percent(101);
        assert_eq!(q.shift_percent(), 100);
    }

    #[test]
    fn full_shift_percent_needs_everything_consumed() {
        let q = DynamicQueue::with_shift_percent(4, 100);
        for i in 0..4 {
            q.enqueue(i);
        }
        for _ in 0..3 {
            q.dequeue();
        }
        q.enqueue(4);
        assert_eq!(q.capacity(), 8);
    }

    #[test]
    fn dequeue_to_empty_reclaims_prefix() {
        let q = DynamicQueue::new(4);
        q.enqueue(1);
        q.enqueue(2);
        q.dequeue();
        assert_eq!(head_of(&q), 1);
        q.dequeue();
        assert_eq!(head_of(&q), 0);
        assert_eq!(q.state.lock().items.len(), 0);
        assert!(q.is_empty());
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn peek_does_not_consume() {
        let q = DynamicQueue::new(2);
        assert_eq!(q.peek(), None);
        q.enqueue(String::from("head"));
        q.enqueue(String::from("next"));
        assert_eq!(q.peek().as_deref(), Some("head"));
        assert_eq!(q.peek_with(String::len), Some(4));
        assert_eq!(q.len(), 2);
        assert_eq!(q.dequeue().as_deref(), Some("head"));
    }

    #[test]
    fn dequeue_if_checks_head_only() {
        let q = DynamicQueue::new(4);
        q.enqueue(10);
        q.enqueue(20);
        assert_eq!(q.dequeue_if(|&v| v > 15), None);
        assert_eq!(q.dequeue_if(|&v| v > 5), Some(10));
        assert_eq!(q.dequeue_if(|&v| v > 15), Some(20));
        assert_eq!(q.dequeue_if(|_| true), None);
    }

    #[test]
    fn consume_stops_when_asked() {
        let q = DynamicQueue::new(8);
        for i in 0..5 {
            q.enqueue(i);
        }
        let mut consumed = Vec::new();
        let count = QueueConsumer::consume(&q, |v| {
            consumed.push(v);
            v == 2
        });
        assert_eq!(count, 3);
        assert_eq!(consumed, vec![0, 1, 2]);
        assert_eq!(q.drain(), vec![3, 4]);
    }

    #[test]
    fn reset_is_idempotent() {
        let q = DynamicQueue::new(3);
        for i in 0..7 {
            q.enqueue(i);
        }
        q.dequeue();
        let cap = q.capacity();

        q.reset();
        assert_eq!(q.len(), 0);
        assert_eq!(head_of(&q), 0);
        assert_eq!(q.capacity(), cap);

        q.reset();
        assert_eq!(q.len(), 0);
        assert_eq!(head_of(&q), 0);
        assert_eq!(q.capacity(), cap);
        assert!(q.is_empty());
    }

    #[test]
    fn resize_picks_largest_bound() {
        let q = DynamicQueue::new(4);
        for i in 0..20 {
            q.enqueue(i);
        }
        for _ in 0..4 {
            q.dequeue();
        }
        // 16 live: 16 + 16 / 4 = 20 beats the initial 4 and the requested 0.
        assert_eq!(q.resize(0), 20);
        assert_eq!(q.capacity(), 20);
        assert_eq!(head_of(&q), 0);

        assert_eq!(q.resize(64), 64);
        assert_eq!(q.capacity(), 64);

        q.reset();
        assert_eq!(q.resize(0), 4);
    }

    #[test]
    fn resize_preserves_order() {
        let q = DynamicQueue::new(4);
        for i in 0..9 {
            q.enqueue(i);
        }
        for _ in 0..3 {
            q.dequeue();
        }
        q.resize(2);
        assert_eq!(q.drain(), vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn bounded_validates_configuration() {
        assert_eq!(
            BoundedQueue::<u8>::new(4, 0).unwrap_err(),
            QueueError::InvalidCapacity {
                reason: "max capacity must be at least 1"
            }
        );
        assert!(matches!(
            BoundedQueue::<u8>::new(8, 4),
            Err(QueueError::InvalidCapacity { .. })
        ));
        assert!(BoundedQueue::<u8>::new(0, 4).is_ok());
    }

    #[test]
    fn bounded_grows_to_ceiling_then_rejects() {
        let q = BoundedQueue::new(2, 6).unwrap();
        for i in 0..6 {
            q.enqueue(i).unwrap();
        }
        // 2 -> 4 -> 6 (clamped from 8)
        assert_eq!(q.capacity(), 6);
        assert!(q.is_full());

        let err = q.enqueue(6).unwrap_err();
        assert_eq!(err.kind(), &QueueError::CapacityExceeded { max_capacity: 6 });
        assert_eq!(err.into_inner(), 6);
        assert_eq!(q.len(), 6);
        assert_eq!(q.peek(), Some(0));
    }

    #[test]
    fn bounded_compacts_at_ceiling_below_shift_threshold() {
        let q = BoundedQueue::with_shift_percent(10, 10, 90).unwrap();
        for i in 0..10 {
            q.enqueue(i).unwrap();
        }
        q.dequeue();
        assert!(!q.is_full());
        q.enqueue(10).unwrap();
        assert_eq!(q.capacity(), 10);
        assert!(q.is_full());
        assert_eq!(q.drain(), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn bounded_reset_and_resize() {
        let q = BoundedQueue::new(2, 8).unwrap();
        for i in 0..5 {
            q.enqueue(i).unwrap();
        }
        assert_eq!(q.resize(100), 8);
        assert_eq!(q.resize(0), 6);
        q.reset();
        q.reset();
        assert!(q.is_empty());
        assert_eq!(q.capacity(), 6);
        assert_eq!(q.max_capacity(), 8);
    }

    #[test]
    fn fifo_across_growth_and_compaction() {
        let q = DynamicQueue::with_shift_percent(3, 25);
        let mut expected = Vec::new();
        let mut next = 0u32;
        for round in 0..50 {
            for _ in 0..(round % 7 + 1) {
                q.enqueue(next);
                next += 1;
            }
            for _ in 0..(round % 5) {
                if let Some(v) = q.dequeue() {
                    expected.push(v);
                }
            }
        }
        expected.extend(q.drain());
        assert_eq!(expected, (0..next).collect::<Vec<_>>());
    }

    #[test]
    fn debug_reports_shape() {
        let q = DynamicQueue::<u8>::new(4);
        let rendered = format!("{q:?}");
        assert!(rendered.contains("capacity: 4"));
        assert!(rendered.contains("len: 0"));
    }

    /// Multi-producer / multi-consumer stress test: every item comes out once.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn mpmc_stress_unbounded() {
        let producers = 4usize;
        let consumers = 4usize;
        let items_per_producer = 20_000usize;
        let total = producers * items_per_producer;

        let q = Arc::new(DynamicQueue::with_shift_percent(16, 50));
        let seen = Arc::new(tokio::sync::Mutex::new(HashSet::<u64>::with_capacity(
            total,
        )));
        let consumed = Arc::new(AtomicUsize::new(0));

        let mut consumer_handles = Vec::with_capacity(consumers);
        for _ in 0..consumers {
            let q = q.clone();
            let seen = seen.clone();
            let consumed = consumed.clone();
            consumer_handles.push(task::spawn(async move {
                while consumed.load(Ordering::SeqCst) < total {
                    match q.dequeue() {
                        Some(val) => {
                            let inserted = seen.lock().await.insert(val);
                            assert!(inserted, "duplicate value observed: {val}");
                            consumed.fetch_add(1, Ordering::SeqCst);
                        },
                        None => task::yield_now().await,
                    }
                }
            }));
        }

        let mut producer_handles = Vec::with_capacity(producers);
        for pid in 0..producers {
            let q = q.clone();
            producer_handles.push(task::spawn(async move {
                for i in 0..items_per_producer {
                    q.enqueue(((pid as u64) << 32) | (i as u64));
                }
            }));
        }

        for h in producer_handles {
            h.await.expect("producer join");
        }
        for h in consumer_handles {
            h.await.expect("consumer join");
        }

        assert_eq!(seen.lock().await.len(), total);
        assert!(q.is_empty());
    }

    /// Per-producer order survives concurrent consumption.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn per_producer_order_is_preserved() {
        let q = Arc::new(DynamicQueue::new(4));
        let producers = 3u64;
        let per_producer = 5_000u64;

        let handles: Vec<_> = (0..producers)
            .map(|pid| {
                let q = q.clone();
                task::spawn(async move {
                    for i in 0..per_producer {
                        q.enqueue((pid, i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.await.expect("producer join");
        }

        let mut last = vec![None::<u64>; producers as usize];
        for (pid, i) in q.drain() {
            let slot = &mut last[pid as usize];
            assert!(slot.is_none_or(|prev| prev < i), "producer {pid} reordered");
            *slot = Some(i);
        }
        assert!(last.iter().all(|l| *l == Some(per_producer - 1)));
    }
}
