use crate::EnqueueError;

/// Trait for queue producers that can enqueue items.
///
/// This trait provides a consistent interface for every producer type,
/// whether it is a queue itself or a dedicated producer handle.
pub trait QueueProducer<T> {
    /// Add an item at the tail of the queue.
    ///
    /// # Returns
    /// `Ok(())` on success. Shapes that can refuse an item (bounded and
    /// circular queues) hand it back inside an [`EnqueueError`]; growable and
    /// ring queues always succeed.
    fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>>;
}

/// Trait for queue consumers that can take items from the head of a queue.
///
/// An empty queue is a normal outcome, so every read reports it with `None`
/// rather than an error.
pub trait QueueConsumer<T> {
    /// Remove and return the head element, or `None` if the queue is empty.
    fn dequeue(&self) -> Option<T>;

    /// Clone the head element without removing it.
    fn peek(&self) -> Option<T>
    where
        T: Clone;

    /// Remove the head element only if `predicate` accepts it.
    ///
    /// The check and the removal happen under the same lock, so no other
    /// consumer can take the element in between.
    fn dequeue_if<F>(&self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool;

    /// Dequeue elements into `consumer` until the queue is empty or the
    /// closure returns `true` to stop.
    ///
    /// # Returns
    /// Number of elements consumed
    fn consume<F>(&self, mut consumer: F) -> usize
    where
        F: FnMut(T) -> bool,
    {
        let mut count = 0;
        while let Some(item) = self.dequeue() {
            count += 1;
            if consumer(item) {
                break;
            }
        }
        count
    }

    /// Check whether the queue holds no elements.
    fn is_empty(&self) -> bool;

    /// Number of elements currently in the queue.
    fn len(&self) -> usize;
}

/// The full capability set shared by every queue shape.
///
/// Code that picks a shape once, at construction, can stay generic over
/// `Q: Queue<T>` or hold an [`AnyQueue`].
///
/// [`AnyQueue`]: crate::AnyQueue
pub trait Queue<T>: QueueProducer<T> + QueueConsumer<T> {
    /// Whether the next [`enqueue`](QueueProducer::enqueue) would be refused
    /// or, for a ring, would evict.
    fn is_full(&self) -> bool;

    /// Number of elements the queue can hold without growing.
    fn capacity(&self) -> usize;

    /// Discard every element, keeping the current capacity.
    fn reset(&self);

    /// Reallocate the backing storage, preserving element order.
    ///
    /// # Returns
    /// The capacity actually in effect afterwards
    fn resize(&self, capacity: usize) -> usize;
}

/// Trait for shared queues that can hand out producers and consumers.
pub trait QueueFactory<T> {
    /// The type of producers this queue creates
    type Producer: QueueProducer<T>;

    /// The type of consumers this queue creates
    type Consumer: QueueConsumer<T>;

    /// Create both producer and consumer handles in one call.
    ///
    /// # Returns
    /// A tuple containing `(producer, consumer)` handles
    fn channel(&self) -> (Self::Producer, Self::Consumer) {
        (self.producer(), self.consumer())
    }

    /// Create a new producer handle for this queue.
    fn producer(&self) -> Self::Producer;

    /// Create a new consumer handle for this queue.
    fn consumer(&self) -> Self::Consumer;
}
