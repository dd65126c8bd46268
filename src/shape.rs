use crate::{
    BoundedQueue, CircularQueue, DEFAULT_SHIFT_PERCENT, DynamicQueue, EnqueueError, QueueError,
    RingBuffer,
    handle::{Consumer, Producer},
    traits::{Queue, QueueConsumer, QueueFactory, QueueProducer},
};
use std::{marker::PhantomData, sync::Arc};

/// Which queue behavior to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QueueShape {
    /// Growable and unbounded: [`DynamicQueue`].
    #[default]
    Dynamic,
    /// Growable up to a maximum capacity: [`BoundedQueue`].
    Bounded,
    /// Fixed capacity, rejects when full: [`CircularQueue`].
    Circular,
    /// Fixed capacity, evicts the oldest item when full: [`RingBuffer`].
    Ring,
}

/// A queue whose shape was chosen at runtime.
///
/// Implements the same capability traits as each concrete queue, so callers
/// that only need [`Queue`] can hold one type regardless of configuration.
#[derive(Debug)]
pub enum AnyQueue<T> {
    /// See [`DynamicQueue`].
    Dynamic(DynamicQueue<T>),
    /// See [`BoundedQueue`].
    Bounded(BoundedQueue<T>),
    /// See [`CircularQueue`].
    Circular(CircularQueue<T>),
    /// See [`RingBuffer`].
    Ring(RingBuffer<T>),
}

impl<T> AnyQueue<T> {
    /// The shape this queue was built with.
    pub const fn shape(&self) -> QueueShape {
        match self {
            Self::Dynamic(_) => QueueShape::Dynamic,
            Self::Bounded(_) => QueueShape::Bounded,
            Self::Circular(_) => QueueShape::Circular,
            Self::Ring(_) => QueueShape::Ring,
        }
    }

    /// Remove every item, returning them in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        match self {
            Self::Dynamic(q) => q.drain(),
            Self::Bounded(q) => q.drain(),
            Self::Circular(q) => q.drain(),
            Self::Ring(q) => q.drain(),
        }
    }
}

impl<T> From<DynamicQueue<T>> for AnyQueue<T> {
    fn from(queue: DynamicQueue<T>) -> Self {
        Self::Dynamic(queue)
    }
}

impl<T> From<BoundedQueue<T>> for AnyQueue<T> {
    fn from(queue: BoundedQueue<T>) -> Self {
        Self::Bounded(queue)
    }
}

impl<T> From<CircularQueue<T>> for AnyQueue<T> {
    fn from(queue: CircularQueue<T>) -> Self {
        Self::Circular(queue)
    }
}

impl<T> From<RingBuffer<T>> for AnyQueue<T> {
    fn from(queue: RingBuffer<T>) -> Self {
        Self::Ring(queue)
    }
}

impl<T> QueueProducer<T> for AnyQueue<T> {
    fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        match self {
            Self::Dynamic(q) => QueueProducer::enqueue(q, item),
            Self::Bounded(q) => QueueProducer::enqueue(q, item),
            Self::Circular(q) => QueueProducer::enqueue(q, item),
            Self::Ring(q) => QueueProducer::enqueue(q, item),
        }
    }
}

impl<T> QueueConsumer<T> for AnyQueue<T> {
    fn dequeue(&self) -> Option<T> {
        match self {
            Self::Dynamic(q) => q.dequeue(),
            Self::Bounded(q) => q.dequeue(),
            Self::Circular(q) => q.dequeue(),
            Self::Ring(q) => q.dequeue(),
        }
    }

    fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        match self {
            Self::Dynamic(q) => q.peek(),
            Self::Bounded(q) => q.peek(),
            Self::Circular(q) => q.peek(),
            Self::Ring(q) => q.peek(),
        }
    }

    fn dequeue_if<F>(&self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        match self {
            Self::Dynamic(q) => q.dequeue_if(predicate),
            Self::Bounded(q) => q.dequeue_if(predicate),
            Self::Circular(q) => q.dequeue_if(predicate),
            Self::Ring(q) => q.dequeue_if(predicate),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Dynamic(q) => q.is_empty(),
            Self::Bounded(q) => q.is_empty(),
            Self::Circular(q) => q.is_empty(),
            Self::Ring(q) => q.is_empty(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Dynamic(q) => q.len(),
            Self::Bounded(q) => q.len(),
            Self::Circular(q) => q.len(),
            Self::Ring(q) => q.len(),
        }
    }
}

impl<T> Queue<T> for AnyQueue<T> {
    fn is_full(&self) -> bool {
        match self {
            Self::Dynamic(q) => q.is_full(),
            Self::Bounded(q) => q.is_full(),
            Self::Circular(q) => q.is_full(),
            Self::Ring(q) => q.is_full(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Self::Dynamic(q) => q.capacity(),
            Self::Bounded(q) => q.capacity(),
            Self::Circular(q) => q.capacity(),
            Self::Ring(q) => q.capacity(),
        }
    }

    fn reset(&self) {
        match self {
            Self::Dynamic(q) => q.reset(),
            Self::Bounded(q) => q.reset(),
            Self::Circular(q) => q.reset(),
            Self::Ring(q) => q.reset(),
        }
    }

    fn resize(&self, capacity: usize) -> usize {
        match self {
            Self::Dynamic(q) => q.resize(capacity),
            Self::Bounded(q) => q.resize(capacity),
            Self::Circular(q) => q.resize(capacity),
            Self::Ring(q) => q.resize(capacity),
        }
    }
}

/// Builder for every queue shape.
///
/// Provides a fluent API whose parameters are validated when a queue is built.
/// The shift percentage only affects the growable shapes and is ignored by
/// the circular ones.
///
/// # Examples
///
/// ```
/// use cask::{QueueShape, queue};
///
/// # fn main() -> Result<(), cask::QueueError> {
/// let ring = queue::<&str>().capacity(2).build_ring()?;
/// ring.enqueue("a");
/// ring.enqueue("b");
/// assert_eq!(ring.enqueue("c"), Some("a"));
///
/// // A ceiling only makes sense for the bounded shape.
/// let err = queue::<u8>().capacity(4).max_capacity(8).build_dynamic().unwrap_err();
/// assert!(matches!(err, cask::QueueError::InvalidCapacity { .. }));
///
/// let any = queue::<u8>().capacity(4).shape(QueueShape::Circular).build()?;
/// assert_eq!(any.shape(), QueueShape::Circular);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QueueBuilder<T> {
    capacity: Option<usize>,
    max_capacity: Option<usize>,
    shift_percent: u32,
    shape: QueueShape,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Default for QueueBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueueBuilder<T> {
    /// Create a new queue builder
    pub const fn new() -> Self {
        Self {
            capacity: None,
            max_capacity: None,
            shift_percent: DEFAULT_SHIFT_PERCENT,
            shape: QueueShape::Dynamic,
            _phantom: PhantomData,
        }
    }

    /// Set the initial capacity
    #[must_use]
    pub const fn capacity(mut self, cap: usize) -> Self {
        self.capacity = Some(cap);
        self
    }

    /// Set the growth ceiling (bounded shape only)
    #[must_use]
    pub const fn max_capacity(mut self, max: usize) -> Self {
        self.max_capacity = Some(max);
        self
    }

    /// Set the compaction threshold, clamped to 100
    #[must_use]
    pub const fn shift_percent(mut self, percent: u32) -> Self {
        self.shift_percent = percent;
        self
    }

    /// Select the shape [`build`](Self::build) and
    /// [`channels`](Self::channels) construct
    #[must_use]
    pub const fn shape(mut self, shape: QueueShape) -> Self {
        self.shape = shape;
        self
    }

    fn required_capacity(&self) -> Result<usize, QueueError> {
        self.capacity.ok_or(QueueError::InvalidCapacity {
            reason: "capacity not set",
        })
    }

    fn reject_ceiling(&self) -> Result<(), QueueError> {
        match self.max_capacity {
            Some(_) => Err(QueueError::InvalidCapacity {
                reason: "max capacity only applies to bounded queues",
            }),
            None => Ok(()),
        }
    }

    /// Build an unbounded growable queue
    pub fn build_dynamic(self) -> Result<DynamicQueue<T>, QueueError> {
        let capacity = self.required_capacity()?;
        self.reject_ceiling()?;
        Ok(DynamicQueue::with_shift_percent(
            capacity,
            self.shift_percent,
        ))
    }

    /// Build a growable queue capped at the configured max capacity
    pub fn build_bounded(self) -> Result<BoundedQueue<T>, QueueError> {
        let capacity = self.required_capacity()?;
        let max_capacity = self.max_capacity.ok_or(QueueError::InvalidCapacity {
            reason: "max capacity not set",
        })?;
        BoundedQueue::with_shift_percent(capacity, max_capacity, self.shift_percent)
    }

    /// Build a fixed-capacity queue that rejects when full
    pub fn build_circular(self) -> Result<CircularQueue<T>, QueueError> {
        let capacity = self.required_capacity()?;
        self.reject_ceiling()?;
        Ok(CircularQueue::new(capacity))
    }

    /// Build a fixed-capacity ring that overwrites its oldest item
    pub fn build_ring(self) -> Result<RingBuffer<T>, QueueError> {
        let capacity = self.required_capacity()?;
        self.reject_ceiling()?;
        Ok(RingBuffer::new(capacity))
    }

    /// Build whichever shape was selected
    pub fn build(self) -> Result<AnyQueue<T>, QueueError> {
        Ok(match self.shape {
            QueueShape::Dynamic => self.build_dynamic()?.into(),
            QueueShape::Bounded => self.build_bounded()?.into(),
            QueueShape::Circular => self.build_circular()?.into(),
            QueueShape::Ring => self.build_ring()?.into(),
        })
    }

    /// Create producer/consumer pair over the selected shape
    pub fn channels(
        self,
    ) -> Result<(Producer<T, AnyQueue<T>>, Consumer<T, AnyQueue<T>>), QueueError> {
        let queue = Arc::new(self.build()?);
        Ok(queue.channel())
    }
}

/// Primary entry point for configuring a queue.
///
/// # Examples
///
/// ```
/// use cask::{queue, traits::QueueProducer};
///
/// # fn main() -> Result<(), cask::QueueError> {
/// let (producer, _consumer) = queue::<u64>().capacity(128).channels()?;
///
/// producer.enqueue(42).unwrap();
/// # Ok(())
/// # }
/// ```
pub const fn queue<T>() -> QueueBuilder<T> {
    QueueBuilder::new()
}
