use crate::{
    EnqueueError,
    traits::{Queue, QueueConsumer, QueueFactory, QueueProducer},
};
use std::{fmt, marker::PhantomData, sync::Arc};

/// Convenient type alias for [`QueueProducerHandle`].
pub type Producer<T, Q> = QueueProducerHandle<T, Q>;

/// Convenient type alias for [`QueueConsumerHandle`].
pub type Consumer<T, Q> = QueueConsumerHandle<T, Q>;

/// Producer handle for a shared queue.
///
/// A lightweight, cloneable handle that can only add items. Every clone points
/// at the same queue through an `Arc`, so handles can be moved to other
/// threads freely.
///
/// # Examples
///
/// ```
/// use cask::{
///     DynamicQueue,
///     traits::{QueueConsumer, QueueFactory, QueueProducer},
/// };
/// use std::{sync::Arc, thread};
///
/// let queue = Arc::new(DynamicQueue::new(16));
/// let (producer, consumer) = queue.channel();
///
/// let writer = {
///     let producer = producer.clone();
///     thread::spawn(move || {
///         for i in 0..100 {
///             producer.enqueue(i).unwrap();
///         }
///     })
/// };
/// writer.join().unwrap();
///
/// assert_eq!(consumer.len(), 100);
/// assert_eq!(consumer.dequeue(), Some(0));
/// ```
pub struct QueueProducerHandle<T, Q> {
    queue: Arc<Q>,
    _phantom: PhantomData<fn(T)>,
}

impl<T, Q> QueueProducerHandle<T, Q> {
    /// The queue this handle writes to.
    pub const fn queue(&self) -> &Arc<Q> {
        &self.queue
    }
}

impl<T, Q> Clone for QueueProducerHandle<T, Q> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T, Q: fmt::Debug> fmt::Debug for QueueProducerHandle<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueProducerHandle")
            .field("queue", &self.queue)
            .finish()
    }
}

impl<T, Q> QueueProducer<T> for QueueProducerHandle<T, Q>
where
    Q: QueueProducer<T>,
{
    fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        self.queue.enqueue(item)
    }
}

/// Consumer handle for a shared queue.
///
/// A lightweight, cloneable handle that can only read and remove items. Any
/// number of consumers may share a queue; each item is handed to exactly one
/// of them.
pub struct QueueConsumerHandle<T, Q> {
    queue: Arc<Q>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, Q> QueueConsumerHandle<T, Q> {
    /// The queue this handle reads from.
    pub const fn queue(&self) -> &Arc<Q> {
        &self.queue
    }
}

impl<T, Q> Clone for QueueConsumerHandle<T, Q> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T, Q: fmt::Debug> fmt::Debug for QueueConsumerHandle<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConsumerHandle")
            .field("queue", &self.queue)
            .finish()
    }
}

impl<T, Q> QueueConsumer<T> for QueueConsumerHandle<T, Q>
where
    Q: QueueConsumer<T>,
{
    fn dequeue(&self) -> Option<T> {
        self.queue.dequeue()
    }

    fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.queue.peek()
    }

    fn dequeue_if<F>(&self, predicate: F) -> Option<T>
    where
        F: FnOnce(&T) -> bool,
    {
        self.queue.dequeue_if(predicate)
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<T, Q> QueueFactory<T> for Arc<Q>
where
    Q: Queue<T>,
{
    type Producer = QueueProducerHandle<T, Q>;
    type Consumer = QueueConsumerHandle<T, Q>;

    fn producer(&self) -> Self::Producer {
        QueueProducerHandle {
            queue: self.clone(),
            _phantom: PhantomData,
        }
    }

    fn consumer(&self) -> Self::Consumer {
        QueueConsumerHandle {
            queue: self.clone(),
            _phantom: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoundedQueue, CircularQueue, QueueError, RingBuffer};
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use tokio::task;

    #[test]
    fn handles_share_one_queue() {
        let q = Arc::new(CircularQueue::<i32>::new(2));
        let (producer, consumer) = q.channel();
        let producer2 = producer.clone();

        producer.enqueue(1).unwrap();
        producer2.enqueue(2).unwrap();
        let err = producer.enqueue(3).unwrap_err();
        assert_eq!(err.kind(), &QueueError::Full { capacity: 2 });

        assert!(Arc::ptr_eq(producer.queue(), consumer.queue()));
        assert_eq!(consumer.peek(), Some(1));
        assert_eq!(consumer.dequeue(), Some(1));
        assert_eq!(consumer.clone().dequeue(), Some(2));
        assert!(consumer.is_empty());
    }

    #[test]
    fn consumer_dequeue_if_and_consume() {
        let q = Arc::new(RingBuffer::<u32>::new(8));
        let (producer, consumer) = q.channel();
        for i in 0..5 {
            producer.enqueue(i).unwrap();
        }
        assert_eq!(consumer.dequeue_if(|&v| v == 1), None);
        assert_eq!(consumer.dequeue_if(|&v| v == 0), Some(0));

        let mut sum = 0;
        let count = consumer.consume(|v| {
            sum += v;
            false
        });
        assert_eq!(count, 4);
        assert_eq!(sum, 1 + 2 + 3 + 4);
        assert_eq!(consumer.len(), 0);
    }

    /// Bounded queue under contention: rejected items are retried until
    /// accepted, and nothing is lost or duplicated.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn mpmc_stress_bounded_with_retry() {
        let producers = 4usize;
        let consumers = 4usize;
        let items_per_producer = 10_000usize;
        let total = producers * items_per_producer;

        let q = Arc::new(BoundedQueue::<u64>::new(8, 64).expect("valid bounds"));
        let (producer, consumer) = q.channel();
        let seen = Arc::new(tokio::sync::Mutex::new(HashSet::<u64>::with_capacity(
            total,
        )));
        let consumed = Arc::new(AtomicUsize::new(0));

        let consumer_handles: Vec<_> = (0..consumers)
            .map(|_| {
                let consumer = consumer.clone();
                let seen = seen.clone();
                let consumed = consumed.clone();
                task::spawn(async move {
                    while consumed.load(Ordering::SeqCst) < total {
                        match consumer.dequeue() {
                            Some(val) => {
                                let inserted = seen.lock().await.insert(val);
                                assert!(inserted, "duplicate value observed: {val}");
                                consumed.fetch_add(1, Ordering::SeqCst);
                            },
                            None => task::yield_now().await,
                        }
                    }
                })
            })
            .collect();

        let producer_handles: Vec<_> = (0..producers)
            .map(|pid| {
                let producer = producer.clone();
                task::spawn(async move {
                    for i in 0..items_per_producer {
                        let mut val = ((pid as u64) << 32) | (i as u64);
                        loop {
                            match producer.enqueue(val) {
                                Ok(()) => break,
                                Err(err) => {
                                    assert!(matches!(
                                        err.kind(),
                                        QueueError::CapacityExceeded { max_capacity: 64 }
                                    ));
                                    val = err.into_inner();
                                    task::yield_now().await;
                                },
                            }
                        }
                    }
                })
            })
            .collect();

        for h in producer_handles {
            h.await.expect("producer join");
        }
        for h in consumer_handles {
            h.await.expect("consumer join");
        }

        assert_eq!(seen.lock().await.len(), total);
        assert!(q.capacity() <= 64);
        assert!(q.is_empty());
    }
}
