use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{Error, Result};

// Fixed size circular store.
// Only the slots in `front..front + count` (wrapping) are `Some`.
#[derive(Debug)]
struct Ring<T> {
    slots: Box<[Option<T>]>,
    front: usize,
    rear: usize,
    count: usize,
}

impl<T> Ring<T> {
    fn with_capacity(cap: usize) -> Self {
        Self {
            slots: (0..cap).map(|_| None).collect(),
            front: 0,
            rear: 0,
            count: 0,
        }
    }

    fn cap(&self) -> usize {
        self.slots.len()
    }

    fn is_full(&self) -> bool {
        self.count == self.cap()
    }

    // Returns the evicted value if the ring was full.
    // The caller drops it, after the indices are consistent again.
    fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.is_full() {
            let old = self.slots[self.front].take();
            self.front = (self.front + 1) % self.cap();
            self.count -= 1;
            old
        } else {
            None
        };

        self.slots[self.rear] = Some(value);
        self.rear = (self.rear + 1) % self.cap();
        self.count += 1;
        evicted
    }

    fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }

        let value = self.slots[self.front].take();
        self.front = (self.front + 1) % self.cap();
        self.count -= 1;
        value
    }
}

/// A fixed capacity queue shared between threads.
///
/// Pushing never blocks: once the queue is full the oldest value is dropped
/// to make room for the new one.
/// Popping blocks until a value is available, or until a deadline passes
/// when using [`Queue::pop_timeout`].
///
/// Every push wakes at most one waiting consumer.
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(ringq::Queue::new(2).unwrap());
///
/// queue.push(1);
/// queue.push(2);
/// queue.push(3); // 1 is dropped
///
/// let consumer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || (queue.pop(), queue.pop(), queue.pop())
/// });
///
/// queue.push(4);
/// assert_eq!(consumer.join().unwrap(), (2, 3, 4));
/// ```
#[derive(Debug)]
pub struct Queue<T> {
    cap: usize,
    verbose: bool,
    inner: Mutex<Ring<T>>,
    not_empty: Condvar,
}

impl<T> Queue<T> {
    /// Create a queue with room for `capacity` values.
    ///
    /// Returns `Error::InvalidCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(Config::default().capacity(capacity))
    }

    /// Same as [`Queue::new`] but accepts a signed capacity.
    ///
    /// Returns `Error::InvalidCapacity` if `capacity` is zero or negative,
    /// and `Error::CapacityOverflow` if it does not fit in a `usize`.
    pub fn try_new(capacity: i64) -> Result<Self> {
        if capacity <= 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        let cap = usize::try_from(capacity).map_err(|_| Error::CapacityOverflow(capacity))?;
        Self::new(cap)
    }

    /// Create a queue from a [`Config`]
    pub fn with_config(config: Config) -> Result<Self> {
        if config.capacity == 0 {
            return Err(Error::InvalidCapacity(0));
        }

        Ok(Self {
            cap: config.capacity,
            verbose: config.verbose,
            inner: Mutex::new(Ring::with_capacity(config.capacity)),
            not_empty: Condvar::new(),
        })
    }

    /// Push a value to the back of the queue, dropping the oldest value if the queue is full.
    pub fn push(&self, value: T) {
        let _ = self.push_evict(value);
    }

    /// Push a value to the back of the queue.
    ///
    /// If the queue was full the oldest value is removed and returned
    /// instead of being dropped.
    pub fn push_evict(&self, value: T) -> Option<T> {
        let mut ring = self.lock();
        let evicted = ring.push(value);

        if self.verbose {
            if evicted.is_some() {
                log::trace!("push: queue full, evicted oldest value");
            }
            log::trace!("push: count {} / {}", ring.count, self.cap);
        }

        self.not_empty.notify_one();
        evicted
    }

    /// Remove the value at the front of the queue.
    ///
    /// This will block until a value is pushed.
    pub fn pop(&self) -> T {
        let mut ring = self.lock();
        loop {
            if let Some(value) = ring.pop() {
                self.trace_pop(ring.count);
                return value;
            }
            ring = self
                .not_empty
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Remove the value at the front of the queue, waiting at most `timeout`.
    ///
    /// A zero timeout checks the queue once without waiting.
    /// On `Error::Timeout` nothing was removed from the queue.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<T> {
        // A deadline too far out to represent is the same as no deadline
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Ok(self.pop());
        };

        let mut ring = self.lock();
        loop {
            if let Some(value) = ring.pop() {
                self.trace_pop(ring.count);
                return Ok(value);
            }

            let now = Instant::now();
            if now >= deadline {
                if self.verbose {
                    log::trace!("pop: timed out after {timeout:?}");
                }
                return Err(Error::Timeout(timeout));
            }

            let (guard, _) = self
                .not_empty
                .wait_timeout(ring, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            ring = guard;
        }
    }

    /// Same as [`Queue::pop_timeout`] with the timeout given in milliseconds
    pub fn pop_timeout_ms(&self, millis: u64) -> Result<T> {
        self.pop_timeout(Duration::from_millis(millis))
    }

    /// Remove the value at the front of the queue if there is one
    pub fn try_pop(&self) -> Option<T> {
        let mut ring = self.lock();
        let value = ring.pop();
        if value.is_some() {
            self.trace_pop(ring.count);
        }
        value
    }

    /// The number of values currently in the queue.
    ///
    /// This is a snapshot and can be stale as soon as it returns,
    /// so don't use it to coordinate threads.
    pub fn len(&self) -> usize {
        self.lock().count
    }

    /// Alias for [`Queue::len`]
    pub fn count(&self) -> usize {
        self.len()
    }

    /// True if the queue holds no values (snapshot)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the next push will evict a value (snapshot)
    pub fn is_full(&self) -> bool {
        self.lock().is_full()
    }

    /// The maximum number of values the queue can hold
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// True if the queue was built with `Config::verbose`
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    // A panic can only happen in a `Drop` of an evicted value, after the
    // ring is consistent again, so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trace_pop(&self, count: usize) {
        if self.verbose {
            log::trace!("pop: count {count} / {}", self.cap);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_indices<T>(ring: &Ring<T>) {
        assert_eq!(ring.rear, (ring.front + ring.count) % ring.cap());
        let live = ring.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(live, ring.count);
    }

    #[test]
    fn ring_push() {
        let mut ring = Ring::with_capacity(3);
        assert!(ring.push(1).is_none());
        assert!(ring.push(2).is_none());
        assert_eq!(ring.count, 2);
        assert_eq!(ring.rear, 2);
        assert_indices(&ring);
    }

    #[test]
    fn ring_evict() {
        let mut ring = Ring::with_capacity(2);
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.push(3), Some(1));
        assert_eq!(ring.front, 1);
        assert_eq!(ring.rear, 1);
        assert_eq!(ring.count, 2);
        assert_indices(&ring);
    }

    #[test]
    fn ring_pop_empty() {
        let mut ring = Ring::<u8>::with_capacity(1);
        assert!(ring.pop().is_none());
        assert_eq!(ring.front, 0);
        assert_eq!(ring.count, 0);
    }

    #[test]
    fn ring_wraps() {
        let mut ring = Ring::with_capacity(3);
        for i in 0..100 {
            ring.push(i);
            if i % 2 == 0 {
                ring.push(i + 1000);
            }
            assert_indices(&ring);
            ring.pop();
            assert_indices(&ring);
        }
    }

    #[test]
    fn zero_capacity() {
        let err = Queue::<u8>::new(0).unwrap_err();
        assert!(matches!(err, Error::InvalidCapacity(0)));
    }

    #[test]
    fn zero_capacity_config() {
        let err = Queue::<u8>::with_config(Config::default().capacity(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidCapacity(0)));
    }

    #[test]
    fn negative_capacity() {
        let err = Queue::<u8>::try_new(-3).unwrap_err();
        assert!(matches!(err, Error::InvalidCapacity(-3)));
    }

    #[test]
    #[cfg(target_pointer_width = "32")]
    fn capacity_beyond_usize() {
        let capacity = i64::from(u32::MAX) + 1;
        let err = Queue::<u8>::try_new(capacity).unwrap_err();
        assert!(matches!(err, Error::CapacityOverflow(c) if c == capacity));
    }

    #[test]
    fn verbose_queue_behaves_the_same() {
        let queue = Queue::with_config(Config::default().capacity(2).verbose(true)).unwrap();
        assert!(queue.is_verbose());
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.pop(), 2);
        assert_eq!(queue.try_pop(), Some(3));
        assert!(queue.pop_timeout(Duration::ZERO).unwrap_err().is_timeout());
    }
}
