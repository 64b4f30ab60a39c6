//! Priority queue holding the jobs of a single queue kind.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use trade_core::{JobId, Priority, QueueKind, TradeJob};

/// Heap entry ordered so the max-heap pops the smallest priority, and the
/// earliest insertion among equal priorities.
struct Entry<P> {
    priority: Priority,
    seq: u64,
    job: TradeJob<P>,
}

impl<P> PartialEq for Entry<P> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<P> Eq for Entry<P> {}

impl<P> PartialOrd for Entry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for Entry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smaller priority first
        match other.priority.cmp(&self.priority) {
            // Then earlier insertion first
            Ordering::Equal => other.seq.cmp(&self.seq),
            other => other,
        }
    }
}

struct Inner<P> {
    heap: BinaryHeap<Entry<P>>,
    next_seq: u64,
}

/// A job handed out of a queue together with the priority it waited at.
#[derive(Debug, Clone, PartialEq)]
pub struct Queued<P> {
    pub job: TradeJob<P>,
    pub priority: Priority,
}

/// What selection needs to know about a queue without removing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueHead {
    pub job_id: JobId,
    pub priority: Priority,
    pub enqueued_at: Instant,
    /// Number of jobs in the queue when the head was read.
    pub depth: usize,
}

/// Min-priority queue bound to one [`QueueKind`].
///
/// Every operation takes the queue's own lock, so concurrent callers always
/// see a consistent head. Equal priorities are served in insertion order.
pub struct TradeQueue<P> {
    kind: QueueKind,
    inner: Mutex<Inner<P>>,
}

impl<P> TradeQueue<P> {
    pub fn new(kind: QueueKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
        }
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    fn lock(&self) -> MutexGuard<'_, Inner<P>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a job. The same requester may appear any number of times.
    pub fn enqueue(&self, job: TradeJob<P>, priority: Priority) {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.heap.push(Entry { priority, seq, job });
    }

    /// Snapshot the head entry and the queue depth under one lock.
    pub fn head(&self) -> Option<QueueHead> {
        let inner = self.lock();
        inner.heap.peek().map(|entry| QueueHead {
            job_id: entry.job.id,
            priority: entry.priority,
            enqueued_at: entry.job.enqueued_at,
            depth: inner.heap.len(),
        })
    }

    /// Remove and return the most urgent job.
    pub fn try_dequeue(&self) -> Option<Queued<P>> {
        self.lock().heap.pop().map(|entry| Queued {
            job: entry.job,
            priority: entry.priority,
        })
    }

    pub fn count(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    /// Drop every job in the queue and return how many there were.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let discarded = inner.heap.len();
        if discarded > 0 {
            tracing::debug!("Clearing {} jobs from {}", discarded, self.kind);
        }
        inner.heap.clear();
        discarded
    }
}

impl<P: Clone> TradeQueue<P> {
    /// Copy out the most urgent job without removing it.
    pub fn try_peek(&self) -> Option<(TradeJob<P>, Priority)> {
        self.lock()
            .heap
            .peek()
            .map(|entry| (entry.job.clone(), entry.priority))
    }
}

impl<P> std::fmt::Debug for TradeQueue<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeQueue")
            .field("kind", &self.kind)
            .field("count", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trade_core::{Requester, TradeCode, TradeType};

    fn job(name: &str) -> TradeJob<String> {
        TradeJob::new(
            name.to_string(),
            Requester::new(name, 1),
            TradeCode(1),
            TradeType::Clone,
        )
    }

    #[test]
    fn equal_priorities_come_out_in_insertion_order() {
        let queue = TradeQueue::new(QueueKind::Clone);
        for name in ["a", "b", "c"] {
            queue.enqueue(job(name), Priority(4));
        }
        queue.enqueue(job("urgent"), Priority(1));

        let order: Vec<_> = std::iter::from_fn(|| queue.try_dequeue())
            .map(|queued| queued.job.payload)
            .collect();
        assert_eq!(order, ["urgent", "a", "b", "c"]);
    }

    #[test]
    fn peek_does_not_remove() {
        let queue = TradeQueue::new(QueueKind::Clone);
        queue.enqueue(job("a"), Priority(2));

        let (peeked, priority) = queue.try_peek().expect("head present");
        assert_eq!(peeked.payload, "a");
        assert_eq!(priority, Priority(2));
        assert_eq!(queue.count(), 1);

        let head = queue.head().expect("head present");
        assert_eq!(head.job_id, peeked.id);
        assert_eq!(head.depth, 1);
    }

    #[test]
    fn empty_queue_yields_nothing() {
        let queue: TradeQueue<String> = TradeQueue::new(QueueKind::Dump);
        assert!(queue.try_dequeue().is_none());
        assert!(queue.try_peek().is_none());
        assert!(queue.head().is_none());

        queue.enqueue(job("a"), Priority(1));
        queue.enqueue(job("b"), Priority(3));
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }
}
