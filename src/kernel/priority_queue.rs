use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::Pid;

/// Which end of the key range is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOrder {
    /// Highest key first (ready queues, keyed by priority).
    MaxFirst,
    /// Lowest key first (sleeping queue, keyed by wake tick).
    MinFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    pid: Pid,
    key: i64,
    rank: i64,
    sequence: u64,
}

impl Ord for QueueEntry {
    // Equal ranks are served in insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| Reverse(self.sequence).cmp(&Reverse(other.sequence)))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded queue of PIDs ordered by an integer key.
pub struct PriorityQueue {
    heap: BinaryHeap<QueueEntry>,
    order: QueueOrder,
    capacity: usize,
    next_sequence: u64,
}

/// Returned when a push would exceed the queue capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl PriorityQueue {
    pub fn new(order: QueueOrder, capacity: usize) -> PriorityQueue {
        PriorityQueue {
            heap: BinaryHeap::with_capacity(capacity),
            order,
            capacity,
            next_sequence: 0,
        }
    }

    pub fn push(&mut self, pid: Pid, key: i64) -> Result<(), QueueFull> {
        if self.heap.len() >= self.capacity {
            return Err(QueueFull);
        }

        let rank = match self.order {
            QueueOrder::MaxFirst => key,
            QueueOrder::MinFirst => -key,
        };
        self.heap.push(QueueEntry { pid, key, rank, sequence: self.next_sequence });
        self.next_sequence += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Pid> {
        self.heap.pop().map(|entry| entry.pid)
    }

    /// The entry that `pop` would return, as `(pid, key)`.
    pub fn peek(&self) -> Option<(Pid, i64)> {
        self.heap.peek().map(|entry| (entry.pid, entry.key))
    }

    /// Pops every entry whose key satisfies `is_due`, in queue order, stopping
    /// at the first entry that does not.
    pub fn pop_while(&mut self, mut is_due: impl FnMut(i64) -> bool) -> Vec<Pid> {
        let mut extracted = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if !is_due(entry.key) {
                break;
            }
            extracted.push(entry.pid);
            self.heap.pop();
        }
        extracted
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.heap.iter().any(|entry| entry.pid == pid)
    }

    /// Entries as `(pid, key)` in the order they would be popped.
    pub fn entries(&self) -> Vec<(Pid, i64)> {
        let mut entries: Vec<QueueEntry> = self.heap.iter().copied().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|entry| (entry.pid, entry.key)).collect()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_queue_max_first() {
        let mut queue = PriorityQueue::new(QueueOrder::MaxFirst, 4);
        queue.push(0, 1).unwrap();
        queue.push(1, 9).unwrap();
        queue.push(2, 5).unwrap();

        assert_eq!(queue.peek(), Some((1, 9)));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_priority_queue_min_first() {
        let mut queue = PriorityQueue::new(QueueOrder::MinFirst, 4);
        queue.push(0, 14).unwrap();
        queue.push(1, 12).unwrap();
        queue.push(2, 20).unwrap();

        assert_eq!(queue.peek(), Some((1, 12)));
        assert_eq!(queue.entries(), vec![(1, 12), (0, 14), (2, 20)]);
    }

    #[test]
    fn test_priority_queue_equal_keys_are_fifo() {
        let mut queue = PriorityQueue::new(QueueOrder::MaxFirst, 8);
        queue.push(3, 5).unwrap();
        queue.push(1, 5).unwrap();
        queue.push(2, 7).unwrap();
        queue.push(0, 5).unwrap();

        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(0));

        let mut sleeping = PriorityQueue::new(QueueOrder::MinFirst, 8);
        sleeping.push(2, 4).unwrap();
        sleeping.push(0, 4).unwrap();
        assert_eq!(sleeping.pop(), Some(2));
        assert_eq!(sleeping.pop(), Some(0));
    }

    #[test]
    fn test_priority_queue_capacity() {
        let mut queue = PriorityQueue::new(QueueOrder::MaxFirst, 1);
        queue.push(0, 1).unwrap();
        assert_eq!(queue.push(1, 2), Err(QueueFull));
        assert_eq!(queue.len(), 1);
        assert!(!queue.contains(1));
    }

    #[test]
    fn test_priority_queue_pop_while() {
        let mut queue = PriorityQueue::new(QueueOrder::MinFirst, 8);
        queue.push(0, 14).unwrap();
        queue.push(1, 14).unwrap();
        queue.push(2, 15).unwrap();

        assert_eq!(queue.pop_while(|key| key <= 13), Vec::<Pid>::new());
        assert_eq!(queue.pop_while(|key| key <= 14), vec![0, 1]);
        assert_eq!(queue.entries(), vec![(2, 15)]);
    }
}
