//! A priority queue that stores arbitrary data sorted by time
//!
//! Defines a `Queue<T>` that is intended to store a queue of items of type
//! T - sorted by integer time in seconds - called 'plans'. This queue has
//! methods for adding plans, retrieving the earliest plan in the queue, and
//! discarding every pending plan at once. Adding and retrieving a plan are
//! both *O*(log(*n*)).
//!
//! This queue is used by `Simulation` to store future events. Plans are never
//! modified once added; a plan that is no longer relevant stays queued and is
//! expected to be harmless when it is eventually retrieved.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A priority queue that stores arbitrary data sorted by time
///
/// Items of type `T` are stored in order by `u64` time and called `Plan<T>`.
/// When plans are created they are sequentially assigned an id. If two plans
/// are scheduled for the same time then the plan that is scheduled first
/// (i.e., that has the lowest id) is placed earlier.
pub struct Queue<T> {
    queue: BinaryHeap<Entry<T>>,
    plan_counter: u64,
}

impl<T> Queue<T> {
    /// Create a new empty `Queue<T>`
    #[must_use]
    pub fn new() -> Queue<T> {
        Queue {
            queue: BinaryHeap::new(),
            plan_counter: 0,
        }
    }

    /// Add a plan to the queue at the specified time
    pub fn add_plan(&mut self, time: u64, data: T) {
        let id = self.plan_counter;
        self.queue.push(Entry { time, id, data });
        self.plan_counter += 1;
    }

    /// Retrieve the earliest plan in the queue
    ///
    /// Returns the next plan if it exists or else `None` if the queue is empty
    pub fn get_next_plan(&mut self) -> Option<Plan<T>> {
        self.queue.pop().map(|entry| Plan {
            time: entry.time,
            data: entry.data,
        })
    }

    /// Discard every pending plan
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A time, id, and payload used to order plans in the `Queue<T>`
struct Entry<T> {
    time: u64,
    id: u64,
    data: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Entry objects are ordered in increasing order by time and then plan id.
/// `BinaryHeap` is a max-heap, so the comparison is reversed.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then(self.id.cmp(&other.id))
            .reverse()
    }
}

/// A plan that holds data of type `T` intended to be used at the specified time
pub struct Plan<T> {
    pub time: u64,
    pub data: T,
}
