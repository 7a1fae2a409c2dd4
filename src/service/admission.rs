//! Bounded admission for a Service.
//!
//! # Responsibilities
//! - Count data requests in flight
//! - Admit only while occupancy is below capacity K
//! - Answer probes without reserving anything
//!
//! # Design Decisions
//! - Check and increment happen in one compare-and-swap, so occupancy never
//!   exceeds K no matter how many connections race
//! - Release is tied to a guard, so a failed reply still frees the slot

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-flight counter with a fixed capacity.
#[derive(Debug)]
pub struct AdmissionQueue {
    capacity: usize,
    occupancy: AtomicUsize,
}

impl AdmissionQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            occupancy: AtomicUsize::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Requests currently admitted.
    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    /// Probe answer: would a request be admitted right now? Read-only.
    pub fn has_capacity(&self) -> bool {
        self.occupancy() < self.capacity
    }

    /// Admit one request, or `None` if the queue is full.
    pub fn try_admit(self: &Arc<Self>) -> Option<AdmissionPermit> {
        let mut current = self.occupancy.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                return None;
            }
            match self.occupancy.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        Some(AdmissionPermit {
            queue: Arc::clone(self),
        })
    }
}

/// One admitted request. Dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    queue: Arc<AdmissionQueue>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.queue.occupancy.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_capacity() {
        let queue = AdmissionQueue::new(2);
        let a = queue.try_admit().unwrap();
        assert!(queue.has_capacity());
        let b = queue.try_admit().unwrap();
        assert!(!queue.has_capacity());
        assert!(queue.try_admit().is_none());
        assert_eq!(queue.occupancy(), 2);

        drop(a);
        assert!(queue.has_capacity());
        let _c = queue.try_admit().unwrap();
        drop(b);
        assert_eq!(queue.occupancy(), 1);
    }

    #[test]
    fn probing_does_not_reserve() {
        let queue = AdmissionQueue::new(1);
        for _ in 0..5 {
            assert!(queue.has_capacity());
        }
        assert_eq!(queue.occupancy(), 0);
        assert!(queue.try_admit().is_some());
    }

    #[test]
    fn never_exceeds_capacity_under_contention() {
        let queue = AdmissionQueue::new(3);
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    let mut held = Vec::new();
                    for _ in 0..1000 {
                        if let Some(permit) = queue.try_admit() {
                            assert!(queue.occupancy() <= 3);
                            held.push(permit);
                        }
                        if held.len() > 1 {
                            held.clear();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.occupancy(), 0);
    }
}
