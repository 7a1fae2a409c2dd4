//! The ordered set of backends a balancer dispatches to.
//!
//! # Responsibilities
//! - Keep backends in the order they were configured
//! - Drop duplicate addresses (first occurrence wins)

use std::fmt;

use crate::protocol::BackendAddress;

/// Ordered, duplicate-free list of backend addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSet {
    addrs: Vec<BackendAddress>,
}

impl BackendSet {
    pub fn new<I>(addrs: I) -> Self
    where
        I: IntoIterator<Item = BackendAddress>,
    {
        let mut unique: Vec<BackendAddress> = Vec::new();
        for addr in addrs {
            if !unique.contains(&addr) {
                unique.push(addr);
            }
        }
        Self { addrs: unique }
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BackendAddress> {
        self.addrs.get(index)
    }

    pub fn contains(&self, addr: &BackendAddress) -> bool {
        self.addrs.contains(addr)
    }

    /// True when every address in the set appears in `visited`.
    pub fn is_covered_by(&self, visited: &[BackendAddress]) -> bool {
        self.addrs.iter().all(|addr| visited.contains(addr))
    }
}

impl fmt::Display for BackendSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BackendAddress::join_list(&self.addrs))
    }
}
