//! Round-robin cursor over a replaceable backend set.

use std::sync::Mutex;

use crate::load_balancer::backend_set::BackendSet;
use crate::protocol::BackendAddress;

#[derive(Debug, Default)]
struct DispatchState {
    backends: BackendSet,
    cursor: usize,
}

/// Round-robin selector.
///
/// The backend set and the cursor are guarded together, so a pick always
/// indexes the set it was computed against. The lock is never held across
/// I/O.
#[derive(Debug, Default)]
pub struct RoundRobin {
    state: Mutex<DispatchState>,
}

impl RoundRobin {
    pub fn new(backends: BackendSet) -> Self {
        Self {
            state: Mutex::new(DispatchState {
                backends,
                cursor: 0,
            }),
        }
    }

    /// Replace the whole set and restart the rotation at its first backend.
    /// Returns the set that was replaced.
    pub fn replace(&self, backends: BackendSet) -> BackendSet {
        let mut state = self.state.lock().expect("dispatch state mutex poisoned");
        state.cursor = 0;
        std::mem::replace(&mut state.backends, backends)
    }

    /// Copy of the current set.
    pub fn backends(&self) -> BackendSet {
        self.state
            .lock()
            .expect("dispatch state mutex poisoned")
            .backends
            .clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("dispatch state mutex poisoned").backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.state.lock().expect("dispatch state mutex poisoned").cursor
    }

    /// Return the backend under the cursor and advance it, wrapping.
    pub fn next_server(&self) -> Option<BackendAddress> {
        let mut state = self.state.lock().expect("dispatch state mutex poisoned");
        let len = state.backends.len();
        if len == 0 {
            return None;
        }
        let index = state.cursor % len;
        let addr = state.backends.get(index).cloned();
        state.cursor = (index + 1) % len;
        addr
    }

    /// Start a scan that visits each backend at most once.
    pub fn scan(&self) -> Scan<'_> {
        Scan {
            selector: self,
            steps_left: 2 * self.len(),
            visited: Vec::new(),
        }
    }

    /// True when every backend of the current set is in `visited`.
    fn covered_by(&self, visited: &[BackendAddress]) -> bool {
        self.state
            .lock()
            .expect("dispatch state mutex poisoned")
            .backends
            .is_covered_by(visited)
    }
}

/// One pass over the backend set, starting at the cursor.
///
/// Every step advances the shared cursor. A backend already visited in
/// this pass is skipped, so concurrent scans stepping the same cursor do
/// not cut each other short. The pass ends once every backend of the
/// current set has been handed out, or after twice the starting set size
/// in steps.
#[derive(Debug)]
pub struct Scan<'a> {
    selector: &'a RoundRobin,
    steps_left: usize,
    visited: Vec<BackendAddress>,
}

impl Scan<'_> {
    /// Backends handed out so far.
    pub fn visited(&self) -> &[BackendAddress] {
        &self.visited
    }
}

impl Iterator for Scan<'_> {
    type Item = BackendAddress;

    fn next(&mut self) -> Option<Self::Item> {
        while self.steps_left > 0 && !self.selector.covered_by(&self.visited) {
            self.steps_left -= 1;
            let addr = self.selector.next_server()?;
            if self.visited.contains(&addr) {
                continue;
            }
            self.visited.push(addr.clone());
            return Some(addr);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(list: &str) -> BackendSet {
        BackendSet::new(BackendAddress::parse_list(list).unwrap())
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new(set("127.0.0.1:8080,127.0.0.1:8081"));

        let s1 = lb.next_server().unwrap();
        assert_eq!(s1.port, 8080);

        let s2 = lb.next_server().unwrap();
        assert_eq!(s2.port, 8081);

        let s3 = lb.next_server().unwrap();
        assert_eq!(s3.port, 8080);
    }

    #[test]
    fn empty_set_yields_nothing() {
        let lb = RoundRobin::default();
        assert!(lb.next_server().is_none());
        assert_eq!(lb.scan().count(), 0);
    }

    #[test]
    fn cursor_stays_in_range() {
        let lb = RoundRobin::new(set("a:1,b:2,c:3"));
        for _ in 0..10 {
            lb.next_server();
            assert!(lb.cursor() < lb.len());
        }
        lb.replace(set("d:4"));
        assert_eq!(lb.cursor(), 0);
        assert_eq!(lb.next_server().unwrap(), BackendAddress::new("d", 4));
        assert_eq!(lb.cursor(), 0);
    }

    #[test]
    fn scan_visits_each_backend_once_from_cursor() {
        let lb = RoundRobin::new(set("a:1,b:2,c:3"));
        lb.next_server();

        let order: Vec<u16> = lb.scan().map(|a| a.port).collect();
        assert_eq!(order, vec![2, 3, 1]);
        // A full pass brings the cursor back where it started.
        assert_eq!(lb.cursor(), 1);
    }

    #[test]
    fn abandoned_scan_leaves_cursor_after_chosen_backend() {
        let lb = RoundRobin::new(set("a:1,b:2,c:3"));
        let mut scan = lb.scan();
        assert_eq!(scan.next().unwrap().port, 1);
        assert_eq!(scan.next().unwrap().port, 2);
        drop(scan);
        assert_eq!(lb.next_server().unwrap().port, 3);
    }

    #[test]
    fn replacement_mid_scan_is_seen_by_later_steps() {
        let lb = RoundRobin::new(set("a:1,b:2"));
        let mut scan = lb.scan();
        assert_eq!(scan.next().unwrap().port, 1);
        lb.replace(set("x:9,y:8"));
        assert_eq!(scan.next().unwrap().port, 9);
        assert_eq!(scan.next().unwrap().port, 8);
        assert!(scan.next().is_none());
    }

    #[test]
    fn interleaved_scans_each_reach_every_backend() {
        let lb = RoundRobin::new(set("a:1,b:2"));
        let mut first = lb.scan();
        let mut second = lb.scan();

        assert_eq!(first.next().unwrap().port, 1);
        assert_eq!(second.next().unwrap().port, 2);
        assert_eq!(first.next().unwrap().port, 2);
        assert!(first.next().is_none());
        assert_eq!(second.next().unwrap().port, 1);
        assert!(second.next().is_none());
        assert_eq!(first.visited().len(), 2);
    }

    #[test]
    fn replace_returns_previous_set() {
        let lb = RoundRobin::new(set("a:1"));
        let old = lb.replace(set("b:2,c:3"));
        assert_eq!(old.to_string(), "a:1");
        assert_eq!(lb.backends().to_string(), "b:2,c:3");
    }
}
