//! Per-run port allocation.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{ManifestError, Result};

/// Assigns concrete port numbers to `(service, logical port)` pairs.
///
/// Every manifest owns one allocator; runs never share allocation state. All
/// assignments go through a single lock, so concurrent callers cannot land two
/// pairs on the same number.
#[derive(Debug, Default)]
pub struct PortAllocator {
    state: Mutex<AllocatorState>,
}

#[derive(Debug, Default)]
struct AllocatorState {
    assigned: HashMap<(String, String), u16>,
    used: BTreeSet<u16>,
}

impl PortAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the port for `(service, name)`, assigning one on first use.
    ///
    /// A new assignment starts at `requested` and advances past every number
    /// already handed out in this run. Repeated calls for the same pair return
    /// the first assignment regardless of `requested`.
    pub fn allocate(&self, service: &str, name: &str, requested: u16) -> Result<u16> {
        let mut state = self.state.lock();
        let key = (service.to_string(), name.to_string());
        if let Some(&port) = state.assigned.get(&key) {
            return Ok(port);
        }

        let mut candidate = requested;
        while state.used.contains(&candidate) {
            candidate = candidate.checked_add(1).ok_or(ManifestError::PortsExhausted(requested))?;
        }

        if candidate != requested {
            debug!(service, port = name, requested, assigned = candidate, "port already taken");
        }
        state.used.insert(candidate);
        state.assigned.insert(key, candidate);
        Ok(candidate)
    }

    /// Drops every assignment held by `service` and frees its port numbers.
    ///
    /// Returns how many assignments were dropped.
    pub fn release(&self, service: &str) -> usize {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let before = state.assigned.len();
        state.assigned.retain(|(owner, _), port| {
            let keep = owner != service;
            if !keep {
                state.used.remove(port);
            }
            keep
        });
        let released = before - state.assigned.len();
        if released > 0 {
            debug!(service, released, "released ports");
        }
        released
    }

    /// Returns the port previously assigned to `(service, name)`.
    pub fn get(&self, service: &str, name: &str) -> Option<u16> {
        self.state.lock().assigned.get(&(service.to_string(), name.to_string())).copied()
    }

    /// Number of assigned pairs.
    pub fn len(&self) -> usize {
        self.state.lock().assigned.len()
    }

    /// Returns true when nothing has been assigned yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc, thread};

    use super::*;

    #[test]
    fn test_allocate_is_idempotent() {
        let allocator = PortAllocator::new();
        let first = allocator.allocate("el", "http", 8545).unwrap();
        let second = allocator.allocate("el", "http", 9000).unwrap();
        assert_eq!(first, 8545);
        assert_eq!(second, first);
        assert_eq!(allocator.len(), 1);
    }

    #[test]
    fn test_allocate_advances_past_taken_ports() {
        let allocator = PortAllocator::new();
        assert_eq!(allocator.allocate("el", "http", 8545).unwrap(), 8545);
        assert_eq!(allocator.allocate("op-geth", "http", 8545).unwrap(), 8546);
        assert_eq!(allocator.allocate("op-geth", "ws", 8546).unwrap(), 8547);
        assert_eq!(allocator.get("op-geth", "ws"), Some(8547));
        assert_eq!(allocator.get("op-geth", "metrics"), None);
    }

    #[test]
    fn test_allocate_exhausted() {
        let allocator = PortAllocator::new();
        allocator.allocate("a", "p", u16::MAX).unwrap();
        assert!(matches!(
            allocator.allocate("b", "p", u16::MAX),
            Err(ManifestError::PortsExhausted(u16::MAX))
        ));
    }

    #[test]
    fn test_release_frees_only_that_service() {
        let allocator = PortAllocator::new();
        allocator.allocate("el", "http", 8545).unwrap();
        allocator.allocate("proxy", "http", 8888).unwrap();
        allocator.allocate("proxy", "admin", 2019).unwrap();

        assert_eq!(allocator.release("proxy"), 2);
        assert_eq!(allocator.release("proxy"), 0);
        assert_eq!(allocator.len(), 1);
        assert_eq!(allocator.get("proxy", "http"), None);
        assert_eq!(allocator.allocate("late", "http", 8888).unwrap(), 8888);
        assert_eq!(allocator.allocate("late", "rpc", 8545).unwrap(), 8546);
    }

    #[test]
    fn test_concurrent_allocations_never_collide() {
        let allocator = Arc::new(PortAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let allocator = Arc::clone(&allocator);
                thread::spawn(move || {
                    (0..16)
                        .map(|j| allocator.allocate(&format!("svc-{i}"), &format!("p{j}"), 30000))
                        .collect::<Result<Vec<_>>>()
                        .unwrap()
                })
            })
            .collect();

        let ports: Vec<u16> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        let unique: HashSet<_> = ports.iter().collect();
        assert_eq!(ports.len(), 128);
        assert_eq!(unique.len(), ports.len());
    }

    #[test]
    fn test_separate_runs_do_not_share_state() {
        let a = PortAllocator::new();
        let b = PortAllocator::new();
        assert_eq!(a.allocate("el", "http", 8545).unwrap(), 8545);
        assert_eq!(b.allocate("el", "http", 8545).unwrap(), 8545);
    }
}
