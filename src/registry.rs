//! Identifiers of live scan jobs, owned by the session.

use std::collections::VecDeque;
use std::fmt;

/// Identity of one scan job within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Identifiers of live jobs, newest first.
///
/// The registry does not own job state; it only records which jobs exist so
/// they can be enumerated and cleaned up. It is touched from the UI context
/// only.
#[derive(Debug, Default)]
pub struct JobRegistry {
    live: VecDeque<JobId>,
    next_id: u64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh identifier; not registered until [`register`](Self::register).
    pub fn allocate_id(&mut self) -> JobId {
        self.next_id += 1;
        JobId(self.next_id)
    }

    /// Prepend `id`. Returns false if it was already live.
    pub fn register(&mut self, id: JobId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.live.push_front(id);
        true
    }

    /// Unlink `id`. Returns false if it was not live.
    pub fn unregister(&mut self, id: JobId) -> bool {
        match self.live.iter().position(|&live| live == id) {
            Some(pos) => {
                self.live.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.live.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = JobId> + '_ {
        self.live.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_prepends_and_counts() {
        let mut registry = JobRegistry::new();
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        assert_ne!(a, b);

        assert!(registry.register(a));
        assert!(registry.register(b));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn duplicate_registration_is_refused() {
        let mut registry = JobRegistry::new();
        let a = registry.allocate_id();
        assert!(registry.register(a));
        assert!(!registry.register(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_unlinks_by_identity() {
        let mut registry = JobRegistry::new();
        let ids: Vec<_> = (0..3).map(|_| registry.allocate_id()).collect();
        for &id in &ids {
            registry.register(id);
        }

        assert!(registry.unregister(ids[1]));
        assert!(!registry.contains(ids[1]));
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![ids[2], ids[0]]);

        assert!(!registry.unregister(ids[1]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn never_goes_negative() {
        let mut registry = JobRegistry::new();
        let id = registry.allocate_id();
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
        assert_eq!(id.to_string(), "job-1");
    }
}
