//! Seen-Address Registry
//!
//! The single dedup point shared by the subscription listener and the
//! reconciliation scanner. `check_and_mark` is synchronous: callers claim an
//! address before any `.await`, so only one path ever proceeds per address.

use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::sync::Mutex;

/// Dedup registry abstraction
///
/// Implementations:
/// - `InMemorySeenRegistry` - process-lifetime set (default)
pub trait SeenRegistry: Send + Sync {
    /// Insert `address` if absent. Returns `true` only for the inserting call.
    fn check_and_mark(&self, address: &Pubkey) -> bool;

    /// Current membership, in no particular order
    fn list(&self) -> Vec<Pubkey>;

    /// Number of registered addresses
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries (lifecycle teardown only)
    fn clear(&self);
}

/// In-memory registry backed by a `HashSet`
#[derive(Debug, Default)]
pub struct InMemorySeenRegistry {
    seen: Mutex<HashSet<Pubkey>>,
}

impl InMemorySeenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn seen(&self) -> std::sync::MutexGuard<'_, HashSet<Pubkey>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SeenRegistry for InMemorySeenRegistry {
    fn check_and_mark(&self, address: &Pubkey) -> bool {
        self.seen().insert(*address)
    }

    fn list(&self) -> Vec<Pubkey> {
        self.seen().iter().copied().collect()
    }

    fn len(&self) -> usize {
        self.seen().len()
    }

    fn clear(&self) {
        self.seen().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_observer_wins() {
        let registry = InMemorySeenRegistry::new();
        let mint = Pubkey::new_unique();

        assert!(registry.check_and_mark(&mint));
        assert!(!registry.check_and_mark(&mint));
        assert!(!registry.check_and_mark(&mint));
        assert_eq!(registry.list(), vec![mint]);
    }

    #[test]
    fn test_clear_resets_membership() {
        let registry = InMemorySeenRegistry::new();
        let mint = Pubkey::new_unique();
        registry.check_and_mark(&mint);
        registry.check_and_mark(&Pubkey::new_unique());
        assert_eq!(registry.len(), 2);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.check_and_mark(&mint));
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let registry = Arc::new(InMemorySeenRegistry::new());
        let mint = Pubkey::new_unique();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.check_and_mark(&mint))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }
}
