//! Reactive, persisted state container.
//!
//! A [`Store`] owns one state value implementing [`Reducer`] and exposes the
//! classic `get_state` / `subscribe` / `dispatch` interface. Stores are plain
//! values owned by the application's composition root and handed to whoever
//! needs them; there is no process-wide instance.
//!
//! # Dispatch Contract
//!
//! 1. The action is applied in full through [`Reducer::reduce`].
//! 2. If the state changed, its snapshot is written through to storage.
//!    Storage failures are logged and otherwise ignored.
//! 3. Every listener is called, in subscription order, with the new state.
//!
//! Actions that leave the state unchanged skip steps 2 and 3, so listeners
//! never observe a half-applied mutation or a spurious notification.
//!
//! # Example
//!
//! ```rust,ignore
//! let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
//! let mut cart = Store::hydrate_or(Arc::clone(&storage), CartState::new(config.currency));
//!
//! cart.subscribe(|state| tracing::info!(items = state.total_items(), "cart changed"));
//! cart.add_item(&product, 2, None);
//! ```

pub mod persist;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::storage::ClientStorage;

pub use persist::PersistError;

/// A state value driven by actions.
pub trait Reducer: Default {
    /// Fixed key the snapshot is stored under.
    const STORAGE_KEY: &'static str;

    /// Snapshot format version. Stored snapshots with another version are
    /// discarded on hydration.
    const VERSION: u32 = 0;

    /// Mutation requests accepted by [`Reducer::reduce`].
    type Action: fmt::Debug;

    /// The persisted subset of the state.
    type Snapshot: Serialize + DeserializeOwned;

    /// Apply an action. Returns `true` if the state changed.
    fn reduce(&mut self, action: Self::Action) -> bool;

    /// Project the state onto its persisted subset.
    fn snapshot(&self) -> Self::Snapshot;

    /// Rebuild a state from a persisted snapshot, re-establishing invariants
    /// the snapshot may have lost.
    fn restore(snapshot: Self::Snapshot) -> Self;
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<S> = Box<dyn FnMut(&S) + Send>;

/// Persisted state container with synchronous change notification.
pub struct Store<S: Reducer> {
    state: S,
    storage: Arc<dyn ClientStorage>,
    listeners: Vec<(SubscriptionId, Listener<S>)>,
    next_subscription: u64,
}

impl<S: Reducer> Store<S> {
    /// Create a store with default state, without reading storage.
    #[must_use]
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self::with_state(S::default(), storage)
    }

    /// Create a store around an existing state value.
    #[must_use]
    pub fn with_state(state: S, storage: Arc<dyn ClientStorage>) -> Self {
        Self {
            state,
            storage,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create a store hydrated from storage.
    ///
    /// Missing, corrupt, or version-mismatched data yields the default state.
    #[must_use]
    pub fn hydrate(storage: Arc<dyn ClientStorage>) -> Self {
        Self::hydrate_or(storage, S::default())
    }

    /// Like [`Store::hydrate`], falling back to `initial` instead of
    /// `S::default()`.
    #[must_use]
    pub fn hydrate_or(storage: Arc<dyn ClientStorage>, initial: S) -> Self {
        let state = match persist::load::<S>(storage.as_ref()) {
            Ok(Some(state)) => {
                tracing::debug!(key = S::STORAGE_KEY, "Hydrated store from storage");
                state
            }
            Ok(None) => initial,
            Err(e) => {
                tracing::warn!(
                    key = S::STORAGE_KEY,
                    error = %e,
                    "Discarding unreadable persisted state"
                );
                initial
            }
        };
        Self::with_state(state, storage)
    }

    /// Strict hydration: missing data yields `initial`, unreadable data is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the [`PersistError`] from reading or decoding the snapshot.
    pub fn try_hydrate_or(
        storage: Arc<dyn ClientStorage>,
        initial: S,
    ) -> Result<Self, PersistError> {
        let state = persist::load::<S>(storage.as_ref())?.unwrap_or(initial);
        Ok(Self::with_state(state, storage))
    }

    /// The current state.
    #[must_use]
    pub fn get_state(&self) -> &S {
        &self.state
    }

    /// Register a listener called after every state change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&S) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() < before
    }

    /// Apply an action, persist, and notify. Returns `true` if the state
    /// changed.
    pub fn dispatch(&mut self, action: S::Action) -> bool {
        tracing::debug!(key = S::STORAGE_KEY, action = ?action, "Dispatching action");

        if !self.state.reduce(action) {
            return false;
        }

        if let Err(e) = persist::save(self.storage.as_ref(), &self.state) {
            tracing::warn!(
                key = S::STORAGE_KEY,
                error = %e,
                "Failed to persist state"
            );
        }

        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
        true
    }

    /// Write the current state to storage, reporting failure.
    ///
    /// `dispatch` writes through as well but only logs storage errors.
    ///
    /// # Errors
    ///
    /// Returns the [`PersistError`] from encoding or writing the snapshot.
    pub fn flush(&self) -> Result<(), PersistError> {
        persist::save(self.storage.as_ref(), &self.state)
    }
}

impl<S: Reducer + fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use serde::Deserialize;

    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    #[derive(Debug, Default, PartialEq)]
    struct Counter {
        value: i64,
    }

    #[derive(Debug)]
    enum CounterAction {
        Add(i64),
    }

    #[derive(Serialize, Deserialize)]
    struct CounterSnapshot {
        value: i64,
    }

    impl Reducer for Counter {
        const STORAGE_KEY: &'static str = "counter-storage";
        type Action = CounterAction;
        type Snapshot = CounterSnapshot;

        fn reduce(&mut self, action: Self::Action) -> bool {
            match action {
                CounterAction::Add(0) => false,
                CounterAction::Add(n) => {
                    self.value += n;
                    true
                }
            }
        }

        fn snapshot(&self) -> Self::Snapshot {
            CounterSnapshot { value: self.value }
        }

        fn restore(snapshot: Self::Snapshot) -> Self {
            Self {
                value: snapshot.value,
            }
        }
    }

    /// Backend whose writes always fail.
    struct BrokenStorage;

    impl ClientStorage for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("broken".to_string()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("broken".to_string()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("broken".to_string()))
        }
    }

    #[test]
    fn test_dispatch_writes_through() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = Store::<Counter>::new(storage.clone());

        assert!(store.dispatch(CounterAction::Add(3)));
        assert_eq!(
            storage.get_item("counter-storage").unwrap().as_deref(),
            Some(r#"{"state":{"value":3},"version":0}"#)
        );
    }

    #[test]
    fn test_hydrate_restores_state() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item("counter-storage", r#"{"state":{"value":7},"version":0}"#)
            .unwrap();

        let store = Store::<Counter>::hydrate(storage);
        assert_eq!(store.get_state().value, 7);
    }

    #[test]
    fn test_hydrate_corrupt_yields_default() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("counter-storage", "{not json").unwrap();

        let store = Store::<Counter>::hydrate(storage);
        assert_eq!(store.get_state(), &Counter::default());
    }

    #[test]
    fn test_hydrate_version_mismatch_yields_default() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item("counter-storage", r#"{"state":{"value":7},"version":3}"#)
            .unwrap();

        let store = Store::<Counter>::hydrate(storage);
        assert_eq!(store.get_state().value, 0);
    }

    #[test]
    fn test_hydrate_unreadable_backend_yields_default() {
        let store = Store::<Counter>::hydrate(Arc::new(BrokenStorage));
        assert_eq!(store.get_state().value, 0);
    }

    #[test]
    fn test_hydrate_or_uses_initial_state() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Store::hydrate_or(storage.clone(), Counter { value: 10 });
        assert_eq!(store.get_state().value, 10);

        storage.set_item("counter-storage", "{not json").unwrap();
        let store = Store::hydrate_or(storage.clone(), Counter { value: 10 });
        assert_eq!(store.get_state().value, 10);

        storage
            .set_item("counter-storage", r#"{"state":{"value":7},"version":0}"#)
            .unwrap();
        let store = Store::hydrate_or(storage, Counter { value: 10 });
        assert_eq!(store.get_state().value, 7);
    }

    #[test]
    fn test_try_hydrate_or_reports_corruption() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Store::try_hydrate_or(storage.clone(), Counter { value: 10 }).unwrap();
        assert_eq!(store.get_state().value, 10);

        storage.set_item("counter-storage", "{not json").unwrap();
        let result = Store::try_hydrate_or(storage, Counter { value: 10 });
        assert!(matches!(result, Err(PersistError::Corrupt(_))));
    }

    #[test]
    fn test_listeners_see_applied_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = Store::<Counter>::new(Arc::new(MemoryStorage::new()));

        let sink = Arc::clone(&seen);
        store.subscribe(move |state: &Counter| sink.lock().unwrap().push(state.value));

        store.dispatch(CounterAction::Add(2));
        store.dispatch(CounterAction::Add(5));

        assert_eq!(*seen.lock().unwrap(), vec![2, 7]);
    }

    #[test]
    fn test_noop_action_does_not_notify_or_persist() {
        let calls = Arc::new(AtomicUsize::new(0));
        let storage = Arc::new(MemoryStorage::new());
        let mut store = Store::<Counter>::new(storage.clone());

        let counter = Arc::clone(&calls);
        store.subscribe(move |_: &Counter| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!store.dispatch(CounterAction::Add(0)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(storage.get_item("counter-storage").unwrap().is_none());
    }

    #[test]
    fn test_unsubscribe() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut store = Store::<Counter>::new(Arc::new(MemoryStorage::new()));

        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_: &Counter| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(CounterAction::Add(1));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(CounterAction::Add(1));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_storage_failure_is_swallowed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut store = Store::<Counter>::new(Arc::new(BrokenStorage));

        let counter = Arc::clone(&calls);
        store.subscribe(move |_: &Counter| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.dispatch(CounterAction::Add(4)));
        assert_eq!(store.get_state().value, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_flush_reports_storage_failure() {
        let mut store = Store::<Counter>::new(Arc::new(BrokenStorage));
        store.dispatch(CounterAction::Add(4));

        assert!(matches!(store.flush(), Err(PersistError::Storage(_))));
    }

    #[test]
    fn test_flush_writes_current_state() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Store::with_state(Counter { value: 9 }, storage.clone());
        assert!(storage.get_item("counter-storage").unwrap().is_none());

        store.flush().unwrap();
        assert_eq!(
            storage.get_item("counter-storage").unwrap().as_deref(),
            Some(r#"{"state":{"value":9},"version":0}"#)
        );
    }
}
