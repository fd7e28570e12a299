//! Canonical state owner.
//!
//! # Invariants
//! - Exactly one canonical [`StoreState`] exists and it is never lent out; readers get clones.
//! - Every mutation runs against a working copy and becomes visible only once it completes.
//! - Persistence happens after the swap and its failure never rolls the swap back.
//! - Each committed mutation notifies every subscriber exactly once, after persistence.

use std::convert::Infallible;
use std::fmt;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::domain::StoreState;
use super::migration::{migrate, CURRENT_SCHEMA_VERSION};
use super::seed::seed_state;
use super::storage::StorageMedium;

/// Namespaced key the aggregate is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "recruitment-desk-state-v3";

pub type Listener = Box<dyn FnMut(StoreState) + Send>;

/// Handle returned by [`Store::subscribe`]; pass it back to [`Store::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

pub struct Store<M> {
    medium: M,
    key: String,
    state: StoreState,
    listeners: Vec<(Subscription, Listener)>,
    next_subscription: u64,
}

impl<M> fmt::Debug for Store<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("key", &self.key)
            .field("schema_version", &self.state.schema_version)
            .field("applicants", &self.state.applicants.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<M: StorageMedium> Store<M> {
    /// Reads and migrates persisted state. Read or parse failures fall back to seed data.
    pub fn load(medium: M, key: impl Into<String>) -> Self {
        let key = key.into();
        let raw = match medium.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(%key, error = %err, "persisted state is not valid JSON; seeding");
                    None
                }
            },
            Ok(None) => {
                info!(%key, "no persisted state; seeding");
                None
            }
            Err(err) => {
                warn!(%key, error = %err, "failed to read persisted state; seeding");
                None
            }
        };

        let state = migrate(raw);
        info!(
            %key,
            schema_version = state.schema_version,
            applicants = state.applicants.len(),
            events = state.events.len(),
            "store loaded"
        );
        Self::with_state(medium, key, state)
    }

    /// Builds a store around explicit state without reading or writing the medium.
    pub fn with_state(medium: M, key: impl Into<String>, state: StoreState) -> Self {
        Self {
            medium,
            key: key.into(),
            state,
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Returns an independent deep copy of the canonical state.
    pub fn get_state(&self) -> StoreState {
        self.state.clone()
    }

    /// Borrowed read access for derived views that do not need a snapshot.
    pub fn read<T>(&self, view: impl FnOnce(&StoreState) -> T) -> T {
        view(&self.state)
    }

    /// Applies `mutator` to a working copy, commits it, persists, then notifies subscribers.
    pub fn set_state<T>(&mut self, mutator: impl FnOnce(&mut StoreState) -> T) -> T {
        match self.try_set_state(|state| Ok::<T, Infallible>(mutator(state))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`Store::set_state`], but an `Err` from `mutator` discards the working copy:
    /// nothing is committed, persisted or broadcast.
    pub fn try_set_state<T, E>(
        &mut self,
        mutator: impl FnOnce(&mut StoreState) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut working = self.state.clone();
        let value = mutator(&mut working)?;
        working.schema_version = CURRENT_SCHEMA_VERSION;
        self.commit(working);
        Ok(value)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(StoreState) + Send + 'static) -> Subscription {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((subscription, Box::new(listener)));
        subscription
    }

    /// Returns `false` when the subscription was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drops persisted data and replaces state with a fresh seed. The seed itself is not
    /// written back until the next mutation.
    pub fn reset(&mut self) {
        if let Err(err) = self.medium.remove(&self.key) {
            warn!(key = %self.key, error = %err, "failed to clear persisted state");
        }
        self.state = seed_state(Utc::now());
        info!(key = %self.key, "store reset to seed data");
        self.notify();
    }

    fn commit(&mut self, next: StoreState) {
        self.state = next;
        debug!(key = %self.key, "state committed");
        self.persist();
        self.notify();
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(self.state.clone());
        }
    }

    fn persist(&self) {
        let payload = match serde_json::to_string(&self.state) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to serialize state; not persisted");
                return;
            }
        };
        if let Err(err) = self.medium.set(&self.key, &payload) {
            warn!(key = %self.key, error = %err, "failed to persist state; keeping in-memory change");
        }
    }
}
