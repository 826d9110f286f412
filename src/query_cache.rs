//! Keyed cache of server-derived state.
//!
//! Fetches run on worker threads and report back over a channel; nothing
//! touches cache state until the owner calls [`QueryCache::poll`], so every
//! state change and observer callback happens on the owning thread.
//!
//! Each fetch is tagged with a generation number. A completion is applied only
//! when its generation is still the entry's outstanding one, which drops
//! responses that were superseded by an invalidation, cancelled by the last
//! subscriber leaving, or belong to a removed key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{BlogError, Result};

pub type FetchFn<V> = Arc<dyn Fn() -> Result<V> + Send + Sync>;

type Listener<V> = Box<dyn FnMut(&QueryState<V>)>;

/// Freshness and retry policy for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Age after which data is refetched on the next subscription.
    pub stale_time: Duration,
    /// How long an unobserved entry is retained before being collected.
    pub gc_time: Duration,
    /// Automatic retries after a transport failure.
    pub retry: u32,
    pub retry_delay: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            gc_time: Duration::from_secs(5 * 60),
            retry: 1,
            retry_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No data and no error yet.
    Pending,
    Success,
    Error,
}

/// Immutable snapshot of one cache entry.
#[derive(Debug)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    pub data: Option<Arc<V>>,
    pub error: Option<BlogError>,
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
        }
    }
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Pending,
            data: None,
            error: None,
            is_fetching: false,
            is_stale: true,
        }
    }
}

impl<V> QueryState<V> {
    /// First load in progress: nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.is_fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Handle returned by [`QueryCache::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription<K> {
    id: SubscriptionId,
    key: K,
}

impl<K> Subscription<K> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn key(&self) -> &K {
        &self.key
    }
}

/// Cache side effect declared by a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEffect<K> {
    Invalidate(K),
    Remove(K),
}

struct Subscriber<V> {
    id: SubscriptionId,
    listener: Option<Listener<V>>,
}

struct CacheEntry<V> {
    fetch: FetchFn<V>,
    options: QueryOptions,
    data: Option<Arc<V>>,
    error: Option<BlogError>,
    data_updated_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<u64>,
    subscribers: Vec<Subscriber<V>>,
    unobserved_since: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(fetch: FetchFn<V>, options: QueryOptions) -> Self {
        Self {
            fetch,
            options,
            data: None,
            error: None,
            data_updated_at: None,
            invalidated: false,
            in_flight: None,
            subscribers: Vec::new(),
            unobserved_since: None,
        }
    }

    /// Data is stale once it is strictly older than `stale_time`.
    fn is_stale(&self, now: Instant) -> bool {
        match self.data_updated_at {
            Some(updated) => {
                self.invalidated || now.saturating_duration_since(updated) > self.options.stale_time
            }
            None => true,
        }
    }

    fn status(&self) -> QueryStatus {
        if self.error.is_some() {
            QueryStatus::Error
        } else if self.data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Pending
        }
    }

    fn snapshot(&self, now: Instant) -> QueryState<V> {
        QueryState {
            status: self.status(),
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.in_flight.is_some(),
            is_stale: self.is_stale(now),
        }
    }

    fn notify(&mut self, now: Instant) {
        let snapshot = self.snapshot(now);
        for subscriber in &mut self.subscribers {
            if let Some(listener) = subscriber.listener.as_mut() {
                listener(&snapshot);
            }
        }
    }
}

struct Completion<K, V> {
    key: K,
    generation: u64,
    result: Result<V>,
}

pub struct QueryCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    defaults: QueryOptions,
    next_subscription: u64,
    next_generation: u64,
    tx: Sender<Completion<K, V>>,
    rx: Receiver<Completion<K, V>>,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(defaults: QueryOptions) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            entries: HashMap::new(),
            defaults,
            next_subscription: 0,
            next_generation: 0,
            tx,
            rx,
        }
    }

    pub fn defaults(&self) -> QueryOptions {
        self.defaults
    }

    /// Registers interest in `key`, fetching it when there is no fresh data
    /// and no fetch already outstanding.
    pub fn subscribe<F>(&mut self, key: K, options: QueryOptions, fetch: F) -> Subscription<K>
    where
        F: Fn() -> Result<V> + Send + Sync + 'static,
    {
        self.add_subscriber(key, options, Arc::new(fetch), None)
    }

    /// Like [`subscribe`](Self::subscribe), with a callback receiving a
    /// snapshot every time the entry changes.
    pub fn subscribe_with<F, L>(
        &mut self,
        key: K,
        options: QueryOptions,
        fetch: F,
        listener: L,
    ) -> Subscription<K>
    where
        F: Fn() -> Result<V> + Send + Sync + 'static,
        L: FnMut(&QueryState<V>) + 'static,
    {
        self.add_subscriber(key, options, Arc::new(fetch), Some(Box::new(listener)))
    }

    fn add_subscriber(
        &mut self,
        key: K,
        options: QueryOptions,
        fetch: FetchFn<V>,
        listener: Option<Listener<V>>,
    ) -> Subscription<K> {
        let now = Instant::now();
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(fetch.clone(), options));
        // The most recent subscriber's fetch and policy win
        entry.fetch = fetch;
        entry.options = options;
        entry.unobserved_since = None;
        entry.subscribers.push(Subscriber { id, listener });

        let needs_fetch = entry.in_flight.is_none() && entry.is_stale(now);
        debug!(?key, subscribers = entry.subscribers.len(), needs_fetch, "subscribed");

        if needs_fetch {
            self.start_fetch(&key);
        }

        Subscription { id, key }
    }

    /// Drops one subscriber. When it was the last, any outstanding fetch is
    /// abandoned and the retention clock starts.
    pub fn unsubscribe(&mut self, subscription: &Subscription<K>) {
        let Some(entry) = self.entries.get_mut(&subscription.key) else {
            return;
        };
        entry.subscribers.retain(|subscriber| subscriber.id != subscription.id);

        if entry.subscribers.is_empty() {
            entry.unobserved_since = Some(Instant::now());
            if entry.in_flight.take().is_some() {
                debug!(key = ?subscription.key, "last subscriber left; abandoning fetch");
            }
        }
    }

    pub fn state(&self, key: &K) -> QueryState<V> {
        self.entries
            .get(key)
            .map(|entry| entry.snapshot(Instant::now()))
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn subscriber_count(&self, key: &K) -> usize {
        self.entries
            .get(key)
            .map_or(0, |entry| entry.subscribers.len())
    }

    /// True while any fetch is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.entries.values().any(|entry| entry.in_flight.is_some())
    }

    /// Marks `key` stale. Active entries refetch at once, replacing any fetch
    /// that is still outstanding; inactive ones refetch on next subscription.
    pub fn invalidate(&mut self, key: &K) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        entry.invalidated = true;

        if entry.subscribers.is_empty() {
            debug!(?key, "invalidated inactive entry");
        } else {
            debug!(?key, "invalidated active entry; refetching");
            self.start_fetch(key);
        }
    }

    /// Purges `key` entirely. Late responses for it are discarded.
    pub fn remove(&mut self, key: &K) {
        if self.entries.remove(key).is_some() {
            debug!(?key, "removed entry");
        }
    }

    pub fn apply_effects(&mut self, effects: impl IntoIterator<Item = CacheEffect<K>>) {
        for effect in effects {
            match effect {
                CacheEffect::Invalidate(key) => self.invalidate(&key),
                CacheEffect::Remove(key) => self.remove(&key),
            }
        }
    }

    /// Runs a write on the calling thread and, if it succeeds, applies the
    /// cache effects it declares.
    pub fn mutate<T, W, E>(&mut self, write: W, effects: E) -> Result<T>
    where
        W: FnOnce() -> Result<T>,
        E: FnOnce(&T) -> Vec<CacheEffect<K>>,
    {
        let output = write()?;
        let effects = effects(&output);
        self.apply_effects(effects);
        Ok(output)
    }

    /// Applies every completion that has already arrived and collects expired
    /// entries. Returns the number of completions applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        self.collect_garbage(Instant::now());
        applied
    }

    /// Waits up to `timeout` for at least one completion, then drains like
    /// [`poll`](Self::poll).
    pub fn poll_blocking(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                let first = usize::from(self.apply(completion));
                first + self.poll()
            }
            Err(_) => self.poll(),
        }
    }

    /// Polls until no fetch is outstanding or `timeout` elapses. Returns
    /// whether the cache went idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_fetching() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.poll_blocking(deadline - now);
        }
        true
    }

    fn start_fetch(&mut self, key: &K) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        entry.in_flight = Some(generation);
        entry.notify(Instant::now());

        let fetch = entry.fetch.clone();
        let options = entry.options;
        let tx = self.tx.clone();
        let key = key.clone();

        thread::spawn(move || {
            let result = fetch_with_retry(&key, fetch.as_ref(), options);
            // The cache may have been dropped; nothing left to report to
            let _ = tx.send(Completion {
                key,
                generation,
                result,
            });
        });
    }

    fn apply(&mut self, completion: Completion<K, V>) -> bool {
        let Completion {
            key,
            generation,
            result,
        } = completion;

        let Some(entry) = self.entries.get_mut(&key) else {
            debug!(?key, generation, "discarding response for removed key");
            return false;
        };
        if entry.in_flight != Some(generation) {
            debug!(?key, generation, "discarding superseded response");
            return false;
        }
        entry.in_flight = None;

        let now = Instant::now();
        match result {
            Ok(value) => {
                entry.data = Some(Arc::new(value));
                entry.error = None;
                entry.data_updated_at = Some(now);
                entry.invalidated = false;
            }
            Err(err) => {
                warn!(?key, error = %err, "query failed");
                entry.error = Some(err);
            }
        }
        entry.notify(now);
        true
    }

    fn collect_garbage(&mut self, now: Instant) {
        self.entries.retain(|key, entry| {
            let expired = entry.subscribers.is_empty()
                && entry.in_flight.is_none()
                && entry
                    .unobserved_since
                    .is_some_and(|since| now.saturating_duration_since(since) >= entry.options.gc_time);
            if expired {
                debug!(?key, "collected unobserved entry");
            }
            !expired
        });
    }
}

fn fetch_with_retry<K, V>(
    key: &K,
    fetch: &(dyn Fn() -> Result<V> + Send + Sync),
    options: QueryOptions,
) -> Result<V>
where
    K: std::fmt::Debug,
{
    let mut attempt = 0;
    loop {
        match fetch() {
            Err(err) if err.is_transport() && attempt < options.retry => {
                attempt += 1;
                warn!(?key, attempt, error = %err, "transport failure; retrying");
                thread::sleep(options.retry_delay);
            }
            result => return result,
        }
    }
}
