use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::features::rate_limits::models::{RateLimitRecord, RecordKey};
use crate::shared::clock::Clock;

/// Process-wide, in-memory map of rate-limit counters.
///
/// Counters are not persisted and are not shared between instances. Every
/// read-modify-write happens under a single mutex so concurrent requests from
/// the same identifier cannot both observe a stale count.
pub struct RateLimitStore {
    records: Mutex<HashMap<RecordKey, RateLimitRecord>>,
    clock: Arc<dyn Clock>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimitStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
            sweeper: Mutex::new(None),
        }
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<RecordKey, RateLimitRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the entry for `key` while holding the store lock.
    ///
    /// `f` receives the clock reading taken for this transaction.
    pub fn with_entry<R>(
        &self,
        key: RecordKey,
        f: impl FnOnce(Entry<'_, RecordKey, RateLimitRecord>, DateTime<Utc>) -> R,
    ) -> R {
        let now = self.clock.now();
        let mut records = self.records();
        f(records.entry(key), now)
    }

    /// Snapshot of a record, without touching it
    pub fn get(&self, key: &RecordKey) -> Option<RateLimitRecord> {
        self.records().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Remove every record whose window has already closed.
    ///
    /// Returns the number of evicted records.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| record.is_live(now));
        before - records.len()
    }

    /// Spawn the periodic sweep on the current tokio runtime.
    ///
    /// The task only holds a weak reference, so it also ends once the store is dropped.
    pub fn start(self: &Arc<Self>, period: Duration) {
        if period.is_zero() {
            tracing::warn!("Rate limit sweep not started: period must be greater than zero");
            return;
        }

        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.is_some() {
            tracing::warn!("Rate limit sweep already running");
            return;
        }

        let store = Arc::downgrade(self);
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(store) = store.upgrade() else {
                    break;
                };

                let evicted = store.sweep();
                tracing::debug!(
                    "Rate limit sweep evicted {} record(s), {} remaining",
                    evicted,
                    store.len()
                );
            }
        }));

        tracing::info!("Rate limit sweep started (every {}s)", period.as_secs());
    }

    /// Cancel the periodic sweep. Safe to call more than once.
    pub fn stop(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("Rate limit sweep stopped");
        }
    }

    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for RateLimitStore {
    fn drop(&mut self) {
        self.stop();
    }
}
