use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::backend::ScanPathResponse;
use crate::models::category::FileCategory;
use crate::models::scan::{Role, RoleView, ScanOutcome, ScanPhase, ScanSnapshot};
use crate::scope_path;
use crate::services::backend_client::Backend;

/// Bound for the quick first count.
pub const FAST_LIMIT: u64 = 5_000;
pub const CACHE_TTL: Duration = Duration::from_millis(15_000);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanCacheKey {
    pub role: Role,
    pub category: FileCategory,
    pub path: String,
}

impl ScanCacheKey {
    pub fn new(role: Role, category: FileCategory, path: &str) -> Self {
        Self {
            role,
            category,
            path: scope_path::normalize(path),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ScanCacheEntry {
    outcome: ScanOutcome,
    stored_at: Instant,
}

/// Last known answers per `role:category:path`, trusted only within the TTL.
#[derive(Debug)]
pub struct ScanCache {
    entries: HashMap<ScanCacheKey, ScanCacheEntry>,
    ttl: Duration,
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

impl ScanCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn lookup(&self, key: &ScanCacheKey, now: Instant) -> Option<ScanOutcome> {
        self.entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl)
            .map(|entry| entry.outcome)
    }

    pub fn store(&mut self, key: ScanCacheKey, outcome: ScanOutcome, now: Instant) {
        self.entries.insert(
            key,
            ScanCacheEntry {
                outcome,
                stored_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, key: &ScanCacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// At most one live request per `(role, phase)`; a newer one cancels the older.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    live: HashMap<(Role, ScanPhase), InFlight>,
    next_generation: u64,
}

impl InFlightRegistry {
    pub fn begin(&mut self, role: Role, phase: ScanPhase) -> (u64, CancellationToken) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let token = CancellationToken::new();
        if let Some(previous) = self.live.insert(
            (role, phase),
            InFlight {
                generation,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
        }
        (generation, token)
    }

    pub fn is_current(&self, role: Role, phase: ScanPhase, generation: u64) -> bool {
        self.live
            .get(&(role, phase))
            .is_some_and(|in_flight| in_flight.generation == generation)
    }

    pub fn finish(&mut self, role: Role, phase: ScanPhase, generation: u64) {
        if self.is_current(role, phase, generation) {
            self.live.remove(&(role, phase));
        }
    }

    pub fn cancel_role(&mut self, role: Role) {
        for phase in [ScanPhase::Fast, ScanPhase::Full] {
            if let Some(in_flight) = self.live.remove(&(role, phase)) {
                in_flight.token.cancel();
            }
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, in_flight) in self.live.drain() {
            in_flight.token.cancel();
        }
    }
}

/// Inputs to [`ScanStore::apply`]. Plain data so resolutions can arrive in any order.
#[derive(Debug)]
pub enum ScanEvent {
    Targeted {
        role: Role,
        path: String,
        category: FileCategory,
        now: Instant,
    },
    Cleared(Role),
    Resolved {
        role: Role,
        phase: ScanPhase,
        generation: u64,
        path: String,
        category: FileCategory,
        result: Result<ScanPathResponse, AppError>,
        now: Instant,
    },
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanApplied {
    Committed(ScanOutcome),
    Placeholder(ScanOutcome),
    Unchanged,
    Dropped,
}

#[derive(Debug, Default)]
pub struct ScanStore {
    cache: ScanCache,
    registry: InFlightRegistry,
    snapshot: ScanSnapshot,
}

impl ScanStore {
    pub fn new(cache: ScanCache, registry: InFlightRegistry) -> Self {
        Self {
            cache,
            registry,
            snapshot: ScanSnapshot::default(),
        }
    }

    pub fn apply(&mut self, event: ScanEvent) -> ScanApplied {
        match event {
            ScanEvent::Targeted {
                role,
                path,
                category,
                now,
            } => {
                let key = ScanCacheKey::new(role, category, &path);
                let cached = self.cache.lookup(&key, now);
                let view = self.snapshot.view_mut(role);
                view.path = path;
                view.category = category;
                match cached {
                    Some(outcome) => {
                        view.count = outcome.count;
                        view.exists = outcome.exists;
                        view.refining = outcome.truncated;
                        view.scanning = false;
                        ScanApplied::Placeholder(outcome)
                    }
                    None => {
                        // Nothing known about this path yet; never show the old path's count.
                        view.count = 0;
                        view.exists = true;
                        view.refining = false;
                        view.scanning = true;
                        ScanApplied::Unchanged
                    }
                }
            }
            ScanEvent::Cleared(role) => {
                self.registry.cancel_role(role);
                let view = self.snapshot.view_mut(role);
                *view = RoleView {
                    category: view.category,
                    ..RoleView::default()
                };
                ScanApplied::Committed(ScanOutcome::EMPTY_PATH)
            }
            ScanEvent::Resolved {
                role,
                phase,
                generation,
                path,
                category,
                result,
                now,
            } => self.resolve(role, phase, generation, path, category, result, now),
            ScanEvent::Reset => {
                self.registry.cancel_all();
                self.cache.clear();
                self.snapshot = ScanSnapshot::default();
                ScanApplied::Unchanged
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve(
        &mut self,
        role: Role,
        phase: ScanPhase,
        generation: u64,
        path: String,
        category: FileCategory,
        result: Result<ScanPathResponse, AppError>,
        now: Instant,
    ) -> ScanApplied {
        if !self.registry.is_current(role, phase, generation) {
            debug!(%role, %phase, generation, "dropping superseded scan result");
            return ScanApplied::Dropped;
        }
        self.registry.finish(role, phase, generation);

        if matches!(&result, Err(err) if err.is_cancelled()) {
            return ScanApplied::Dropped;
        }

        let view = self.snapshot.view_mut(role);
        if scope_path::normalize(&view.path) != scope_path::normalize(&path)
            || view.category != category
        {
            debug!(%role, %phase, path = %path, current = %view.path, "dropping scan for stale path");
            return ScanApplied::Dropped;
        }

        match result {
            Ok(response) => {
                let outcome = ScanOutcome {
                    count: response.count,
                    exists: response.exists,
                    truncated: phase == ScanPhase::Fast && response.truncated,
                };
                view.count = outcome.count;
                view.exists = outcome.exists;
                view.refining = outcome.truncated;
                view.scanning = false;
                self.cache
                    .store(ScanCacheKey::new(role, category, &path), outcome, now);
                ScanApplied::Committed(outcome)
            }
            Err(err) => {
                warn!(%role, %phase, path = %path, error = %err, "scan failed");
                view.count = 0;
                view.exists = false;
                view.refining = false;
                view.scanning = false;
                ScanApplied::Committed(ScanOutcome::UNREACHABLE)
            }
        }
    }

    pub fn snapshot(&self) -> &ScanSnapshot {
        &self.snapshot
    }

    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    pub fn registry_mut(&mut self) -> &mut InFlightRegistry {
        &mut self.registry
    }
}

/// Two-phase, cached, cancellable directory counts for the source and target roles.
#[derive(Clone)]
pub struct ScanCoordinator {
    backend: Arc<dyn Backend>,
    store: Arc<Mutex<ScanStore>>,
    updates: Arc<watch::Sender<ScanSnapshot>>,
    refinements: Arc<Mutex<HashMap<Role, JoinHandle<()>>>>,
}

impl ScanCoordinator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_stores(backend, ScanCache::default(), InFlightRegistry::default())
    }

    pub fn with_stores(
        backend: Arc<dyn Backend>,
        cache: ScanCache,
        registry: InFlightRegistry,
    ) -> Self {
        let (updates, _) = watch::channel(ScanSnapshot::default());
        Self {
            backend,
            store: Arc::new(Mutex::new(ScanStore::new(cache, registry))),
            updates: Arc::new(updates),
            refinements: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        self.lock().snapshot.clone()
    }

    /// Fast bounded count, followed by a background full count when truncated.
    /// Returns `None` when the answer was superseded before it could be shown.
    pub async fn scan(
        &self,
        role: Role,
        path: &str,
        category: FileCategory,
        limit: Option<u64>,
    ) -> Option<ScanOutcome> {
        if path.trim().is_empty() {
            self.dispatch(ScanEvent::Cleared(role));
            return Some(ScanOutcome::EMPTY_PATH);
        }

        let (generation, token) = {
            let mut store = self.lock();
            store.apply(ScanEvent::Targeted {
                role,
                path: path.to_string(),
                category,
                now: Instant::now(),
            });
            let started = store.registry.begin(role, ScanPhase::Fast);
            self.updates.send_replace(store.snapshot.clone());
            started
        };
        debug!(%role, path, %category, generation, "fast scan started");

        let bound = limit.unwrap_or(FAST_LIMIT);
        let result = self.request(&token, path, category, Some(bound)).await;
        let applied = self.dispatch(ScanEvent::Resolved {
            role,
            phase: ScanPhase::Fast,
            generation,
            path: path.to_string(),
            category,
            result,
            now: Instant::now(),
        });

        match applied {
            ScanApplied::Committed(outcome) => {
                if outcome.truncated {
                    self.spawn_full(role, path.to_string(), category);
                }
                Some(outcome)
            }
            _ => None,
        }
    }

    /// Drops the cached answer for this key and scans again.
    pub async fn refresh(
        &self,
        role: Role,
        path: &str,
        category: FileCategory,
        limit: Option<u64>,
    ) -> Option<ScanOutcome> {
        self.invalidate(role, path, category);
        self.scan(role, path, category, limit).await
    }

    pub fn invalidate(&self, role: Role, path: &str, category: FileCategory) {
        self.lock()
            .cache
            .invalidate(&ScanCacheKey::new(role, category, path));
    }

    /// Cancels everything in flight and forgets all cached answers.
    pub fn reset(&self) {
        self.dispatch(ScanEvent::Reset);
        let mut refinements = self
            .refinements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (_, handle) in refinements.drain() {
            handle.abort();
        }
    }

    /// Waits for the background full scan of `role`, if one was started.
    pub async fn settle(&self, role: Role) {
        let handle = self
            .refinements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&role);
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn spawn_full(&self, role: Role, path: String, category: FileCategory) {
        let (generation, token) = self.lock().registry.begin(role, ScanPhase::Full);
        let this = self.clone();
        let handle = tokio::spawn(async move {
            debug!(%role, path = %path, generation, "full scan started");
            let result = this.request(&token, &path, category, None).await;
            this.dispatch(ScanEvent::Resolved {
                role,
                phase: ScanPhase::Full,
                generation,
                path,
                category,
                result,
                now: Instant::now(),
            });
        });
        let mut refinements = self
            .refinements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        refinements.insert(role, handle);
    }

    async fn request(
        &self,
        token: &CancellationToken,
        path: &str,
        category: FileCategory,
        limit: Option<u64>,
    ) -> Result<ScanPathResponse, AppError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(AppError::Cancelled),
            result = self.backend.scan_path(path, category, limit) => result,
        }
    }

    fn dispatch(&self, event: ScanEvent) -> ScanApplied {
        let mut store = self.lock();
        let applied = store.apply(event);
        if applied != ScanApplied::Dropped {
            self.updates.send_replace(store.snapshot.clone());
        }
        applied
    }

    fn lock(&self) -> MutexGuard<'_, ScanStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
