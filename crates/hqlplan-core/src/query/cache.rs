//! Cache of compiled query plans.
//!
//! Building a plan means splitting and translating the query, so plans are
//! kept and shared between executions. The key covers everything that
//! changes the generated SQL: the query text, the shallow flag, the enabled
//! filters and, for collection filters, the collection role. Parameter
//! values and row selections are per execution and never part of the key.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::context::PlanContext;
use super::parameters::EnabledFilter;
use super::plan::QueryPlan;
use crate::config::PlanConfig;
use crate::error::Result;

/// Cache lookup key.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PlanCacheKey {
    query: String,
    collection_role: Option<String>,
    shallow: bool,
    filter_names: BTreeSet<String>,
}

impl PlanCacheKey {
    /// Key for an HQL query plan.
    pub fn for_query(query: &str, shallow: bool, enabled_filters: &[EnabledFilter]) -> Self {
        Self {
            query: query.to_string(),
            collection_role: None,
            shallow,
            filter_names: enabled_filters.iter().map(|f| f.name.clone()).collect(),
        }
    }

    /// Key for a collection filter plan.
    pub fn for_filter(
        query: &str,
        collection_role: &str,
        shallow: bool,
        enabled_filters: &[EnabledFilter],
    ) -> Self {
        Self {
            collection_role: Some(collection_role.to_string()),
            ..Self::for_query(query, shallow, enabled_filters)
        }
    }
}

/// Cached plan with its usage count.
#[derive(Debug)]
pub struct CachedPlan {
    /// The shared plan.
    pub plan: Arc<QueryPlan>,
    /// Number of cache hits for this plan.
    pub hit_count: AtomicU64,
}

impl CachedPlan {
    fn new(plan: Arc<QueryPlan>) -> Self {
        Self {
            plan,
            hit_count: AtomicU64::new(0),
        }
    }

    /// Increment the hit count and return the new value.
    pub fn record_hit(&self) -> u64 {
        self.hit_count.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    /// Get the current hit count.
    pub fn hits(&self) -> u64 {
        self.hit_count.load(AtomicOrdering::Relaxed)
    }
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Get eviction count.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(AtomicOrdering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default)]
struct Entries {
    catalog_version: u64,
    plans: HashMap<PlanCacheKey, CachedPlan>,
}

/// Bounded, thread-safe plan cache.
///
/// All plans are dropped when a lookup arrives with a different catalog
/// version than the one the cached plans were built against.
#[derive(Debug)]
pub struct QueryPlanCache {
    entries: RwLock<Entries>,
    max_entries: usize,
    stats: CacheStats,
}

impl QueryPlanCache {
    /// Create a cache holding at most `max_entries` plans.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            max_entries: max_entries.max(1),
            stats: CacheStats::default(),
        }
    }

    /// Create a cache sized from the configuration.
    pub fn from_config(config: &PlanConfig) -> Self {
        Self::new(config.plan_cache_max_size)
    }

    /// Get or build the plan for an HQL query.
    pub fn plan(
        &self,
        hql: &str,
        shallow: bool,
        enabled_filters: &[EnabledFilter],
        ctx: &PlanContext,
    ) -> Result<Arc<QueryPlan>> {
        let key = PlanCacheKey::for_query(hql, shallow, enabled_filters);
        self.get_or_build(key, ctx, || QueryPlan::new(hql, shallow, enabled_filters, ctx))
    }

    /// Get or build the plan for a collection filter.
    pub fn filter_plan(
        &self,
        hql: &str,
        collection_role: &str,
        shallow: bool,
        enabled_filters: &[EnabledFilter],
        ctx: &PlanContext,
    ) -> Result<Arc<QueryPlan>> {
        let key = PlanCacheKey::for_filter(hql, collection_role, shallow, enabled_filters);
        self.get_or_build(key, ctx, || {
            QueryPlan::for_collection_filter(hql, collection_role, shallow, enabled_filters, ctx)
        })
    }

    fn get_or_build(
        &self,
        key: PlanCacheKey,
        ctx: &PlanContext,
        build: impl FnOnce() -> Result<QueryPlan>,
    ) -> Result<Arc<QueryPlan>> {
        let version = ctx.catalog().version();

        {
            let entries = self.entries.read();
            if entries.catalog_version == version {
                if let Some(cached) = entries.plans.get(&key) {
                    cached.record_hit();
                    self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
                    trace!(query = %key.query, "plan cache hit");
                    return Ok(cached.plan.clone());
                }
            }
        }

        self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(query = %key.query, "plan cache miss");
        let plan = Arc::new(build()?);

        let mut entries = self.entries.write();
        if entries.catalog_version != version {
            debug!(
                from = entries.catalog_version,
                to = version,
                dropped = entries.plans.len(),
                "catalog version changed; clearing plan cache"
            );
            entries.plans.clear();
            entries.catalog_version = version;
        }
        // Another thread may have built the same plan meanwhile.
        if let Some(cached) = entries.plans.get(&key) {
            return Ok(cached.plan.clone());
        }
        if entries.plans.len() >= self.max_entries {
            self.evict_least_used(&mut entries.plans);
        }
        entries.plans.insert(key, CachedPlan::new(plan.clone()));
        Ok(plan)
    }

    /// Evict the entry with the lowest hit count.
    fn evict_least_used(&self, plans: &mut HashMap<PlanCacheKey, CachedPlan>) {
        let evict_key = plans
            .iter()
            .min_by_key(|(_, v)| v.hits())
            .map(|(k, _)| k.clone());

        if let Some(key) = evict_key {
            plans.remove(&key);
            self.stats.evictions.fetch_add(1, AtomicOrdering::Relaxed);
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get the current number of cached plans.
    pub fn len(&self) -> usize {
        self.entries.read().plans.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached plans.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Drop all cached plans.
    pub fn clear(&self) {
        self.entries.write().plans.clear();
    }
}

impl Default for QueryPlanCache {
    fn default() -> Self {
        Self::from_config(&PlanConfig::default())
    }
}
