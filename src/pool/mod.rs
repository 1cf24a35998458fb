//! Scratch column pool.
//!
//! Signatures borrow temporary columns for the duration of one evaluation
//! call and hand them back when done. Released columns keep their
//! allocations and are reused by later leases of the same domain.
//!
//! # Example
//!
//! ```ignore
//! let pool = BufferPool::new(PoolConfig::default(), 1024);
//! let mut scratch = pool.lease(EvalType::Int, n)?;
//! child.vec_eval_int(ctx, input, &mut scratch)?;
//! // Column returns to the pool when `scratch` drops, on success or error
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Result, VexprError};
use crate::types::EvalType;
use crate::vectorized::Column;

/// Limits of a [`BufferPool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of columns leased at once; 0 means unlimited.
    pub max_leased: usize,
    /// Maximum number of released columns kept per domain.
    pub max_cached_per_type: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_leased: 0,
            max_cached_per_type: 8,
        }
    }
}

impl PoolConfig {
    /// Caps the number of simultaneously leased columns.
    #[must_use]
    pub fn with_max_leased(mut self, max_leased: usize) -> Self {
        self.max_leased = max_leased;
        self
    }

    /// Sets how many released columns are retained per domain.
    #[must_use]
    pub fn with_max_cached_per_type(mut self, max_cached: usize) -> Self {
        self.max_cached_per_type = max_cached;
        self
    }
}

/// Pool of reusable scratch columns, keyed by domain.
///
/// One pool belongs to one evaluation context. The free lists sit behind a
/// lock so the pool is `Sync`, but workers evaluating in parallel each own
/// their own context.
pub struct BufferPool {
    config: PoolConfig,
    /// Minimum row capacity of freshly allocated columns.
    min_rows: usize,
    /// Released columns awaiting reuse.
    free: Mutex<HashMap<EvalType, Vec<Column>>>,
    /// Columns currently out on lease.
    outstanding: AtomicUsize,
    leases: AtomicU64,
    reuses: AtomicU64,
    allocations: AtomicU64,
}

impl BufferPool {
    /// Creates an empty pool. Fresh allocations reserve at least `min_rows` rows.
    #[must_use]
    pub fn new(config: PoolConfig, min_rows: usize) -> Self {
        Self {
            config,
            min_rows,
            free: Mutex::new(HashMap::new()),
            outstanding: AtomicUsize::new(0),
            leases: AtomicU64::new(0),
            reuses: AtomicU64::new(0),
            allocations: AtomicU64::new(0),
        }
    }

    /// Returns the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Leases an empty column of `eval_type` with capacity for `rows` rows.
    ///
    /// The column is released back to the pool when the returned guard drops.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailed` if the lease limit is reached or the rows
    /// cannot be reserved.
    pub fn lease(&self, eval_type: EvalType, rows: usize) -> Result<ScratchColumn<'_>> {
        let column = self.take(eval_type, rows)?;
        Ok(ScratchColumn { pool: self, column })
    }

    fn take(&self, eval_type: EvalType, rows: usize) -> Result<Column> {
        let outstanding = self.outstanding.load(Ordering::Relaxed);
        if self.config.max_leased > 0 && outstanding >= self.config.max_leased {
            debug!(%eval_type, rows, outstanding, "buffer pool exhausted");
            return Err(VexprError::AllocationFailed(format!(
                "buffer pool exhausted: {outstanding} of {} scratch columns leased",
                self.config.max_leased
            )));
        }

        let reclaimed = self.free.lock().get_mut(&eval_type).and_then(Vec::pop);
        let column = match reclaimed {
            Some(mut column) => {
                column.reset();
                column.reserve(rows).map_err(|e| {
                    debug!(%eval_type, rows, error = %e, "cannot grow reused scratch column");
                    e
                })?;
                self.reuses.fetch_add(1, Ordering::Relaxed);
                trace!(%eval_type, rows, "reused scratch column");
                column
            }
            None => {
                let column = Column::try_with_capacity(eval_type, rows.max(self.min_rows))
                    .map_err(|e| {
                        debug!(%eval_type, rows, error = %e, "cannot allocate scratch column");
                        e
                    })?;
                self.allocations.fetch_add(1, Ordering::Relaxed);
                trace!(%eval_type, rows, "allocated scratch column");
                column
            }
        };

        self.leases.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        Ok(column)
    }

    /// Returns a column to the pool.
    ///
    /// The column is dropped instead if its domain's free list is full.
    pub fn release(&self, column: Column) {
        // Saturating: a column that was never leased must not underflow.
        let _ = self
            .outstanding
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));

        let eval_type = column.eval_type();
        let mut free = self.free.lock();
        let list = free.entry(eval_type).or_default();
        if list.len() < self.config.max_cached_per_type {
            list.push(column);
        } else {
            trace!(%eval_type, "free list full, dropping scratch column");
        }
    }

    /// Drops every cached column.
    pub fn clear(&self) {
        self.free.lock().clear();
    }

    /// Returns statistics about the pool.
    #[must_use]
    pub fn stats(&self) -> BufferPoolStats {
        let cached = self.free.lock().values().map(Vec::len).sum();
        BufferPoolStats {
            leases: self.leases.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            outstanding: self.outstanding.load(Ordering::Relaxed),
            cached,
        }
    }

    /// Resets the lease counters. Outstanding and cached counts are live and
    /// unaffected.
    pub fn reset_stats(&self) {
        self.leases.store(0, Ordering::Relaxed);
        self.reuses.store(0, Ordering::Relaxed);
        self.allocations.store(0, Ordering::Relaxed);
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.config)
            .field("min_rows", &self.min_rows)
            .field("stats", &self.stats())
            .finish()
    }
}

/// RAII guard for a leased scratch column.
///
/// Dereferences to [`Column`]; the column is released when the guard drops.
pub struct ScratchColumn<'a> {
    pool: &'a BufferPool,
    column: Column,
}

impl Deref for ScratchColumn<'_> {
    type Target = Column;

    fn deref(&self) -> &Column {
        &self.column
    }
}

impl DerefMut for ScratchColumn<'_> {
    fn deref_mut(&mut self) -> &mut Column {
        &mut self.column
    }
}

impl fmt::Debug for ScratchColumn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScratchColumn").field(&self.column).finish()
    }
}

impl Drop for ScratchColumn<'_> {
    fn drop(&mut self) {
        // A zero-capacity column does not allocate.
        let placeholder = Column::new(self.column.eval_type(), 0);
        let column = std::mem::replace(&mut self.column, placeholder);
        self.pool.release(column);
    }
}

/// Statistics about the pool state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Leases granted.
    pub leases: u64,
    /// Leases served from a free list.
    pub reuses: u64,
    /// Leases that allocated a new column.
    pub allocations: u64,
    /// Columns currently leased.
    pub outstanding: usize,
    /// Columns sitting in free lists.
    pub cached: usize,
}

impl BufferPoolStats {
    /// Fraction of leases served without allocating (0.0 to 1.0).
    ///
    /// Returns `None` if no lease has been granted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reuse_rate(&self) -> Option<f64> {
        if self.leases == 0 {
            None
        } else {
            Some(self.reuses as f64 / self.leases as f64)
        }
    }
}
