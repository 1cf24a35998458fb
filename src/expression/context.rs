//! Per-worker evaluation context.

use serde::{Deserialize, Serialize};

use crate::pool::{BufferPool, PoolConfig};
use crate::vectorized::DEFAULT_BATCH_SIZE;

/// Configuration for an [`EvalContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Expected rows per batch; fresh scratch columns reserve this many rows.
    pub batch_size: usize,
    /// Scratch pool limits.
    pub pool: PoolConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pool: PoolConfig::default(),
        }
    }
}

impl EvalConfig {
    /// Creates a new evaluation configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the scratch pool configuration.
    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}

/// Evaluation context: configuration plus the scratch pool.
///
/// Each worker evaluating batches in parallel owns its own context;
/// expression trees themselves hold no per-call state and can be shared.
#[derive(Debug)]
pub struct EvalContext {
    config: EvalConfig,
    pool: BufferPool,
}

impl EvalContext {
    /// Creates a context with an empty scratch pool.
    #[must_use]
    pub fn new(config: EvalConfig) -> Self {
        let pool = BufferPool::new(config.pool.clone(), config.batch_size);
        Self { config, pool }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Returns the scratch pool.
    #[must_use]
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}
