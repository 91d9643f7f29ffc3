//! Worker pool configuration for parallel visitation

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{MatrixError, Result};

/// Configuration of the workers used by row- and column-parallel visitation
///
/// Without an explicit worker count, work runs on rayon's global pool.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionConfig {
    /// Number of worker threads, `None` for the global pool
    pub workers: Option<usize>,
    /// Prefix for worker thread names
    pub thread_name: Option<String>,
}

impl ExecutionConfig {
    /// Create config with a fixed worker count
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: Some(workers),
            thread_name: None,
        }
    }

    /// Set the worker thread name prefix
    pub fn with_thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = Some(prefix.into());
        self
    }

    /// Worker count visitation will see inside [`ExecutionConfig::install`]
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(rayon::current_num_threads)
    }

    /// Build a dedicated pool from this configuration
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(workers) = self.workers {
            builder = builder.num_threads(workers);
        }
        if let Some(prefix) = self.thread_name.clone() {
            builder = builder.thread_name(move |i| format!("{prefix}-{i}"));
        }
        builder
            .build()
            .map_err(|e| MatrixError::ThreadPool(e.to_string()))
    }

    /// Run `op` with this configuration's workers
    ///
    /// Parallel visitation started inside `op` uses the configured pool and
    /// its worker count for the CSR cost heuristic.
    pub fn install<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers.is_none() && self.thread_name.is_none() {
            return Ok(op());
        }
        Ok(self.build_pool()?.install(op))
    }
}
