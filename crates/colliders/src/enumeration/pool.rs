//! Worker pool for narrow-phase filtering

use std::sync::Arc;

use log::debug;
use thiserror::Error;

use super::handoff::{HandoffError, HandoffSender};
use super::Candidates;
use crate::config::EnumerationConfig;

/// Errors raised while setting up an enumeration pool
#[derive(Error, Debug)]
pub enum PoolError {
    /// Worker threads could not be started
    #[error("Failed to build enumeration pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// Thread pool that runs narrow-phase predicates in parallel
///
/// Cloning is cheap; clones share the same workers.
#[derive(Debug, Clone)]
pub struct EnumerationPool {
    pool: Arc<rayon::ThreadPool>,
    handoff_capacity: usize,
}

impl EnumerationPool {
    /// Build a pool sized from configuration (one worker per core by default)
    pub fn new(config: &EnumerationConfig) -> Result<Self, PoolError> {
        let threads = config.worker_threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("colliders-enum-{index}"))
            .build()?;
        debug!("Enumeration pool started with {threads} workers");
        Ok(Self {
            pool: Arc::new(pool),
            handoff_capacity: config.handoff_capacity.max(1),
        })
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Capacity used for hand-off channels created for this pool
    pub fn handoff_capacity(&self) -> usize {
        self.handoff_capacity
    }

    /// Run a closure inside the pool so nested rayon work uses its workers
    pub fn install<R, F>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(job)
    }

    /// Filter candidates in the background and deliver the matches in one
    /// batch to the owner of `sender`
    ///
    /// The calling thread returns immediately. If the owner has gone away the
    /// batch is discarded.
    pub fn spawn_delivery<T>(&self, candidates: Candidates<T>, sender: HandoffSender<T>)
    where
        T: Send + 'static,
    {
        let pool = self.clone();
        self.pool.spawn(move || {
            let found = candidates.par_collect(&pool);
            if let Err(HandoffError::OwnerGone) = sender.deliver(found) {
                debug!("Dropping enumeration results: owner disconnected");
            }
        });
    }
}
