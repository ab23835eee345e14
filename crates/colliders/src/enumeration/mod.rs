//! Broad-phase / narrow-phase enumeration
//!
//! Every shape answers "what overlaps me" the same way: a cheap conservative
//! source (the world's agent index or a bounded [`LatticeScan`]) produces
//! candidates, and an exact predicate keeps the ones that really overlap.
//! [`Candidates`] carries both halves so the filtering can run lazily on the
//! calling thread or in parallel on an [`EnumerationPool`].
//!
//! Candidate sequences are finite and cannot be restarted. Dropping one
//! part-way through is always safe; the remaining scan is simply never run.

pub mod handoff;
pub mod lattice;
pub mod pool;

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rayon::iter::{ParallelBridge, ParallelIterator};

use crate::foundation::math::Vec3;
use crate::world::{Agent, AgentId, CellPos};

pub use handoff::{handoff, HandoffError, HandoffReceiver, HandoffSender};
pub use lattice::LatticeScan;
pub use pool::{EnumerationPool, PoolError};

/// Exact narrow-phase test applied to each broad-phase candidate
pub type NarrowPhase<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Lazy sequence of enumeration candidates
///
/// Iterating on the current thread evaluates the narrow phase one candidate at
/// a time. [`Candidates::par_collect`] evaluates it across a worker pool; the
/// resulting order is unspecified.
pub struct Candidates<T> {
    broad: Box<dyn Iterator<Item = T> + Send>,
    narrow: NarrowPhase<T>,
}

impl<T: Send + 'static> Candidates<T> {
    /// Pair a broad-phase source with its exact filter
    pub fn new<I, F>(broad: I, narrow: F) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            broad: Box::new(broad.into_iter()),
            narrow: Arc::new(narrow),
        }
    }

    /// Candidates that need no further filtering
    pub fn exact<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::new(items, |_| true)
    }

    /// Sequence that yields nothing
    pub fn empty() -> Self {
        Self::exact(Vec::new())
    }

    /// Add another exact test on top of the current one
    pub fn refine<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let narrow = self.narrow;
        Self {
            broad: self.broad,
            narrow: Arc::new(move |item: &T| narrow(item) && predicate(item)),
        }
    }

    /// Run the narrow phase across the pool and gather every match
    pub fn par_collect(self, pool: &EnumerationPool) -> Vec<T> {
        let Self { broad, narrow } = self;
        pool.install(move || broad.par_bridge().filter(|item| narrow(item)).collect())
    }

    /// Union of several candidate sequences, each item reported once.
    ///
    /// Broad sources are chained and deduplicated by [`Identity`], keeping the
    /// first occurrence. A candidate passes when any part's narrow phase
    /// accepts it, so narrow phases must be exact tests that hold for any
    /// candidate, not only those from their own broad source. Nothing runs
    /// until the union is consumed.
    pub fn union(parts: Vec<Self>) -> Self
    where
        T: Identity,
        T::Key: Send + 'static,
    {
        let (sources, narrows): (Vec<_>, Vec<_>) = parts
            .into_iter()
            .map(|part| (part.broad, part.narrow))
            .unzip();
        let mut seen = HashSet::new();
        let broad = sources
            .into_iter()
            .flatten()
            .filter(move |item: &T| seen.insert(item.identity()));
        Self {
            broad: Box::new(broad),
            narrow: Arc::new(move |item: &T| narrows.iter().any(|narrow| narrow(item))),
        }
    }
}

impl<T> Iterator for Candidates<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let narrow = &self.narrow;
        self.broad.by_ref().find(|item| narrow(item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.broad.size_hint().1)
    }
}

impl<T> fmt::Debug for Candidates<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidates")
            .field("upper_bound", &self.broad.size_hint().1)
            .finish_non_exhaustive()
    }
}

/// Equality used to deduplicate candidates found through several shapes
pub trait Identity {
    /// Hashable key identifying the candidate
    type Key: Hash + Eq;

    /// Key for this candidate
    fn identity(&self) -> Self::Key;
}

impl Identity for Agent {
    type Key = AgentId;

    fn identity(&self) -> AgentId {
        self.id
    }
}

impl Identity for CellPos {
    type Key = CellPos;

    fn identity(&self) -> CellPos {
        *self
    }
}

impl Identity for Vec3 {
    type Key = [u64; 3];

    fn identity(&self) -> [u64; 3] {
        [self.x.to_bits(), self.y.to_bits(), self.z.to_bits()]
    }
}
