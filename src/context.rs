//! Execution context: random stream, worker pool, options and error sink.
//!
//! A [`Context`] carries everything an algorithm needs besides its active
//! object: a seeded, splittable random stream, the worker count and an
//! optional shared rayon pool, the deterministic-mode flag, and the error
//! sink through which failures are reported before being returned.
//!
//! Contexts are committed lazily: the first algorithm run freezes the
//! option set, after which [`Context::set_option`] fails. Cloning a stream
//! ([`Context::clone_stream`]) or splitting ([`Context::split`]) derives
//! children with independent random streams, so recursive sub-problems can
//! run concurrently and still be reproducible for a fixed seed.

use crate::error::{Error, Result};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Arc;

/// Installable error reporting callback.
pub type ErrorSink = Arc<dyn Fn(&Error) + Send + Sync>;

/// Numeric option keys, mirroring the public option surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOption {
    /// Nonzero forces canonical sequential reductions everywhere.
    Deterministic,
    /// Nonzero re-seeds the random stream with the given fixed value.
    FixedSeed,
    /// Number of workers; `0` selects the machine default.
    ThreadNbr,
}

/// Shared execution state threaded through every algorithm.
pub struct Context {
    seed: u64,
    rng: SmallRng,
    deterministic: bool,
    workers: usize,
    pool: Option<Arc<rayon::ThreadPool>>,
    sink: Option<ErrorSink>,
    committed: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::with_seed(1)
    }
}

impl Context {
    /// A context with the given random seed and one worker.
    pub fn with_seed(seed: u64) -> Self {
        Context {
            seed,
            rng: SmallRng::seed_from_u64(seed),
            deterministic: true,
            workers: 1,
            pool: None,
            sink: None,
            committed: false,
        }
    }

    /// The seed this context (or stream) was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether canonical sequential reductions are forced.
    pub fn deterministic(&self) -> bool {
        self.deterministic
    }

    /// Number of workers available to parallel kernels.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Install the error sink invoked by [`Context::report`].
    pub fn set_error_sink(&mut self, sink: ErrorSink) {
        self.sink = Some(sink);
    }

    /// Report an error through the sink, falling back to the `log` facade.
    pub fn report(&self, err: &Error) {
        match &self.sink {
            Some(sink) => sink(err),
            None => log::error!("{err}"),
        }
    }

    /// Set a numeric option. Fails once the context has been committed by a
    /// first run.
    pub fn set_option(&mut self, option: ContextOption, value: u64) -> Result<()> {
        if self.committed {
            return Err(Error::input("context option set after commit"));
        }
        match option {
            ContextOption::Deterministic => self.deterministic = value != 0,
            ContextOption::FixedSeed => {
                self.seed = value;
                self.rng = SmallRng::seed_from_u64(value);
            }
            ContextOption::ThreadNbr => {
                self.workers = if value == 0 {
                    num_cpus::get()
                } else {
                    value as usize
                };
            }
        }
        Ok(())
    }

    /// Freeze the option set and build the worker pool if needed.
    ///
    /// Called implicitly by the top-level entry points; calling it twice is
    /// harmless.
    pub fn commit(&mut self) -> Result<()> {
        if self.committed {
            return Ok(());
        }
        self.committed = true;
        if self.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .map_err(|e| Error::input(format!("cannot build worker pool: {e}")))?;
            self.pool = Some(Arc::new(pool));
        }
        Ok(())
    }

    /// The shared worker pool, if more than one worker was requested.
    pub fn pool(&self) -> Option<&rayon::ThreadPool> {
        self.pool.as_deref()
    }

    /// A uniformly random index below `bound` (`bound > 0`).
    pub fn random_index(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        self.rng.gen_range(0..bound)
    }

    /// Shuffle a slice in place with this context's stream.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.rng);
    }

    /// A random permutation of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..n).collect();
        self.shuffle(&mut perm);
        perm
    }

    /// Derive a child context with an independent random stream and the
    /// same workers and options.
    pub fn clone_stream(&mut self) -> Context {
        let child_seed = self.rng.next_u64();
        Context {
            seed: child_seed,
            rng: SmallRng::seed_from_u64(child_seed),
            deterministic: self.deterministic,
            workers: self.workers,
            pool: self.pool.clone(),
            sink: self.sink.clone(),
            committed: self.committed,
        }
    }

    /// Split into two children for the two halves of a recursive step.
    ///
    /// Workers are divided between the children; both inherit the pool so
    /// nested parallelism stays bounded by the committed worker count.
    pub fn split(&mut self) -> (Context, Context) {
        let mut left = self.clone_stream();
        let mut right = self.clone_stream();
        left.workers = (self.workers / 2).max(1);
        right.workers = (self.workers - left.workers).max(1);
        (left, right)
    }

    /// Save the random stream state (the seed of a fresh stream).
    pub fn save_random(&mut self) -> u64 {
        let state = self.rng.next_u64();
        self.rng = SmallRng::seed_from_u64(state);
        state
    }

    /// Restore a stream previously returned by [`Context::save_random`].
    pub fn restore_random(&mut self, state: u64) {
        self.rng = SmallRng::seed_from_u64(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_permutation() {
        let mut a = Context::with_seed(42);
        let mut b = Context::with_seed(42);
        assert_eq!(a.permutation(100), b.permutation(100));
    }

    #[test]
    fn option_after_commit_fails() {
        let mut ctx = Context::default();
        ctx.commit().unwrap();
        assert!(ctx.set_option(ContextOption::ThreadNbr, 4).is_err());
    }

    #[test]
    fn save_restore_replays_stream() {
        let mut ctx = Context::with_seed(7);
        let state = ctx.save_random();
        let first = ctx.permutation(32);
        ctx.restore_random(state);
        assert_eq!(ctx.permutation(32), first);
    }
}
