//! Memoised, failure-tolerant derived properties.

use std::fmt;
use std::sync::OnceLock;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;

use crate::error::Result;

/// A value computed on first access and kept for the owner's lifetime.
///
/// The computation runs at most once, even under concurrent access. If it
/// fails, the failure is logged and the fallback is cached in its place.
pub struct LazyProperty<T> {
    cell: OnceLock<T>,
    #[cfg(test)]
    computations: AtomicUsize,
}

impl<T> LazyProperty<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            #[cfg(test)]
            computations: AtomicUsize::new(0),
        }
    }

    /// The cached value, computing it first if needed.
    ///
    /// `name` only appears in the log line emitted on failure.
    pub fn get_or_compute<F, D>(&self, name: &str, compute: F, fallback: D) -> &T
    where
        F: FnOnce() -> Result<T>,
        D: FnOnce() -> T,
    {
        self.cell.get_or_init(|| {
            #[cfg(test)]
            self.computations.fetch_add(1, Ordering::Relaxed);
            match compute() {
                Ok(value) => value,
                Err(err) => {
                    warn!("unable to compute {}: {}", name, err);
                    fallback()
                }
            }
        })
    }

    /// The cached value, if it was already computed.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// How many times a computation has run.
    #[cfg(test)]
    pub(crate) fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }
}

impl<T> Default for LazyProperty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("LazyProperty").field(value).finish(),
            None => f.write_str("LazyProperty(<pending>)"),
        }
    }
}
