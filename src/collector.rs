//! Bounded, order preserving fan-out over a [`SourceFetcher`]

use futures::StreamExt;
use futures::stream;
use tracing::debug;

use crate::fetchers::SourceFetcher;

/// Upper bound of concurrent fetches per collection
pub const MAX_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct ParallelCollector {
    max_concurrency: usize,
}

impl Default for ParallelCollector {
    fn default() -> Self {
        Self::new(MAX_CONCURRENCY)
    }
}

impl ParallelCollector {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Concurrency used for a batch of `len` identities
    pub fn concurrency_for(&self, len: usize) -> usize {
        self.max_concurrency.min(len).max(1)
    }

    /// Fetch every identity and return the outputs in input order.
    ///
    /// Waits for all fetches. Each fetch is bounded by its own timeout, a
    /// slow item only delays the batch, never fails it.
    pub async fn collect<F>(&self, fetcher: &F, identities: &[F::Identity]) -> Vec<F::Output>
    where
        F: SourceFetcher + ?Sized,
    {
        let concurrency = self.concurrency_for(identities.len());
        debug!(
            "collecting {} items from {} ({concurrency} at a time)",
            identities.len(),
            fetcher.source()
        );

        stream::iter(0..identities.len())
            .map(|index| fetcher.fetch(&identities[index]))
            .buffered(concurrency)
            .collect()
            .await
    }
}
