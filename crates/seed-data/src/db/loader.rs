//! Batched, guarded population of a store with customers, orders and products.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use storefront::{EntityKind, NewCustomer, StoreError};

use super::store::DataStore;
use crate::config::{DEFAULT_BATCH_SIZE, GuardMode, SeedConfig};
use crate::generators::CustomerGenerator;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Customer count must be positive")]
    InvalidCount,

    #[error("Existence check failed: {0}")]
    ExistenceCheck(#[source] StoreError),

    #[error("Batch {batch} failed to commit: {source}")]
    BatchCommit {
        batch: usize,
        #[source]
        source: StoreError,
    },

    #[error("Failed to clear store: {0}")]
    Clear(#[source] StoreError),

    #[error("Store holds {existing} customers but {requested} were requested")]
    CountMismatch { existing: u64, requested: usize },
}

/// Progress callback invoked after every committed batch with
/// `(batches_completed, customers_written)`.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

#[derive(Debug, Default)]
struct Progress {
    batches: usize,
    customers: usize,
}

/// Populates a [`DataStore`] with generated customers in fixed-size batches.
///
/// Every batch is one atomic `insert_batch` call, awaited before the next
/// batch is built. The first failure aborts the run; batches committed before
/// it stay in the store.
pub struct SeedLoader {
    batch_size: usize,
    guard: GuardMode,
    progress: Option<ProgressCallback>,
}

impl Default for SeedLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedLoader {
    /// Creates a loader with the default batch size and guard.
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            guard: GuardMode::default(),
            progress: None,
        }
    }

    pub fn from_config(config: &SeedConfig) -> Self {
        Self::new()
            .with_batch_size(config.batch_size)
            .with_guard(config.guard)
    }

    /// Sets the number of customers per batch. Zero is treated as one.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_guard(mut self, guard: GuardMode) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Seeds `count` customers unless the guard decides the store is already seeded.
    pub async fn populate<S>(&self, store: &S, count: usize) -> Result<(), SeedError>
    where
        S: DataStore + ?Sized,
    {
        let mut rng = StdRng::from_entropy();
        self.populate_with_rng(store, count, &mut rng).await
    }

    /// Like [`Self::populate`], drawing the random fields from `rng`.
    pub async fn populate_with_rng<S, R>(
        &self,
        store: &S,
        count: usize,
        rng: &mut R,
    ) -> Result<(), SeedError>
    where
        S: DataStore + ?Sized,
        R: Rng,
    {
        if count == 0 {
            return Err(SeedError::InvalidCount);
        }

        if !self.needs_seeding(store, count).await? {
            info!("Store already seeded, skipping");
            return Ok(());
        }

        info!("Seeding {} customers...", count);

        let generator = CustomerGenerator::new(OffsetDateTime::now_utc());
        let mut batch: Vec<NewCustomer> = Vec::with_capacity(self.batch_size.min(count));
        let mut progress = Progress::default();

        for index in 0..count {
            batch.push(generator.generate(index, rng));

            if batch.len() >= self.batch_size {
                self.flush(store, &mut batch, &mut progress).await?;
            }
        }

        if !batch.is_empty() {
            self.flush(store, &mut batch, &mut progress).await?;
        }

        info!(
            "Seed complete: {} customers in {} batches",
            progress.customers, progress.batches
        );
        Ok(())
    }

    async fn needs_seeding<S>(&self, store: &S, count: usize) -> Result<bool, SeedError>
    where
        S: DataStore + ?Sized,
    {
        match self.guard {
            GuardMode::AnyExisting => {
                let exists = store
                    .exists(EntityKind::Customer)
                    .await
                    .map_err(SeedError::ExistenceCheck)?;
                Ok(!exists)
            }
            GuardMode::ExactCount => {
                let existing = store
                    .count(EntityKind::Customer)
                    .await
                    .map_err(SeedError::ExistenceCheck)?;
                match existing {
                    0 => Ok(true),
                    n if n == count as u64 => Ok(false),
                    n => Err(SeedError::CountMismatch {
                        existing: n,
                        requested: count,
                    }),
                }
            }
            GuardMode::Force => {
                store.clear().await.map_err(SeedError::Clear)?;
                Ok(true)
            }
        }
    }

    /// Commits the buffered customers as one unit and empties the buffer.
    async fn flush<S>(
        &self,
        store: &S,
        batch: &mut Vec<NewCustomer>,
        progress: &mut Progress,
    ) -> Result<(), SeedError>
    where
        S: DataStore + ?Sized,
    {
        let number = progress.batches + 1;

        store
            .insert_batch(batch.as_slice())
            .await
            .map_err(|source| SeedError::BatchCommit {
                batch: number,
                source,
            })?;

        progress.batches = number;
        progress.customers += batch.len();
        batch.clear();

        info!("  Committed batch {} ({} customers)", number, progress.customers);
        if let Some(callback) = &self.progress {
            callback(progress.batches, progress.customers);
        }

        Ok(())
    }
}
