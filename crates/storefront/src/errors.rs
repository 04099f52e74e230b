use thiserror::Error;

use crate::models::EntityKind;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database unreachable: {0}")]
    Unreachable(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Reserved {got} ids for {kind:?}, expected {expected}")]
    IdReservation {
        kind: EntityKind,
        expected: usize,
        got: usize,
    },

    #[error("Batch {batch} rejected: {reason}")]
    BatchRejected { batch: usize, reason: String },
}
