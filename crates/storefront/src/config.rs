//! Parameters shared by the query workloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Row cap applied to the bulk reads and eager-loading workloads.
    pub take: i64,
    /// Customer id looked up by the existence and delete workloads.
    pub probe_id: i64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            take: 50_000,
            probe_id: 25_000,
        }
    }
}
