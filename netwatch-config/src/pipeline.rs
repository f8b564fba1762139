//! Aggregation pipeline configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Event aggregation and batching parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct PipelineConfig {
    /// Number of buffered events that triggers a batch upload.
    #[validate(range(min = 1, max = 100000))]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How many entries to report in top-talker and top-port snapshots.
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_batch_size() -> usize {
    200
}

fn default_top_n() -> usize {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            top_n: default_top_n(),
        }
    }
}
