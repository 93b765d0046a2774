//! # Sync Stages
//!
//! Coarse progress model of a full catalog sync.
//!
//! ```text
//! Starting → Categories → Channels → Movies → Series → Finalizing → Completed
//!   0.1        0.2          0.4        0.6      0.8       0.9          1.0
//! ```
//!
//! The four entity stages run concurrently and finish in any order.
//! [`ProgressTracker`] releases them in the order above, once every earlier
//! stage has finished, so reported fractions never go backwards.

use chrono::{DateTime, Utc};
use core_auth::PartitionId;
use core_cache::SyncCounts;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Starting,
    Categories,
    Channels,
    Movies,
    Series,
    Finalizing,
    Completed,
}

impl SyncStage {
    /// Entity stages in reporting order.
    pub const ENTITIES: [SyncStage; 4] = [
        SyncStage::Categories,
        SyncStage::Channels,
        SyncStage::Movies,
        SyncStage::Series,
    ];

    /// Fraction of the sync done once this stage is reached.
    pub fn progress(&self) -> f32 {
        match self {
            SyncStage::Starting => 0.1,
            SyncStage::Categories => 0.2,
            SyncStage::Channels => 0.4,
            SyncStage::Movies => 0.6,
            SyncStage::Series => 0.8,
            SyncStage::Finalizing => 0.9,
            SyncStage::Completed => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStage::Starting => "starting",
            SyncStage::Categories => "categories",
            SyncStage::Channels => "channels",
            SyncStage::Movies => "movies",
            SyncStage::Series => "series",
            SyncStage::Finalizing => "finalizing",
            SyncStage::Completed => "completed",
        }
    }

    /// Whether this is one of the four concurrent entity stages.
    pub fn is_entity(&self) -> bool {
        Self::ENTITIES.contains(self)
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Cache was still valid; nothing was fetched
    AlreadyValid,
    /// A full sync ran and wrote these counts
    Synced(SyncCounts),
}

/// Cache state of the active user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    pub is_valid: bool,
    pub valid_until: Option<DateTime<Utc>>,
    pub partition: PartitionId,
}

/// Orders entity stage completions for reporting.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    finished: [bool; 4],
    next: usize,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `stage` as finished and return the stages that can now be
    /// reported, in order. Non-entity stages are ignored.
    pub fn finish(&mut self, stage: SyncStage) -> Vec<SyncStage> {
        if let Some(index) = SyncStage::ENTITIES.iter().position(|s| *s == stage) {
            self.finished[index] = true;
        }

        let mut ready = Vec::new();
        while self.next < SyncStage::ENTITIES.len() && self.finished[self.next] {
            ready.push(SyncStage::ENTITIES[self.next]);
            self.next += 1;
        }
        ready
    }

    pub fn is_complete(&self) -> bool {
        self.next == SyncStage::ENTITIES.len()
    }
}
