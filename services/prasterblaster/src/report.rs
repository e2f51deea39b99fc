//! Run report written at the end of a reprojection.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use reproject::{OutputGeometry, ReprojectStats};
use serde::{Deserialize, Serialize};

/// What one rank did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankReport {
    pub rank: usize,
    /// Partitions assigned to this rank.
    pub partitions: usize,
    /// Partitions with no source pixels, written as fill only.
    pub empty_partitions: usize,
    pub stats: ReprojectStats,
    pub read_ms: u64,
    pub reproject_ms: u64,
    pub write_ms: u64,
}

/// Summary of a whole run, assembled on the root rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processes: usize,
    pub geometry: OutputGeometry,
    pub ranks: Vec<RankReport>,
}

impl RunReport {
    pub fn total_stats(&self) -> ReprojectStats {
        let mut total = ReprojectStats::default();
        for rank in &self.ranks {
            total.merge(rank.stats);
        }
        total
    }

    pub fn total_partitions(&self) -> usize {
        self.ranks.iter().map(|r| r.partitions).sum()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
