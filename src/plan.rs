//! Run planning: metadata directory to shards.
//!
//! Every process of a run builds the same [`RunPlan`] from the same inputs,
//! so a child process only needs its shard index to find its work.

use std::path::Path;

use crate::{
    error::FramegrabError,
    grouping::{SourceGroup, aggregate},
    metadata::load_records,
    partition::partition,
};

/// The source groups of a run split into shards.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Number of distinct sources across all shards.
    pub group_count: usize,
    /// Number of metadata files read.
    pub sequence_count: usize,
    /// One entry per shard, in shard order.
    pub shards: Vec<Vec<SourceGroup>>,
}

impl RunPlan {
    /// Read `<cameras_dir>/<mode>/*.txt`, group by source, and split into
    /// `shard_count` shards.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::Parse`] for the first malformed metadata file.
    /// - [`FramegrabError::InvalidShardCount`] if `shard_count` is zero.
    /// - [`FramegrabError::IoError`] if the metadata directory is unreadable.
    pub fn load(
        cameras_dir: impl AsRef<Path>,
        mode: &str,
        shard_count: usize,
    ) -> Result<Self, FramegrabError> {
        let metadata_dir = cameras_dir.as_ref().join(mode);
        log::info!("Loading data list from {}", metadata_dir.display());

        let records = load_records(&metadata_dir)?;
        let sequence_count = records.len();
        let groups = aggregate(records);
        let group_count = groups.len();
        log::info!("{group_count} movies are used in {mode} mode");

        Ok(Self {
            group_count,
            sequence_count,
            shards: partition(groups, shard_count)?,
        })
    }

    /// Take ownership of shard `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::ShardOutOfRange`] if there is no such shard.
    pub fn into_shard(mut self, index: usize) -> Result<Vec<SourceGroup>, FramegrabError> {
        let count = self.shards.len();
        if index >= count {
            return Err(FramegrabError::ShardOutOfRange { index, count });
        }
        Ok(self.shards.swap_remove(index))
    }
}
