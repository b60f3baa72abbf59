//! Static work partitioning.
//!
//! [`partition`] splits an ordered list into a fixed number of contiguous
//! shards, one per worker process. Item `i` of `total` lands in shard
//! `floor(i * shards / total)`, so shard sizes differ by at most one and
//! concatenating the shards in order gives back the input.

use crate::error::FramegrabError;

/// Split `items` into exactly `shard_count` contiguous shards.
///
/// Shards may be empty when `shard_count` exceeds the number of items.
///
/// # Errors
///
/// Returns [`FramegrabError::InvalidShardCount`] if `shard_count` is zero.
///
/// # Example
///
/// ```
/// let shards = framegrab::partition((0..7).collect(), 3).unwrap();
/// assert_eq!(shards, vec![vec![0, 1, 2], vec![3, 4], vec![5, 6]]);
/// ```
pub fn partition<T>(items: Vec<T>, shard_count: usize) -> Result<Vec<Vec<T>>, FramegrabError> {
    if shard_count == 0 {
        return Err(FramegrabError::InvalidShardCount);
    }

    let total = items.len();
    let mut shards: Vec<Vec<T>> = (0..shard_count)
        .map(|index| Vec::with_capacity(shard_len(index, shard_count, total)))
        .collect();

    for (index, item) in items.into_iter().enumerate() {
        shards[shard_of(index, shard_count, total)].push(item);
    }

    Ok(shards)
}

/// Index of the shard that item `index` of `total` belongs to.
///
/// Requires `index < total` and `shard_count > 0`.
pub(crate) fn shard_of(index: usize, shard_count: usize, total: usize) -> usize {
    // u128 keeps `index * shard_count` from overflowing on 32-bit targets.
    ((index as u128 * shard_count as u128) / total as u128) as usize
}

/// Number of items shard `index` receives.
fn shard_len(index: usize, shard_count: usize, total: usize) -> usize {
    shard_start(index + 1, shard_count, total) - shard_start(index, shard_count, total)
}

/// First item index of shard `index`: `ceil(index * total / shard_count)`.
fn shard_start(index: usize, shard_count: usize, total: usize) -> usize {
    (index as u128 * total as u128).div_ceil(shard_count as u128) as usize
}
