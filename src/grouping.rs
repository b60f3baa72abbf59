//! Per-source job aggregation.
//!
//! Several dataset sequences are often cut from the same video. [`aggregate`]
//! folds parsed [`MetadataRecord`]s into one [`SourceGroup`] per distinct
//! source locator so each video is downloaded only once.

use std::collections::HashMap;

use crate::metadata::MetadataRecord;

/// One sequence of frames to extract from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// Output directory name for this sequence.
    pub name: String,
    /// Frame timestamps, in file order.
    pub timestamps: Vec<u64>,
}

/// All sequences that share one source locator.
///
/// Never empty: a group is created by its first sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    /// The source locator, compared by exact string equality.
    pub source_identifier: String,
    /// Sequences in the order they were encountered.
    pub sequences: Vec<Sequence>,
}

impl SourceGroup {
    /// Number of sequences in the group.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Returns `true` if the group holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Names of every sequence in the group.
    pub fn sequence_names(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|sequence| sequence.name.as_str())
    }

    /// Total number of frames requested across all sequences.
    pub fn frame_count(&self) -> usize {
        self.sequences
            .iter()
            .map(|sequence| sequence.timestamps.len())
            .sum()
    }
}

impl From<MetadataRecord> for Sequence {
    fn from(record: MetadataRecord) -> Self {
        Self {
            name: record.sequence_name,
            timestamps: record.timestamps,
        }
    }
}

/// Merge records into groups keyed by source identifier.
///
/// Groups appear in order of first appearance of their identifier; each
/// group's sequences keep their encounter order. Identifiers are not
/// normalized.
///
/// # Example
///
/// ```
/// use framegrab::{MetadataRecord, aggregate};
///
/// let record = |url: &str, name: &str| MetadataRecord {
///     source_identifier: url.to_string(),
///     sequence_name: name.to_string(),
///     timestamps: vec![0],
/// };
///
/// let groups = aggregate(vec![record("a", "s1"), record("b", "s2"), record("a", "s3")]);
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].sequence_names().collect::<Vec<_>>(), ["s1", "s3"]);
/// ```
pub fn aggregate<I>(records: I) -> Vec<SourceGroup>
where
    I: IntoIterator<Item = MetadataRecord>,
{
    let mut groups: Vec<SourceGroup> = Vec::new();
    let mut index_by_identifier: HashMap<String, usize> = HashMap::new();

    for record in records {
        match index_by_identifier.get(&record.source_identifier) {
            Some(&index) => groups[index].sequences.push(record.into()),
            None => {
                index_by_identifier.insert(record.source_identifier.clone(), groups.len());
                groups.push(SourceGroup {
                    source_identifier: record.source_identifier.clone(),
                    sequences: vec![record.into()],
                });
            }
        }
    }

    groups
}
