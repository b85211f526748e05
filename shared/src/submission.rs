//! Daily collection submission payload
//!
//! Turns the sparse map of box counts plus the shade-egg count into the
//! request body expected by `submit-daily-collection`. The builder performs no
//! I/O and is deterministic: cages are ordered by id, partitions by index and
//! records by row then column.
//!
//! Partition indices are 1-based on the partition object and 0-based on each
//! egg record, matching what the backend reads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::errors::{SharedError, SharedResult};
use crate::layout::FarmLayout;
use crate::types::{BoxAddress, CageId, CageType, EggCount};

/// Eggs collected from one box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggRecord {
    pub value: u32,
    /// 1-based box number within its row
    pub box_number: usize,
    /// 0-based partition index
    pub partition_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionSubmission {
    /// 1-based partition index
    pub partition_index: usize,
    pub eggs_collected: Vec<EggRecord>,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CageSubmission {
    pub cage_id: CageId,
    pub cage_type: CageType,
    pub partitions: Vec<PartitionSubmission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub date: NaiveDate,
    pub shade_eggs: u32,
    pub cages: Vec<CageSubmission>,
}

impl SubmissionPayload {
    /// Eggs across all boxes and the shade area
    pub fn total_eggs(&self) -> u32 {
        self.shade_eggs + self.box_eggs()
    }

    pub fn box_eggs(&self) -> u32 {
        self.records().map(|(_, _, record)| record.value).sum()
    }

    /// Every egg record with its cage id and 1-based partition index
    pub fn records(&self) -> impl Iterator<Item = (CageId, usize, &EggRecord)> {
        self.cages.iter().flat_map(|cage| {
            cage.partitions.iter().flat_map(move |partition| {
                partition
                    .eggs_collected
                    .iter()
                    .map(move |record| (cage.cage_id, partition.partition_index, record))
            })
        })
    }
}

/// Flattened view of one reported box: (cage, 1-based partition, box number, count)
pub type SubmittedBox = (CageId, usize, usize, u32);

/// Build the submission payload from the collection state.
///
/// Fails with a validation error when there is neither a positive shade count
/// nor any box entry. Zero counts are not sent, and partitions without any
/// positive count are left out entirely.
pub fn build_submission(
    layout: &FarmLayout,
    cells: &BTreeMap<BoxAddress, EggCount>,
    shade_eggs: Option<u32>,
    date: NaiveDate,
) -> SharedResult<SubmissionPayload> {
    let shade_eggs = shade_eggs.unwrap_or(0);
    if shade_eggs == 0 && cells.is_empty() {
        return Err(SharedError::nothing_to_submit());
    }

    let mut grouped: BTreeMap<CageId, BTreeMap<usize, Vec<EggRecord>>> = BTreeMap::new();

    for (address, &count) in cells {
        if count == 0 {
            continue;
        }

        if layout.cage(address.cage).is_none() {
            warn!(address = %address, "Dropping count for unknown cage");
            continue;
        }

        grouped
            .entry(address.cage)
            .or_default()
            .entry(address.partition)
            .or_default()
            .push(EggRecord {
                value: u32::from(count),
                box_number: address.box_number(),
                partition_index: address.partition,
            });
    }

    let cages = grouped
        .into_iter()
        .filter_map(|(cage_id, partitions)| {
            let cage = layout.cage(cage_id)?;
            Some(CageSubmission {
                cage_id,
                cage_type: cage.cage_type,
                partitions: partitions
                    .into_iter()
                    .map(|(index, eggs_collected)| PartitionSubmission {
                        partition_index: index + 1,
                        eggs_collected,
                        comments: String::new(),
                    })
                    .collect(),
            })
        })
        .collect();

    Ok(SubmissionPayload {
        date,
        shade_eggs,
        cages,
    })
}

/// Flatten a payload back into (cage, partition, box number, count) tuples, sorted
pub fn regroup(payload: &SubmissionPayload) -> Vec<SubmittedBox> {
    let mut boxes: Vec<SubmittedBox> = payload
        .records()
        .map(|(cage_id, partition_index, record)| {
            (cage_id, partition_index, record.box_number, record.value)
        })
        .collect();
    boxes.sort();
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::initialize_layout;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn cells(entries: &[(BoxAddress, EggCount)]) -> BTreeMap<BoxAddress, EggCount> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_single_box_payload_shape() {
        let layout = initialize_layout();
        let values = cells(&[(BoxAddress::new(1, 0, 0, 3), 2)]);

        let payload = build_submission(&layout, &values, None, date()).unwrap();
        let wire = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            wire,
            json!({
                "date": "2024-03-09",
                "shade_eggs": 0,
                "cages": [{
                    "cageId": 1,
                    "cageType": "combined",
                    "partitions": [{
                        "partitionIndex": 1,
                        "eggsCollected": [{"value": 2, "boxNumber": 4, "partitionIndex": 0}],
                        "comments": ""
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_nothing_to_submit() {
        let layout = initialize_layout();
        let empty = BTreeMap::new();

        for shade in [None, Some(0)] {
            let err = build_submission(&layout, &empty, shade, date()).unwrap_err();
            assert_eq!(err, SharedError::nothing_to_submit());
        }
    }

    #[test]
    fn test_shade_only_submission() {
        let layout = initialize_layout();
        let payload = build_submission(&layout, &BTreeMap::new(), Some(12), date()).unwrap();
        assert_eq!(payload.shade_eggs, 12);
        assert!(payload.cages.is_empty());
        assert_eq!(payload.total_eggs(), 12);
    }

    #[test]
    fn test_zero_counts_and_empty_partitions_are_omitted() {
        let layout = initialize_layout();
        let values = cells(&[
            (BoxAddress::new(2, 0, 0, 0), 0),
            (BoxAddress::new(2, 1, 2, 1), 3),
            (BoxAddress::new(1, 0, 1, 1), 0),
        ]);

        let payload = build_submission(&layout, &values, None, date()).unwrap();

        assert_eq!(payload.cages.len(), 1);
        let cage = &payload.cages[0];
        assert_eq!(cage.cage_id, CageId(2));
        assert_eq!(cage.cage_type, CageType::Standard);
        assert_eq!(cage.partitions.len(), 1);
        assert_eq!(cage.partitions[0].partition_index, 2);
        assert_eq!(
            cage.partitions[0].eggs_collected,
            vec![EggRecord { value: 3, box_number: 2, partition_index: 1 }]
        );
    }

    #[test]
    fn test_unknown_cage_is_dropped() {
        let layout = initialize_layout();
        let values = cells(&[(BoxAddress::new(9, 0, 0, 0), 4), (BoxAddress::new(1, 0, 0, 0), 1)]);

        let payload = build_submission(&layout, &values, None, date()).unwrap();
        assert_eq!(payload.cages.len(), 1);
        assert_eq!(payload.cages[0].cage_id, CageId(1));
    }

    #[test]
    fn test_builder_is_deterministic() {
        let layout = initialize_layout();
        let values = cells(&[
            (BoxAddress::new(2, 1, 3, 3), 4),
            (BoxAddress::new(1, 0, 2, 5), 1),
            (BoxAddress::new(2, 0, 0, 2), 2),
            (BoxAddress::new(1, 0, 0, 0), 3),
        ]);

        let first = build_submission(&layout, &values, Some(5), date()).unwrap();
        let second = build_submission(&layout, &values, Some(5), date()).unwrap();
        assert_eq!(first, second);

        let cage_ids: Vec<_> = first.cages.iter().map(|c| c.cage_id).collect();
        assert_eq!(cage_ids, vec![CageId(1), CageId(2)]);
        let partition_indices: Vec<_> = first.cages[1].partitions.iter().map(|p| p.partition_index).collect();
        assert_eq!(partition_indices, vec![1, 2]);
    }

    #[test]
    fn test_regroup_reproduces_non_zero_entries() {
        let layout = initialize_layout();
        let values = cells(&[
            (BoxAddress::new(1, 0, 0, 7), 4),
            (BoxAddress::new(1, 0, 3, 0), 1),
            (BoxAddress::new(2, 0, 1, 1), 0),
            (BoxAddress::new(2, 1, 2, 3), 2),
        ]);

        let payload = build_submission(&layout, &values, None, date()).unwrap();

        let mut expected: Vec<SubmittedBox> = values
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(address, count)| (address.cage, address.partition + 1, address.column + 1, u32::from(*count)))
            .collect();
        expected.sort();

        assert_eq!(regroup(&payload), expected);
        assert_eq!(payload.box_eggs(), 7);
    }
}
