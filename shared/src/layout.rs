//! Fixed farm layout: cages, partitions, rows and boxes
//!
//! The farm has two cages. Cage 1 is a combined cage with a single partition
//! of 4 rows by 8 boxes; cage 2 is a standard cage with front and back
//! partitions of 4 rows by 4 boxes each. Every box position houses four
//! chickens.

use serde::Serialize;

use crate::types::{BoxAddress, CageId, CageType};

/// Rows in every partition
pub const ROWS_PER_PARTITION: usize = 4;

/// Chickens sharing one box position
pub const CHICKENS_PER_BOX: u32 = 4;

/// Named side of a partition, as used by the reporting endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionSide {
    Front,
    Middle1,
    Middle2,
    Back,
}

impl PartitionSide {
    /// All sides in display order
    pub const ALL: [PartitionSide; 4] = [
        PartitionSide::Front,
        PartitionSide::Middle1,
        PartitionSide::Middle2,
        PartitionSide::Back,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PartitionSide::Front => "Front Partition",
            PartitionSide::Middle1 => "Middle1 Partition",
            PartitionSide::Middle2 => "Middle2 Partition",
            PartitionSide::Back => "Back Partition",
        }
    }

    /// Key of this side's box list in the collection table response
    pub fn report_key(&self) -> &'static str {
        match self {
            PartitionSide::Front => "front_partition",
            PartitionSide::Middle1 => "middle1_partition",
            PartitionSide::Middle2 => "middle2_partition",
            PartitionSide::Back => "back_partition",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionLayout {
    /// 0-based index within the cage
    pub index: usize,
    pub side: PartitionSide,
    pub rows: usize,
    pub columns: usize,
}

impl PartitionLayout {
    pub fn box_count(&self) -> usize {
        self.rows * self.columns
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CageLayout {
    pub id: CageId,
    pub cage_type: CageType,
    pub partitions: Vec<PartitionLayout>,
}

impl CageLayout {
    /// Single 4x8 partition
    pub fn combined(id: u32) -> Self {
        Self {
            id: CageId(id),
            cage_type: CageType::Combined,
            partitions: vec![PartitionLayout {
                index: 0,
                side: PartitionSide::Front,
                rows: ROWS_PER_PARTITION,
                columns: CageType::Combined.columns_per_row(),
            }],
        }
    }

    /// Front and back 4x4 partitions
    pub fn standard(id: u32) -> Self {
        let partitions = [PartitionSide::Front, PartitionSide::Back]
            .into_iter()
            .enumerate()
            .map(|(index, side)| PartitionLayout {
                index,
                side,
                rows: ROWS_PER_PARTITION,
                columns: CageType::Standard.columns_per_row(),
            })
            .collect();

        Self {
            id: CageId(id),
            cage_type: CageType::Standard,
            partitions,
        }
    }

    pub fn partition(&self, index: usize) -> Option<&PartitionLayout> {
        self.partitions.get(index)
    }

    pub fn partition_for_side(&self, side: PartitionSide) -> Option<&PartitionLayout> {
        self.partitions.iter().find(|p| p.side == side)
    }

    /// Boxes per row; every partition of a cage shares the same width
    pub fn columns_per_row(&self) -> usize {
        self.partitions.first().map(|p| p.columns).unwrap_or(0)
    }

    pub fn box_count(&self) -> usize {
        self.partitions.iter().map(PartitionLayout::box_count).sum()
    }

    pub fn contains(&self, address: &BoxAddress) -> bool {
        address.cage == self.id
            && self
                .partition(address.partition)
                .is_some_and(|p| address.row < p.rows && address.column < p.columns)
    }

    /// Every box address in this cage, in partition, row, column order
    pub fn addresses(&self) -> impl Iterator<Item = BoxAddress> + '_ {
        self.partitions.iter().flat_map(move |partition| {
            (0..partition.rows).flat_map(move |row| {
                (0..partition.columns).map(move |column| BoxAddress {
                    cage: self.id,
                    partition: partition.index,
                    row,
                    column,
                })
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FarmLayout {
    cages: Vec<CageLayout>,
}

impl FarmLayout {
    pub fn new(cages: Vec<CageLayout>) -> Self {
        Self { cages }
    }

    /// Produce the farm's two cages. Deterministic and idempotent.
    pub fn initialize() -> Self {
        Self {
            cages: vec![CageLayout::combined(1), CageLayout::standard(2)],
        }
    }

    pub fn cages(&self) -> &[CageLayout] {
        &self.cages
    }

    pub fn cage(&self, id: CageId) -> Option<&CageLayout> {
        self.cages.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, address: &BoxAddress) -> bool {
        self.cage(address.cage).is_some_and(|c| c.contains(address))
    }

    pub fn addresses(&self) -> impl Iterator<Item = BoxAddress> + '_ {
        self.cages.iter().flat_map(CageLayout::addresses)
    }

    pub fn total_boxes(&self) -> usize {
        self.cages.iter().map(CageLayout::box_count).sum()
    }

    /// Number of chickens the layout houses
    pub fn chicken_capacity(&self) -> u32 {
        self.total_boxes() as u32 * CHICKENS_PER_BOX
    }
}

impl Default for FarmLayout {
    fn default() -> Self {
        Self::initialize()
    }
}

/// Produce the fixed two-cage farm layout
pub fn initialize_layout() -> FarmLayout {
    FarmLayout::initialize()
}
