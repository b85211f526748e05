//! Read-only grid rebuilt from a recorded collection table
//!
//! The backend returns each partition as a flat list of `{box, eggs}`
//! entries. Rows are recovered by chunking that list by the cage's row width,
//! so the result is addressed the same way as the collection grid.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::layout::{FarmLayout, PartitionSide, ROWS_PER_PARTITION};
use crate::messages::report::{CageTable, EggCollectionTable};
use crate::types::{BoxAddress, CageId, CageType};

/// Row width for cages neither the layout nor the table describes
const UNKNOWN_CAGE_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBox {
    pub box_number: usize,
    pub eggs: u32,
    /// Matching collection-grid address, when the partition is part of the layout
    pub address: Option<BoxAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPartition {
    pub side: PartitionSide,
    /// 0-based layout index; `None` for sides the layout does not have
    pub index: Option<usize>,
    pub rows: Vec<Vec<ReportBox>>,
}

impl ReportPartition {
    pub fn total(&self) -> u32 {
        self.rows.iter().flatten().map(|b| b.eggs).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCage {
    pub cage_id: CageId,
    pub cage_type: Option<CageType>,
    pub cage_total: u32,
    pub partitions: Vec<ReportPartition>,
}

impl ReportCage {
    pub fn partition(&self, side: PartitionSide) -> Option<&ReportPartition> {
        self.partitions.iter().find(|p| p.side == side)
    }
}

/// Recorded collection for one date, shaped like the collection grid
#[derive(Debug, Clone, PartialEq)]
pub struct ReportGrid {
    pub date: NaiveDate,
    pub grand_total: u32,
    pub shade_total: u32,
    pub laying_percentage: Option<f64>,
    pub performance_comment: Option<String>,
    pub cages: Vec<ReportCage>,
}

impl ReportGrid {
    pub fn from_table(layout: &FarmLayout, table: &EggCollectionTable) -> Self {
        let cages = table.cages.iter().map(|cage| reshape_cage(layout, cage)).collect();

        Self {
            date: table.date,
            grand_total: table.grand_total,
            shade_total: table.shade_total,
            laying_percentage: table.laying_percentage(),
            performance_comment: table.performance_comment.clone(),
            cages,
        }
    }

    pub fn cage(&self, id: CageId) -> Option<&ReportCage> {
        self.cages.iter().find(|c| c.cage_id == id)
    }

    /// Recorded eggs at a grid address
    pub fn count_at(&self, address: &BoxAddress) -> Option<u32> {
        self.boxes()
            .find(|b| b.address.as_ref() == Some(address))
            .map(|b| b.eggs)
    }

    /// Recorded counts keyed by grid address, for boxes that have one
    pub fn cell_values(&self) -> BTreeMap<BoxAddress, u32> {
        self.boxes()
            .filter_map(|b| b.address.map(|address| (address, b.eggs)))
            .collect()
    }

    pub fn cage_eggs(&self) -> u32 {
        self.cages.iter().map(|c| c.cage_total).sum()
    }

    fn boxes(&self) -> impl Iterator<Item = &ReportBox> {
        self.cages
            .iter()
            .flat_map(|c| c.partitions.iter())
            .flat_map(|p| p.rows.iter())
            .flatten()
    }
}

fn reshape_cage(layout: &FarmLayout, table: &CageTable) -> ReportCage {
    let cage_id = CageId(table.cage_id);
    let cage_layout = layout.cage(cage_id);
    let cage_type = cage_layout.map(|c| c.cage_type).or(table.cage_type);
    let columns = cage_layout
        .map(|c| c.columns_per_row())
        .filter(|&columns| columns > 0)
        .or(table.cage_type.map(CageType::columns_per_row))
        .unwrap_or(UNKNOWN_CAGE_COLUMNS);

    let mut partitions = Vec::new();
    for side in PartitionSide::ALL {
        let entries = table.side(side);
        let index = cage_layout.and_then(|c| c.partition_for_side(side)).map(|p| p.index);

        // Sides outside the layout are only kept when they carry data
        if index.is_none() && entries.is_empty() {
            continue;
        }

        let rows = entries
            .chunks(columns)
            .take(ROWS_PER_PARTITION)
            .enumerate()
            .map(|(row, chunk)| {
                chunk
                    .iter()
                    .enumerate()
                    .map(|(column, entry)| ReportBox {
                        box_number: entry.box_number,
                        eggs: entry.eggs,
                        address: index.map(|partition| BoxAddress {
                            cage: cage_id,
                            partition,
                            row,
                            column,
                        }),
                    })
                    .collect()
            })
            .collect();

        partitions.push(ReportPartition { side, index, rows });
    }

    ReportCage {
        cage_id,
        cage_type,
        cage_total: table.cage_total,
        partitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::initialize_layout;
    use crate::messages::report::BoxEntry;

    fn entries(count: usize, eggs: impl Fn(usize) -> u32) -> Vec<BoxEntry> {
        (0..count)
            .map(|i| BoxEntry {
                box_number: i % 8 + 1,
                eggs: eggs(i),
            })
            .collect()
    }

    fn table() -> EggCollectionTable {
        EggCollectionTable {
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            grand_total: 20,
            shade_total: 2,
            cage_total: None,
            laying_percentage: serde_json::json!(31.25),
            performance_comment: Some("Average".into()),
            cages: vec![
                CageTable {
                    cage_id: 1,
                    cage_total: 12,
                    front_partition: entries(32, |i| if i == 11 { 4 } else { u32::from(i == 3) * 2 }),
                    ..Default::default()
                },
                CageTable {
                    cage_id: 2,
                    cage_total: 6,
                    front_partition: entries(16, |_| 0),
                    back_partition: entries(16, |i| if i == 15 { 3 } else { 0 }),
                    middle1_partition: entries(4, |_| 1),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_rows_are_chunked_by_layout_width() {
        let grid = ReportGrid::from_table(&initialize_layout(), &table());

        let combined = grid.cage(CageId(1)).unwrap();
        assert_eq!(combined.cage_type, Some(CageType::Combined));
        let front = combined.partition(PartitionSide::Front).unwrap();
        assert_eq!(front.rows.len(), 4);
        assert!(front.rows.iter().all(|row| row.len() == 8));

        let standard = grid.cage(CageId(2)).unwrap();
        let back = standard.partition(PartitionSide::Back).unwrap();
        assert_eq!(back.index, Some(1));
        assert!(back.rows.iter().all(|row| row.len() == 4));
    }

    #[test]
    fn test_lookup_by_grid_address() {
        let grid = ReportGrid::from_table(&initialize_layout(), &table());

        assert_eq!(grid.count_at(&BoxAddress::new(1, 0, 0, 3)), Some(2));
        assert_eq!(grid.count_at(&BoxAddress::new(1, 0, 1, 3)), Some(4));
        assert_eq!(grid.count_at(&BoxAddress::new(2, 1, 3, 3)), Some(3));
        assert_eq!(grid.count_at(&BoxAddress::new(2, 2, 0, 0)), None);
        assert_eq!(grid.cell_values().len(), 32 + 16 + 16);
    }

    #[test]
    fn test_middle_partitions_kept_without_address() {
        let grid = ReportGrid::from_table(&initialize_layout(), &table());
        let standard = grid.cage(CageId(2)).unwrap();

        let middle = standard.partition(PartitionSide::Middle1).unwrap();
        assert_eq!(middle.index, None);
        assert_eq!(middle.total(), 4);
        assert!(middle.rows.iter().flatten().all(|b| b.address.is_none()));
        assert!(standard.partition(PartitionSide::Middle2).is_none());
    }

    #[test]
    fn test_summary_fields_carry_over() {
        let grid = ReportGrid::from_table(&initialize_layout(), &table());
        assert_eq!(grid.grand_total, 20);
        assert_eq!(grid.shade_total, 2);
        assert_eq!(grid.laying_percentage, Some(31.25));
        assert_eq!(grid.cage_eggs(), 18);
    }

    #[test]
    fn test_unknown_cage_uses_fallback_width() {
        let mut table = table();
        table.cages.push(CageTable {
            cage_id: 3,
            cage_total: 0,
            front_partition: entries(8, |_| 1),
            ..Default::default()
        });

        let grid = ReportGrid::from_table(&initialize_layout(), &table);
        let extra = grid.cage(CageId(3)).unwrap();
        assert_eq!(extra.cage_type, None);
        let front = extra.partition(PartitionSide::Front).unwrap();
        assert_eq!(front.rows.len(), 2);
        assert_eq!(front.rows[0].len(), 4);
    }

    #[test]
    fn test_unknown_cage_takes_width_from_its_type() {
        let mut table = table();
        table.cages.push(CageTable {
            cage_id: 4,
            cage_type: Some(CageType::Combined),
            front_partition: entries(8, |_| 1),
            ..Default::default()
        });

        let grid = ReportGrid::from_table(&initialize_layout(), &table);
        let extra = grid.cage(CageId(4)).unwrap();
        assert_eq!(extra.cage_type, Some(CageType::Combined));
        let front = extra.partition(PartitionSide::Front).unwrap();
        assert_eq!(front.rows.len(), 1);
        assert_eq!(front.rows[0].len(), 8);
        assert!(front.rows[0].iter().all(|b| b.address.is_none()));
    }

    #[test]
    fn test_width_is_not_keyed_on_cage_id() {
        let table: EggCollectionTable = serde_json::from_value(serde_json::json!({
            "date": "2024-04-02",
            "cages": [{"cage_id": 1, "front_partition": (1..=8).map(|n| serde_json::json!({"box": n, "eggs": 1})).collect::<Vec<_>>()}]
        }))
        .unwrap();

        let grid = ReportGrid::from_table(&FarmLayout::new(Vec::new()), &table);
        let front = grid.cage(CageId(1)).unwrap().partition(PartitionSide::Front).unwrap();
        assert_eq!(front.rows.len(), 2);
        assert_eq!(front.rows[0].len(), UNKNOWN_CAGE_COLUMNS);
    }

    #[test]
    fn test_table_cage_type_accepts_type_key() {
        let cage: CageTable = serde_json::from_value(serde_json::json!({"cage_id": 5, "type": "standard"})).unwrap();
        assert_eq!(cage.cage_type, Some(CageType::Standard));
    }
}
