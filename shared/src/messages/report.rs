//! Egg-collection table returned by the reporting endpoint

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layout::PartitionSide;
use crate::types::CageType;
use crate::messages::lenient_number;

/// Eggs in one full tray
pub const EGGS_PER_TRAY: u32 = 30;

/// One box in a reported partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxEntry {
    #[serde(rename = "box")]
    pub box_number: usize,
    #[serde(default)]
    pub eggs: u32,
}

/// Per-cage section of the collection table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CageTable {
    pub cage_id: u32,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub cage_type: Option<CageType>,
    #[serde(default)]
    pub cage_total: u32,
    #[serde(default)]
    pub front_partition: Vec<BoxEntry>,
    #[serde(default)]
    pub middle1_partition: Vec<BoxEntry>,
    #[serde(default)]
    pub middle2_partition: Vec<BoxEntry>,
    #[serde(default)]
    pub back_partition: Vec<BoxEntry>,
}

impl CageTable {
    pub fn side(&self, side: PartitionSide) -> &[BoxEntry] {
        match side {
            PartitionSide::Front => &self.front_partition,
            PartitionSide::Middle1 => &self.middle1_partition,
            PartitionSide::Middle2 => &self.middle2_partition,
            PartitionSide::Back => &self.back_partition,
        }
    }

    pub fn side_total(&self, side: PartitionSide) -> u32 {
        self.side(side).iter().map(|entry| entry.eggs).sum()
    }
}

/// Response of `GET /api/cages/reports/egg-collection-table/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EggCollectionTable {
    pub date: NaiveDate,
    #[serde(default)]
    pub grand_total: u32,
    #[serde(default)]
    pub shade_total: u32,
    #[serde(default)]
    pub cage_total: Option<u32>,
    /// Sent either as a number or a decimal string
    #[serde(default)]
    pub laying_percentage: Value,
    #[serde(default)]
    pub performance_comment: Option<String>,
    #[serde(default)]
    pub cages: Vec<CageTable>,
}

impl EggCollectionTable {
    pub fn laying_percentage(&self) -> Option<f64> {
        lenient_number(&self.laying_percentage)
    }

    /// Eggs collected from cages, excluding shade eggs
    pub fn cage_eggs(&self) -> u32 {
        self.cage_total
            .unwrap_or_else(|| self.cages.iter().map(|cage| cage.cage_total).sum())
    }

    /// (full trays, remaining eggs) for the grand total
    pub fn trays(&self) -> (u32, u32) {
        (self.grand_total / EGGS_PER_TRAY, self.grand_total % EGGS_PER_TRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_parses_backend_shape() {
        let json = r#"{
            "date": "2024-06-01",
            "grand_total": 65,
            "shade_total": 5,
            "laying_percentage": "23.44",
            "performance_comment": "Fair",
            "cages": [
                {"cage_id": 1, "cage_total": 60, "front_partition": [{"box": 1, "eggs": 3}],
                 "middle1_partition": [], "middle2_partition": [], "back_partition": []}
            ]
        }"#;

        let table: EggCollectionTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.laying_percentage(), Some(23.44));
        assert_eq!(table.cages[0].side(PartitionSide::Front)[0], BoxEntry { box_number: 1, eggs: 3 });
        assert_eq!(table.cage_eggs(), 60);
        assert_eq!(table.trays(), (2, 5));
    }

    #[test]
    fn test_missing_partitions_default_to_empty() {
        let cage: CageTable = serde_json::from_str(r#"{"cage_id": 2}"#).unwrap();
        assert!(cage.back_partition.is_empty());
        assert_eq!(cage.side_total(PartitionSide::Back), 0);
    }
}
