//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SharedError;

/// Egg count held by a single box, always within `0..=MAX_EGGS_PER_BOX`
pub type EggCount = u8;

/// Identifier of a physical cage on the farm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CageId(pub u32);

impl fmt::Display for CageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cage construction, which fixes its partition and box layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CageType {
    /// One partition of 4 rows by 8 boxes
    Combined,
    /// Front and back partitions of 4 rows by 4 boxes each
    Standard,
}

impl CageType {
    /// Boxes in each row of this kind of cage
    pub fn columns_per_row(self) -> usize {
        match self {
            CageType::Combined => 8,
            CageType::Standard => 4,
        }
    }
}

impl fmt::Display for CageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CageType::Combined => write!(f, "combined"),
            CageType::Standard => write!(f, "standard"),
        }
    }
}

/// Address of one box: cage, partition, row and column (all indices 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxAddress {
    pub cage: CageId,
    pub partition: usize,
    pub row: usize,
    pub column: usize,
}

impl BoxAddress {
    pub fn new(cage: u32, partition: usize, row: usize, column: usize) -> Self {
        Self {
            cage: CageId(cage),
            partition,
            row,
            column,
        }
    }

    /// 1-based box number within its row
    pub fn box_number(&self) -> usize {
        self.column + 1
    }
}

impl fmt::Display for BoxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}", self.cage, self.partition, self.row, self.column)
    }
}

impl FromStr for BoxAddress {
    type Err = SharedError;

    /// Parses the `cage-partition-row-column` form, e.g. `1-0-0-3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SharedError::InvalidBoxAddress { input: s.to_string() };

        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 4 {
            return Err(invalid());
        }

        let cage = parts[0].parse::<u32>().map_err(|_| invalid())?;
        let partition = parts[1].parse::<usize>().map_err(|_| invalid())?;
        let row = parts[2].parse::<usize>().map_err(|_| invalid())?;
        let column = parts[3].parse::<usize>().map_err(|_| invalid())?;

        Ok(BoxAddress::new(cage, partition, row, column))
    }
}

/// Role carried by an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Worker,
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Worker => write!(f, "worker"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "worker" => Ok(Role::Worker),
            "owner" => Ok(Role::Owner),
            _ => Err(SharedError::InvalidRole { input: s.to_string() }),
        }
    }
}

/// User record returned by the backend on login and persisted with the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

impl UserProfile {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_address_string_form() {
        let address = BoxAddress::new(1, 0, 0, 3);
        assert_eq!(address.to_string(), "1-0-0-3");
        assert_eq!("1-0-0-3".parse::<BoxAddress>().unwrap(), address);
        assert_eq!(address.box_number(), 4);
    }

    #[test]
    fn test_box_address_rejects_malformed_input() {
        for input in ["", "1-0-0", "1-0-0-3-4", "a-0-0-0", "1--0-0", "1-0-0--1"] {
            assert!(
                matches!(input.parse::<BoxAddress>(), Err(SharedError::InvalidBoxAddress { .. })),
                "should reject {input:?}"
            );
        }
    }

    #[test]
    fn test_box_address_ordering_is_cage_partition_row_column() {
        let mut addresses = vec![
            BoxAddress::new(2, 0, 0, 0),
            BoxAddress::new(1, 0, 1, 0),
            BoxAddress::new(1, 0, 0, 7),
        ];
        addresses.sort();
        assert_eq!(addresses[0], BoxAddress::new(1, 0, 0, 7));
        assert_eq!(addresses[2], BoxAddress::new(2, 0, 0, 0));
    }

    #[test]
    fn test_role_parsing_and_serde() {
        assert_eq!("Owner".parse::<Role>().unwrap(), Role::Owner);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Worker).unwrap(), "\"worker\"");
    }

    #[test]
    fn test_user_profile_ignores_extra_fields() {
        let json = r#"{"id": 7, "username": "amina", "email": "a@farm.test", "role": "owner", "phone": "0700"}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert!(user.is_owner());
        assert_eq!(user.username, "amina");
    }
}
