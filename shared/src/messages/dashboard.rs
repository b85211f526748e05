//! Owner dashboard overview

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::messages::lenient_number;

/// Response of `GET /api/cages/dashboard/overview/`.
///
/// Only the headline metrics are typed; everything else the backend sends is
/// kept in `extra` for display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardOverview {
    #[serde(default)]
    pub total_chickens: Option<u32>,
    #[serde(default)]
    pub eggs_today: Option<u32>,
    #[serde(default)]
    pub trays_in_store: Value,
    #[serde(default)]
    pub egg_production: Value,
    #[serde(default)]
    pub feed_requirements: Value,
    #[serde(default)]
    pub expenses_today: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Today's eggs for one cage as broken down by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CageBreakdown {
    pub total: u32,
    pub front: u32,
    pub back: u32,
}

impl DashboardOverview {
    pub fn laying_percentage(&self) -> f64 {
        self.egg_production
            .get("laying_percentage")
            .and_then(lenient_number)
            .unwrap_or(0.0)
    }

    pub fn daily_feed_kg(&self) -> f64 {
        self.feed_requirements
            .get("daily_kg")
            .and_then(lenient_number)
            .unwrap_or(0.0)
    }

    pub fn trays_in_store(&self) -> f64 {
        lenient_number(&self.trays_in_store).unwrap_or(0.0)
    }

    /// Expense total for today; the backend sends either a number or `{total}`
    pub fn expenses_today(&self) -> f64 {
        lenient_number(&self.expenses_today)
            .or_else(|| self.expenses_today.get("total").and_then(lenient_number))
            .unwrap_or(0.0)
    }

    pub fn shade_eggs_today(&self) -> u32 {
        self.breakdown()
            .and_then(|breakdown| breakdown.get("shade_eggs"))
            .and_then(lenient_number)
            .unwrap_or(0.0) as u32
    }

    /// Today's breakdown for a cage, zeros when the backend has nothing
    pub fn cage_breakdown(&self, cage_id: u32) -> CageBreakdown {
        let Some(cage) = self
            .breakdown()
            .and_then(|breakdown| breakdown.get("cages"))
            .and_then(|cages| cages.get(cage_id.to_string()))
        else {
            return CageBreakdown::default();
        };

        let field = |name: &str| cage.get(name).and_then(lenient_number).unwrap_or(0.0) as u32;
        CageBreakdown {
            total: field("total"),
            front: field("front"),
            back: field("back"),
        }
    }

    fn breakdown(&self) -> Option<&Value> {
        self.egg_production.get("today_breakdown")
    }
}
