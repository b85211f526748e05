//! Farm records kept by the owner: sales, expenses, feed and medical

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::errors::{SharedError, SharedResult};
use crate::messages::lenient_number;

/// Kilograms in one sack of feed
pub const KG_PER_SACK: f64 = 70.0;

/// Days covered by a report download when no range is given
pub const DEFAULT_REPORT_DAYS: i64 = 30;

const DEFAULT_FEED_TYPE: &str = "general";
const DEFAULT_TREATMENT_TYPE: &str = "general";

fn require_positive(field: &str, value: f64) -> SharedResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SharedError::validation(field, "must be greater than zero"))
    }
}

fn require_text(field: &str, value: &str) -> SharedResult<()> {
    if value.trim().is_empty() {
        Err(SharedError::validation(field, "is required"))
    } else {
        Ok(())
    }
}

/// Body of `POST /api/cages/sales/record/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub trays_sold: u32,
    pub price_per_tray: f64,
    pub date: NaiveDate,
}

impl SaleRecord {
    pub fn new(trays_sold: u32, price_per_tray: f64, date: NaiveDate) -> SharedResult<Self> {
        require_positive("trays_sold", f64::from(trays_sold))?;
        require_positive("price_per_tray", price_per_tray)?;
        Ok(Self {
            trays_sold,
            price_per_tray,
            date,
        })
    }

    pub fn total_amount(&self) -> f64 {
        f64::from(self.trays_sold) * self.price_per_tray
    }
}

/// Body of `POST /api/cages/expenses/record/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub expense_type: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sacks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_type: Option<String>,
}

impl ExpenseRecord {
    pub fn new(expense_type: &str, amount: f64, description: &str, date: NaiveDate) -> SharedResult<Self> {
        require_text("expense_type", expense_type)?;
        require_positive("amount", amount)?;
        Ok(Self {
            expense_type: expense_type.trim().to_lowercase(),
            amount,
            description: description.to_string(),
            date,
            sacks: None,
            quantity_kg: None,
            treatment_type: None,
        })
    }

    /// Feed expenses are also booked as a feed purchase
    pub fn companion_feed_purchase(&self) -> Option<FeedPurchase> {
        if self.expense_type != "feed" {
            return None;
        }
        let quantity_kg = self
            .quantity_kg
            .unwrap_or_else(|| f64::from(self.sacks.unwrap_or(0)) * KG_PER_SACK);

        Some(FeedPurchase {
            quantity_kg,
            total_cost: self.amount,
            feed_type: DEFAULT_FEED_TYPE.to_string(),
            date: self.date,
            sacks: self.sacks,
        })
    }

    /// Medicine expenses are also booked as a medical treatment
    pub fn companion_medical(&self) -> Option<MedicalRecord> {
        if self.expense_type != "medicine" {
            return None;
        }
        Some(MedicalRecord {
            treatment_type: self
                .treatment_type
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TREATMENT_TYPE.to_string()),
            description: self.description.clone(),
            cost: self.amount,
            date: self.date,
        })
    }
}

/// Body of `POST /api/cages/feed/purchase/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPurchase {
    pub quantity_kg: f64,
    pub total_cost: f64,
    pub feed_type: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sacks: Option<u32>,
}

impl FeedPurchase {
    pub fn new(quantity_kg: f64, total_cost: f64, feed_type: &str, date: NaiveDate) -> SharedResult<Self> {
        require_positive("quantity_kg", quantity_kg)?;
        require_positive("total_cost", total_cost)?;
        require_text("feed_type", feed_type)?;
        Ok(Self {
            quantity_kg,
            total_cost,
            feed_type: feed_type.trim().to_string(),
            date,
            sacks: None,
        })
    }

    /// Purchase measured in sacks
    pub fn from_sacks(sacks: u32, total_cost: f64, feed_type: &str, date: NaiveDate) -> SharedResult<Self> {
        let mut purchase = Self::new(f64::from(sacks) * KG_PER_SACK, total_cost, feed_type, date)?;
        purchase.sacks = Some(sacks);
        Ok(purchase)
    }
}

/// Body of `POST /api/cages/feed/consumption/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConsumption {
    pub quantity_used_kg: f64,
    pub date: NaiveDate,
}

impl FeedConsumption {
    pub fn new(quantity_used_kg: f64, date: NaiveDate) -> SharedResult<Self> {
        require_positive("quantity_used_kg", quantity_used_kg)?;
        Ok(Self { quantity_used_kg, date })
    }
}

/// Body of `POST /api/cages/medical/record/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub treatment_type: String,
    pub description: String,
    pub cost: f64,
    pub date: NaiveDate,
}

impl MedicalRecord {
    pub fn new(treatment_type: &str, description: &str, cost: f64, date: NaiveDate) -> SharedResult<Self> {
        require_text("treatment_type", treatment_type)?;
        require_text("description", description)?;
        if cost < 0.0 {
            return Err(SharedError::validation("cost", "cannot be negative"));
        }
        Ok(Self {
            treatment_type: treatment_type.trim().to_string(),
            description: description.trim().to_string(),
            cost,
            date,
        })
    }
}

/// Body of `PUT /api/cages/chicken-count/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChickenCountUpdate {
    pub total_chickens: u32,
}

/// Record families with a history endpoint and a PDF report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Sales,
    Feed,
    Expenses,
    Medical,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [RecordKind::Sales, RecordKind::Feed, RecordKind::Expenses, RecordKind::Medical];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Sales => "sales",
            RecordKind::Feed => "feed",
            RecordKind::Expenses => "expenses",
            RecordKind::Medical => "medical",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RecordKind::Sales => "Sales History",
            RecordKind::Feed => "Feed Records",
            RecordKind::Expenses => "Expense Records",
            RecordKind::Medical => "Medical Records",
        }
    }

    pub fn history_path(&self) -> String {
        format!("/api/cages/{}/history/", self.as_str())
    }

    pub fn download_path(&self) -> String {
        format!("/api/cages/reports/download/{}/", self.as_str())
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sales" => Ok(RecordKind::Sales),
            "feed" => Ok(RecordKind::Feed),
            "expenses" => Ok(RecordKind::Expenses),
            "medical" => Ok(RecordKind::Medical),
            _ => Err(SharedError::InvalidRecordKind { input: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// The thirty days ending on `today`
    pub fn last_days_until(today: NaiveDate) -> Self {
        Self {
            start_date: today - Duration::days(DEFAULT_REPORT_DAYS),
            end_date: today,
        }
    }

    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> SharedResult<Self> {
        if start_date > end_date {
            return Err(SharedError::validation("start_date", "must not be after end_date"));
        }
        Ok(Self { start_date, end_date })
    }

    /// Sunday to Saturday week containing `day`
    pub fn week_of(day: NaiveDate) -> Self {
        let start_date = day - Duration::days(i64::from(day.weekday().num_days_from_sunday()));
        Self {
            start_date,
            end_date: start_date + Duration::days(6),
        }
    }

    /// Calendar month containing `day`
    pub fn month_of(day: NaiveDate) -> Self {
        let start_date = day - Duration::days(i64::from(day.day0()));
        let end_date = start_date
            .iter_days()
            .take_while(|d| d.month() == start_date.month())
            .last()
            .unwrap_or(start_date);
        Self { start_date, end_date }
    }

    /// Days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Response of a record history endpoint
///
/// The record lists differ per kind (`sales`, `feed_purchases`,
/// `feed_consumption`, `expenses`, `expense_types`, `medical_records`,
/// `treatment_types`) and are kept as named sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordHistory {
    pub date_range: DateRange,
    #[serde(default)]
    pub summary: Map<String, Value>,
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

impl RecordHistory {
    /// Entries of one named section, empty when absent
    pub fn section(&self, name: &str) -> &[Value] {
        self.sections
            .get(name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Owner views built from the detailed report endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailedReportKind {
    Feed,
    Performance,
    Weekly,
    Monthly,
}

impl DetailedReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailedReportKind::Feed => "feed",
            DetailedReportKind::Performance => "performance",
            DetailedReportKind::Weekly => "weekly",
            DetailedReportKind::Monthly => "monthly",
        }
    }

    /// Period requested when the caller gives none; `None` leaves it to the backend
    pub fn default_range(&self, today: NaiveDate) -> Option<DateRange> {
        match self {
            DetailedReportKind::Weekly => Some(DateRange::week_of(today)),
            DetailedReportKind::Monthly => Some(DateRange::month_of(today)),
            DetailedReportKind::Feed | DetailedReportKind::Performance => None,
        }
    }
}

impl fmt::Display for DetailedReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailedReportKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feed" => Ok(DetailedReportKind::Feed),
            "performance" => Ok(DetailedReportKind::Performance),
            "weekly" => Ok(DetailedReportKind::Weekly),
            "monthly" => Ok(DetailedReportKind::Monthly),
            _ => Err(SharedError::InvalidRecordKind { input: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailedTotals {
    #[serde(default)]
    pub total_eggs: u32,
    #[serde(default)]
    pub total_trays_sold: Value,
    #[serde(default)]
    pub total_feed_used: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DetailedTotals {
    pub fn trays_sold(&self) -> f64 {
        lenient_number(&self.total_trays_sold).unwrap_or(0.0)
    }

    pub fn feed_used_kg(&self) -> f64 {
        lenient_number(&self.total_feed_used).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub eggs_collected: u32,
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub status: Option<String>,
}

impl DailySummary {
    pub fn is_recorded(&self) -> bool {
        self.has_data || self.eggs_collected > 0
    }
}

/// One recorded egg count, per cage and partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EggCollectionRow {
    pub laid_date: NaiveDate,
    #[serde(default)]
    pub cage_id: Option<u32>,
    #[serde(default)]
    pub partition_index: Option<u32>,
    #[serde(default)]
    pub count: u32,
    #[serde(default, rename = "recorded_by__username")]
    pub recorded_by: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPurchaseRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub quantity_kg: Value,
    #[serde(default)]
    pub feed_type: String,
    #[serde(default)]
    pub total_cost: Value,
}

impl FeedPurchaseRow {
    pub fn quantity_kg(&self) -> f64 {
        lenient_number(&self.quantity_kg).unwrap_or(0.0)
    }

    pub fn total_cost(&self) -> f64 {
        lenient_number(&self.total_cost).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConsumptionRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub quantity_used_kg: Value,
}

impl FeedConsumptionRow {
    pub fn quantity_used_kg(&self) -> f64 {
        lenient_number(&self.quantity_used_kg).unwrap_or(0.0)
    }
}

/// Eggs for one seven-day block of a period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekTotal {
    /// 1-based position within the period
    pub week: usize,
    pub start_date: NaiveDate,
    pub total: u32,
}

/// Response of `GET /api/cages/reports/detailed/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedReport {
    pub date_range: DateRange,
    #[serde(default)]
    pub summary_totals: DetailedTotals,
    #[serde(default)]
    pub daily_summaries: Vec<DailySummary>,
    #[serde(default)]
    pub egg_collection_records: Vec<EggCollectionRow>,
    #[serde(default)]
    pub feed_purchase_records: Vec<FeedPurchaseRow>,
    #[serde(default)]
    pub feed_consumption_records: Vec<FeedConsumptionRow>,
    #[serde(default)]
    pub feed_remaining: Value,
}

impl DetailedReport {
    pub fn feed_remaining_kg(&self) -> f64 {
        lenient_number(&self.feed_remaining).unwrap_or(0.0)
    }

    /// Mean eggs per day over the whole period, rounded
    pub fn average_daily_eggs(&self) -> u32 {
        let days = self.date_range.days().max(1) as f64;
        (f64::from(self.summary_totals.total_eggs) / days).round() as u32
    }

    /// Day with the most eggs; the earliest wins a tie
    pub fn most_productive_day(&self) -> Option<&DailySummary> {
        self.daily_summaries
            .iter()
            .reduce(|best, day| if day.eggs_collected > best.eggs_collected { day } else { best })
    }

    pub fn recorded_days(&self) -> usize {
        self.daily_summaries.iter().filter(|day| day.is_recorded()).count()
    }

    pub fn unrecorded_days(&self) -> usize {
        self.daily_summaries.len() - self.recorded_days()
    }

    /// Totals for consecutive seven-day blocks of the daily summaries
    pub fn week_totals(&self) -> Vec<WeekTotal> {
        self.daily_summaries
            .chunks(7)
            .enumerate()
            .map(|(i, days)| WeekTotal {
                week: i + 1,
                start_date: days[0].date,
                total: days.iter().map(|day| day.eggs_collected).sum(),
            })
            .collect()
    }

    /// Best seven-day block; the earliest wins a tie
    pub fn best_week(&self) -> Option<WeekTotal> {
        self.week_totals()
            .into_iter()
            .reduce(|best, week| if week.total > best.total { week } else { best })
    }
}
