//! Wire messages exchanged with the farm backend
//!
//! - `auth`: login, registration, password reset, profile and error bodies
//! - `report`: egg-collection table
//! - `dashboard`: owner overview metrics
//! - `records`: sales, expenses, feed, medical, record history and detailed reports
//! - `users`: user administration

pub mod auth;
pub mod dashboard;
pub mod records;
pub mod report;
pub mod users;

pub use auth::{
    AuthResponse, ErrorBody, LoginRequest, PasswordResetRequest, ProfileUpdateForm, ProfileUpdateRequest,
    ProfileUpdateResponse, RegisterRequest, RegisterResponse, SignUpForm,
};

pub use dashboard::{CageBreakdown, DashboardOverview};

pub use records::{
    ChickenCountUpdate, DailySummary, DateRange, DetailedReport, DetailedReportKind, DetailedTotals,
    EggCollectionRow, ExpenseRecord, FeedConsumption, FeedConsumptionRow, FeedPurchase, FeedPurchaseRow,
    MedicalRecord, RecordHistory, RecordKind, SaleRecord, WeekTotal, KG_PER_SACK,
};

pub use report::{BoxEntry, CageTable, EggCollectionTable, EGGS_PER_TRAY};

pub use users::UserRecord;

use serde_json::Value;

/// Read a number the backend may send as JSON number or decimal string
pub fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_number() {
        assert_eq!(lenient_number(&json!(12)), Some(12.0));
        assert_eq!(lenient_number(&json!("81.25")), Some(81.25));
        assert_eq!(lenient_number(&json!("n/a")), None);
        assert_eq!(lenient_number(&Value::Null), None);
    }
}
