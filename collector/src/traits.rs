//! Collector trait definitions for dependency injection

use async_trait::async_trait;
use chrono::NaiveDate;

use shared::{
    AuthResponse, ChickenCountUpdate, DashboardOverview, DateRange, DetailedReport, EggCollectionTable, ExpenseRecord,
    FeedConsumption,
    FeedPurchase, LoginRequest, MedicalRecord, PasswordResetRequest, ProfileUpdateRequest, ProfileUpdateResponse,
    RecordHistory, RecordKind, RegisterRequest, RegisterResponse, SaleRecord, SubmissionPayload, UserRecord,
};

use crate::error::CollectorResult;

/// Farm backend REST API.
///
/// Every call that takes a token sends it as `Authorization: Token <token>`.
/// A 401 from any call surfaces as `CollectorError::Unauthorized`.
#[mockall::automock]
#[async_trait]
pub trait FarmApi: Send + Sync {
    /// Exchange credentials for a token and user record
    async fn login(&self, request: &LoginRequest) -> CollectorResult<AuthResponse>;

    /// Create an account; owners pass their token when adding staff
    async fn register(&self, token: Option<String>, request: &RegisterRequest) -> CollectorResult<RegisterResponse>;

    async fn request_password_reset(&self, request: &PasswordResetRequest) -> CollectorResult<()>;

    /// Post one day's collection
    async fn submit_daily_collection(&self, token: &str, payload: &SubmissionPayload) -> CollectorResult<()>;

    /// Recorded collection table for a date
    async fn fetch_collection_table(&self, token: &str, date: NaiveDate) -> CollectorResult<EggCollectionTable>;

    async fn dashboard_overview(&self, token: &str) -> CollectorResult<DashboardOverview>;

    async fn list_users(&self, token: &str) -> CollectorResult<Vec<UserRecord>>;

    async fn pending_users(&self, token: &str) -> CollectorResult<Vec<UserRecord>>;

    async fn approve_user(&self, token: &str, user_id: u64) -> CollectorResult<()>;

    async fn delete_user(&self, token: &str, user_id: u64) -> CollectorResult<()>;

    async fn update_profile(&self, token: &str, request: &ProfileUpdateRequest) -> CollectorResult<ProfileUpdateResponse>;

    async fn update_chicken_count(&self, token: &str, update: &ChickenCountUpdate) -> CollectorResult<()>;

    async fn record_sale(&self, token: &str, sale: &SaleRecord) -> CollectorResult<()>;

    async fn record_expense(&self, token: &str, expense: &ExpenseRecord) -> CollectorResult<()>;

    async fn record_feed_purchase(&self, token: &str, purchase: &FeedPurchase) -> CollectorResult<()>;

    async fn record_feed_consumption(&self, token: &str, consumption: &FeedConsumption) -> CollectorResult<()>;

    async fn record_medical(&self, token: &str, record: &MedicalRecord) -> CollectorResult<()>;

    async fn record_history(&self, token: &str, kind: RecordKind) -> CollectorResult<RecordHistory>;

    /// Daily summaries and raw records; without a range the backend picks the period
    async fn detailed_report(&self, token: &str, range: Option<DateRange>) -> CollectorResult<DetailedReport>;

    /// PDF report bytes for a record kind and date range
    async fn download_report(
        &self,
        token: &str,
        kind: RecordKind,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CollectorResult<Vec<u8>>;
}

/// Persistent key-value storage for the session (two keys: token and user)
#[mockall::automock]
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> CollectorResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> CollectorResult<()>;

    fn remove(&self, key: &str) -> CollectorResult<()>;
}
