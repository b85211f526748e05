//! HTTP implementation of the farm backend API

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use shared::{
    AuthResponse, ChickenCountUpdate, DashboardOverview, DateRange, DetailedReport, EggCollectionTable, ErrorBody,
    ExpenseRecord,
    FeedConsumption, FeedPurchase, LoginRequest, MedicalRecord, PasswordResetRequest, ProfileUpdateRequest,
    ProfileUpdateResponse, RecordHistory, RecordKind, RegisterRequest, RegisterResponse, SaleRecord,
    SubmissionPayload, UserRecord,
};

use crate::config::ClientConfig;
use crate::error::{CollectorError, CollectorResult};
use crate::traits::FarmApi;

const LOGIN_PATH: &str = "/api/auth/login/";
const REGISTER_PATH: &str = "/api/auth/register/";
const PASSWORD_RESET_PATH: &str = "/api/auth/password-reset/";
const SUBMIT_PATH: &str = "/api/cages/eggs/submit-daily-collection/";
const COLLECTION_TABLE_PATH: &str = "/api/cages/reports/egg-collection-table/";
const DETAILED_REPORT_PATH: &str = "/api/cages/reports/detailed/";
const DASHBOARD_PATH: &str = "/api/cages/dashboard/overview/";
const USERS_PATH: &str = "/api/auth/users/";
const PENDING_USERS_PATH: &str = "/api/auth/pending-users/";
const PROFILE_PATH: &str = "/api/auth/profile/update/";
const CHICKEN_COUNT_PATH: &str = "/api/cages/chicken-count/";
const SALES_PATH: &str = "/api/cages/sales/record/";
const EXPENSES_PATH: &str = "/api/cages/expenses/record/";
const FEED_PURCHASE_PATH: &str = "/api/cages/feed/purchase/";
const FEED_CONSUMPTION_PATH: &str = "/api/cages/feed/consumption/";
const MEDICAL_PATH: &str = "/api/cages/medical/record/";

/// Whether a 401 means the stored session is dead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Credential exchange; a 401 is just a failed attempt
    Anonymous,
    /// Token-bearing call; a 401 ends the session
    Session,
}

/// Real farm API backed by `reqwest`, with a per-request timeout
pub struct RealFarmApi {
    client: Client,
    config: ClientConfig,
}

impl RealFarmApi {
    pub fn new(config: ClientConfig) -> CollectorResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CollectorError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> CollectorResult<Url> {
        self.config.endpoint(path)
    }

    fn get(&self, token: &str, path: &str) -> CollectorResult<RequestBuilder> {
        Ok(with_token(self.client.get(self.url(path)?), token))
    }

    fn post(&self, token: &str, path: &str) -> CollectorResult<RequestBuilder> {
        Ok(with_token(self.client.post(self.url(path)?), token))
    }

    fn put(&self, token: &str, path: &str) -> CollectorResult<RequestBuilder> {
        Ok(with_token(self.client.put(self.url(path)?), token))
    }

    /// Send a request and turn non-2xx statuses into typed errors
    async fn send(&self, request: RequestBuilder, auth: Auth) -> CollectorResult<Response> {
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CollectorError::from_reqwest(e, self.config.timeout_secs()))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Backend responded");

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED && auth == Auth::Session {
            warn!("Backend rejected the session token");
            return Err(CollectorError::Unauthorized);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CollectorError::from_reqwest(e, self.config.timeout_secs()))?;
        Err(rejection(status, &body))
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> CollectorResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| CollectorError::from_reqwest(e, self.config.timeout_secs()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn range_query(start_date: NaiveDate, end_date: NaiveDate) -> [(&'static str, String); 2] {
    [
        ("start_date", start_date.format("%Y-%m-%d").to_string()),
        ("end_date", end_date.format("%Y-%m-%d").to_string()),
    ]
}

fn with_token(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header(header::AUTHORIZATION, format!("Token {token}"))
}

/// Build a rejection from a non-2xx status and its body
fn rejection(status: StatusCode, body: &[u8]) -> CollectorError {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();

    let field_errors = parsed.as_ref().map(ErrorBody::field_errors).unwrap_or_default();
    let message = parsed
        .as_ref()
        .and_then(ErrorBody::summary)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    CollectorError::Rejected {
        status: status.as_u16(),
        message,
        field_errors,
    }
}

#[async_trait]
impl FarmApi for RealFarmApi {
    async fn login(&self, request: &LoginRequest) -> CollectorResult<AuthResponse> {
        let builder = self.client.post(self.url(LOGIN_PATH)?).json(request);
        let response = self.send(builder, Auth::Anonymous).await?;
        self.read_json(response).await
    }

    async fn register(&self, token: Option<String>, request: &RegisterRequest) -> CollectorResult<RegisterResponse> {
        let mut builder = self.client.post(self.url(REGISTER_PATH)?).json(request);
        let auth = match token.as_deref() {
            Some(token) => {
                builder = with_token(builder, token);
                Auth::Session
            }
            None => Auth::Anonymous,
        };

        let response = self.send(builder, auth).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| CollectorError::from_reqwest(e, self.config.timeout_secs()))?;
        if body.is_empty() {
            return Ok(RegisterResponse::default());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn request_password_reset(&self, request: &PasswordResetRequest) -> CollectorResult<()> {
        let builder = self.client.post(self.url(PASSWORD_RESET_PATH)?).json(request);
        self.send(builder, Auth::Anonymous).await?;
        Ok(())
    }

    async fn submit_daily_collection(&self, token: &str, payload: &SubmissionPayload) -> CollectorResult<()> {
        let builder = self.post(token, SUBMIT_PATH)?.json(payload);
        self.send(builder, Auth::Session).await?;
        Ok(())
    }

    async fn fetch_collection_table(&self, token: &str, date: NaiveDate) -> CollectorResult<EggCollectionTable> {
        let builder = self
            .get(token, COLLECTION_TABLE_PATH)?
            .query(&[("date", date.format("%Y-%m-%d").to_string())]);
        let response = self.send(builder, Auth::Session).await?;
        self.read_json(response).await
    }

    async fn dashboard_overview(&self, token: &str) -> CollectorResult<DashboardOverview> {
        let response = self.send(self.get(token, DASHBOARD_PATH)?, Auth::Session).await?;
        self.read_json(response).await
    }

    async fn list_users(&self, token: &str) -> CollectorResult<Vec<UserRecord>> {
        let response = self.send(self.get(token, USERS_PATH)?, Auth::Session).await?;
        self.read_json(response).await
    }

    async fn pending_users(&self, token: &str) -> CollectorResult<Vec<UserRecord>> {
        let response = self.send(self.get(token, PENDING_USERS_PATH)?, Auth::Session).await?;
        self.read_json(response).await
    }

    async fn approve_user(&self, token: &str, user_id: u64) -> CollectorResult<()> {
        let path = format!("{USERS_PATH}{user_id}/approve/");
        self.send(self.post(token, &path)?, Auth::Session).await?;
        Ok(())
    }

    async fn delete_user(&self, token: &str, user_id: u64) -> CollectorResult<()> {
        let url = self.url(&format!("{USERS_PATH}{user_id}/"))?;
        let builder = with_token(self.client.delete(url), token);
        self.send(builder, Auth::Session).await?;
        Ok(())
    }

    async fn update_profile(&self, token: &str, request: &ProfileUpdateRequest) -> CollectorResult<ProfileUpdateResponse> {
        let builder = self.put(token, PROFILE_PATH)?.json(request);
        let response = self.send(builder, Auth::Session).await?;
        self.read_json(response).await
    }

    async fn update_chicken_count(&self, token: &str, update: &ChickenCountUpdate) -> CollectorResult<()> {
        let builder = self.put(token, CHICKEN_COUNT_PATH)?.json(update);
        self.send(builder, Auth::Session).await?;
        Ok(())
    }

    async fn record_sale(&self, token: &str, sale: &SaleRecord) -> CollectorResult<()> {
        self.send(self.post(token, SALES_PATH)?.json(sale), Auth::Session).await?;
        Ok(())
    }

    async fn record_expense(&self, token: &str, expense: &ExpenseRecord) -> CollectorResult<()> {
        self.send(self.post(token, EXPENSES_PATH)?.json(expense), Auth::Session).await?;
        Ok(())
    }

    async fn record_feed_purchase(&self, token: &str, purchase: &FeedPurchase) -> CollectorResult<()> {
        self.send(self.post(token, FEED_PURCHASE_PATH)?.json(purchase), Auth::Session)
            .await?;
        Ok(())
    }

    async fn record_feed_consumption(&self, token: &str, consumption: &FeedConsumption) -> CollectorResult<()> {
        self.send(self.post(token, FEED_CONSUMPTION_PATH)?.json(consumption), Auth::Session)
            .await?;
        Ok(())
    }

    async fn record_medical(&self, token: &str, record: &MedicalRecord) -> CollectorResult<()> {
        self.send(self.post(token, MEDICAL_PATH)?.json(record), Auth::Session).await?;
        Ok(())
    }

    async fn record_history(&self, token: &str, kind: RecordKind) -> CollectorResult<RecordHistory> {
        let response = self.send(self.get(token, &kind.history_path())?, Auth::Session).await?;
        self.read_json(response).await
    }

    async fn detailed_report(&self, token: &str, range: Option<DateRange>) -> CollectorResult<DetailedReport> {
        let mut builder = self.get(token, DETAILED_REPORT_PATH)?;
        if let Some(range) = &range {
            builder = builder.query(&range_query(range.start_date, range.end_date));
        }
        let response = self.send(builder, Auth::Session).await?;
        self.read_json(response).await
    }

    async fn download_report(
        &self,
        token: &str,
        kind: RecordKind,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CollectorResult<Vec<u8>> {
        let builder = self
            .get(token, &kind.download_path())?
            .query(&range_query(start_date, end_date));

        let response = self.send(builder, Auth::Session).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CollectorError::from_reqwest(e, self.config.timeout_secs()))?;
        Ok(bytes.to_vec())
    }
}
