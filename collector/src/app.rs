//! Farm application with dependency injection
//!
//! Ties the session store, view router, collection controller, report client
//! and pending-user monitor to one backend API. Every backend call goes
//! through a guard that turns a 401 into a sign-out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use chrono::{Local, NaiveDate};
use tokio::sync::{Mutex, RwLock};

use shared::{
    BoxAddress, BoxWrite, ChickenCountUpdate, DashboardOverview, DateRange, DetailedReport, DetailedReportKind,
    ExpenseRecord, FarmLayout,
    FeedConsumption, FeedPurchase, GridModel, LoginRequest, MedicalRecord, PasswordResetRequest, ProfileUpdateForm,
    RecordHistory, RecordKind, ReportGrid, SaleRecord, SignUpForm, UserProfile, UserRecord,
};
use shared::logging::{self, log_error, log_startup, log_success};

use crate::COMPONENT;
use crate::core::records::{self, ExpenseReceipt, ReportDownload};
use crate::core::{CollectionController, PendingUserMonitor, ReportClient, SessionStore, View, ViewRouter};
use crate::error::{CollectorError, CollectorResult};
use crate::traits::{FarmApi, SessionStorage};
use crate::types::{Notification, Session, SubmissionReceipt};

const AWAITING_APPROVAL: &str = "Account created. An owner must approve it before you can sign in.";

/// Result of a sign-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The backend returned a token; the new user is signed in
    SignedIn(View),
    /// The account exists but has to be approved first
    AwaitingApproval { message: String },
}

#[derive(Debug, Default)]
struct AppState {
    router: ViewRouter,
    session: Option<Session>,
}

pub struct FarmApp<A, S>
where
    A: FarmApi,
    S: SessionStorage,
{
    api: Arc<A>,
    sessions: SessionStore<S>,
    state: RwLock<AppState>,
    collection: CollectionController,
    reports: Mutex<ReportClient>,
    monitor: Arc<PendingUserMonitor>,
    layout: FarmLayout,
    poll_interval: Duration,
}

impl<A, S> FarmApp<A, S>
where
    A: FarmApi,
    S: SessionStorage,
{
    pub fn new(api: A, storage: S, layout: FarmLayout, poll_interval: Duration) -> Self {
        Self {
            api: Arc::new(api),
            sessions: SessionStore::new(storage),
            state: RwLock::new(AppState::default()),
            collection: CollectionController::for_today(layout.clone()),
            reports: Mutex::new(ReportClient::new(layout.clone())),
            monitor: Arc::new(PendingUserMonitor::new()),
            layout,
            poll_interval,
        }
    }

    /// Hydrate from the persisted session and pick the initial view
    pub async fn start(&self) -> CollectorResult<View> {
        let session = self.sessions.load()?;
        let mut state = self.state.write().await;
        let view = state.router.hydrate(session.as_ref());
        state.session = session;

        log_startup(COMPONENT, &format!("view {view}"));
        Ok(view)
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn layout(&self) -> &FarmLayout {
        &self.layout
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    pub fn collection(&self) -> &CollectionController {
        &self.collection
    }

    pub fn monitor(&self) -> &PendingUserMonitor {
        &self.monitor
    }

    pub async fn view(&self) -> View {
        self.state.read().await.router.view()
    }

    pub async fn current_user(&self) -> Option<UserProfile> {
        self.state.read().await.router.user().cloned()
    }

    // Authentication

    pub async fn login(&self, email: &str, password: &str) -> CollectorResult<View> {
        let request = LoginRequest::new(email, password)?;
        let response = self.api.login(&request).await.inspect_err(|e| {
            log_error(COMPONENT, "Sign in", e);
        })?;

        let view = self
            .establish(Session {
                token: response.token,
                user: response.user,
            })
            .await?;
        log_success(COMPONENT, &format!("Signed in, showing {view}"));
        Ok(view)
    }

    pub async fn begin_sign_up(&self) -> View {
        self.state.write().await.router.begin_sign_up()
    }

    pub async fn cancel_sign_up(&self) -> View {
        self.state.write().await.router.cancel_sign_up()
    }

    /// Validate the form locally, then register
    pub async fn sign_up(&self, form: &SignUpForm) -> CollectorResult<SignUpOutcome> {
        let request = form.validate()?;
        let response = self.api.register(None, &request).await?;
        let message = response.message.clone();

        match response.into_auth() {
            Some(auth) => {
                let view = self
                    .establish(Session {
                        token: auth.token,
                        user: auth.user,
                    })
                    .await?;
                Ok(SignUpOutcome::SignedIn(view))
            }
            None => {
                self.state.write().await.router.cancel_sign_up();
                Ok(SignUpOutcome::AwaitingApproval {
                    message: message.unwrap_or_else(|| AWAITING_APPROVAL.to_string()),
                })
            }
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> CollectorResult<()> {
        let request = PasswordResetRequest::new(email)?;
        self.api.request_password_reset(&request).await
    }

    /// Clear the session and the in-progress grid
    pub async fn logout(&self) -> CollectorResult<View> {
        self.sessions.clear()?;
        self.collection.reset().await;
        self.reports.lock().await.clear();
        self.monitor.clear().await;

        let mut state = self.state.write().await;
        state.session = None;
        Ok(state.router.signed_out())
    }

    async fn establish(&self, session: Session) -> CollectorResult<View> {
        self.sessions.save(&session)?;
        let mut state = self.state.write().await;
        let view = state.router.authenticated(&session.user);
        state.session = Some(session);
        Ok(view)
    }

    /// Sign out when the backend rejects the session. The grid is kept.
    async fn guard<T>(&self, result: CollectorResult<T>) -> CollectorResult<T> {
        if result.as_ref().is_err_and(CollectorError::is_unauthorized) {
            shared::component_warn!(COMPONENT, "Session rejected by backend, signing out");
            if let Err(clear_err) = self.sessions.clear() {
                log_error(COMPONENT, "Clearing rejected session", &clear_err);
            }
            self.monitor.clear().await;
            let mut state = self.state.write().await;
            state.session = None;
            state.router.signed_out();
        }
        result
    }

    async fn token(&self) -> CollectorResult<String> {
        let state = self.state.read().await;
        state.router.require_authenticated()?;
        state
            .session
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(CollectorError::NotAuthenticated)
    }

    async fn owner_token(&self) -> CollectorResult<String> {
        self.state.read().await.router.require_owner()?;
        self.token().await
    }

    // Collection

    pub async fn set_box_count(&self, address: BoxAddress, raw: &str) -> CollectorResult<BoxWrite> {
        if !self.state.read().await.router.can_collect() {
            return Err(CollectorError::NotAuthenticated);
        }
        self.collection.set_count(address, raw).await
    }

    pub async fn set_shade_eggs(&self, raw: &str) -> CollectorResult<Option<u32>> {
        self.collection.set_shade_eggs(raw).await
    }

    pub async fn set_collection_date(&self, date: NaiveDate) {
        self.collection.set_date(date).await;
    }

    pub async fn grid(&self) -> GridModel {
        self.collection.snapshot().await
    }

    pub async fn submit_collection(&self) -> CollectorResult<SubmissionReceipt> {
        self.submit_collection_until(std::future::pending::<()>()).await
    }

    /// Submit, giving up when `cancel` resolves first
    pub async fn submit_collection_until<C>(&self, cancel: C) -> CollectorResult<SubmissionReceipt>
    where
        C: Future<Output = ()>,
    {
        let token = self.token().await?;
        let result = self.collection.submit_until(self.api.as_ref(), &token, cancel).await;
        self.guard(result).await
    }

    // Reports

    pub async fn fetch_report(&self, date: NaiveDate) -> CollectorResult<ReportGrid> {
        let token = self.token().await?;
        let result = {
            let mut reports = self.reports.lock().await;
            reports
                .fetch_collection_table(self.api.as_ref(), &token, date)
                .await
                .cloned()
        };
        self.guard(result).await
    }

    pub async fn current_report(&self) -> Option<ReportGrid> {
        self.reports.lock().await.current().cloned()
    }

    // Owner operations

    pub async fn dashboard(&self) -> CollectorResult<DashboardOverview> {
        let token = self.owner_token().await?;
        let result = self.api.dashboard_overview(&token).await;
        self.guard(result).await
    }

    pub async fn list_users(&self) -> CollectorResult<Vec<UserRecord>> {
        let token = self.owner_token().await?;
        let result = self.api.list_users(&token).await;
        self.guard(result).await
    }

    pub async fn pending_users(&self) -> CollectorResult<Vec<UserRecord>> {
        let token = self.owner_token().await?;
        let result = self.api.pending_users(&token).await;
        self.guard(result).await
    }

    pub async fn approve_user(&self, user_id: u64) -> CollectorResult<()> {
        let token = self.owner_token().await?;
        let result = self.api.approve_user(&token, user_id).await;
        self.guard(result).await?;
        self.monitor.dismiss(user_id).await;
        shared::component_info!(COMPONENT, user_id, "User approved");
        Ok(())
    }

    pub async fn delete_user(&self, user_id: u64) -> CollectorResult<()> {
        let token = self.owner_token().await?;
        let result = self.api.delete_user(&token, user_id).await;
        self.guard(result).await?;
        self.monitor.dismiss(user_id).await;
        shared::component_info!(COMPONENT, user_id, "User deleted");
        Ok(())
    }

    /// Owner adds a staff account; the owner stays signed in
    pub async fn create_user(&self, form: &SignUpForm) -> CollectorResult<Option<UserProfile>> {
        let request = form.validate()?;
        let token = self.owner_token().await?;
        let result = self.api.register(Some(token), &request).await;
        Ok(self.guard(result).await?.user)
    }

    /// Update the owner's profile; the stored user record follows the response
    pub async fn update_profile(&self, form: &ProfileUpdateForm) -> CollectorResult<UserProfile> {
        let request = form.validate()?;
        let token = self.owner_token().await?;
        let result = self.api.update_profile(&token, &request).await;
        let user = self.guard(result).await?.user;

        self.sessions.update_user(&user)?;
        let mut state = self.state.write().await;
        state.router.authenticated(&user);
        if let Some(session) = state.session.as_mut() {
            session.user = user.clone();
        }
        Ok(user)
    }

    pub async fn update_chicken_count(&self, total_chickens: u32) -> CollectorResult<()> {
        let token = self.owner_token().await?;
        let update = ChickenCountUpdate { total_chickens };
        let result = self.api.update_chicken_count(&token, &update).await;
        self.guard(result).await
    }

    pub async fn record_sale(&self, sale: &SaleRecord) -> CollectorResult<()> {
        let token = self.owner_token().await?;
        let result = records::record_sale(self.api.as_ref(), &token, sale).await;
        self.guard(result).await
    }

    pub async fn record_expense(&self, expense: &ExpenseRecord) -> CollectorResult<ExpenseReceipt> {
        let token = self.owner_token().await?;
        let result = records::record_expense(self.api.as_ref(), &token, expense).await;
        self.guard(result).await
    }

    pub async fn record_feed_purchase(&self, purchase: &FeedPurchase) -> CollectorResult<()> {
        let token = self.owner_token().await?;
        let result = records::record_feed_purchase(self.api.as_ref(), &token, purchase).await;
        self.guard(result).await
    }

    pub async fn record_feed_consumption(&self, consumption: &FeedConsumption) -> CollectorResult<()> {
        let token = self.owner_token().await?;
        let result = records::record_feed_consumption(self.api.as_ref(), &token, consumption).await;
        self.guard(result).await
    }

    pub async fn record_medical(&self, record: &MedicalRecord) -> CollectorResult<()> {
        let token = self.owner_token().await?;
        let result = records::record_medical(self.api.as_ref(), &token, record).await;
        self.guard(result).await
    }

    pub async fn record_history(&self, kind: RecordKind) -> CollectorResult<RecordHistory> {
        let token = self.owner_token().await?;
        let result = records::history(self.api.as_ref(), &token, kind).await;
        self.guard(result).await
    }

    /// Detailed owner report; weekly and monthly views default to the current period
    pub async fn detailed_report(
        &self,
        kind: DetailedReportKind,
        range: Option<DateRange>,
    ) -> CollectorResult<DetailedReport> {
        let token = self.owner_token().await?;
        let today = Local::now().date_naive();
        let result = records::detailed_report(self.api.as_ref(), &token, kind, range, today).await;
        self.guard(result).await
    }

    /// PDF report; without a range the last thirty days
    pub async fn download_report(&self, kind: RecordKind, range: Option<DateRange>) -> CollectorResult<ReportDownload> {
        let token = self.owner_token().await?;
        let today = Local::now().date_naive();
        let result = records::download_report(self.api.as_ref(), &token, kind, range, today).await;
        self.guard(result).await
    }

    // Notifications

    pub async fn poll_pending_once(&self) -> CollectorResult<Vec<Notification>> {
        let token = self.owner_token().await?;
        let result = self.monitor.poll_once(self.api.as_ref(), &token).await;
        self.guard(result).await?;
        Ok(self.monitor.notifications().await)
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.monitor.notifications().await
    }
}

impl<A, S> FarmApp<A, S>
where
    A: FarmApi + 'static,
    S: SessionStorage,
{
    /// Watch for pending users until `shutdown` resolves or the session ends
    pub async fn watch_pending<F>(&self, shutdown: F) -> CollectorResult<()>
    where
        F: Future<Output = ()>,
    {
        let token = self.owner_token().await?;
        logging::log_progress(COMPONENT, "Watching pending users", &format!("every {:?}", self.poll_interval));
        let result = Arc::clone(&self.monitor)
            .run(Arc::clone(&self.api), token, self.poll_interval, shutdown)
            .await;
        self.guard(result).await
    }
}
