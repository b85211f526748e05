//! Owner farm records
//!
//! Thin layer over the record endpoints. Expenses of type `feed` and
//! `medicine` are also booked as a feed purchase or medical treatment; those
//! companion writes are best effort and only logged when they fail.

use chrono::NaiveDate;
use tracing::{info, warn};

use shared::{
    DateRange, DetailedReport, DetailedReportKind, ExpenseRecord, FeedConsumption, FeedPurchase, MedicalRecord,
    RecordHistory, RecordKind, SaleRecord,
};

use crate::COMPONENT;
use crate::error::CollectorResult;
use crate::traits::FarmApi;

/// Status of a companion record written alongside an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanionStatus {
    NotApplicable,
    Recorded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseReceipt {
    pub feed_purchase: CompanionStatus,
    pub medical: CompanionStatus,
}

/// A downloaded PDF report
#[derive(Debug, Clone)]
pub struct ReportDownload {
    pub kind: RecordKind,
    pub range: DateRange,
    pub bytes: Vec<u8>,
}

impl ReportDownload {
    /// File name the backend suggests, e.g. `sales_report_2024-06-01_to_2024-06-30.pdf`
    pub fn file_name(&self) -> String {
        format!(
            "{}_report_{}_to_{}.pdf",
            self.kind, self.range.start_date, self.range.end_date
        )
    }
}

pub async fn record_sale<A>(api: &A, token: &str, sale: &SaleRecord) -> CollectorResult<()>
where
    A: FarmApi + ?Sized,
{
    api.record_sale(token, sale).await?;
    info!(trays = sale.trays_sold, amount = sale.total_amount(), date = %sale.date, "Sale recorded");
    Ok(())
}

/// Record an expense plus any companion record its type implies
pub async fn record_expense<A>(api: &A, token: &str, expense: &ExpenseRecord) -> CollectorResult<ExpenseReceipt>
where
    A: FarmApi + ?Sized,
{
    api.record_expense(token, expense).await?;
    info!(expense_type = %expense.expense_type, amount = expense.amount, date = %expense.date, "Expense recorded");

    let feed_purchase = match expense.companion_feed_purchase() {
        None => CompanionStatus::NotApplicable,
        Some(purchase) => companion(api.record_feed_purchase(token, &purchase).await, "feed purchase"),
    };
    let medical = match expense.companion_medical() {
        None => CompanionStatus::NotApplicable,
        Some(record) => companion(api.record_medical(token, &record).await, "medical record"),
    };

    Ok(ExpenseReceipt { feed_purchase, medical })
}

fn companion(result: CollectorResult<()>, what: &str) -> CompanionStatus {
    match result {
        Ok(()) => CompanionStatus::Recorded,
        Err(e) => {
            shared::component_warn!(COMPONENT, error = %e, "Expense saved but companion {} failed", what);
            CompanionStatus::Failed
        }
    }
}

pub async fn record_feed_purchase<A>(api: &A, token: &str, purchase: &FeedPurchase) -> CollectorResult<()>
where
    A: FarmApi + ?Sized,
{
    api.record_feed_purchase(token, purchase).await?;
    info!(kg = purchase.quantity_kg, cost = purchase.total_cost, "Feed purchase recorded");
    Ok(())
}

pub async fn record_feed_consumption<A>(api: &A, token: &str, consumption: &FeedConsumption) -> CollectorResult<()>
where
    A: FarmApi + ?Sized,
{
    api.record_feed_consumption(token, consumption).await?;
    info!(kg = consumption.quantity_used_kg, "Feed consumption recorded");
    Ok(())
}

pub async fn record_medical<A>(api: &A, token: &str, record: &MedicalRecord) -> CollectorResult<()>
where
    A: FarmApi + ?Sized,
{
    api.record_medical(token, record).await?;
    info!(treatment = %record.treatment_type, cost = record.cost, "Medical record saved");
    Ok(())
}

pub async fn history<A>(api: &A, token: &str, kind: RecordKind) -> CollectorResult<RecordHistory>
where
    A: FarmApi + ?Sized,
{
    api.record_history(token, kind).await
}

/// Detailed report for one owner view.
///
/// Weekly and monthly views default to the week or month containing `today`;
/// feed and performance views leave the period to the backend.
pub async fn detailed_report<A>(
    api: &A,
    token: &str,
    kind: DetailedReportKind,
    range: Option<DateRange>,
    today: NaiveDate,
) -> CollectorResult<DetailedReport>
where
    A: FarmApi + ?Sized,
{
    let range = range.or_else(|| kind.default_range(today));
    let report = api.detailed_report(token, range).await?;
    info!(
        kind = %kind,
        start = %report.date_range.start_date,
        end = %report.date_range.end_date,
        days = report.daily_summaries.len(),
        "Detailed report fetched"
    );
    Ok(report)
}

/// Download a PDF report; without a range the last thirty days up to `today`
pub async fn download_report<A>(
    api: &A,
    token: &str,
    kind: RecordKind,
    range: Option<DateRange>,
    today: NaiveDate,
) -> CollectorResult<ReportDownload>
where
    A: FarmApi + ?Sized,
{
    let range = range.unwrap_or_else(|| DateRange::last_days_until(today));
    let bytes = api
        .download_report(token, kind, range.start_date, range.end_date)
        .await?;
    info!(kind = %kind, bytes = bytes.len(), "Report downloaded");
    Ok(ReportDownload { kind, range, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectorError;
    use crate::traits::MockFarmApi;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    #[tokio::test]
    async fn test_feed_expense_books_purchase() {
        let mut expense = ExpenseRecord::new("feed", 5600.0, "layers mash", day()).unwrap();
        expense.sacks = Some(2);

        let mut api = MockFarmApi::new();
        api.expect_record_expense().times(1).returning(|_, _| Ok(()));
        api.expect_record_feed_purchase()
            .withf(|_, purchase| purchase.quantity_kg == 140.0 && purchase.feed_type == "general")
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_record_medical().times(0);

        let receipt = record_expense(&api, "tok", &expense).await.unwrap();
        assert_eq!(receipt.feed_purchase, CompanionStatus::Recorded);
        assert_eq!(receipt.medical, CompanionStatus::NotApplicable);
    }

    #[tokio::test]
    async fn test_companion_failure_is_not_fatal() {
        let expense = ExpenseRecord::new("medicine", 800.0, "vaccine", day()).unwrap();

        let mut api = MockFarmApi::new();
        api.expect_record_expense().returning(|_, _| Ok(()));
        api.expect_record_medical()
            .returning(|_, _| Err(CollectorError::rejected(500, "Internal Server Error")));

        let receipt = record_expense(&api, "tok", &expense).await.unwrap();
        assert_eq!(receipt.medical, CompanionStatus::Failed);
    }

    #[tokio::test]
    async fn test_failed_expense_skips_companions() {
        let expense = ExpenseRecord::new("feed", 100.0, "", day()).unwrap();

        let mut api = MockFarmApi::new();
        api.expect_record_expense()
            .returning(|_, _| Err(CollectorError::Timeout { seconds: 30 }));
        api.expect_record_feed_purchase().times(0);

        assert!(record_expense(&api, "tok", &expense).await.is_err());
    }

    #[tokio::test]
    async fn test_download_defaults_to_last_thirty_days() {
        let mut api = MockFarmApi::new();
        api.expect_download_report()
            .withf(|_, kind, start, end| {
                *kind == RecordKind::Sales
                    && *start == NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
                    && *end == NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
            })
            .returning(|_, _, _, _| Ok(b"%PDF-1.4".to_vec()));

        let download = download_report(&api, "tok", RecordKind::Sales, None, day()).await.unwrap();
        assert_eq!(download.file_name(), "sales_report_2024-06-15_to_2024-07-15.pdf");
        assert!(download.bytes.starts_with(b"%PDF"));
    }

    fn detailed_body(start: &str, end: &str) -> DetailedReport {
        serde_json::from_value(serde_json::json!({
            "date_range": {"start_date": start, "end_date": end},
            "summary_totals": {"total_eggs": 0}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_weekly_view_asks_for_current_week() {
        let mut api = MockFarmApi::new();
        api.expect_detailed_report()
            .withf(|token, range| token == "tok" && *range == Some(DateRange::week_of(day())))
            .times(1)
            .returning(|_, _| Ok(detailed_body("2024-07-14", "2024-07-20")));

        let report = detailed_report(&api, "tok", DetailedReportKind::Weekly, None, day()).await.unwrap();
        assert_eq!(report.date_range.start_date, NaiveDate::from_ymd_opt(2024, 7, 14).unwrap());
    }

    #[tokio::test]
    async fn test_feed_view_leaves_period_to_backend() {
        let mut api = MockFarmApi::new();
        api.expect_detailed_report()
            .withf(|_, range| range.is_none())
            .times(1)
            .returning(|_, _| Ok(detailed_body("2024-06-15", "2024-07-15")));

        assert!(detailed_report(&api, "tok", DetailedReportKind::Feed, None, day()).await.is_ok());
    }

    #[tokio::test]
    async fn test_explicit_range_overrides_view_default() {
        let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), day()).unwrap();
        let expected = range.clone();

        let mut api = MockFarmApi::new();
        api.expect_detailed_report()
            .withf(move |_, range| range.as_ref() == Some(&expected))
            .times(1)
            .returning(|_, _| Ok(detailed_body("2024-05-01", "2024-07-15")));

        assert!(detailed_report(&api, "tok", DetailedReportKind::Monthly, Some(range), day()).await.is_ok());
    }
}
