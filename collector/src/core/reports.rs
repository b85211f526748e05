//! Report client: fetches a recorded day and reshapes it for display

use chrono::NaiveDate;
use tracing::{info, warn};

use shared::{FarmLayout, ReportGrid};

use crate::error::CollectorResult;
use crate::traits::FarmApi;

pub struct ReportClient {
    layout: FarmLayout,
    current: Option<ReportGrid>,
}

impl ReportClient {
    pub fn new(layout: FarmLayout) -> Self {
        Self { layout, current: None }
    }

    /// The report currently on display
    pub fn current(&self) -> Option<&ReportGrid> {
        self.current.as_ref()
    }

    /// Fetch the collection table for `date`.
    ///
    /// On success the new report replaces the displayed one. On any failure
    /// the displayed report is left untouched.
    pub async fn fetch_collection_table<A>(&mut self, api: &A, token: &str, date: NaiveDate) -> CollectorResult<&ReportGrid>
    where
        A: FarmApi + ?Sized,
    {
        match api.fetch_collection_table(token, date).await {
            Ok(table) => {
                let report = ReportGrid::from_table(&self.layout, &table);
                info!(date = %date, grand_total = report.grand_total, "Loaded collection report");
                Ok(self.current.insert(report))
            }
            Err(e) => {
                warn!(date = %date, error = %e, "Failed to load collection report");
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
