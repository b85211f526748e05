//! Collection controller: owns the grid and drives submission
//!
//! Only one submission may be in flight at a time. The flag is held by an
//! RAII guard so it is released on every exit path, including cancellation.
//! Edits are refused while it is set, since a successful submission resets
//! the grid.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use shared::{BoxAddress, BoxWrite, FarmLayout, GridModel, SharedError, SubmissionPayload};

use crate::COMPONENT;
use crate::error::{CollectorError, CollectorResult};
use crate::traits::FarmApi;
use crate::types::SubmissionReceipt;

/// Shared handle to the in-progress grid
pub type SharedGrid = Arc<RwLock<GridModel>>;

/// Releases the in-flight flag when dropped
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct CollectionController {
    grid: SharedGrid,
    in_flight: Arc<AtomicBool>,
}

impl CollectionController {
    pub fn new(grid: GridModel) -> Self {
        Self {
            grid: Arc::new(RwLock::new(grid)),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Empty grid over the farm layout, dated today
    pub fn for_today(layout: FarmLayout) -> Self {
        Self::new(GridModel::for_today(layout))
    }

    pub fn grid(&self) -> SharedGrid {
        Arc::clone(&self.grid)
    }

    /// Copy of the current grid state
    pub async fn snapshot(&self) -> GridModel {
        self.grid.read().await.clone()
    }

    pub async fn set_count(&self, address: BoxAddress, raw: &str) -> CollectorResult<BoxWrite> {
        let mut grid = self.grid.write().await;
        self.ensure_editable()?;
        let outcome = grid.set_count(address, raw)?;
        drop(grid);
        if outcome == BoxWrite::Reject {
            shared::component_debug!(COMPONENT, address = %address, raw, "Rejected box count");
        }
        Ok(outcome)
    }

    pub async fn set_shade_eggs(&self, raw: &str) -> CollectorResult<Option<u32>> {
        let mut grid = self.grid.write().await;
        self.ensure_editable()?;
        Ok(grid.set_shade_eggs(raw))
    }

    pub async fn set_date(&self, date: chrono::NaiveDate) {
        self.grid.write().await.set_date(date);
    }

    pub async fn reset(&self) {
        self.grid.write().await.reset();
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // Checked under the grid write lock so no edit lands after the payload snapshot
    fn ensure_editable(&self) -> CollectorResult<()> {
        if self.is_submitting() {
            return Err(CollectorError::SubmissionInFlight);
        }
        Ok(())
    }

    fn try_begin(&self) -> CollectorResult<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CollectorError::SubmissionInFlight)?;
        Ok(InFlightGuard {
            flag: Arc::clone(&self.in_flight),
        })
    }

    /// Submit the grid; on success the grid is reset
    pub async fn submit<A>(&self, api: &A, token: &str) -> CollectorResult<SubmissionReceipt>
    where
        A: FarmApi + ?Sized,
    {
        self.submit_until(api, token, std::future::pending::<()>()).await
    }

    /// Submit the grid, giving up when `cancel` resolves first.
    ///
    /// Validation runs before anything is sent, and a grid with flagged boxes
    /// is not submitted. On failure, timeout or cancellation the grid is left
    /// as it was so the worker can retry.
    pub async fn submit_until<A, C>(&self, api: &A, token: &str, cancel: C) -> CollectorResult<SubmissionReceipt>
    where
        A: FarmApi + ?Sized,
        C: Future<Output = ()>,
    {
        let _guard = self.try_begin()?;

        let payload = {
            let grid = self.grid.read().await;
            if let Some((address, message)) = grid.field_errors().iter().next() {
                return Err(SharedError::validation(address.to_string(), message.clone()).into());
            }
            grid.build_submission()?
        };
        let receipt = receipt_for(&payload);
        shared::component_info!(
            COMPONENT,
            date = %payload.date,
            cages = payload.cages.len(),
            eggs = receipt.total(),
            "Submitting daily collection"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel => Err(CollectorError::Cancelled),
            result = api.submit_daily_collection(token, &payload) => result,
        };

        match outcome {
            Ok(()) => {
                self.grid.write().await.reset();
                shared::logging::log_success(COMPONENT, &format!("Recorded {} eggs for {}", receipt.total(), receipt.date));
                Ok(receipt)
            }
            Err(e) => {
                shared::logging::log_error(COMPONENT, "Daily collection submission", &e);
                Err(e)
            }
        }
    }
}

fn receipt_for(payload: &SubmissionPayload) -> SubmissionReceipt {
    SubmissionReceipt {
        date: payload.date,
        box_eggs: payload.box_eggs(),
        shade_eggs: payload.shade_eggs,
    }
}
