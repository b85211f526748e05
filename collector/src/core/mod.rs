//! Collector core business logic

pub mod collection;
pub mod notifications;
pub mod records;
pub mod reports;
pub mod router;
pub mod session;

pub use collection::{CollectionController, SharedGrid};
pub use notifications::PendingUserMonitor;
pub use records::{CompanionStatus, ExpenseReceipt, ReportDownload};
pub use reports::ReportClient;
pub use router::{View, ViewRouter};
pub use session::{SessionStore, TOKEN_KEY, USER_KEY};
