//! Domain model for the egg-collection client
//!
//! Holds the fixed farm layout, the in-progress collection grid with its
//! input validation, the submission payload builder, the read-only report
//! grid and the wire messages exchanged with the farm backend. Nothing in
//! this crate performs I/O.

pub mod errors;
pub mod grid;
pub mod layout;
pub mod logging;
pub mod messages;
pub mod report;
pub mod submission;
pub mod types;
pub mod validator;

pub use errors::*;
pub use types::*;

pub use grid::GridModel;
pub use layout::{CageLayout, FarmLayout, PartitionLayout, PartitionSide, initialize_layout};
pub use report::{ReportBox, ReportCage, ReportGrid, ReportPartition};
pub use submission::{CageSubmission, EggRecord, PartitionSubmission, SubmissionPayload, build_submission, regroup};
pub use validator::{BoxWrite, InputValidator, MAX_EGGS_PER_BOX, OVER_CAPACITY_MESSAGE, parse_box_count};

pub use messages::{
    // Authentication
    AuthResponse, ErrorBody, LoginRequest, PasswordResetRequest, ProfileUpdateForm, ProfileUpdateRequest,
    ProfileUpdateResponse, RegisterRequest, RegisterResponse, SignUpForm,

    // Reporting and dashboard
    CageTable, DashboardOverview, EggCollectionTable,

    // Owner records
    ChickenCountUpdate, DateRange, ExpenseRecord, FeedConsumption, FeedPurchase, MedicalRecord, RecordHistory,
    RecordKind, SaleRecord,

    // Detailed reports
    DailySummary, DetailedReport, DetailedReportKind, DetailedTotals, EggCollectionRow, FeedConsumptionRow,
    FeedPurchaseRow, WeekTotal,

    // User administration
    UserRecord,
};
