//! Egg-collection client library
//!
//! Services for talking to the farm backend, the persisted session, the
//! view router and the collection, report and owner workflows built on them.
//! The `eggventory` binary is a thin command-line front end over [`FarmApp`].

pub mod app;
pub mod config;
pub mod core;
pub mod display;
pub mod error;
pub mod services;
pub mod shutdown;
pub mod traits;
pub mod types;

/// Component name used to tag log events
pub const COMPONENT: &str = "collector";

// Re-export main types
pub use app::{FarmApp, SignUpOutcome};
pub use config::ClientConfig;
pub use crate::core::{CollectionController, PendingUserMonitor, ReportClient, SessionStore, View, ViewRouter};
pub use error::{CollectorError, CollectorResult};
pub use services::*;
pub use traits::*;
pub use types::*;
