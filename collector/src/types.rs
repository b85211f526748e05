//! Collector-specific data types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use shared::{UserProfile, UserRecord};

/// Credentials persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn is_owner(&self) -> bool {
        self.user.is_owner()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PendingUser,
}

/// Owner notification raised for an account awaiting approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Id of the pending user; notifications are unique per id
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub user: UserRecord,
    pub raised_at: DateTime<Local>,
}

impl Notification {
    pub fn pending_user(user: UserRecord) -> Self {
        Self {
            id: user.id,
            kind: NotificationKind::PendingUser,
            message: format!("New user signup: {} is waiting for approval", user.display_name()),
            user,
            raised_at: Local::now(),
        }
    }
}

/// Outcome of a submission attempt, as shown to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub date: chrono::NaiveDate,
    pub box_eggs: u32,
    pub shade_eggs: u32,
}

impl SubmissionReceipt {
    pub fn total(&self) -> u32 {
        self.box_eggs + self.shade_eggs
    }
}
