//! View router: which screen is active for the current session
//!
//! ```text
//! SignIn ──login ok──▶ WorkerCollection | OwnerDashboard
//!   ▲  │                         │
//!   │  └─begin sign-up─▶ SignUp  │
//!   └──── logout / 401 ──────────┘
//! ```

use std::fmt;
use tracing::info;

use shared::{Role, UserProfile};

use crate::error::{CollectorError, CollectorResult};
use crate::types::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Awaiting credentials
    SignIn,
    SignUp,
    WorkerCollection,
    OwnerDashboard,
}

impl View {
    /// Landing view for an authenticated user
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Owner => View::OwnerDashboard,
            Role::Worker => View::WorkerCollection,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, View::WorkerCollection | View::OwnerDashboard)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::SignIn => "sign-in",
            View::SignUp => "sign-up",
            View::WorkerCollection => "worker collection",
            View::OwnerDashboard => "owner dashboard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ViewRouter {
    view: View,
    user: Option<UserProfile>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        Self {
            view: View::SignIn,
            user: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Pick the initial view from whatever session was loaded from storage
    pub fn hydrate(&mut self, session: Option<&Session>) -> View {
        match session {
            Some(session) => self.authenticated(&session.user),
            None => self.signed_out(),
        }
    }

    pub fn authenticated(&mut self, user: &UserProfile) -> View {
        self.user = Some(user.clone());
        self.transition(View::for_role(user.role))
    }

    /// Only reachable from the sign-in view
    pub fn begin_sign_up(&mut self) -> View {
        if self.view == View::SignIn {
            self.transition(View::SignUp);
        }
        self.view
    }

    pub fn cancel_sign_up(&mut self) -> View {
        if self.view == View::SignUp {
            self.transition(View::SignIn);
        }
        self.view
    }

    /// Logout or session expiry
    pub fn signed_out(&mut self) -> View {
        self.user = None;
        self.transition(View::SignIn)
    }

    /// Owners see the collection form embedded in their dashboard
    pub fn can_collect(&self) -> bool {
        self.view.is_authenticated()
    }

    pub fn require_authenticated(&self) -> CollectorResult<&UserProfile> {
        match (&self.user, self.view.is_authenticated()) {
            (Some(user), true) => Ok(user),
            _ => Err(CollectorError::NotAuthenticated),
        }
    }

    pub fn require_owner(&self) -> CollectorResult<&UserProfile> {
        let user = self.require_authenticated()?;
        if user.is_owner() {
            Ok(user)
        } else {
            Err(CollectorError::OwnerOnly)
        }
    }

    fn transition(&mut self, next: View) -> View {
        if self.view != next {
            info!(from = %self.view, to = %next, "View changed");
            self.view = next;
        }
        self.view
    }
}
