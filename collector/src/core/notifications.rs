//! Pending-user watcher for owners
//!
//! Polls the pending-users endpoint on an interval. Polls may overlap, so each
//! one takes a ticket from a monotonically increasing counter and its result
//! is only applied if no later poll has been applied already. A failed poll
//! leaves the known pending users and notifications as they were.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use shared::UserRecord;

use crate::COMPONENT;
use crate::error::CollectorResult;
use crate::traits::FarmApi;
use crate::types::Notification;

#[derive(Debug, Default)]
struct MonitorState {
    applied_seq: u64,
    pending_users: Vec<UserRecord>,
    /// Newest first, unique by user id
    notifications: Vec<Notification>,
}

#[derive(Debug, Default)]
pub struct PendingUserMonitor {
    state: RwLock<MonitorState>,
    next_seq: AtomicU64,
}

impl PendingUserMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next poll ticket; tickets start at 1
    pub fn next_ticket(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a poll result if it is newer than the last applied one.
    ///
    /// Returns false when the result was stale and discarded.
    pub async fn apply(&self, seq: u64, users: Vec<UserRecord>) -> bool {
        let mut state = self.state.write().await;
        if seq <= state.applied_seq {
            debug!(seq, applied = state.applied_seq, "Discarding stale pending-user poll");
            return false;
        }

        let fresh: Vec<Notification> = users
            .iter()
            .filter(|user| !state.notifications.iter().any(|n| n.id == user.id))
            .cloned()
            .map(Notification::pending_user)
            .collect();

        if !fresh.is_empty() {
            shared::component_info!(COMPONENT, count = fresh.len(), "New users awaiting approval");
        }

        state.notifications.splice(0..0, fresh);
        state.pending_users = users;
        state.applied_seq = seq;
        true
    }

    /// Run one poll
    pub async fn poll_once<A>(&self, api: &A, token: &str) -> CollectorResult<bool>
    where
        A: FarmApi + ?Sized,
    {
        let seq = self.next_ticket();
        let users = api.pending_users(token).await?;
        Ok(self.apply(seq, users).await)
    }

    pub async fn pending_users(&self) -> Vec<UserRecord> {
        self.state.read().await.pending_users.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }

    /// Drop the notification for a user, e.g. once approved
    pub async fn dismiss(&self, user_id: u64) {
        let mut state = self.state.write().await;
        state.notifications.retain(|n| n.id != user_id);
        state.pending_users.retain(|u| u.id != user_id);
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.notifications.clear();
        state.pending_users.clear();
    }

    /// Poll every `interval` until `shutdown` resolves.
    ///
    /// Each poll runs as its own task so a slow response never delays the
    /// next tick. Ends with an error only when the backend rejects the session.
    pub async fn run<A, S>(self: Arc<Self>, api: Arc<A>, token: String, interval: Duration, shutdown: S) -> CollectorResult<()>
    where
        A: FarmApi + 'static,
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    polls.abort_all();
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let monitor = Arc::clone(&self);
                    let api = Arc::clone(&api);
                    let token = token.clone();
                    polls.spawn(async move { monitor.poll_once(api.as_ref(), &token).await });
                }
                Some(joined) = polls.join_next() => match joined {
                    Ok(Ok(applied)) => debug!(applied, "Pending-user poll finished"),
                    Ok(Err(e)) if e.is_unauthorized() => {
                        polls.abort_all();
                        return Err(e);
                    }
                    Ok(Err(e)) => warn!(error = %e, "Pending-user poll failed"),
                    Err(e) => warn!(error = %e, "Pending-user poll task aborted"),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectorError;
    use crate::traits::MockFarmApi;

    fn pending(id: u64, username: &str) -> UserRecord {
        serde_json::from_value(serde_json::json!({"id": id, "username": username, "email": format!("{username}@farm.test")}))
            .unwrap()
    }

    #[tokio::test]
    async fn test_notifications_deduped_newest_first() {
        let monitor = PendingUserMonitor::new();

        assert!(monitor.apply(1, vec![pending(1, "ann")]).await);
        assert!(monitor.apply(2, vec![pending(1, "ann"), pending(2, "ben")]).await);

        let notifications = monitor.notifications().await;
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].id, 2);
        assert_eq!(notifications[0].message, "New user signup: ben is waiting for approval");
        assert_eq!(notifications[1].id, 1);
    }

    #[tokio::test]
    async fn test_stale_poll_is_discarded() {
        let monitor = PendingUserMonitor::new();
        let older = monitor.next_ticket();
        let newer = monitor.next_ticket();

        assert!(monitor.apply(newer, vec![pending(5, "eve")]).await);
        assert!(!monitor.apply(older, vec![]).await);

        assert_eq!(monitor.pending_users().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_known_state() {
        let monitor = PendingUserMonitor::new();
        let mut api = MockFarmApi::new();
        let mut calls = 0;
        api.expect_pending_users().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![pending(3, "cal")])
            } else {
                Err(CollectorError::Network {
                    message: "connection reset".into(),
                })
            }
        });

        assert!(monitor.poll_once(&api, "tok").await.unwrap());
        assert!(monitor.poll_once(&api, "tok").await.is_err());
        assert_eq!(monitor.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dismiss_removes_notification() {
        let monitor = PendingUserMonitor::new();
        monitor.apply(1, vec![pending(1, "ann"), pending(2, "ben")]).await;

        monitor.dismiss(1).await;
        let ids: Vec<u64> = monitor.notifications().await.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_run_stops_on_unauthorized() {
        let monitor = Arc::new(PendingUserMonitor::new());
        let mut api = MockFarmApi::new();
        api.expect_pending_users().returning(|_| Err(CollectorError::Unauthorized));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            Arc::clone(&monitor).run(Arc::new(api), "tok".into(), Duration::from_millis(10), std::future::pending()),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(CollectorError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_run_polls_until_shutdown() {
        let monitor = Arc::new(PendingUserMonitor::new());
        let mut api = MockFarmApi::new();
        api.expect_pending_users().returning(|_| Ok(vec![pending(8, "hal")]));

        let result = Arc::clone(&monitor)
            .run(
                Arc::new(api),
                "tok".into(),
                Duration::from_millis(10),
                tokio::time::sleep(Duration::from_millis(100)),
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(monitor.notifications().await.len(), 1);
    }
}
