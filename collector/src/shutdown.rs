//! Interrupt handling for long-running commands

use std::future::Future;
use std::io;

use shared::logging;

use crate::COMPONENT;

/// Resolves once `signal` fires.
///
/// A signal that cannot be installed never resolves, so the work it guards
/// runs to completion instead of being cancelled straight away.
pub async fn on_signal<F>(signal: F, reason: &str)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => logging::log_shutdown(COMPONENT, reason),
        Err(err) => {
            logging::log_error(COMPONENT, "Signal handling", &err);
            std::future::pending::<()>().await;
        }
    }
}

pub async fn ctrl_c(reason: &str) {
    on_signal(tokio::signal::ctrl_c(), reason).await;
}
