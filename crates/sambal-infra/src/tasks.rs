//! Detached background tasks.

use std::future::Future;

/// Run `fut` in the background without awaiting it. Errors are logged under `label`.
pub fn spawn_detached<F, E>(label: &'static str, fut: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            tracing::error!(task = label, error = %e, "Detached task failed");
        }
    })
}
