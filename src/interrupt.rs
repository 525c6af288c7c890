use std::future::Future;
use std::io;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Turns a stream of interrupts into a two-step stop.
///
/// The first interrupt cancels `stop` so the run winds down after the
/// attempt in flight. The second one resolves this future; race it against
/// the run to stop waiting on a connect that may take minutes to time out.
/// If listening fails the future never resolves.
pub async fn escalating_stop<F, Fut>(stop: CancellationToken, mut next_interrupt: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = next_interrupt().await {
        warn!("cannot listen for interrupts: {:?}", e);
        return std::future::pending().await;
    }
    info!("interrupt received, stopping after the current attempt");
    stop.cancel();

    if let Err(e) = next_interrupt().await {
        warn!("cannot listen for interrupts: {:?}", e);
        return std::future::pending().await;
    }
    warn!("second interrupt, abandoning the attempt in flight");
}
