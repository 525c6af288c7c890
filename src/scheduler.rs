use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Fixed pre-attempt delay. The gap between attempt starts therefore drifts
/// by the duration of the previous attempt, same as a classic ping.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Sleep for one interval. Returns `false` if `stop` fired first.
    pub async fn wait(&self, stop: &CancellationToken) -> bool {
        if stop.is_cancelled() {
            return false;
        }
        if self.interval.is_zero() {
            return true;
        }
        tokio::select! {
            _ = stop.cancelled() => false,
            _ = sleep(self.interval) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn waits_full_interval() {
        let pacer = Pacer::new(Duration::from_millis(250));
        let start = Instant::now();
        assert!(pacer.wait(&CancellationToken::new()).await);
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_sleep() {
        let pacer = Pacer::new(Duration::from_secs(60));
        let stop = CancellationToken::new();
        let trigger = stop.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let start = Instant::now();
        assert!(!pacer.wait(&stop).await);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn already_stopped_returns_immediately() {
        let stop = CancellationToken::new();
        stop.cancel();
        assert!(!Pacer::new(Duration::ZERO).wait(&stop).await);
    }
}
