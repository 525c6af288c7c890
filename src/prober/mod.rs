use serde::Serialize;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::scheduler::Pacer;

pub mod tcp_connect;

pub use tcp_connect::TcpConnector;

/// Already-resolved address and port a run probes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Target {
    pub address: String,
    pub port: u16,
}

impl Target {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

/// One counted connection attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub host: String,
    pub port: u16,
    pub delivered: bool,
    pub delay_millis: u64,
}

/// Receives outcomes in attempt order, from the probing loop itself.
pub trait OutcomeSink {
    fn on_outcome(&mut self, outcome: &AttemptOutcome);
}

impl<F> OutcomeSink for F
where
    F: FnMut(&AttemptOutcome),
{
    fn on_outcome(&mut self, outcome: &AttemptOutcome) {
        self(outcome)
    }
}

/// Opens (and immediately closes) one connection to the target.
/// `Ok` means the handshake completed; any error counts the attempt as lost.
pub trait Connector {
    fn connect(&self, target: &Target) -> impl Future<Output = io::Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// Every requested outcome was emitted.
    Completed,
    /// A stop was requested before the run finished on its own.
    Cancelled,
}

pub struct Prober<C = TcpConnector> {
    target: Target,
    connector: C,
    stop: CancellationToken,
}

impl Prober<TcpConnector> {
    pub fn new(target: Target) -> Self {
        Self::with_connector(target, TcpConnector::default())
    }
}

impl<C: Connector> Prober<C> {
    pub fn with_connector(target: Target, connector: C) -> Self {
        Self {
            target,
            connector,
            stop: CancellationToken::new(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Token that stops the run when cancelled. Clone it into a signal handler.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Probe the target `count` times (`0` = until stopped), `delay` apart.
    ///
    /// One extra warm-up attempt runs first and is never handed to `sink`.
    /// Attempts are strictly sequential; an attempt already in flight when a
    /// stop arrives is allowed to resolve and is still reported.
    ///
    /// The stop token is never reset: once a prober has been stopped, every
    /// later `run` returns `Cancelled` without attempting anything.
    pub async fn run<S>(&self, count: u64, delay: Duration, sink: &mut S) -> RunEnd
    where
        S: OutcomeSink + ?Sized,
    {
        let pacer = Pacer::new(delay);
        info!(peer = %self.target, count, delay_ms = delay.as_millis() as u64, "starting run");

        let mut warmed_up = false;
        let mut emitted: u64 = 0;
        loop {
            if count != 0 && emitted >= count {
                info!(peer = %self.target, "run completed");
                return RunEnd::Completed;
            }
            if self.stop.is_cancelled() {
                break;
            }
            if warmed_up && !pacer.wait(&self.stop).await {
                break;
            }

            let (delivered, elapsed) = self.attempt_once().await;
            let delay_millis = elapsed.as_millis() as u64;

            if !warmed_up {
                trace!(peer = %self.target, delivered, delay_millis, "warm-up attempt discarded");
                warmed_up = true;
                continue;
            }
            sink.on_outcome(&AttemptOutcome {
                host: self.target.address.clone(),
                port: self.target.port,
                delivered,
                delay_millis,
            });
            emitted += 1;
        }

        info!(peer = %self.target, emitted, "run cancelled");
        RunEnd::Cancelled
    }

    async fn attempt_once(&self) -> (bool, Duration) {
        let start = Instant::now();
        let result = self.connector.connect(&self.target).await;
        let elapsed = start.elapsed();
        match result {
            Ok(()) => {
                debug!(peer = %self.target, elapsed_ms = elapsed.as_millis() as u64, "connected");
                (true, elapsed)
            }
            Err(e) => {
                debug!(peer = %self.target, elapsed_ms = elapsed.as_millis() as u64, error = %e, "connect failed");
                (false, elapsed)
            }
        }
    }
}
