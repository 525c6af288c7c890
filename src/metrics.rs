use anyhow::Result;
use prometheus::{Encoder, TextEncoder, TEXT_FORMAT, HistogramOpts, HistogramVec, IntCounterVec, GaugeVec, Opts, Registry};
use warp::Filter;
use warp::http::header::{HeaderValue, CONTENT_TYPE};
use warp::http::{Response, StatusCode};
use std::net::SocketAddr;

use crate::prober::{AttemptOutcome, OutcomeSink, Target};

/// Prometheus view of a run. Owns its registry so several probers can
/// coexist in one process.
#[derive(Clone)]
pub struct ProbeMetrics {
    registry: Registry,
    label: String,
    latency_gauge: GaugeVec,
    sent_counter: IntCounterVec,
    lost_counter: IntCounterVec,
    // only registered when latency history is enabled
    latency_hist: Option<HistogramVec>,
}

impl ProbeMetrics {
    pub fn new(target: &Target, enable_latency_history: bool) -> Result<Self> {
        let registry = Registry::new();

        let latency_gauge = GaugeVec::new(
            Opts::new("tcp_ping_latency_milliseconds_current", "Last TCP connect latency in milliseconds"),
            &["target"],
        )?;
        let sent_counter = IntCounterVec::new(
            Opts::new("tcp_ping_sent_total", "Total number of counted connect attempts"),
            &["target"],
        )?;
        let lost_counter = IntCounterVec::new(
            Opts::new("tcp_ping_lost_total", "Total number of failed connect attempts"),
            &["target"],
        )?;
        registry.register(Box::new(latency_gauge.clone()))?;
        registry.register(Box::new(sent_counter.clone()))?;
        registry.register(Box::new(lost_counter.clone()))?;

        let latency_hist = if enable_latency_history {
            let hist = HistogramVec::new(
                HistogramOpts::new("tcp_ping_latency_milliseconds", "TCP connect latency in milliseconds")
                    .buckets(vec![
                        0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0,
                        100.0, 250.0, 500.0, 1000.0, 3000.0,
                    ]),
                &["target"],
            )?;
            registry.register(Box::new(hist.clone()))?;
            Some(hist)
        } else {
            None
        };

        Ok(Self {
            registry,
            label: target.to_string(),
            latency_gauge,
            sent_counter,
            lost_counter,
            latency_hist,
        })
    }

    /// Text exposition of everything recorded so far.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(buf)
    }

    pub fn observe(&self, outcome: &AttemptOutcome) {
        let labels = [self.label.as_str()];
        self.sent_counter.with_label_values(&labels).inc();
        if !outcome.delivered {
            self.lost_counter.with_label_values(&labels).inc();
            return;
        }
        let latency_ms = outcome.delay_millis as f64;
        self.latency_gauge.with_label_values(&labels).set(latency_ms);
        if let Some(hist) = &self.latency_hist {
            hist.with_label_values(&labels).observe(latency_ms);
        }
    }
}

impl OutcomeSink for ProbeMetrics {
    fn on_outcome(&mut self, outcome: &AttemptOutcome) {
        self.observe(outcome);
    }
}

pub async fn serve_metrics(metrics: ProbeMetrics, addr: SocketAddr) {
    let metrics_route = warp::path!("metrics").map(move || {
        let mut resp = match metrics.encode() {
            Ok(buf) => Response::new(buf),
            Err(e) => {
                tracing::error!("encoding metrics failed: {:?}", e);
                let mut resp = Response::new(Vec::new());
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp
            }
        };
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
        resp
    });

    tracing::info!("serving metrics on http://{}/metrics", addr);
    warp::serve(metrics_route).run(addr).await;
}
