use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use tcp_pinger::config::PingConfig;
use tcp_pinger::metrics::{self, ProbeMetrics};
use tcp_pinger::prober::{AttemptOutcome, OutcomeSink, Prober, RunEnd, Target, TcpConnector};
use tcp_pinger::report::{self, ConsoleReporter};
use tcp_pinger::stats::StatsAccumulator;
use tcp_pinger::interrupt;
use tcp_pinger::util::resolve_host_to_ip;

/// Ping a host over TCP: time the connect handshake instead of ICMP echo.
#[derive(Debug, Parser)]
#[command(name = "tcp-pinger", version, about, long_about = None)]
struct Cli {
    /// Host name or IP, optionally with `:port`.
    host: Option<String>,

    /// Destination port [default: 80]
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Number of counted attempts, 0 runs until Ctrl-C [default: 4]
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Delay before each attempt in milliseconds [default: 1000]
    #[arg(short = 'd', long = "delay-ms")]
    delay_ms: Option<u64>,

    /// Give up on a connect after this many milliseconds (OS default if unset).
    #[arg(short = 't', long = "timeout-ms")]
    timeout_ms: Option<u64>,

    /// Print outcomes and the summary as JSON lines.
    #[arg(long)]
    json: bool,

    /// trace, debug, info, warn or error.
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    /// Expose Prometheus metrics on this address, e.g. 0.0.0.0:9100.
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,

    /// Also record a latency histogram in the exported metrics.
    #[arg(long)]
    latency_history: bool,

    /// JSON config file; command-line flags win over its values.
    #[arg(short = 'c', long, env = "TCP_PINGER_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    async fn into_config(self) -> Result<PingConfig> {
        let mut cfg = match &self.config {
            Some(path) => PingConfig::load_file(path).await?,
            None => PingConfig::default(),
        };

        if let Some(host) = self.host {
            cfg.set_host(&host);
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(count) = self.count {
            cfg.count = count;
        }
        if let Some(delay_ms) = self.delay_ms {
            cfg.delay_ms = delay_ms;
        }
        if self.timeout_ms.is_some() {
            cfg.connect_timeout_ms = self.timeout_ms;
        }
        if let Some(level) = self.log_level {
            cfg.log_level = level;
        }
        if self.metrics_addr.is_some() {
            cfg.metrics_addr = self.metrics_addr;
        }
        cfg.json |= self.json;
        cfg.log_json |= self.log_json;
        cfg.enable_latency_history |= self.latency_history;

        cfg.validate()?;
        Ok(cfg)
    }
}

fn init_tracing(cfg: &PingConfig) -> Result<()> {
    let log_level = cfg.get_tracing_level()?;
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("tcp_pinger={}", log_level.as_str().to_lowercase()).parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cfg.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Cli::parse().into_config().await?;
    init_tracing(&cfg)?;

    let ip = resolve_host_to_ip(&cfg.host).await?;
    let target = Target::new(ip.to_string(), cfg.port);
    let connector = TcpConnector {
        timeout: cfg.connect_timeout(),
    };
    let prober = Prober::with_connector(target.clone(), connector);

    let metrics = match cfg.metrics_addr {
        Some(addr) => {
            let m = ProbeMetrics::new(&target, cfg.enable_latency_history)?;
            tokio::spawn(metrics::serve_metrics(m.clone(), addr));
            Some(m)
        }
        None => None,
    };

    let mut reporter = ConsoleReporter { json: cfg.json };
    let mut stats = StatsAccumulator::new();

    if !cfg.json {
        println!("{}\n", report::banner(&cfg.host, &target));
    }

    // first Ctrl-C stops after the attempt in flight, a second one stops right away
    let interrupted = interrupt::escalating_stop(prober.stop_handle(), tokio::signal::ctrl_c);

    let (end, forced) = {
        let mut sink = |outcome: &AttemptOutcome| {
            reporter.on_outcome(outcome);
            stats.observe(outcome);
            if let Some(m) = &metrics {
                m.observe(outcome);
            }
        };
        tokio::select! {
            end = prober.run(cfg.count, cfg.delay(), &mut sink) => (end, false),
            _ = interrupted => (RunEnd::Cancelled, true),
        }
    };

    reporter.print_summary(&target, &stats.summarize(), end == RunEnd::Cancelled)?;
    if forced {
        std::process::exit(130);
    }
    Ok(())
}
