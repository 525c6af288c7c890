use std::time::Duration;

use tcp_pinger::prober::{Connector, Prober, RunEnd, Target, TcpConnector};
use tcp_pinger::stats::StatsAccumulator;
use tokio::net::TcpListener;

async fn listening_target() -> Target {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });
    Target::new("127.0.0.1", port)
}

async fn closed_target() -> Target {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    Target::new("127.0.0.1", port)
}

#[tokio::test]
async fn connects_to_open_port() {
    let target = listening_target().await;
    assert!(TcpConnector::default().connect(&target).await.is_ok());
    assert!(TcpConnector::with_timeout(Duration::from_secs(2)).connect(&target).await.is_ok());
}

#[tokio::test]
async fn closed_port_is_an_error() {
    let target = closed_target().await;
    assert!(TcpConnector::default().connect(&target).await.is_err());
}

#[tokio::test]
async fn loopback_run_delivers_everything() {
    let prober = Prober::new(listening_target().await);
    let mut stats = StatsAccumulator::new();

    assert_eq!(prober.run(3, Duration::from_millis(10), &mut stats).await, RunEnd::Completed);
    let s = stats.summarize();
    assert_eq!((s.sent, s.delivered, s.lost), (3, 3, 0));
    assert!(s.min_millis <= s.avg_millis && s.avg_millis <= s.max_millis);
}

#[tokio::test]
async fn refused_run_keeps_going_and_counts_loss() {
    let prober = Prober::new(closed_target().await);
    let mut stats = StatsAccumulator::new();

    assert_eq!(prober.run(2, Duration::ZERO, &mut stats).await, RunEnd::Completed);
    let s = stats.summarize();
    assert_eq!((s.sent, s.delivered, s.lost, s.loss_percent), (2, 0, 2, Some(100)));
    assert_eq!(s.avg_millis, None);
}
