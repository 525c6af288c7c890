use std::io;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use super::{Connector, Target};

/// Plain TCP handshake. Without a timeout the OS decides when to give up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector {
    pub timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl Connector for TcpConnector {
    async fn connect(&self, target: &Target) -> io::Result<()> {
        let conn_fut = TcpStream::connect((target.address.as_str(), target.port));
        let conn = match self.timeout {
            Some(limit) => timeout(limit, conn_fut)
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??,
            None => conn_fut.await?,
        };
        // nothing is sent; closing right away
        drop(conn);
        Ok(())
    }
}
