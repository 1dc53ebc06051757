//! Port release polling.

use crate::{HarnessError, HarnessResult};

use std::io::ErrorKind;
use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;
use log::debug;
use tokio::net::TcpStream;
use tokio::time::Instant;

/// What a single connect attempt says about a port.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PortState {
    /// Connection refused: nobody is listening
    Free,
    /// Connection accepted: something still listens
    Occupied,
    /// Anything else (DNS hiccup, connect timeout); try again
    Unknown(String),
}

/// Polls a TCP port until nothing accepts connections on it.
#[derive(Debug, Clone)]
pub struct PortWaiter {
    poll_interval: Duration,
}

impl PortWaiter {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Wait until `host:port` refuses connections.
    ///
    /// Only "connection refused" counts as free. Transient errors are
    /// retried until `timeout` elapses, after which `PortStillBound` is
    /// returned.
    #[track_caller]
    pub fn wait_for_port_free<'a>(
        &'a self,
        host: &'a str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = HarnessResult<()>> + 'a {
        let location = ErrorLocation::from(Location::caller());

        async move {
            let deadline = Instant::now() + timeout;

            loop {
                match self.probe(host, port).await {
                    PortState::Free => {
                        debug!("Port {host}:{port} is free");
                        return Ok(());
                    }
                    PortState::Occupied => debug!("Port {host}:{port} still in use"),
                    PortState::Unknown(reason) => {
                        debug!("Port {host}:{port} state unknown ({reason}), retrying")
                    }
                }

                let now = Instant::now();
                if now >= deadline {
                    return Err(HarnessError::PortStillBound {
                        host: host.to_string(),
                        port,
                        timeout_ms: timeout.as_millis() as u64,
                        location,
                    });
                }
                tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
            }
        }
    }

    /// Single connect attempt; `true` when the connection is refused.
    pub async fn is_port_free(&self, host: &str, port: u16) -> bool {
        self.probe(host, port).await == PortState::Free
    }

    async fn probe(&self, host: &str, port: u16) -> PortState {
        match tokio::time::timeout(self.poll_interval, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => PortState::Occupied,
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => PortState::Free,
            Ok(Err(e)) => PortState::Unknown(e.to_string()),
            Err(_) => PortState::Unknown(format!(
                "connect timed out after {}ms",
                self.poll_interval.as_millis()
            )),
        }
    }
}
