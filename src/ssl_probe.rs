use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::{anyhow, Result};
use openssl::ssl::{SslConnector, SslMethod};
use url::Url;

/// Classifies the TLS state of a URL's host.
///
/// Codes: `1` valid HTTPS handshake, `0` HTTPS but the connection or
/// handshake failed, `-1` not an HTTPS URL (no network access attempted).
pub trait SslProber: Send + Sync {
    fn check_ssl_state(&self, url: &str) -> i64;
}

pub struct LiveSslProber {
    timeout: Duration,
}

impl LiveSslProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn handshake(&self, host: &str) -> Result<()> {
        let addr = (host, 443)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow!("no address for {host}"))?;

        let stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        // Default connector: system trust roots, chain and hostname
        // verification enabled.
        let connector = SslConnector::builder(SslMethod::tls())?.build();
        let tls = connector.connect(host, stream)?;
        drop(tls);
        Ok(())
    }
}

impl SslProber for LiveSslProber {
    fn check_ssl_state(&self, url: &str) -> i64 {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return -1,
        };
        if parsed.scheme() != "https" {
            return -1;
        }
        let host = match parsed.host_str() {
            Some(host) => host,
            None => return 0,
        };
        match self.handshake(host) {
            Ok(()) => 1,
            Err(err) => {
                tracing::debug!("TLS probe failed for {host}: {err}");
                0
            }
        }
    }
}
