use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::Error;

/// TCP port every probe connects to.
pub const PROBE_PORT: u16 = 443;

/// Upper bound on a single connect attempt. Retry and backoff belong to the
/// tracker's cadence, not to the prober.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of a single reachability check.
///
/// `Started` and `Stopped` are lifecycle markers that only ever appear in the
/// transition log; a probe never produces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Online,
    Timeout,
    Refused,
    Aborted,
    Reset,
    NoRoute,
    /// Catch-all for socket failures outside the fixed taxonomy. Keeps the
    /// raw OS code and message so the taxonomy can be extended later.
    NetworkError {
        code: Option<i32>,
        detail: String,
    },
    Started,
    Stopped,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Online => f.write_str("Online"),
            Classification::Timeout => f.write_str("Timeout"),
            Classification::Refused => f.write_str("Refused"),
            Classification::Aborted => f.write_str("Aborted"),
            Classification::Reset => f.write_str("Reset"),
            Classification::NoRoute => f.write_str("No Route"),
            Classification::NetworkError { code, detail } => {
                // Collapse whitespace runs so the label never contains a
                // column separator or a line break.
                let detail = detail.split_whitespace().collect::<Vec<_>>().join(" ");
                match code {
                    Some(code) => write!(f, "E {code}: {detail}"),
                    None => write!(f, "E ?: {detail}"),
                }
            }
            Classification::Started => f.write_str("Started Log"),
            Classification::Stopped => f.write_str("Stopped Log"),
        }
    }
}

/// A validated probe target: an IPv4 literal plus the fixed probe port.
///
/// Hostnames and IPv6 literals are rejected; name resolution would hide the
/// difference between "DNS is down" and "the host is down".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    addr: Ipv4Addr,
    port: u16,
}

impl HostTarget {
    pub fn parse(host: &str) -> Result<Self, Error> {
        let addr: Ipv4Addr = host
            .parse()
            .map_err(|_| Error::InvalidHost(host.to_string()))?;
        Ok(Self {
            addr,
            port: PROBE_PORT,
        })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.addr, self.port))
    }

    /// The dotted-quad form, used to derive the log file name.
    #[must_use]
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    #[cfg(test)]
    pub(crate) fn with_port(addr: Ipv4Addr, port: u16) -> Self {
        Self { addr, port }
    }
}

/// Source of per-tick classifications. Production code connects over TCP;
/// tests substitute scripted sequences.
pub trait Probe {
    fn check(&mut self) -> impl Future<Output = Classification> + Send;
}

/// Probes by attempting a TCP connection to the target.
#[derive(Debug, Clone)]
pub struct TcpProber {
    target: HostTarget,
}

impl TcpProber {
    #[must_use]
    pub fn new(target: HostTarget) -> Self {
        Self { target }
    }
}

impl Probe for TcpProber {
    async fn check(&mut self) -> Classification {
        classify_connect(self.target.socket_addr()).await
    }
}

/// One connect attempt, mapped onto the taxonomy. Never returns an error;
/// anything unclassifiable degrades to `NetworkError`.
async fn classify_connect(addr: SocketAddr) -> Classification {
    match timeout(PROBE_TIMEOUT, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => Classification::Online,
        Err(_elapsed) => Classification::Timeout,
        Ok(Err(e)) => classify_error(&e),
    }
}

fn classify_error(e: &std::io::Error) -> Classification {
    use std::io::ErrorKind;

    match e.kind() {
        ErrorKind::TimedOut => Classification::Timeout,
        ErrorKind::ConnectionRefused => Classification::Refused,
        ErrorKind::ConnectionAborted => Classification::Aborted,
        ErrorKind::ConnectionReset => Classification::Reset,
        ErrorKind::HostUnreachable | ErrorKind::NetworkUnreachable => Classification::NoRoute,
        _ => Classification::NetworkError {
            code: e.raw_os_error(),
            detail: e.to_string(),
        },
    }
}
