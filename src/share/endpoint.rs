//! Ephemeral listener binding and sharing URL construction.

use crate::error::{AppError, AppResult};
use crate::share::token::CapabilityToken;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::TcpListener;

/// Bound address, OS-assigned port and token. Immutable once bound.
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    addr: SocketAddrV4,
    token: CapabilityToken,
}

impl ServiceEndpoint {
    pub fn new(addr: SocketAddrV4, token: CapabilityToken) -> Self {
        Self { addr, token }
    }

    pub fn addr(&self) -> SocketAddrV4 {
        self.addr
    }

    pub fn token(&self) -> &CapabilityToken {
        &self.token
    }

    /// The sharing URL: `http://{address}:{port}/{token}`.
    pub fn url(&self) -> String {
        format!(
            "http://{}:{}/{}",
            self.addr.ip(),
            self.addr.port(),
            self.token.as_str()
        )
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Bind a listener on `{ip}:0` and report the concrete endpoint.
pub async fn bind_ephemeral(
    ip: Ipv4Addr,
    token: CapabilityToken,
) -> AppResult<(TcpListener, ServiceEndpoint)> {
    let requested = SocketAddr::V4(SocketAddrV4::new(ip, 0));
    let bind_err = |source| AppError::Bind {
        addr: requested,
        source,
    };

    let listener = TcpListener::bind(requested).await.map_err(bind_err)?;
    let bound = match listener.local_addr().map_err(bind_err)? {
        SocketAddr::V4(v4) => v4,
        SocketAddr::V6(v6) => SocketAddrV4::new(ip, v6.port()),
    };

    Ok((listener, ServiceEndpoint::new(bound, token)))
}
