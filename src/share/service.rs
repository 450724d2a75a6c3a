//! One-shot delivery service: bind, serve until the first outcome, abandon.

use crate::error::AppResult;
use crate::share::arbiter::{DeliveryOutcome, LifecycleArbiter};
use crate::share::delivery::{delivery_router, DeliveryState};
use crate::share::endpoint::{bind_ephemeral, ServiceEndpoint};
use crate::share::secret::Secret;
use crate::share::token::CapabilityToken;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// A bound, not yet serving, share service.
pub struct ShareService {
    listener: TcpListener,
    endpoint: ServiceEndpoint,
}

impl ShareService {
    /// Bind the ephemeral listener for a freshly generated token.
    pub async fn bind(ip: Ipv4Addr, token: CapabilityToken) -> AppResult<Self> {
        let (listener, endpoint) = bind_ephemeral(ip, token).await?;
        Ok(Self { listener, endpoint })
    }

    /// Generate a token and bind on `ip`.
    pub async fn bind_new(ip: Ipv4Addr) -> AppResult<Self> {
        let token = CapabilityToken::generate()?;
        Self::bind(ip, token).await
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Serve the secret until it is delivered once or `timeout` elapses.
    ///
    /// The listener is abandoned on return, not drained.
    pub async fn run(self, secret: Secret, timeout: Duration) -> DeliveryOutcome {
        let arbiter = LifecycleArbiter::new();
        let state = DeliveryState {
            secret: secret.into_shared(),
            signal: arbiter.signal(),
        };
        let router = delivery_router(self.endpoint.token(), state);

        let listener = self.listener;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("Server error: {}", e);
            }
        });

        let outcome = arbiter.wait(timeout).await;
        server.abort();
        info!("Shutting down: {}", outcome.describe());
        outcome
    }
}

/// Resolve the address to bind: the configured one, or discover it.
pub async fn select_address(configured: Option<Ipv4Addr>) -> AppResult<Ipv4Addr> {
    match configured {
        Some(ip) => Ok(ip),
        None => crate::share::address::resolve_local_ipv4().await,
    }
}

/// Full startup path: pick address and token, bind.
pub async fn prepare(configured: Option<Ipv4Addr>) -> AppResult<ShareService> {
    // Resolution and token generation are independent of each other
    let (ip, token) = tokio::join!(select_address(configured), async {
        CapabilityToken::generate()
    });
    ShareService::bind(ip?, token?).await
}
