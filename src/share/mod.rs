//! One-shot, capability-gated secret delivery.
//!
//! This module serves a single secret to the first requester that presents
//! an unguessable URL token, then stops.
//!
//! ## Security Model
//!
//! - A fresh 128-bit token is generated on each run
//! - The listener binds an OS-assigned port on the local network address
//! - The secret is stored only in memory and zeroized on drop
//! - The service ends on the first successful delivery or on timeout
//! - Transport is plain HTTP; the network is assumed trusted
//!
//! ## Usage
//!
//! ```ignore
//! let service = share::service::prepare(None).await?;
//! info!("Listening on {}", service.endpoint().url());
//!
//! let outcome = service.run(secret, Duration::from_secs(600)).await;
//! ```

pub mod address;
pub mod arbiter;
pub mod delivery;
pub mod detach;
pub mod endpoint;
pub mod secret;
pub mod service;
pub mod token;

pub use arbiter::{ArbiterState, CompletionSignal, DeliveryOutcome, LifecycleArbiter};
pub use endpoint::ServiceEndpoint;
pub use secret::{Secret, SharedSecret};
pub use service::ShareService;
pub use token::CapabilityToken;
