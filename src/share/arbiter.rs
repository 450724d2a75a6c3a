//! Lifecycle arbiter: races the first successful delivery against a deadline.
//!
//! Both the delivery handler and the deadline timer report into a single
//! [`CompletionSignal`]. The first report wins and moves the arbiter from
//! `Waiting` to `Terminated`; every later report is discarded.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// Why the service stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// A requester presented the token and received the secret.
    Fulfilled,
    /// The deadline elapsed with no successful delivery.
    Expired,
}

impl DeliveryOutcome {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Fulfilled => "password delivered",
            Self::Expired => "timed out waiting for recipient",
        }
    }
}

/// Arbiter state as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    Waiting,
    Terminated(DeliveryOutcome),
}

struct Slot {
    sender: Option<oneshot::Sender<DeliveryOutcome>>,
    recorded: Option<DeliveryOutcome>,
    claimed: bool,
}

/// Single-shot, first-writer-wins completion signal.
///
/// Reporting never blocks, so the timer and a request handler may fire at
/// the same instant without either one waiting on the other.
pub struct CompletionSignal {
    slot: Mutex<Slot>,
}

impl CompletionSignal {
    fn new(sender: oneshot::Sender<DeliveryOutcome>) -> Self {
        Self {
            slot: Mutex::new(Slot {
                sender: Some(sender),
                recorded: None,
                claimed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // The slot holds no invariant a panicking writer could break.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Report an outcome. Returns true only for the report that decided it.
    pub fn report(&self, outcome: DeliveryOutcome) -> bool {
        let mut slot = self.lock();
        if slot.recorded.is_some() {
            debug!("Ignoring {:?} after termination", outcome);
            return false;
        }
        slot.recorded = Some(outcome);
        if let Some(sender) = slot.sender.take() {
            // Receiver may already be gone if the coordinator was dropped
            let _ = sender.send(outcome);
        }
        true
    }

    /// Reserve the single delivery attempt.
    ///
    /// Fails once an outcome is recorded or while another attempt holds the
    /// claim. The holder either reports `Fulfilled` or calls
    /// [`release_claim`](Self::release_claim).
    pub fn try_claim(&self) -> bool {
        let mut slot = self.lock();
        if slot.recorded.is_some() || slot.claimed {
            return false;
        }
        slot.claimed = true;
        true
    }

    /// Give back a claim whose attempt never reached the requester.
    pub fn release_claim(&self) {
        self.lock().claimed = false;
    }

    pub fn state(&self) -> ArbiterState {
        match self.lock().recorded {
            Some(outcome) => ArbiterState::Terminated(outcome),
            None => ArbiterState::Waiting,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state(), ArbiterState::Terminated(_))
    }
}

/// Shared handle to the completion signal.
pub type SharedSignal = Arc<CompletionSignal>;

/// Coordinator that owns the receiving side of the completion signal.
pub struct LifecycleArbiter {
    signal: SharedSignal,
    receiver: oneshot::Receiver<DeliveryOutcome>,
}

impl LifecycleArbiter {
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            signal: Arc::new(CompletionSignal::new(sender)),
            receiver,
        }
    }

    /// Handle for the delivery side to report `Fulfilled`.
    pub fn signal(&self) -> SharedSignal {
        self.signal.clone()
    }

    /// Arm the deadline timer and wait for the first outcome.
    ///
    /// The timer is left running once superseded; its late report is ignored.
    pub async fn wait(self, deadline: Duration) -> DeliveryOutcome {
        let timer_signal = self.signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            timer_signal.report(DeliveryOutcome::Expired);
        });

        match self.receiver.await {
            Ok(outcome) => outcome,
            // The sender lives inside `self.signal`, which is still held here
            Err(_) => match self.signal.state() {
                ArbiterState::Terminated(outcome) => outcome,
                ArbiterState::Waiting => DeliveryOutcome::Expired,
            },
        }
    }
}

impl Default for LifecycleArbiter {
    fn default() -> Self {
        Self::new()
    }
}
