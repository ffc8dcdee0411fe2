//! Node connection: address subscriptions for inbound committee traffic.
//!
//! [`NodeConnHandle`] is the registry-facing [`NetworkBinding`]: it queues
//! subscribe/unsubscribe commands on an unbounded channel, so a call never
//! blocks and never drops a command while the service is alive. [`NodeConnService`]
//! drains the queue on its own task and maintains the set of addresses the
//! node currently listens on. The ledger transport that consumes this set is
//! external.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::contracts::NetworkBinding;
use crate::registry::types::CommitteeAddress;

/// Commands delivered to the service loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingCommand {
    Subscribe(Vec<CommitteeAddress>),
    Unsubscribe(CommitteeAddress),
}

type SubscriptionSet = Arc<Mutex<BTreeSet<CommitteeAddress>>>;

/// Cloneable client handle.
#[derive(Clone)]
pub struct NodeConnHandle {
    tx: mpsc::UnboundedSender<BindingCommand>,
    subscribed: SubscriptionSet,
}

impl NodeConnHandle {
    /// Snapshot of addresses the service has applied so far, sorted.
    pub fn subscribed(&self) -> Vec<CommitteeAddress> {
        self.subscribed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    fn send(&self, cmd: BindingCommand) {
        if let Err(mpsc::error::SendError(cmd)) = self.tx.send(cmd) {
            warn!(?cmd, "node connection not running, binding command dropped");
        }
    }
}

impl NetworkBinding for NodeConnHandle {
    fn subscribe(&self, addrs: &[CommitteeAddress]) {
        if addrs.is_empty() {
            return;
        }
        self.send(BindingCommand::Subscribe(addrs.to_vec()));
    }

    fn unsubscribe(&self, addr: &CommitteeAddress) {
        self.send(BindingCommand::Unsubscribe(*addr));
    }
}

/// Owns the command receiver and the authoritative subscription set.
pub struct NodeConnService {
    rx: mpsc::UnboundedReceiver<BindingCommand>,
    subscribed: SubscriptionSet,
}

impl NodeConnService {
    pub fn new() -> (Self, NodeConnHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscribed = SubscriptionSet::default();
        let handle = NodeConnHandle { tx, subscribed: subscribed.clone() };
        (Self { rx, subscribed }, handle)
    }

    /// Apply commands until `shutdown` is cancelled or every handle is dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("node connection running");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!(subscribed = self.len(), "node connection shutting down");
                    break;
                }

                cmd = self.rx.recv() => {
                    match cmd {
                        Some(cmd) => self.apply(cmd),
                        None => {
                            info!("all binding handles dropped, node connection exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.subscribed.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn apply(&self, cmd: BindingCommand) {
        let mut set = self.subscribed.lock().unwrap_or_else(PoisonError::into_inner);
        match cmd {
            BindingCommand::Subscribe(addrs) => {
                for addr in addrs {
                    if set.insert(addr) {
                        debug!(%addr, "subscribed");
                    }
                }
            }
            BindingCommand::Unsubscribe(addr) => {
                if set.remove(&addr) {
                    debug!(%addr, "unsubscribed");
                }
            }
        }
    }
}
