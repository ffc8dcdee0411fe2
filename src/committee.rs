//! Local committee handles and the factory that builds them.
//!
//! A [`LocalCommittee`] is the node-side lifecycle handle of one committee:
//! it remembers the bootup record, this node's member index, and a
//! [`CancellationToken`] that consensus tasks watch. Dismissing the handle
//! cancels the token; the tasks themselves live outside this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::registry::contracts::{Committee, CommitteeFactory};
use crate::registry::types::{BootupRecord, CommitteeAddress};

pub struct LocalCommittee {
    record: BootupRecord,
    own_index: u16,
    dismissed: AtomicBool,
    cancel: CancellationToken,
}

impl LocalCommittee {
    pub fn record(&self) -> &BootupRecord {
        &self.record
    }

    /// This node's position in `record.committee_nodes`.
    pub fn own_index(&self) -> u16 {
        self.own_index
    }

    pub fn size(&self) -> usize {
        self.record.committee_nodes.len()
    }

    /// Token cancelled on dismissal. Hand child tokens to consensus tasks.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Resolves once the committee has been dismissed.
    pub async fn dismissed(&self) {
        self.cancel.cancelled().await;
    }
}

impl Committee for LocalCommittee {
    fn address(&self) -> CommitteeAddress {
        self.record.address
    }

    fn is_dismissed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn dismiss(&self) {
        if self.dismissed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel.cancel();
        info!(addr = %self.record.address, "committee dismissed");
    }
}

/// Builds [`LocalCommittee`]s for records this node is a member of.
#[derive(Debug, Clone)]
pub struct LocalCommitteeFactory {
    own_node: String,
}

impl LocalCommitteeFactory {
    /// `own_node` is this node's peering endpoint as listed in committee records.
    pub fn new(own_node: impl Into<String>) -> Self {
        Self { own_node: own_node.into() }
    }

    /// Build the concrete handle, or `None` if the record is unusable here.
    pub fn build(&self, record: &BootupRecord) -> Option<LocalCommittee> {
        let addr = record.address;
        let size = record.committee_nodes.len();

        if size == 0 {
            warn!(%addr, "bootup record lists no committee nodes");
            return None;
        }

        let Some(pos) = record.committee_nodes.iter().position(|n| *n == self.own_node) else {
            warn!(%addr, own_node = %self.own_node, "this node is not a member of the committee");
            return None;
        };
        let Ok(own_index) = u16::try_from(pos) else {
            warn!(%addr, size, "committee too large");
            return None;
        };

        let quorum = record.effective_quorum();
        if quorum == 0 || quorum > size {
            warn!(%addr, quorum, size, "invalid quorum for committee");
            return None;
        }

        Some(LocalCommittee {
            record: record.clone(),
            own_index,
            dismissed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        })
    }
}

impl CommitteeFactory for LocalCommitteeFactory {
    fn create(&self, record: &BootupRecord) -> Option<Arc<dyn Committee>> {
        self.build(record).map(|c| Arc::new(c) as Arc<dyn Committee>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const OWN: &str = "127.0.0.1:4000";

    fn record(nodes: &[&str]) -> BootupRecord {
        BootupRecord::new(CommitteeAddress::from_bytes([1; CommitteeAddress::LEN]))
            .with_committee(nodes.iter().copied())
    }

    #[test]
    fn member_gets_index() {
        let f = LocalCommitteeFactory::new(OWN);
        let c = f.build(&record(&["10.0.0.1:4000", OWN, "10.0.0.3:4000"])).unwrap();
        assert_eq!(c.own_index(), 1);
        assert_eq!(c.size(), 3);
        assert!(!c.is_dismissed());
    }

    #[test]
    fn non_member_refused() {
        let f = LocalCommitteeFactory::new(OWN);
        assert!(f.create(&record(&["10.0.0.1:4000"])).is_none());
    }

    #[test]
    fn empty_committee_refused() {
        let f = LocalCommitteeFactory::new(OWN);
        assert!(f.create(&record(&[])).is_none());
    }

    #[test]
    fn oversized_quorum_refused() {
        let f = LocalCommitteeFactory::new(OWN);
        assert!(f.create(&record(&[OWN, "10.0.0.2:4000"]).with_quorum(3)).is_none());
        assert!(f.create(&record(&[OWN, "10.0.0.2:4000"]).with_quorum(0)).is_none());
        assert!(f.create(&record(&[OWN, "10.0.0.2:4000"]).with_quorum(2)).is_some());
    }

    #[tokio::test]
    async fn dismiss_is_idempotent_and_cancels_tasks() {
        let c = LocalCommitteeFactory::new(OWN).build(&record(&[OWN])).unwrap();
        let child = c.cancellation_token();
        c.dismiss();
        c.dismiss();
        assert!(c.is_dismissed());
        assert!(child.is_cancelled());
        tokio::time::timeout(Duration::from_millis(50), c.dismissed())
            .await
            .expect("dismissed future resolves");
    }
}
