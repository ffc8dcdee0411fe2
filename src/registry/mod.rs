//! Committee registry: the node's directory of live consensus committees.
//!
//! The registry owns the address → committee map and drives three phases of
//! a committee's life on this node:
//!
//! 1. **Bootstrap**: persisted bootup records are read once, disabled
//!    addresses skipped, handles built and indexed, and all surviving
//!    addresses subscribed in one batch. The [`StartupGate`] then fires.
//! 2. **Service**: ad hoc [`CommitteeRegistry::register_committee`] calls
//!    and [`CommitteeRegistry::lookup`]s. A lookup that finds a dismissed
//!    committee evicts it and revokes its network binding; there is no
//!    background sweep.
//! 3. **Shutdown**: [`CommitteeRegistry::shutdown_all`] snapshots the map
//!    and dismisses every handle on a detached blocking task.
//!
//! # Locking
//!
//! A single `std::sync::RwLock` guards the map. It is never held across an
//! `.await`, a `dismiss()` call or a [`NetworkBinding`] call. The factory
//! runs under the write lock so check-then-insert stays atomic.

pub mod contracts;
pub mod gate;
pub mod types;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{RegisterError, RegistryError};
use contracts::{AddressFilter, BootupSource, Committee, CommitteeFactory, NetworkBinding};
use gate::StartupGate;
use types::{BootupRecord, CommitteeAddress};

type CommitteeMap = HashMap<CommitteeAddress, Arc<dyn Committee>>;

/// The collaborators a registry is wired to at construction.
pub struct Collaborators {
    pub source: Arc<dyn BootupSource>,
    pub filter: Arc<dyn AddressFilter>,
    pub factory: Arc<dyn CommitteeFactory>,
    pub network: Arc<dyn NetworkBinding>,
}

/// Outcome counts of a completed bootstrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Records returned by the source.
    pub loaded: usize,
    /// Records skipped because their address is disabled.
    pub disabled: usize,
    /// Records that registered and were subscribed.
    pub registered: usize,
    /// Records rejected as duplicates or refused by the factory.
    pub failed: usize,
}

/// Process-scoped registry. Construct once, share via `Arc`.
pub struct CommitteeRegistry {
    committees: RwLock<CommitteeMap>,
    initial_load: StartupGate,
    source: Arc<dyn BootupSource>,
    filter: Arc<dyn AddressFilter>,
    factory: Arc<dyn CommitteeFactory>,
    network: Arc<dyn NetworkBinding>,
}

impl CommitteeRegistry {
    pub fn new(collaborators: Collaborators) -> Self {
        let Collaborators { source, filter, factory, network } = collaborators;
        Self {
            committees: RwLock::new(HashMap::new()),
            initial_load: StartupGate::new(),
            source,
            filter,
            factory,
            network,
        }
    }

    // ── locking ───────────────────────────────────────────────────────────────

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn read_map(&self) -> RwLockReadGuard<'_, CommitteeMap> {
        self.committees.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, CommitteeMap> {
        self.committees.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── registration & lookup ─────────────────────────────────────────────────

    /// Build a committee from `record` and index it under its address.
    ///
    /// A duplicate address is rejected without touching the existing entry.
    /// When `subscribe` is set, the address is bound to network delivery
    /// before this returns.
    pub fn register_committee(
        &self,
        record: &BootupRecord,
        subscribe: bool,
    ) -> Result<Arc<dyn Committee>, RegisterError> {
        let addr = record.address;

        let committee = {
            let mut map = self.write_map();
            if map.contains_key(&addr) {
                error!(%addr, "committee already registered");
                return Err(RegisterError::Duplicate(addr));
            }
            let Some(committee) = self.factory.create(record) else {
                warn!(%addr, "committee factory produced no handle");
                return Err(RegisterError::FactoryRefused(addr));
            };
            map.insert(addr, committee.clone());
            committee
        };

        if subscribe {
            self.network.subscribe(&[addr]);
        }
        info!(%addr, subscribed = subscribe, "registered committee");
        Ok(committee)
    }

    /// Return the live committee for `addr`, if any.
    ///
    /// A dismissed committee is evicted here and its address unsubscribed.
    /// Only the caller that actually removes the entry unsubscribes, so
    /// racing lookups on the same dismissed committee unsubscribe once.
    pub fn lookup(&self, addr: &CommitteeAddress) -> Option<Arc<dyn Committee>> {
        let found = self.read_map().get(addr).cloned()?;
        if !found.is_dismissed() {
            return Some(found);
        }

        let evicted = {
            let mut map = self.write_map();
            match map.get(addr).cloned() {
                Some(current) if Arc::ptr_eq(&current, &found) => {
                    map.remove(addr);
                    true
                }
                // Replaced by a fresh registration while we were unlocked.
                Some(current) if !current.is_dismissed() => return Some(current),
                _ => false,
            }
        };

        if evicted {
            self.network.unsubscribe(addr);
            info!(%addr, "evicted dismissed committee");
        }
        None
    }

    /// Number of indexed committees, dismissed-but-not-yet-evicted included.
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    /// Snapshot of indexed addresses, sorted.
    pub fn addresses(&self) -> Vec<CommitteeAddress> {
        let mut v: Vec<_> = self.read_map().keys().copied().collect();
        v.sort();
        v
    }

    // ── bootstrap ─────────────────────────────────────────────────────────────

    /// Load and register every enabled bootup record, then fire the
    /// initial-load gate.
    ///
    /// A source failure aborts with the gate left unfired; the registry
    /// stays usable. Per-record failures are logged and skipped.
    ///
    /// # Panics
    ///
    /// Panics if called again after a successful bootstrap.
    pub async fn bootstrap(&self) -> Result<BootstrapReport, RegistryError> {
        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "failed to load bootup records from registry");
                return Err(e);
            }
        };
        debug!(count = records.len(), "loaded bootup record(s)");

        let mut report = BootstrapReport {
            loaded: records.len(),
            ..BootstrapReport::default()
        };
        let mut addrs = Vec::with_capacity(records.len());

        for record in &records {
            if self.filter.is_disabled(&record.address) {
                debug!(addr = %record.address, "skipping disabled address");
                report.disabled += 1;
                continue;
            }
            match self.register_committee(record, false) {
                Ok(_) => addrs.push(record.address),
                Err(_) => report.failed += 1,
            }
        }
        report.registered = addrs.len();

        self.network.subscribe(&addrs);
        self.initial_load.fire();

        info!(
            loaded = report.loaded,
            registered = report.registered,
            disabled = report.disabled,
            failed = report.failed,
            "initial committee load complete"
        );
        Ok(report)
    }

    /// Wait until the initial bootstrap has completed.
    ///
    /// Never completes if bootstrap failed; wrap in `tokio::time::timeout`
    /// when a bound is needed.
    pub async fn wait_initial_load(&self) {
        self.initial_load.wait().await;
    }

    pub fn is_initial_load_done(&self) -> bool {
        self.initial_load.is_fired()
    }

    // ── shutdown ──────────────────────────────────────────────────────────────

    /// Dismiss every indexed committee on a detached task.
    ///
    /// Returns as soon as the snapshot is taken. The returned handle may be
    /// dropped, or awaited with a grace period. Entries stay in the map;
    /// eviction remains lookup-driven.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn shutdown_all(&self) -> JoinHandle<()> {
        let snapshot: Vec<Arc<dyn Committee>> = self.read_map().values().cloned().collect();
        let count = snapshot.len();
        info!(count, "shutdown signal received: dismissing committees..");

        tokio::task::spawn_blocking(move || {
            for committee in &snapshot {
                debug!(addr = %committee.address(), "dismissing committee");
                committee.dismiss();
            }
            info!(count, "shutdown signal received: dismissing committees.. done");
        })
    }

    /// Run bootstrap, then wait for `shutdown` and start dismissal.
    ///
    /// The outer handle resolves once shutdown has been signalled and yields
    /// the dismissal task's handle, so the caller can grant it a grace period.
    pub fn spawn_worker(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> JoinHandle<JoinHandle<()>> {
        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    warn!("shutdown signalled before initial committee load finished");
                }

                res = self.bootstrap() => {
                    if res.is_err() {
                        warn!("registry running with no bootstrapped committees");
                    }
                    shutdown.cancelled().await;
                }
            }
            self.shutdown_all()
        })
    }
}
