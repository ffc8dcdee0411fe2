//! Collaborator contracts: the capabilities the registry depends on.
//!
//! The registry never knows the concrete committee, store or network types.
//! Each collaborator is a `Send + Sync` trait object so the registry can be
//! shared behind `Arc` across Tokio tasks.
//!
//! | Contract             | Role                                         |
//! |----------------------|----------------------------------------------|
//! | [`Committee`]        | live committee handle owned by the registry  |
//! | [`BootupSource`]     | persisted records read once at startup       |
//! | [`AddressFilter`]    | administrative disable list                  |
//! | [`CommitteeFactory`] | record → handle construction                 |
//! | [`NetworkBinding`]   | inbound traffic subscription per address     |

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::registry::types::{BootupRecord, CommitteeAddress};

/// A live committee handle.
pub trait Committee: Send + Sync {
    fn address(&self) -> CommitteeAddress;

    /// `true` once the committee has terminated.
    fn is_dismissed(&self) -> bool;

    /// Terminate participation. Idempotent and best-effort; may return before
    /// teardown finishes.
    fn dismiss(&self);
}

/// A boxed, owned future returned by [`BootupSource::fetch`].
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<BootupRecord>, RegistryError>> + Send + 'a>>;

/// Supplies persisted bootup records, in source order.
pub trait BootupSource: Send + Sync {
    fn fetch(&self) -> FetchFuture<'_>;
}

/// Decides whether an address is administratively disabled.
///
/// Must be a pure predicate. Any `Fn(&CommitteeAddress) -> bool` qualifies.
pub trait AddressFilter: Send + Sync {
    fn is_disabled(&self, addr: &CommitteeAddress) -> bool;
}

impl<F> AddressFilter for F
where
    F: Fn(&CommitteeAddress) -> bool + Send + Sync,
{
    fn is_disabled(&self, addr: &CommitteeAddress) -> bool {
        self(addr)
    }
}

/// Builds committee handles from bootup records.
///
/// Returning `None` means construction failed; implementations log their own
/// reasons and must not panic.
pub trait CommitteeFactory: Send + Sync {
    fn create(&self, record: &BootupRecord) -> Option<Arc<dyn Committee>>;
}

/// Binds committee addresses to inbound network delivery.
///
/// Both calls are idempotent and must not block; `subscribe(&[])` is a no-op.
pub trait NetworkBinding: Send + Sync {
    fn subscribe(&self, addrs: &[CommitteeAddress]);

    fn unsubscribe(&self, addr: &CommitteeAddress);
}
