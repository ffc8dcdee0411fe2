// Library root. The binary entry point is src/main.rs.

pub mod bootup;
pub mod committee;
pub mod config;
pub mod error;
pub mod filter;
pub mod logger;
pub mod nodeconn;
pub mod registry;

pub use registry::contracts::{AddressFilter, BootupSource, Committee, CommitteeFactory, NetworkBinding};
pub use registry::types::{BootupRecord, CommitteeAddress};
pub use registry::{BootstrapReport, Collaborators, CommitteeRegistry};
