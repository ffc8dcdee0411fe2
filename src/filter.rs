//! Administrative address disable list.

use std::collections::HashSet;

use crate::error::RegistryError;
use crate::registry::contracts::AddressFilter;
use crate::registry::types::CommitteeAddress;

/// Set of addresses that must not be bootstrapped.
#[derive(Debug, Clone, Default)]
pub struct DisabledAddresses {
    disabled: HashSet<CommitteeAddress>,
}

impl DisabledAddresses {
    pub fn new(disabled: impl IntoIterator<Item = CommitteeAddress>) -> Self {
        Self { disabled: disabled.into_iter().collect() }
    }

    /// Build from hex strings, as found in `[registry].disabled_addresses`.
    pub fn from_hex<I, S>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let disabled = entries
            .into_iter()
            .map(|s| s.as_ref().parse::<CommitteeAddress>())
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self { disabled })
    }

    pub fn len(&self) -> usize {
        self.disabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disabled.is_empty()
    }
}

impl AddressFilter for DisabledAddresses {
    fn is_disabled(&self, addr: &CommitteeAddress) -> bool {
        self.disabled.contains(addr)
    }
}
