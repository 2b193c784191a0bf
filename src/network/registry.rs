//! Held-address bookkeeping for a single network.
//!
//! Each [`super::Network`] owns one registry behind a mutex, so every
//! check-then-claim runs in one critical section. No two owners ever hold the
//! same address.

use super::InstanceId;
use crate::error::{NetworkError, Result};
use crate::models::int_to_ip;
use std::collections::BTreeMap;

/// Outcome of [`AddressRegistry::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The address was free and is now held.
    Claimed,
    /// The owner already held the address; nothing changed.
    AlreadyHeld,
}

/// Outcome of [`AddressRegistry::release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    Released,
    NotHeld,
    /// Someone else holds the address; left untouched.
    HeldByOther(InstanceId),
}

/// Addresses currently held on one network, keyed by integer address.
#[derive(Debug, Default)]
pub struct AddressRegistry {
    held: BTreeMap<u32, InstanceId>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self, ip: u32) -> Option<&InstanceId> {
        self.held.get(&ip)
    }

    pub fn is_held(&self, ip: u32) -> bool {
        self.held.contains_key(&ip)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Held addresses in ascending order.
    pub fn held(&self) -> impl Iterator<Item = (u32, &InstanceId)> {
        self.held.iter().map(|(ip, owner)| (*ip, owner))
    }

    /// Mark `ip` held by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::NetworkAddressInUse` if another owner holds it.
    pub fn claim(&mut self, network: &str, ip: u32, owner: &InstanceId) -> Result<Claim> {
        match self.held.get(&ip) {
            Some(holder) if holder == owner => Ok(Claim::AlreadyHeld),
            Some(holder) => Err(NetworkError::NetworkAddressInUse {
                network: network.to_string(),
                ip: int_to_ip(ip),
                owner: holder.clone(),
            }),
            None => {
                self.held.insert(ip, owner.clone());
                Ok(Claim::Claimed)
            }
        }
    }

    /// Drop `owner`'s hold on `ip`. Never fails.
    pub fn release(&mut self, ip: u32, owner: &InstanceId) -> Release {
        match self.held.get(&ip) {
            None => Release::NotHeld,
            Some(holder) if holder != owner => Release::HeldByOther(holder.clone()),
            Some(_) => {
                self.held.remove(&ip);
                Release::Released
            }
        }
    }

    /// First address from `candidates` nobody holds.
    pub fn first_free(&self, candidates: impl IntoIterator<Item = u32>) -> Option<u32> {
        candidates.into_iter().find(|ip| !self.is_held(*ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_release() {
        let mut registry = AddressRegistry::new();
        let vm1 = InstanceId::new("vm1");

        assert_eq!(registry.claim("foo", 10, &vm1).unwrap(), Claim::Claimed);
        assert!(registry.is_held(10));
        assert_eq!(registry.holder(10), Some(&vm1));

        assert_eq!(registry.release(10, &vm1), Release::Released);
        assert!(!registry.is_held(10));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_claim_is_idempotent_for_same_owner() {
        let mut registry = AddressRegistry::new();
        let vm1 = InstanceId::new("vm1");

        registry.claim("foo", 10, &vm1).unwrap();
        assert_eq!(registry.claim("foo", 10, &vm1).unwrap(), Claim::AlreadyHeld);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_claim_conflict() {
        let mut registry = AddressRegistry::new();
        let vm1 = InstanceId::new("vm1");
        let vm2 = InstanceId::new("vm2");

        registry.claim("foo", 10, &vm1).unwrap();
        let err = registry.claim("foo", 10, &vm2).unwrap_err();
        assert!(err.is_exhaustion());
        assert_eq!(registry.holder(10), Some(&vm1));
    }

    #[test]
    fn test_release_not_held_is_noop() {
        let mut registry = AddressRegistry::new();
        let vm1 = InstanceId::new("vm1");
        let vm2 = InstanceId::new("vm2");

        registry.claim("foo", 10, &vm1).unwrap();
        assert_eq!(registry.release(11, &vm1), Release::NotHeld);
        assert_eq!(registry.release(10, &vm2), Release::HeldByOther(vm1.clone()));
        assert_eq!(registry.holder(10), Some(&vm1));
    }

    #[test]
    fn test_first_free() {
        let mut registry = AddressRegistry::new();
        let vm1 = InstanceId::new("vm1");

        registry.claim("foo", 1, &vm1).unwrap();
        registry.claim("foo", 2, &vm1).unwrap();
        assert_eq!(registry.first_free(1..=5), Some(3));
        assert_eq!(registry.first_free(1..=2), None);

        let held: Vec<u32> = registry.held().map(|(ip, _)| ip).collect();
        assert_eq!(held, vec![1, 2]);
    }
}
