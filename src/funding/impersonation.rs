//! Impersonation capability management.
//!
//! # States
//! - Active: the node accepts unsigned transactions from the address
//! - Inactive: impersonation was revoked through this handle
//!
//! # Design Decisions
//! - Impersonation is node-global; the handle makes ownership visible in
//!   the type system even though the node does not enforce it
//! - Within one process, acquisitions of the same address are serialized by
//!   a per-address lock carried in the handle
//! - Release is async and cannot run in `Drop`; a leaked active handle is logged

use std::sync::Arc;

use alloy::primitives::Address;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::chain::{ChainClient, ChainError, ChainResult};

/// Lifecycle state of an impersonation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Active,
    Inactive,
}

/// Live capability to send transactions as `address` on the node.
#[derive(Debug)]
pub struct ImpersonationHandle {
    address: Address,
    state: HandleState,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ImpersonationHandle {
    /// Address being impersonated.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == HandleState::Active
    }

    /// Fail with `NotActive` unless this handle is active for `address`.
    pub fn ensure_active_for(&self, address: Address) -> ChainResult<()> {
        if !self.is_active() || self.address != address {
            return Err(ChainError::NotActive(address));
        }
        Ok(())
    }
}

impl Drop for ImpersonationHandle {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::warn!(
                address = %self.address,
                "Impersonation handle dropped while active; node still impersonates the account"
            );
        }
    }
}

/// Acquires and releases impersonation on the node.
#[derive(Clone)]
pub struct ImpersonationManager {
    client: Arc<dyn ChainClient>,
    locks: Arc<DashMap<Address, Arc<Mutex<()>>>>,
    serialize: bool,
}

impl ImpersonationManager {
    /// Create a manager. With `serialize` set, a second `acquire` of the same
    /// address waits until the first handle is released.
    pub fn new(client: Arc<dyn ChainClient>, serialize: bool) -> Self {
        Self {
            client,
            locks: Arc::new(DashMap::new()),
            serialize,
        }
    }

    /// Start impersonating `address`.
    ///
    /// Idempotent on the node: re-impersonating an active address succeeds.
    pub async fn acquire(&self, address: Address) -> ChainResult<ImpersonationHandle> {
        let guard = if self.serialize {
            let lock = self
                .locks
                .entry(address)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            Some(lock.lock_owned().await)
        } else {
            None
        };

        self.client.impersonate_account(address).await?;
        tracing::info!(address = %address, "Impersonation acquired");

        Ok(ImpersonationHandle {
            address,
            state: HandleState::Active,
            guard,
        })
    }

    /// Stop impersonating the handle's address.
    ///
    /// Fails with `NotActive` if the handle was already released. If the node
    /// call fails the handle stays active so the release can be retried.
    pub async fn release(&self, handle: &mut ImpersonationHandle) -> ChainResult<()> {
        if !handle.is_active() {
            return Err(ChainError::NotActive(handle.address));
        }

        self.client.stop_impersonating_account(handle.address).await?;

        handle.state = HandleState::Inactive;
        handle.guard = None;
        tracing::info!(address = %handle.address, "Impersonation released");
        Ok(())
    }
}

impl std::fmt::Debug for ImpersonationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpersonationManager")
            .field("serialize", &self.serialize)
            .field("tracked_addresses", &self.locks.len())
            .finish()
    }
}
