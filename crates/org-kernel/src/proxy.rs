use std::sync::Arc;

use org_ledger::{AppStorage, AssetRef, CallContext, CallPayload, Dispatchable, World};
use org_types::{Address, AppId, AppNamespace};

use crate::error::KernelError;
use crate::event::{AuditEvent, EventLog};
use crate::kernel::{Kernel, app_bases_namespace};

/// How a proxy finds its executable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyTarget {
    /// Re-resolved through the kernel registry on every call.
    Upgradeable { app_id: AppId },
    /// Fixed at construction time.
    Pinned { code: Address },
}

/// A forwarding shell: owns the long-lived storage and identity of an app
/// instance and delegates execution into resolvable code. Accepts plain
/// value deposits (no code runs on receipt) and exposes one permissionless
/// recovery path that only ever moves assets to the designated vault.
#[derive(Debug)]
pub struct AppProxy {
    address: Address,
    namespace: AppNamespace,
    target: ProxyTarget,
    storage: AppStorage,
    events: EventLog,
}

impl AppProxy {
    /// Creates an upgradeable proxy for `app_id`, resolving code through the
    /// kernel's base namespace. Fails with `InvalidCode` when the id does
    /// not resolve to executable code. A non-empty init payload is
    /// dispatched into the resolved code immediately, against the proxy's
    /// fresh storage.
    pub fn new_upgradeable(
        world: &mut World,
        kernel: &Kernel,
        app_id: AppId,
        init: Option<CallPayload>,
    ) -> Result<Self, KernelError> {
        let namespace = app_bases_namespace();
        let code_address = kernel.get_app(namespace, app_id);
        let code = world
            .code(code_address)
            .ok_or(KernelError::InvalidCode(code_address))?;
        Self::construct(world, namespace, ProxyTarget::Upgradeable { app_id }, code, init)
    }

    /// Creates a proxy pinned to a fixed code address.
    pub fn new_pinned(
        world: &mut World,
        code_address: Address,
        init: Option<CallPayload>,
    ) -> Result<Self, KernelError> {
        let code = world
            .code(code_address)
            .ok_or(KernelError::InvalidCode(code_address))?;
        Self::construct(
            world,
            app_bases_namespace(),
            ProxyTarget::Pinned { code: code_address },
            code,
            init,
        )
    }

    fn construct(
        world: &mut World,
        namespace: AppNamespace,
        target: ProxyTarget,
        code: Arc<dyn Dispatchable>,
        init: Option<CallPayload>,
    ) -> Result<Self, KernelError> {
        let mut proxy = Self {
            // Depositable: plain sends are accepted without running code.
            address: world.register_contract(true),
            namespace,
            target,
            storage: AppStorage::new(),
            events: EventLog::default(),
        };
        if let Some(payload) = init {
            let mut ctx = CallContext {
                caller: proxy.address,
                self_address: proxy.address,
                storage: &mut proxy.storage,
            };
            code.dispatch(&mut ctx, &payload)?;
        }
        Ok(proxy)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn target(&self) -> ProxyTarget {
        self.target
    }

    /// Forwards a call into the current code with the proxy's storage as the
    /// execution context. Upgradeable proxies re-resolve the target on every
    /// call; an unresolvable target fails with `NoCode`, never a silent
    /// no-op.
    pub fn call(
        &mut self,
        world: &World,
        kernel: &Kernel,
        caller: Address,
        payload: &CallPayload,
    ) -> Result<Vec<u8>, KernelError> {
        let code = self.resolve_code(world, kernel)?;
        let mut ctx = CallContext {
            caller,
            self_address: self.address,
            storage: &mut self.storage,
        };
        Ok(code.dispatch(&mut ctx, payload)?)
    }

    fn resolve_code(
        &self,
        world: &World,
        kernel: &Kernel,
    ) -> Result<Arc<dyn Dispatchable>, KernelError> {
        match self.target {
            ProxyTarget::Upgradeable { app_id } => {
                let code_address = kernel.get_app(self.namespace, app_id);
                world.code(code_address).ok_or(KernelError::NoCode {
                    namespace: self.namespace,
                    app_id,
                })
            }
            ProxyTarget::Pinned { code } => {
                world.code(code).ok_or(KernelError::InvalidCode(code))
            }
        }
    }

    /// Sweeps the proxy's entire balance of `asset` to the vault registered
    /// for its namespace. Permissionless: recovery only ever moves assets to
    /// the designated vault, never to an arbitrary destination.
    ///
    /// The vault is resolved fresh on every call. The sweep is two-phase:
    /// snapshot the amount, transfer, then re-read and require a zero
    /// residual so a partially-transferring or reentrant asset cannot fake a
    /// completed recovery.
    pub fn transfer_to_vault(
        &mut self,
        world: &mut World,
        kernel: &Kernel,
        asset: AssetRef,
    ) -> Result<(), KernelError> {
        let vault = self.resolve_vault(world, kernel)?;
        let amount = world.asset_balance(asset, self.address)?;
        if amount == 0 {
            // Nothing to recover; repeated sweeps are a no-op.
            return Ok(());
        }
        world.asset_transfer(asset, self.address, vault, amount)?;
        let remaining = world.asset_balance(asset, self.address)?;
        if remaining != 0 {
            return Err(KernelError::RecoveryIncomplete { asset, remaining });
        }
        log::info!(
            "recovered {amount} of {asset:?} from {} to vault {vault}",
            self.address
        );
        self.events.record(AuditEvent::AssetRecovered {
            proxy: self.address,
            asset,
            amount,
            vault,
        });
        Ok(())
    }

    fn resolve_vault(&self, world: &World, kernel: &Kernel) -> Result<Address, KernelError> {
        let no_vault = KernelError::NoVault(self.namespace);
        let Some(vault_id) = kernel.default_vault_id(self.namespace) else {
            return Err(no_vault);
        };
        let vault = kernel.get_app(self.namespace, vault_id);
        if vault.is_zero() || !world.is_contract(vault) {
            return Err(no_vault);
        }
        Ok(vault)
    }

    pub fn events(&self) -> &[AuditEvent] {
        self.events.entries()
    }

    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        self.events.drain()
    }
}
