use indexmap::IndexMap;
use std::collections::HashMap;

use org_ledger::World;
use org_types::{Address, AppId, AppNamespace, ParamValue, Role};

use crate::acl::Acl;
use crate::error::KernelError;
use crate::event::{AuditEvent, EventLog};

/// Namespace for the kernel's own code pointer.
pub fn core_namespace() -> AppNamespace {
    AppNamespace::from_label("core")
}

/// Namespace for app base (implementation) code registrations.
pub fn app_bases_namespace() -> AppNamespace {
    AppNamespace::from_label("base")
}

/// Namespace for live app instance registrations.
pub fn app_addr_namespace() -> AppNamespace {
    AppNamespace::from_label("app")
}

pub fn kernel_app_id() -> AppId {
    AppId::from_label("kernel")
}

pub fn acl_app_id() -> AppId {
    AppId::from_label("acl")
}

/// Role gating every registry write, with `[namespace, app_id]` as the
/// permission-check arguments.
pub fn app_manager_role() -> Role {
    Role::from_label("APP_MANAGER_ROLE")
}

/// The organization root: a namespaced appId -> code address registry whose
/// only privileged write path is `set_app`, gated through the installed ACL.
///
/// The kernel account never accepts direct value transfer, before or after
/// initialization; all value lives in app proxies or the vault.
pub struct Kernel {
    address: Address,
    apps: IndexMap<(AppNamespace, AppId), Address>,
    default_vaults: HashMap<AppNamespace, AppId>,
    acl: Option<Acl>,
    events: EventLog,
}

impl Kernel {
    /// Registers the kernel as a non-depositable contract account. All
    /// privileged operations fail until `initialize`.
    pub fn new(world: &mut World) -> Self {
        Self {
            address: world.register_contract(false),
            apps: IndexMap::new(),
            default_vaults: HashMap::new(),
            acl: None,
            events: EventLog::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn has_initialized(&self) -> bool {
        self.acl.is_some()
    }

    /// One-shot setup: bootstraps the supplied ACL with `permissions_root`
    /// and installs it as the policy engine. Records the kernel's own code
    /// pointer and the ACL reference in the registry.
    pub fn initialize(
        &mut self,
        mut acl: Acl,
        permissions_root: Address,
    ) -> Result<(), KernelError> {
        if self.has_initialized() {
            return Err(KernelError::AlreadyInitialized);
        }
        acl.initialize(permissions_root)?;
        let acl_address = acl.address();
        self.record_app(core_namespace(), kernel_app_id(), self.address);
        self.record_app(app_addr_namespace(), acl_app_id(), acl_address);
        self.acl = Some(acl);
        log::info!(
            "kernel {} initialized with acl {acl_address} and root {permissions_root}",
            self.address
        );
        Ok(())
    }

    pub fn acl(&self) -> Result<&Acl, KernelError> {
        self.acl.as_ref().ok_or(KernelError::NotInitialized)
    }

    pub fn acl_mut(&mut self) -> Result<&mut Acl, KernelError> {
        self.acl.as_mut().ok_or(KernelError::NotInitialized)
    }

    /// The single privileged-write chokepoint. Replaces the registry entry
    /// atomically; a zero address unregisters. Writing `(core, kernel)` is
    /// the kernel's own upgrade path, `(app, acl)` re-points the ACL
    /// reference of record.
    pub fn set_app(
        &mut self,
        caller: Address,
        namespace: AppNamespace,
        app_id: AppId,
        address: Address,
    ) -> Result<(), KernelError> {
        self.authorize_app_manager(caller, namespace, app_id)?;
        self.record_app(namespace, app_id, address);
        Ok(())
    }

    /// Pure read: the registered address, or `Address::ZERO` when
    /// unregistered. Never fails, even before initialization.
    pub fn get_app(&self, namespace: AppNamespace, app_id: AppId) -> Address {
        self.apps
            .get(&(namespace, app_id))
            .copied()
            .unwrap_or(Address::ZERO)
    }

    /// Records which app id in `namespace` receives recovered assets. The
    /// target is not validated here; resolution happens at recovery time so
    /// a vault re-registration takes effect immediately for all proxies.
    pub fn set_default_vault_id(
        &mut self,
        caller: Address,
        namespace: AppNamespace,
        app_id: AppId,
    ) -> Result<(), KernelError> {
        self.authorize_app_manager(caller, namespace, app_id)?;
        self.default_vaults.insert(namespace, app_id);
        self.events
            .record(AuditEvent::DefaultVaultSet { namespace, app_id });
        Ok(())
    }

    pub fn default_vault_id(&self, namespace: AppNamespace) -> Option<AppId> {
        self.default_vaults.get(&namespace).copied()
    }

    /// Swaps the live policy engine. Gated by the same permission as writing
    /// the ACL's registry entry, and keeps that entry in sync.
    pub fn replace_acl(&mut self, caller: Address, acl: Acl) -> Result<(), KernelError> {
        self.authorize_app_manager(caller, app_addr_namespace(), acl_app_id())?;
        self.record_app(app_addr_namespace(), acl_app_id(), acl.address());
        self.acl = Some(acl);
        Ok(())
    }

    /// Registered apps in insertion order, for audit listings.
    pub fn apps(&self) -> impl Iterator<Item = (AppNamespace, AppId, Address)> + '_ {
        self.apps.iter().map(|((ns, id), addr)| (*ns, *id, *addr))
    }

    pub fn events(&self) -> &[AuditEvent] {
        self.events.entries()
    }

    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        self.events.drain()
    }

    fn authorize_app_manager(
        &self,
        caller: Address,
        namespace: AppNamespace,
        app_id: AppId,
    ) -> Result<(), KernelError> {
        let acl = self.acl()?;
        let args = [
            ParamValue::Word(*namespace.as_bytes()),
            ParamValue::Word(*app_id.as_bytes()),
        ];
        if acl.has_permission(caller, self.address, app_manager_role(), &args) {
            Ok(())
        } else {
            Err(KernelError::Unauthorized {
                entity: caller,
                app: self.address,
                role: app_manager_role(),
            })
        }
    }

    fn record_app(&mut self, namespace: AppNamespace, app_id: AppId, address: Address) {
        let old = if address.is_zero() {
            self.apps.shift_remove(&(namespace, app_id))
        } else {
            self.apps.insert((namespace, app_id), address)
        }
        .unwrap_or(Address::ZERO);
        self.events.record(AuditEvent::AppSet {
            namespace,
            app_id,
            old,
            new: address,
        });
    }
}
