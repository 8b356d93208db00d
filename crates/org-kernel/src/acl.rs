use org_ledger::World;
use org_types::{Address, ParamRule, ParamValue, Role};

use crate::error::KernelError;
use crate::event::{AuditEvent, EventLog};
use crate::permissions::{GrantState, PermissionStore};

/// Role required to create brand-new permissions on any app. The bootstrap
/// root receives it on the ACL itself during kernel initialization.
pub fn create_permissions_role() -> Role {
    Role::from_label("CREATE_PERMISSIONS_ROLE")
}

/// Access-control engine: evaluates "may entity E perform role R on app T
/// with arguments A" and administers grants. Every mutation here is itself a
/// permissioned action; only evaluation is free.
pub struct Acl {
    address: Address,
    store: PermissionStore,
    events: EventLog,
    initialized: bool,
}

impl Acl {
    /// Registers the engine as a non-depositable contract account. The
    /// engine accepts no mutations until the kernel bootstraps it.
    pub fn new(world: &mut World) -> Self {
        Self {
            address: world.register_contract(false),
            store: PermissionStore::new(),
            events: EventLog::default(),
            initialized: false,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// One-shot bootstrap, driven by `Kernel::initialize`: grants
    /// `permissions_root` the create-permissions role on the ACL itself,
    /// managed by the root.
    pub(crate) fn initialize(&mut self, permissions_root: Address) -> Result<(), KernelError> {
        if self.initialized {
            return Err(KernelError::AlreadyInitialized);
        }
        self.initialized = true;
        let role = create_permissions_role();
        self.store
            .set_grant(permissions_root, self.address, role, GrantState::Unconditional);
        self.store.set_manager(self.address, role, permissions_root);
        self.events.record(AuditEvent::PermissionCreated {
            entity: permissions_root,
            app: self.address,
            role,
            manager: permissions_root,
        });
        log::info!("acl {} bootstrapped with root {permissions_root}", self.address);
        Ok(())
    }

    /// Pure evaluation; never fails and requires no permission itself.
    pub fn has_permission(
        &self,
        entity: Address,
        app: Address,
        role: Role,
        args: &[ParamValue],
    ) -> bool {
        self.store.evaluate(entity, app, role, args)
    }

    pub fn permission_manager(&self, app: Address, role: Role) -> Option<Address> {
        self.store.manager(app, role)
    }

    /// Creates a permission from scratch: an unconditional grant for `entity`
    /// plus a manager slot for the `(app, role)` pair. Permissions are
    /// created once; subsequent changes go through grant/revoke.
    pub fn create_permission(
        &mut self,
        caller: Address,
        entity: Address,
        app: Address,
        role: Role,
        manager: Address,
    ) -> Result<(), KernelError> {
        self.require_initialized()?;
        if !self.has_permission(caller, self.address, create_permissions_role(), &[]) {
            return Err(KernelError::Unauthorized {
                entity: caller,
                app: self.address,
                role: create_permissions_role(),
            });
        }
        if self.store.manager(app, role).is_some() {
            return Err(KernelError::PermissionExists { app, role });
        }
        self.store
            .set_grant(entity, app, role, GrantState::Unconditional);
        self.store.set_manager(app, role, manager);
        self.events.record(AuditEvent::PermissionCreated {
            entity,
            app,
            role,
            manager,
        });
        Ok(())
    }

    /// Manager-only unconditional grant. A full replace: any previous grant
    /// state for the entity is overwritten.
    pub fn grant_permission(
        &mut self,
        caller: Address,
        entity: Address,
        app: Address,
        role: Role,
    ) -> Result<(), KernelError> {
        self.grant_with_state(caller, entity, app, role, GrantState::Unconditional)
    }

    /// Manager-only conditional grant: the entity holds the role only for
    /// calls whose arguments satisfy every rule.
    pub fn grant_permission_with_rules(
        &mut self,
        caller: Address,
        entity: Address,
        app: Address,
        role: Role,
        rules: Vec<ParamRule>,
    ) -> Result<(), KernelError> {
        self.grant_with_state(caller, entity, app, role, GrantState::Conditional(rules))
    }

    fn grant_with_state(
        &mut self,
        caller: Address,
        entity: Address,
        app: Address,
        role: Role,
        state: GrantState,
    ) -> Result<(), KernelError> {
        self.require_initialized()?;
        self.require_manager(caller, app, role)?;
        self.store.set_grant(entity, app, role, state);
        self.events
            .record(AuditEvent::PermissionGranted { entity, app, role });
        Ok(())
    }

    pub fn revoke_permission(
        &mut self,
        caller: Address,
        entity: Address,
        app: Address,
        role: Role,
    ) -> Result<(), KernelError> {
        self.require_initialized()?;
        self.require_manager(caller, app, role)?;
        self.store.clear_grant(entity, app, role);
        self.events
            .record(AuditEvent::PermissionRevoked { entity, app, role });
        Ok(())
    }

    /// Transfers administration of the `(app, role)` pair. Administration is
    /// separate from use: the manager need not hold the role itself.
    pub fn set_permission_manager(
        &mut self,
        caller: Address,
        new_manager: Address,
        app: Address,
        role: Role,
    ) -> Result<(), KernelError> {
        self.require_initialized()?;
        self.require_manager(caller, app, role)?;
        self.store.set_manager(app, role, new_manager);
        self.events.record(AuditEvent::ManagerChanged {
            app,
            role,
            old: caller,
            new: new_manager,
        });
        Ok(())
    }

    pub fn events(&self) -> &[AuditEvent] {
        self.events.entries()
    }

    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        self.events.drain()
    }

    fn require_initialized(&self) -> Result<(), KernelError> {
        if self.initialized {
            Ok(())
        } else {
            Err(KernelError::NotInitialized)
        }
    }

    fn require_manager(&self, caller: Address, app: Address, role: Role) -> Result<(), KernelError> {
        if self.store.manager(app, role) == Some(caller) {
            Ok(())
        } else {
            Err(KernelError::Unauthorized {
                entity: caller,
                app,
                role,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use org_types::CompareOp;

    fn addr(tag: u8) -> Address {
        Address::from_bytes([tag; 20])
    }

    fn role() -> Role {
        Role::from_label("DO_THING_ROLE")
    }

    fn bootstrapped() -> (Acl, Address) {
        let mut world = World::new();
        let root = world.create_account();
        let mut acl = Acl::new(&mut world);
        acl.initialize(root).unwrap();
        (acl, root)
    }

    #[test]
    fn bootstrap_grants_create_permissions_to_root() {
        let (acl, root) = bootstrapped();
        assert!(acl.has_permission(root, acl.address(), create_permissions_role(), &[]));
        assert_eq!(
            acl.permission_manager(acl.address(), create_permissions_role()),
            Some(root)
        );
        assert!(matches!(
            acl.events(),
            [AuditEvent::PermissionCreated { .. }]
        ));
    }

    #[test]
    fn mutations_fail_before_bootstrap() {
        let mut world = World::new();
        let root = world.create_account();
        let mut acl = Acl::new(&mut world);
        let err = acl
            .create_permission(root, root, addr(5), role(), root)
            .unwrap_err();
        assert!(matches!(err, KernelError::NotInitialized));
    }

    #[test]
    fn create_requires_create_permissions_role() {
        let (mut acl, _root) = bootstrapped();
        let outsider = addr(9);
        let err = acl
            .create_permission(outsider, outsider, addr(5), role(), outsider)
            .unwrap_err();
        assert!(matches!(err, KernelError::Unauthorized { .. }));
        assert!(!acl.has_permission(outsider, addr(5), role(), &[]));
    }

    #[test]
    fn create_is_once_per_role_app_pair() {
        let (mut acl, root) = bootstrapped();
        acl.create_permission(root, addr(1), addr(5), role(), root)
            .unwrap();
        let err = acl
            .create_permission(root, addr(2), addr(5), role(), root)
            .unwrap_err();
        assert!(matches!(err, KernelError::PermissionExists { .. }));
    }

    #[test]
    fn unauthorized_caller_cannot_probe_existing_pairs() {
        let (mut acl, root) = bootstrapped();
        acl.create_permission(root, addr(1), addr(5), role(), root)
            .unwrap();
        // The authorization check runs first: an outsider is refused before
        // learning whether the pair already exists.
        let outsider = addr(9);
        let err = acl
            .create_permission(outsider, outsider, addr(5), role(), outsider)
            .unwrap_err();
        assert!(matches!(err, KernelError::Unauthorized { .. }));
    }

    #[test]
    fn manager_grants_and_revokes() {
        let (mut acl, root) = bootstrapped();
        let manager = addr(3);
        acl.create_permission(root, addr(1), addr(5), role(), manager)
            .unwrap();

        acl.grant_permission(manager, addr(2), addr(5), role())
            .unwrap();
        assert!(acl.has_permission(addr(2), addr(5), role(), &[]));

        // Only the manager may administer the pair, even the bootstrap root
        // is refused.
        let err = acl
            .grant_permission(root, addr(4), addr(5), role())
            .unwrap_err();
        assert!(matches!(err, KernelError::Unauthorized { .. }));

        acl.revoke_permission(manager, addr(2), addr(5), role())
            .unwrap();
        assert!(!acl.has_permission(addr(2), addr(5), role(), &[]));

        let events = acl.drain_events();
        assert!(events.contains(&AuditEvent::PermissionRevoked {
            entity: addr(2),
            app: addr(5),
            role: role(),
        }));
    }

    #[test]
    fn conditional_grant_gates_on_args() {
        let (mut acl, root) = bootstrapped();
        let manager = addr(3);
        acl.create_permission(root, addr(1), addr(5), role(), manager)
            .unwrap();
        acl.grant_permission_with_rules(
            manager,
            addr(2),
            addr(5),
            role(),
            vec![ParamRule::new(0, CompareOp::Lt, 10u128)],
        )
        .unwrap();
        assert!(acl.has_permission(addr(2), addr(5), role(), &[ParamValue::Uint(9)]));
        assert!(!acl.has_permission(addr(2), addr(5), role(), &[ParamValue::Uint(10)]));
    }

    #[test]
    fn regrant_replaces_previous_state() {
        let (mut acl, root) = bootstrapped();
        let manager = addr(3);
        acl.create_permission(root, addr(1), addr(5), role(), manager)
            .unwrap();
        acl.grant_permission_with_rules(
            manager,
            addr(2),
            addr(5),
            role(),
            vec![ParamRule::new(0, CompareOp::Lt, 10u128)],
        )
        .unwrap();
        acl.grant_permission(manager, addr(2), addr(5), role())
            .unwrap();
        assert!(acl.has_permission(addr(2), addr(5), role(), &[ParamValue::Uint(10)]));
    }

    #[test]
    fn manager_transfer_moves_authority() {
        let (mut acl, root) = bootstrapped();
        acl.create_permission(root, addr(1), addr(5), role(), root)
            .unwrap();
        acl.set_permission_manager(root, addr(6), addr(5), role())
            .unwrap();
        assert_eq!(acl.permission_manager(addr(5), role()), Some(addr(6)));

        let err = acl
            .grant_permission(root, addr(2), addr(5), role())
            .unwrap_err();
        assert!(matches!(err, KernelError::Unauthorized { .. }));
        acl.grant_permission(addr(6), addr(2), addr(5), role())
            .unwrap();
    }
}
