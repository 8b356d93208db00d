use std::collections::BTreeMap;

use org_types::{Address, ParamRule, ParamValue, Role};
use serde::{Deserialize, Serialize};

/// State of one (entity, app, role) grant. Absence of an entry means the
/// entity has no grant at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantState {
    Unconditional,
    Conditional(Vec<ParamRule>),
}

/// Pure grant/manager data plus predicate evaluation. No external calls and
/// no authorization of its own; gating lives in the ACL engine.
#[derive(Debug, Default, Clone)]
pub struct PermissionStore {
    grants: BTreeMap<(Address, Address, Role), GrantState>,
    managers: BTreeMap<(Address, Role), Address>,
}

impl PermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_state(&self, entity: Address, app: Address, role: Role) -> Option<&GrantState> {
        self.grants.get(&(entity, app, role))
    }

    pub fn set_grant(&mut self, entity: Address, app: Address, role: Role, state: GrantState) {
        self.grants.insert((entity, app, role), state);
    }

    pub fn clear_grant(&mut self, entity: Address, app: Address, role: Role) -> bool {
        self.grants.remove(&(entity, app, role)).is_some()
    }

    pub fn manager(&self, app: Address, role: Role) -> Option<Address> {
        self.managers.get(&(app, role)).copied()
    }

    pub fn set_manager(&mut self, app: Address, role: Role, manager: Address) {
        self.managers.insert((app, role), manager);
    }

    /// True iff `entity` (or the wildcard entity) holds the role on `app`
    /// and any attached rules all match `args`. Read-only and infallible;
    /// safe to call speculatively before committing a mutation.
    pub fn evaluate(&self, entity: Address, app: Address, role: Role, args: &[ParamValue]) -> bool {
        self.evaluate_exact(entity, app, role, args)
            || (entity != Address::ANY && self.evaluate_exact(Address::ANY, app, role, args))
    }

    fn evaluate_exact(
        &self,
        entity: Address,
        app: Address,
        role: Role,
        args: &[ParamValue],
    ) -> bool {
        match self.grants.get(&(entity, app, role)) {
            None => false,
            Some(GrantState::Unconditional) => true,
            Some(GrantState::Conditional(rules)) => rules.iter().all(|rule| rule.matches(args)),
        }
    }
}
