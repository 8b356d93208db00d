use std::collections::HashMap;

use org_types::Address;

/// External fungible-asset interface invoked by the recovery path.
///
/// Implementations are untrusted: they may misreport balances, return `true`
/// without moving the full amount, or otherwise misbehave. Callers must
/// verify postconditions by re-reading balances rather than trusting the
/// return value.
pub trait FungibleToken {
    fn balance_of(&self, owner: Address) -> u128;
    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> bool;
}

/// Well-behaved in-memory token.
#[derive(Default)]
pub struct StandardToken {
    balances: HashMap<Address, u128>,
}

impl StandardToken {
    pub fn new(initial_holder: Address, supply: u128) -> Self {
        let mut balances = HashMap::new();
        balances.insert(initial_holder, supply);
        Self { balances }
    }
}

impl FungibleToken for StandardToken {
    fn balance_of(&self, owner: Address) -> u128 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> bool {
        let have = self.balance_of(from);
        if have < amount {
            return false;
        }
        self.balances.insert(from, have - amount);
        *self.balances.entry(to).or_insert(0) += amount;
        true
    }
}
