use std::collections::HashMap;
use std::sync::Arc;

use org_types::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::dispatch::Dispatchable;
use crate::error::LedgerError;
use crate::token::FungibleToken;

/// A recoverable asset: native value or a fungible token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetRef {
    Native,
    Token(Address),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountKind {
    External,
    Contract { depositable: bool },
}

struct Account {
    kind: AccountKind,
    native: u128,
}

/// The host environment: account table, native balances, installed code, and
/// token contracts. One `World` per organization under test; every operation
/// runs to completion before the next is observed.
#[derive(Default)]
pub struct World {
    accounts: HashMap<Address, Account>,
    code: HashMap<Address, Arc<dyn Dispatchable>>,
    tokens: HashMap<Address, Box<dyn FungibleToken>>,
    next_serial: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, kind: AccountKind) -> Address {
        // Deterministic address derivation from an allocation counter.
        self.next_serial += 1;
        let digest = Sha256::digest(format!("account:{}", self.next_serial).as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        let address = Address::from_bytes(bytes);
        self.accounts.insert(address, Account { kind, native: 0 });
        address
    }

    /// Creates a fresh externally-owned account.
    pub fn create_account(&mut self) -> Address {
        self.allocate(AccountKind::External)
    }

    /// Registers a contract account with no code installed yet.
    pub fn register_contract(&mut self, depositable: bool) -> Address {
        self.allocate(AccountKind::Contract { depositable })
    }

    /// Registers a contract account and installs executable code at it.
    pub fn deploy(&mut self, code: Arc<dyn Dispatchable>) -> Address {
        let address = self.register_contract(false);
        self.code.insert(address, code);
        address
    }

    /// Registers a token contract and returns its address.
    pub fn register_token(&mut self, token: Box<dyn FungibleToken>) -> Address {
        let address = self.register_contract(false);
        self.tokens.insert(address, token);
        address
    }

    pub fn is_contract(&self, address: Address) -> bool {
        matches!(
            self.accounts.get(&address).map(|a| a.kind),
            Some(AccountKind::Contract { .. })
        )
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.code.contains_key(&address)
    }

    pub fn code(&self, address: Address) -> Option<Arc<dyn Dispatchable>> {
        self.code.get(&address).cloned()
    }

    pub fn native_balance(&self, address: Address) -> u128 {
        self.accounts.get(&address).map(|a| a.native).unwrap_or(0)
    }

    fn accepts_value(&self, address: Address) -> bool {
        match self.accounts.get(&address).map(|a| a.kind) {
            Some(AccountKind::External) | None => true,
            Some(AccountKind::Contract { depositable }) => depositable,
        }
    }

    fn credit(&mut self, address: Address, amount: u128) -> Result<(), LedgerError> {
        if !self.accepts_value(address) {
            log::warn!("value transfer of {amount} to {address} refused");
            return Err(LedgerError::ValueRefused(address));
        }
        self.accounts
            .entry(address)
            .or_insert(Account {
                kind: AccountKind::External,
                native: 0,
            })
            .native += amount;
        Ok(())
    }

    /// Credits native value out of thin air; bootstrap/test faucet. Subject
    /// to the same acceptance rules as a transfer.
    pub fn mint_native(&mut self, address: Address, amount: u128) -> Result<(), LedgerError> {
        self.credit(address, amount)
    }

    /// Moves native value between accounts. Fails without any state change
    /// when the sender balance is short or the destination refuses value.
    pub fn transfer_native(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let have = self.native_balance(from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                address: from,
                have,
                need: amount,
            });
        }
        if !self.accepts_value(to) {
            log::warn!("value transfer of {amount} from {from} to {to} refused");
            return Err(LedgerError::ValueRefused(to));
        }
        if let Some(account) = self.accounts.get_mut(&from) {
            account.native -= amount;
        }
        self.credit(to, amount)
    }

    pub fn token_balance(&self, token: Address, owner: Address) -> Result<u128, LedgerError> {
        let token_contract = self
            .tokens
            .get(&token)
            .ok_or(LedgerError::UnknownToken(token))?;
        Ok(token_contract.balance_of(owner))
    }

    pub fn token_transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let token_contract = self
            .tokens
            .get_mut(&token)
            .ok_or(LedgerError::UnknownToken(token))?;
        if !token_contract.transfer(from, to, amount) {
            return Err(LedgerError::TokenTransferFailed {
                token,
                from,
                amount,
            });
        }
        Ok(())
    }

    pub fn asset_balance(&self, asset: AssetRef, owner: Address) -> Result<u128, LedgerError> {
        match asset {
            AssetRef::Native => Ok(self.native_balance(owner)),
            AssetRef::Token(token) => self.token_balance(token, owner),
        }
    }

    pub fn asset_transfer(
        &mut self,
        asset: AssetRef,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        match asset {
            AssetRef::Native => self.transfer_native(from, to, amount),
            AssetRef::Token(token) => self.token_transfer(token, from, to, amount),
        }
    }
}
