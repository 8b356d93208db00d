use org_types::Address;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {0} does not accept direct value transfer")]
    ValueRefused(Address),
    #[error("insufficient balance at {address}: have {have}, need {need}")]
    InsufficientBalance {
        address: Address,
        have: u128,
        need: u128,
    },
    #[error("no token contract at {0}")]
    UnknownToken(Address),
    #[error("token {token} refused transfer of {amount} from {from}")]
    TokenTransferFailed {
        token: Address,
        from: Address,
        amount: u128,
    },
    #[error("no contract account at {0}")]
    NotAContract(Address),
}
