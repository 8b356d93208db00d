//! Host environment for the org kernel: accounts, balances, untrusted token
//! contracts, and the delegated-execution seam app proxies forward through.

mod dispatch;
mod error;
mod token;
mod world;

pub use dispatch::{AppStorage, CallContext, CallPayload, DispatchError, Dispatchable};
pub use error::LedgerError;
pub use token::{FungibleToken, StandardToken};
pub use world::{AssetRef, World};
