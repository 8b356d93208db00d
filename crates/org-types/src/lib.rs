//! Opaque identifiers and typed permission parameters shared across the org stack.

mod address;
mod ids;
mod params;

pub use address::{Address, AddressError};
pub use ids::{AppId, AppNamespace, IdError, Role};
pub use params::{CompareOp, ParamRule, ParamValue};
