use std::collections::BTreeMap;

use org_types::Address;
use thiserror::Error;

/// Application-defined storage owned by a proxy instance. Targets run against
/// this map via delegated execution; key layout compatibility between a proxy
/// and every code version it resolves is an explicit contract of this seam.
pub type AppStorage = BTreeMap<String, Vec<u8>>;

/// Execution context handed to target code: the code runs "as" the proxy,
/// with the proxy's address and storage, on behalf of the original caller.
pub struct CallContext<'a> {
    pub caller: Address,
    pub self_address: Address,
    pub storage: &'a mut AppStorage,
}

/// A call payload forwarded into target code. Selectors are application
/// conventions; the host does not interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPayload {
    pub selector: String,
    pub data: Vec<u8>,
}

impl CallPayload {
    pub fn new(selector: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            selector: selector.into(),
            data,
        }
    }

    pub fn selector_only(selector: impl Into<String>) -> Self {
        Self::new(selector, Vec::new())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unsupported selector '{0}'")]
    UnsupportedSelector(String),
    #[error("app failure: {0}")]
    App(String),
}

/// Resolvable executable code: resolve-target happens outside (registry or a
/// pinned address); this trait is the forward-call-with-context half.
pub trait Dispatchable {
    fn dispatch(&self, ctx: &mut CallContext<'_>, payload: &CallPayload)
    -> Result<Vec<u8>, DispatchError>;
}
