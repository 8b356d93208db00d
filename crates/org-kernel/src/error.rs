use org_ledger::{AssetRef, DispatchError, LedgerError};
use org_types::{Address, AppId, AppNamespace, Role};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("kernel is not initialized")]
    NotInitialized,
    #[error("kernel is already initialized")]
    AlreadyInitialized,
    #[error("entity {entity} lacks role {role} on {app}")]
    Unauthorized {
        entity: Address,
        app: Address,
        role: Role,
    },
    #[error("permission for role {role} on {app} already exists")]
    PermissionExists { app: Address, role: Role },
    #[error("no executable code at {0}")]
    InvalidCode(Address),
    #[error("app {app_id} in namespace {namespace} resolves to no executable code")]
    NoCode {
        namespace: AppNamespace,
        app_id: AppId,
    },
    #[error("no usable recovery vault for namespace {0}")]
    NoVault(AppNamespace),
    #[error("recovery of {asset:?} left a residual balance of {remaining}")]
    RecoveryIncomplete { asset: AssetRef, remaining: u128 },
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("app call failed: {0}")]
    Dispatch(#[from] DispatchError),
}
