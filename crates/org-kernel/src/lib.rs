//! Permission-governed application kernel: a namespaced app registry gated
//! through a pluggable access-control engine, plus upgradeable call-forwarding
//! proxies with stray-asset recovery.

pub mod acl;
pub mod error;
pub mod event;
pub mod kernel;
pub mod permissions;
pub mod proxy;

pub use acl::{Acl, create_permissions_role};
pub use error::KernelError;
pub use event::{AuditEvent, EventLog};
pub use kernel::{
    Kernel, acl_app_id, app_addr_namespace, app_bases_namespace, app_manager_role, core_namespace,
    kernel_app_id,
};
pub use permissions::{GrantState, PermissionStore};
pub use proxy::{AppProxy, ProxyTarget};
