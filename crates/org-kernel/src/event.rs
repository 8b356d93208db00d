use org_ledger::AssetRef;
use org_types::{Address, AppId, AppNamespace, Role};
use serde::{Deserialize, Serialize};

/// Observable record of a committed mutation, for off-core audit trails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    AppSet {
        namespace: AppNamespace,
        app_id: AppId,
        old: Address,
        new: Address,
    },
    DefaultVaultSet {
        namespace: AppNamespace,
        app_id: AppId,
    },
    PermissionCreated {
        entity: Address,
        app: Address,
        role: Role,
        manager: Address,
    },
    PermissionGranted {
        entity: Address,
        app: Address,
        role: Role,
    },
    PermissionRevoked {
        entity: Address,
        app: Address,
        role: Role,
    },
    ManagerChanged {
        app: Address,
        role: Role,
        old: Address,
        new: Address,
    },
    AssetRecovered {
        proxy: Address,
        asset: AssetRef,
        amount: u128,
        vault: Address,
    },
}

/// Append-only event sink owned by each mutating component.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<AuditEvent>,
}

impl EventLog {
    pub fn record(&mut self, event: AuditEvent) {
        log::debug!("audit: {event:?}");
        self.entries.push(event);
    }

    pub fn entries(&self) -> &[AuditEvent] {
        &self.entries
    }

    pub fn drain(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.entries)
    }
}
