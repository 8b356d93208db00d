//! Stray-asset recovery scenarios: value and tokens landing in an app proxy
//! are swept to the organization's designated vault, and nowhere else.

use std::sync::Arc;

use anyhow::Result;
use org_kernel::{Acl, AppProxy, Kernel, KernelError, app_bases_namespace, app_manager_role};
use org_ledger::{
    AssetRef, CallContext, CallPayload, DispatchError, Dispatchable, FungibleToken, StandardToken,
    World,
};
use org_types::{Address, AppId};

struct AppStub;

impl Dispatchable for AppStub {
    fn dispatch(
        &self,
        ctx: &mut CallContext<'_>,
        payload: &CallPayload,
    ) -> Result<Vec<u8>, DispatchError> {
        match payload.selector.as_str() {
            "initialize" => {
                ctx.storage.insert("initialized".into(), vec![1]);
                Ok(Vec::new())
            }
            other => Err(DispatchError::UnsupportedSelector(other.into())),
        }
    }
}

/// Token that reports success while moving only half the requested amount.
struct ShortChangeToken {
    inner: StandardToken,
}

impl FungibleToken for ShortChangeToken {
    fn balance_of(&self, owner: Address) -> u128 {
        self.inner.balance_of(owner)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> bool {
        self.inner.transfer(from, to, amount / 2)
    }
}

struct Org {
    world: World,
    kernel: Kernel,
    root: Address,
    proxy: AppProxy,
    vault: Address,
    vault_id: AppId,
}

fn new_org() -> Result<Org> {
    let mut org = new_org_without_vault()?;
    org.kernel.set_app(
        org.root,
        app_bases_namespace(),
        org.vault_id,
        org.vault,
    )?;
    org.kernel
        .set_default_vault_id(org.root, app_bases_namespace(), org.vault_id)?;
    Ok(org)
}

fn new_org_without_vault() -> Result<Org> {
    let mut world = World::new();
    let root = world.create_account();
    let mut kernel = Kernel::new(&mut world);
    let acl = Acl::new(&mut world);
    kernel.initialize(acl, root)?;

    let kernel_address = kernel.address();
    kernel
        .acl_mut()?
        .create_permission(root, root, kernel_address, app_manager_role(), root)?;

    let app_id = AppId::from_label("stub");
    let code = world.deploy(Arc::new(AppStub));
    kernel.set_app(root, app_bases_namespace(), app_id, code)?;
    let proxy = AppProxy::new_upgradeable(
        &mut world,
        &kernel,
        app_id,
        Some(CallPayload::selector_only("initialize")),
    )?;

    let vault = world.register_contract(true);
    let vault_id = AppId::from_label("vault");

    Ok(Org {
        world,
        kernel,
        root,
        proxy,
        vault,
        vault_id,
    })
}

fn deposit_native(org: &mut Org, amount: u128) -> Result<()> {
    let sender = org.world.create_account();
    org.world.mint_native(sender, amount)?;
    org.world
        .transfer_native(sender, org.proxy.address(), amount)?;
    Ok(())
}

#[test]
fn recovers_native_value() -> Result<()> {
    let mut org = new_org()?;
    deposit_native(&mut org, 1)?;
    assert_eq!(org.world.native_balance(org.proxy.address()), 1);

    org.proxy
        .transfer_to_vault(&mut org.world, &org.kernel, AssetRef::Native)?;
    assert_eq!(org.world.native_balance(org.proxy.address()), 0);
    assert_eq!(org.world.native_balance(org.vault), 1);
    Ok(())
}

#[test]
fn repeated_sweep_is_a_no_op() -> Result<()> {
    let mut org = new_org()?;
    deposit_native(&mut org, 3)?;
    org.proxy
        .transfer_to_vault(&mut org.world, &org.kernel, AssetRef::Native)?;
    org.proxy
        .transfer_to_vault(&mut org.world, &org.kernel, AssetRef::Native)?;
    assert_eq!(org.world.native_balance(org.proxy.address()), 0);
    assert_eq!(org.world.native_balance(org.vault), 3);
    // Only the first sweep moved anything, so only one event is recorded.
    assert_eq!(org.proxy.events().len(), 1);
    Ok(())
}

#[test]
fn recovers_tokens() -> Result<()> {
    let mut org = new_org()?;
    let holder = org.world.create_account();
    let token = org
        .world
        .register_token(Box::new(StandardToken::new(holder, 1000)));
    let asset = AssetRef::Token(token);

    org.world
        .token_transfer(token, holder, org.proxy.address(), 1)?;
    assert_eq!(org.world.asset_balance(asset, org.proxy.address())?, 1);

    org.proxy
        .transfer_to_vault(&mut org.world, &org.kernel, asset)?;
    assert_eq!(org.world.asset_balance(asset, org.proxy.address())?, 0);
    assert_eq!(org.world.asset_balance(asset, org.vault)?, 1);
    Ok(())
}

#[test]
fn fails_when_vault_is_not_a_contract() -> Result<()> {
    let mut org = new_org()?;
    deposit_native(&mut org, 1)?;

    // Re-point the vault entry at an externally-owned account.
    let outsider = org.world.create_account();
    org.kernel
        .set_app(org.root, app_bases_namespace(), org.vault_id, outsider)?;

    let err = org
        .proxy
        .transfer_to_vault(&mut org.world, &org.kernel, AssetRef::Native)
        .unwrap_err();
    assert!(matches!(err, KernelError::NoVault(_)));
    assert_eq!(org.world.native_balance(org.proxy.address()), 1);
    Ok(())
}

#[test]
fn fails_when_vault_entry_is_unregistered() -> Result<()> {
    let mut org = new_org()?;
    deposit_native(&mut org, 1)?;
    org.kernel
        .set_app(org.root, app_bases_namespace(), org.vault_id, Address::ZERO)?;

    let err = org
        .proxy
        .transfer_to_vault(&mut org.world, &org.kernel, AssetRef::Native)
        .unwrap_err();
    assert!(matches!(err, KernelError::NoVault(_)));
    assert_eq!(org.world.native_balance(org.proxy.address()), 1);
    Ok(())
}

#[test]
fn fails_when_no_vault_id_is_registered() -> Result<()> {
    // The organization never designated a recovery target for the
    // namespace at all.
    let mut org = new_org_without_vault()?;
    deposit_native(&mut org, 1)?;
    assert_eq!(org.kernel.default_vault_id(app_bases_namespace()), None);

    let err = org
        .proxy
        .transfer_to_vault(&mut org.world, &org.kernel, AssetRef::Native)
        .unwrap_err();
    assert!(matches!(err, KernelError::NoVault(_)));
    assert_eq!(org.world.native_balance(org.proxy.address()), 1);
    Ok(())
}

#[test]
fn vault_reregistration_takes_effect_immediately() -> Result<()> {
    let mut org = new_org()?;
    deposit_native(&mut org, 2)?;

    // The vault is resolved fresh at recovery time, not cached at proxy
    // construction.
    let replacement = org.world.register_contract(true);
    org.kernel
        .set_app(org.root, app_bases_namespace(), org.vault_id, replacement)?;

    org.proxy
        .transfer_to_vault(&mut org.world, &org.kernel, AssetRef::Native)?;
    assert_eq!(org.world.native_balance(org.vault), 0);
    assert_eq!(org.world.native_balance(replacement), 2);
    Ok(())
}

#[test]
fn detects_partial_token_transfers() -> Result<()> {
    let mut org = new_org()?;
    let holder = org.world.create_account();
    let token = org.world.register_token(Box::new(ShortChangeToken {
        inner: StandardToken::new(holder, 100),
    }));
    let asset = AssetRef::Token(token);
    org.world
        .token_transfer(token, holder, org.proxy.address(), 8)?;
    // The misbehaving token moved 4 of the 8 already; the sweep below asks
    // for the remaining 4 and again only half arrives.
    let before = org.world.asset_balance(asset, org.proxy.address())?;
    assert_eq!(before, 4);

    let err = org
        .proxy
        .transfer_to_vault(&mut org.world, &org.kernel, asset)
        .unwrap_err();
    assert!(matches!(
        err,
        KernelError::RecoveryIncomplete {
            asset: AssetRef::Token(_),
            remaining: 2,
        }
    ));
    // No recovery event was recorded for the failed sweep.
    assert!(org.proxy.events().is_empty());
    Ok(())
}

#[test]
fn recovery_event_names_asset_amount_and_vault() -> Result<()> {
    let mut org = new_org()?;
    deposit_native(&mut org, 5)?;
    org.proxy
        .transfer_to_vault(&mut org.world, &org.kernel, AssetRef::Native)?;

    let events = org.proxy.drain_events();
    let json = serde_json::to_value(&events)?;
    let recovered = &json[0]["AssetRecovered"];
    assert_eq!(recovered["asset"], serde_json::json!("Native"));
    assert_eq!(recovered["amount"], 5);
    assert_eq!(recovered["vault"], org.vault.to_string());
    assert_eq!(recovered["proxy"], org.proxy.address().to_string());
    Ok(())
}
