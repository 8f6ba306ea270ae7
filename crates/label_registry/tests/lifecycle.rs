//! Register → lookup → transfer → expire → re-register, end to end.

use ebakus_label_registry::{
    dispatch, publish_interface, CallContext, CallOutput, DirectoryService, ErrorKind,
    HolderNaming, InMemoryDirectory, LabelEvent, LabelRegistry, RegistryCall, RegistryConfig,
};
use ebakus_types::{Address, Label};

const FEE: u128 = 100_000_000_000_000_000;
const PERIOD: u64 = 365 * 24 * 60 * 60;

fn holder(byte: u8) -> Address {
    Address::new([byte; 20])
}

#[test]
fn label_lifecycle_scenario() {
    let registry = LabelRegistry::new(RegistryConfig::default()).unwrap();
    assert_eq!(registry.registration_amount(), FEE);
    assert_eq!(registry.registration_period(), PERIOD);

    let label = Label::from_name("ebakus");
    let (a, b, c) = (holder(0xA), holder(0xB), holder(0xC));

    let receipt = registry
        .register(label, a, &CallContext::new(a, 0).with_value(FEE))
        .unwrap();
    assert_eq!(receipt.fee_charged, FEE);
    assert_eq!(registry.expires_at(&label).unwrap(), PERIOD);

    assert_eq!(registry.lookup(&label, 0).unwrap(), a);

    registry
        .transfer(label, b, &CallContext::new(a, 1))
        .unwrap();
    assert_eq!(registry.lookup(&label, 1).unwrap(), b);

    let err = registry
        .renew(label, &CallContext::new(b, PERIOD / 2))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RenewalNotAllowed);

    let err = registry.lookup(&label, PERIOD + 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(registry.expires_at(&label).unwrap(), PERIOD);

    registry
        .register(label, c, &CallContext::new(c, PERIOD + 1).with_value(FEE))
        .unwrap();
    assert_eq!(registry.lookup(&label, PERIOD + 1).unwrap(), c);
    assert_eq!(registry.expires_at(&label).unwrap(), PERIOD + 1 + PERIOD);

    assert_eq!(registry.collected_fees(), 2 * FEE);
    assert_eq!(registry.refunded_total(), 0);
    assert_eq!(registry.record_count(), 1);

    let events = registry.events();
    assert_eq!(
        events,
        vec![
            LabelEvent::Registered { label, holder: a },
            LabelEvent::Transferred {
                label,
                new_holder: b
            },
            LabelEvent::Registered { label, holder: c },
        ]
    );
}

#[test]
fn owner_shaped_client_sees_owner_fields() {
    let registry = LabelRegistry::new(RegistryConfig::default()).unwrap();
    let label = Label::from_hex("0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        .unwrap();
    let buyer = holder(0x01);
    let owner1: Address = "0x8F10D3A6283672EcfAeea0377d460BdEd489EC44".parse().unwrap();
    let owner2: Address = "0x6FDFD8Bf1A5310243519dC2e7B90916f6b4534ab".parse().unwrap();

    let paid = CallContext::new(buyer, 10).with_value(FEE * 2);
    let call = RegistryCall::Register {
        label,
        holder: owner1,
    };
    let out = dispatch(&registry, HolderNaming::Owner, call, &paid)
        .unwrap()
        .render(HolderNaming::Owner);
    assert_eq!(out["logs"][0]["args"]["owner"], owner1.to_string());
    assert_eq!(out["refund"], FEE.to_string());

    // The buyer does not hold the label, so only owner1 can move it.
    let err = dispatch(
        &registry,
        HolderNaming::Owner,
        RegistryCall::Transfer {
            label,
            new_holder: owner2,
        },
        &CallContext::new(buyer, 11),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let out = dispatch(
        &registry,
        HolderNaming::Owner,
        RegistryCall::Transfer {
            label,
            new_holder: owner2,
        },
        &CallContext::new(owner1, 11),
    )
    .unwrap()
    .render(HolderNaming::Owner);
    assert_eq!(out["logs"][0]["args"]["newOwner"], owner2.to_string());

    let out = dispatch(
        &registry,
        HolderNaming::Owner,
        RegistryCall::Owner { label },
        &CallContext::new(buyer, 12),
    )
    .unwrap();
    assert_eq!(out, CallOutput::Holder(owner2));
}

#[tokio::test]
async fn deployment_publishes_interface() {
    let directory = InMemoryDirectory::new();
    let contract = holder(0x42);

    publish_interface(&directory, contract, HolderNaming::Target)
        .await
        .unwrap();

    let stored = directory.abi_for_address(contract).await.unwrap().unwrap();
    assert!(stored.contains("getAddress"));
    assert!(!stored.contains("\"owner\""));
}
