//! Development smoke run: the call sequence a freshly deployed registry is
//! expected to survive.

use anyhow::Result;
use ebakus_label_registry::{
    dispatch, CallContext, CallOutput, ErrorKind, HolderNaming, LabelRegistry, RegistryCall,
};
use ebakus_types::{Address, Label, Timestamp};
use tracing::{error, info};

pub const TEST_LABEL: &str = "0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f";
pub const TEST_OWNER_1: &str = "0x8F10D3A6283672EcfAeea0377d460BdEd489EC44";
pub const TEST_OWNER_2: &str = "0x6FDFD8Bf1A5310243519dC2e7B90916f6b4534ab";

#[derive(Debug, Default)]
pub struct SmokeReport {
    pub passed: Vec<&'static str>,
    pub failures: Vec<String>,
}

impl SmokeReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn pass(&mut self, step: &'static str) {
        info!(step, "ok");
        self.passed.push(step);
    }

    fn fail(&mut self, step: &'static str, reason: impl Into<String>) {
        let reason = reason.into();
        error!(step, %reason, "failed");
        self.failures.push(format!("{step}: {reason}"));
    }
}

pub fn run(
    registry: &LabelRegistry,
    naming: HolderNaming,
    buyer: Address,
    now: Timestamp,
) -> Result<SmokeReport> {
    let label = Label::from_hex(TEST_LABEL)?;
    let owner1: Address = TEST_OWNER_1.parse()?;
    let owner2: Address = TEST_OWNER_2.parse()?;
    let mut report = SmokeReport::default();

    let amount = match dispatch(
        registry,
        naming,
        RegistryCall::GetRegistrationAmount,
        &CallContext::new(buyer, now),
    )? {
        CallOutput::RegistrationAmount(amount) => amount,
        other => anyhow::bail!("unexpected output for getRegistrationAmount: {other:?}"),
    };
    info!(amount = %amount, "registration amount");

    let register = RegistryCall::Register {
        label,
        holder: owner1,
    };
    match dispatch(
        registry,
        naming,
        register,
        &CallContext::new(buyer, now).with_value(amount),
    ) {
        Ok(output) => {
            info!(receipt = %output.render(naming), "label inserted");
            report.pass("register");
        }
        Err(err) => report.fail("register", err.to_string()),
    }

    let lookup = match naming {
        HolderNaming::Owner => RegistryCall::Owner { label },
        HolderNaming::Target => RegistryCall::GetAddress { label },
    };
    match dispatch(registry, naming, lookup, &CallContext::new(buyer, now)) {
        Ok(CallOutput::Holder(holder)) if holder == owner1 => report.pass("lookup"),
        Ok(other) => report.fail(
            "lookup",
            format!("holder retrieved doesn't match the one registered: {other:?}"),
        ),
        Err(err) => report.fail("lookup", err.to_string()),
    }

    match registry.expires_at(&label) {
        Ok(expires_at) => {
            info!(expires_at, "expiry");
            report.pass("expires_at");
        }
        Err(err) => report.fail("expires_at", err.to_string()),
    }

    let transfer = RegistryCall::Transfer {
        label,
        new_holder: owner2,
    };
    match dispatch(registry, naming, transfer, &CallContext::new(owner1, now)) {
        Ok(output) => {
            info!(receipt = %output.render(naming), "label transferred");
            report.pass("transfer");
        }
        Err(err) => report.fail("transfer", err.to_string()),
    }

    match dispatch(
        registry,
        naming,
        RegistryCall::Renew { label },
        &CallContext::new(owner2, now),
    ) {
        Ok(_) => report.fail("renew", "label was renewed while still live"),
        Err(err) if err.kind() == ErrorKind::RenewalNotAllowed => {
            info!(%err, "renewal refused as expected");
            report.pass("renew");
        }
        Err(err) => report.fail("renew", format!("unexpected error: {err}")),
    }

    Ok(report)
}
