//! Boundary call shapes.
//!
//! Two client conventions exist for the same registry: one names the
//! controlling address `owner` (looked up with `owner(label)`), the other
//! names it `target` (looked up with `getAddress(label)`). Internally both
//! map onto the registry's `holder`; only this module knows the field names.

use crate::errors::*;
use crate::registry::LabelRegistry;
use crate::types::*;
use ebakus_types::{Address, Amount, Label, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolderNaming {
    #[default]
    Owner,
    Target,
}

impl HolderNaming {
    /// Field name for the holder in calls and events.
    pub fn holder_field(self) -> &'static str {
        match self {
            HolderNaming::Owner => "owner",
            HolderNaming::Target => "target",
        }
    }

    /// Field name for the new holder in transfer calls and events.
    pub fn new_holder_field(self) -> &'static str {
        match self {
            HolderNaming::Owner => "newOwner",
            HolderNaming::Target => "newTarget",
        }
    }

    /// Method used to look a label up.
    pub fn lookup_method(self) -> &'static str {
        match self {
            HolderNaming::Owner => "owner",
            HolderNaming::Target => "getAddress",
        }
    }
}

impl fmt::Display for HolderNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.holder_field())
    }
}

impl FromStr for HolderNaming {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(HolderNaming::Owner),
            "target" => Ok(HolderNaming::Target),
            other => Err(RegistryError::InvalidConfig(format!(
                "unknown holder naming '{other}' (expected 'owner' or 'target')"
            ))),
        }
    }
}

/// A registry call as sent by either client convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum RegistryCall {
    Register {
        label: Label,
        #[serde(rename = "owner", alias = "target")]
        holder: Address,
    },
    Owner {
        label: Label,
    },
    GetAddress {
        label: Label,
    },
    ExpiresAt {
        label: Label,
    },
    Transfer {
        label: Label,
        #[serde(rename = "newOwner", alias = "newTarget")]
        new_holder: Address,
    },
    Renew {
        label: Label,
    },
    GetRegistrationAmount,
}

impl RegistryCall {
    pub fn method(&self) -> &'static str {
        match self {
            RegistryCall::Register { .. } => "register",
            RegistryCall::Owner { .. } => "owner",
            RegistryCall::GetAddress { .. } => "getAddress",
            RegistryCall::ExpiresAt { .. } => "expiresAt",
            RegistryCall::Transfer { .. } => "transfer",
            RegistryCall::Renew { .. } => "renew",
            RegistryCall::GetRegistrationAmount => "getRegistrationAmount",
        }
    }
}

/// Result of a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutput {
    Receipt(Receipt),
    Holder(Address),
    ExpiresAt(Timestamp),
    RegistrationAmount(Amount),
}

impl CallOutput {
    /// Render with the field names of `naming`. Amounts are decimal strings.
    pub fn render(&self, naming: HolderNaming) -> Value {
        match self {
            CallOutput::Receipt(receipt) => json!({
                "logs": [render_event(&receipt.event, naming)],
                "feeCharged": receipt.fee_charged.to_string(),
                "refund": receipt.refund.to_string(),
                "refundTo": receipt.refund_to.to_string(),
            }),
            CallOutput::Holder(holder) => json!(holder.to_string()),
            CallOutput::ExpiresAt(expires_at) => json!(expires_at),
            CallOutput::RegistrationAmount(amount) => json!(amount.to_string()),
        }
    }
}

/// Render an event the way clients of `naming` expect to read its args.
pub fn render_event(event: &LabelEvent, naming: HolderNaming) -> Value {
    let mut args = serde_json::Map::new();
    let name = match event {
        LabelEvent::Registered { label, holder } => {
            args.insert("label".into(), json!(label.to_string()));
            args.insert(naming.holder_field().into(), json!(holder.to_string()));
            "Registered"
        }
        LabelEvent::Transferred { label, new_holder } => {
            args.insert("label".into(), json!(label.to_string()));
            args.insert(
                naming.new_holder_field().into(),
                json!(new_holder.to_string()),
            );
            "Transferred"
        }
        LabelEvent::Renewed {
            label,
            holder,
            expires_at,
        } => {
            args.insert("label".into(), json!(label.to_string()));
            args.insert(naming.holder_field().into(), json!(holder.to_string()));
            args.insert("expiresAt".into(), json!(expires_at));
            "Renewed"
        }
        LabelEvent::RegistrationAmountChanged { previous, current } => {
            args.insert("previous".into(), json!(previous.to_string()));
            args.insert("current".into(), json!(current.to_string()));
            "RegistrationAmountChanged"
        }
    };
    json!({ "event": name, "args": Value::Object(args) })
}

/// Route a call onto the registry.
pub fn dispatch(
    registry: &LabelRegistry,
    naming: HolderNaming,
    call: RegistryCall,
    ctx: &CallContext,
) -> Result<CallOutput> {
    match call {
        RegistryCall::Register { label, holder } => registry
            .register(label, holder, ctx)
            .map(CallOutput::Receipt),
        RegistryCall::Owner { label } if naming == HolderNaming::Owner => {
            registry.lookup(&label, ctx.now).map(CallOutput::Holder)
        }
        RegistryCall::GetAddress { label } if naming == HolderNaming::Target => {
            registry.lookup(&label, ctx.now).map(CallOutput::Holder)
        }
        RegistryCall::ExpiresAt { label } => {
            registry.expires_at(&label).map(CallOutput::ExpiresAt)
        }
        RegistryCall::Transfer { label, new_holder } => registry
            .transfer(label, new_holder, ctx)
            .map(CallOutput::Receipt),
        RegistryCall::Renew { label } => registry.renew(label, ctx).map(CallOutput::Receipt),
        RegistryCall::GetRegistrationAmount => Ok(CallOutput::RegistrationAmount(
            registry.registration_amount(),
        )),
        other => Err(RegistryError::UnsupportedCall {
            method: other.method().to_string(),
        }),
    }
}

/// Parse a JSON call, dispatch it and render the output.
pub fn dispatch_json(
    registry: &LabelRegistry,
    naming: HolderNaming,
    raw: &str,
    ctx: &CallContext,
) -> Result<Value> {
    let call: RegistryCall = serde_json::from_str(raw)?;
    dispatch(registry, naming, call, ctx).map(|output| output.render(naming))
}

fn param(name: &str, ty: &str) -> Value {
    json!({ "name": name, "type": ty })
}

fn event_param(name: &str, ty: &str, indexed: bool) -> Value {
    json!({ "name": name, "type": ty, "indexed": indexed })
}

fn function(name: &str, inputs: Vec<Value>, outputs: Vec<Value>, mutability: &str) -> Value {
    json!({
        "type": "function",
        "name": name,
        "inputs": inputs,
        "outputs": outputs,
        "stateMutability": mutability,
    })
}

/// Interface description (ABI JSON) of the registry under `naming`.
pub fn interface_description(naming: HolderNaming) -> Value {
    let holder = naming.holder_field();
    let new_holder = naming.new_holder_field();

    json!([
        function(
            "register",
            vec![param("label", "bytes32"), param(holder, "address")],
            vec![],
            "payable",
        ),
        function(
            naming.lookup_method(),
            vec![param("label", "bytes32")],
            vec![param("", "address")],
            "view",
        ),
        function(
            "expiresAt",
            vec![param("label", "bytes32")],
            vec![param("", "uint256")],
            "view",
        ),
        function(
            "transfer",
            vec![param("label", "bytes32"), param(new_holder, "address")],
            vec![],
            "nonpayable",
        ),
        function("renew", vec![param("label", "bytes32")], vec![], "nonpayable"),
        function(
            "getRegistrationAmount",
            vec![],
            vec![param("", "uint256")],
            "view",
        ),
        {
            "type": "event",
            "name": "Registered",
            "inputs": [event_param("label", "bytes32", true), event_param(holder, "address", false)],
            "anonymous": false,
        },
        {
            "type": "event",
            "name": "Transferred",
            "inputs": [event_param("label", "bytes32", true), event_param(new_holder, "address", false)],
            "anonymous": false,
        },
        {
            "type": "event",
            "name": "Renewed",
            "inputs": [
                event_param("label", "bytes32", true),
                event_param(holder, "address", false),
                event_param("expiresAt", "uint256", false),
            ],
            "anonymous": false,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE: Amount = 500;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn registry() -> LabelRegistry {
        LabelRegistry::new(RegistryConfig {
            registration_amount: FEE,
            registration_period: 1_000,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_register_call_accepts_both_field_names() {
        let label = Label::from_name("ebakus");
        let owner_shape = format!(
            r#"{{"method":"register","label":"{label}","owner":"{}"}}"#,
            addr(1)
        );
        let target_shape = format!(
            r#"{{"method":"register","label":"{label}","target":"{}"}}"#,
            addr(1)
        );

        let expected = RegistryCall::Register {
            label,
            holder: addr(1),
        };
        assert_eq!(
            serde_json::from_str::<RegistryCall>(&owner_shape).unwrap(),
            expected
        );
        assert_eq!(
            serde_json::from_str::<RegistryCall>(&target_shape).unwrap(),
            expected
        );
    }

    #[test]
    fn test_lookup_method_follows_naming() {
        let registry = registry();
        let label = Label::from_name("shape");
        let ctx = CallContext::new(addr(9), 0).with_value(FEE);
        registry.register(label, addr(1), &ctx).unwrap();

        let owner = dispatch(
            &registry,
            HolderNaming::Owner,
            RegistryCall::Owner { label },
            &ctx,
        )
        .unwrap();
        assert_eq!(owner, CallOutput::Holder(addr(1)));

        let err = dispatch(
            &registry,
            HolderNaming::Owner,
            RegistryCall::GetAddress { label },
            &ctx,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedCall);

        let target = dispatch(
            &registry,
            HolderNaming::Target,
            RegistryCall::GetAddress { label },
            &ctx,
        )
        .unwrap();
        assert_eq!(target, CallOutput::Holder(addr(1)));
    }

    #[test]
    fn test_dispatch_json_renders_target_events() {
        let registry = registry();
        let label = Label::from_name("rendered");
        let buyer = CallContext::new(addr(9), 0).with_value(FEE + 7);

        let raw = format!(
            r#"{{"method":"register","label":"{label}","target":"{}"}}"#,
            addr(1)
        );
        let out = dispatch_json(&registry, HolderNaming::Target, &raw, &buyer).unwrap();
        assert_eq!(out["logs"][0]["event"], "Registered");
        assert_eq!(out["logs"][0]["args"]["target"], addr(1).to_string());
        assert_eq!(out["refund"], "7");

        let raw = format!(
            r#"{{"method":"transfer","label":"{label}","newTarget":"{}"}}"#,
            addr(2)
        );
        let holder = CallContext::new(addr(1), 1);
        let out = dispatch_json(&registry, HolderNaming::Target, &raw, &holder).unwrap();
        assert_eq!(out["logs"][0]["args"]["newTarget"], addr(2).to_string());

        let raw = format!(r#"{{"method":"getAddress","label":"{label}"}}"#);
        let out = dispatch_json(&registry, HolderNaming::Target, &raw, &holder).unwrap();
        assert_eq!(out, json!(addr(2).to_string()));
    }

    #[test]
    fn test_dispatch_json_reports_errors_by_kind() {
        let registry = registry();
        let ctx = CallContext::new(addr(1), 0);

        let err = dispatch_json(&registry, HolderNaming::Owner, "{\"method\":\"burn\"}", &ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);

        let raw = format!(
            r#"{{"method":"owner","label":"{}"}}"#,
            Label::from_name("missing")
        );
        let err = dispatch_json(&registry, HolderNaming::Owner, &raw, &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let out = dispatch_json(
            &registry,
            HolderNaming::Owner,
            r#"{"method":"getRegistrationAmount"}"#,
            &ctx,
        )
        .unwrap();
        assert_eq!(out, json!("500"));
    }

    #[test]
    fn test_interface_description_uses_naming() {
        let owner_abi = interface_description(HolderNaming::Owner);
        let names: Vec<&str> = owner_abi
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|entry| entry["name"].as_str())
            .collect();
        assert!(names.contains(&"owner"));
        assert!(!names.contains(&"getAddress"));
        assert_eq!(owner_abi[0]["inputs"][1]["name"], "owner");
        assert_eq!(owner_abi[0]["stateMutability"], "payable");

        let target_abi = interface_description(HolderNaming::Target);
        assert_eq!(target_abi[1]["name"], "getAddress");
        assert_eq!(target_abi[3]["inputs"][1]["name"], "newTarget");
    }

    #[test]
    fn test_naming_parses_from_str() {
        assert_eq!("Owner".parse::<HolderNaming>().unwrap(), HolderNaming::Owner);
        assert_eq!(" target ".parse::<HolderNaming>().unwrap(), HolderNaming::Target);
        assert!("holder".parse::<HolderNaming>().is_err());
    }
}
