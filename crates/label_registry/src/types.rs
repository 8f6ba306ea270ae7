//! Types for the label registry

use crate::errors::{RegistryError, Result};
use ebakus_types::{Address, Amount, Label, Timestamp, UNITS_PER_TOKEN};
use serde::{Deserialize, Serialize};

/// One year in seconds.
pub const DEFAULT_REGISTRATION_PERIOD: u64 = 365 * 24 * 60 * 60;
/// 0.1 native token.
pub const DEFAULT_REGISTRATION_AMOUNT: Amount = UNITS_PER_TOKEN / 10;

/// Registration record kept for every label that was ever registered.
///
/// Records are never removed; an expired record is treated as absent by
/// every operation except [`crate::LabelRegistry::expires_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub label: Label,
    /// Address currently controlling the label.
    pub holder: Address,
    /// Time of the most recent successful registration (or renewal).
    pub registered_at: Timestamp,
    pub expires_at: Timestamp,
}

impl LabelRecord {
    /// A record is live while `expires_at > now`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }
}

/// Authenticated call envelope supplied by the execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    /// Payment attached to the call, in the smallest native unit.
    pub value: Amount,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self {
            caller,
            value: 0,
            now,
        }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// What `renew` does once a record has lapsed.
///
/// Renewal of a live record is always refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenewalPolicy {
    /// Renewal is never granted.
    #[default]
    Rejected,
    /// The last holder may renew during `window` seconds after expiry,
    /// provided nobody re-registered the label in the meantime.
    GracePeriod { window: u64 },
}

/// Registry-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub registration_amount: Amount,
    /// Seconds added to `now` on registration.
    pub registration_period: u64,
    #[serde(default)]
    pub renewal_policy: RenewalPolicy,
    /// Account allowed to change the registration amount (zero: nobody).
    #[serde(default)]
    pub admin: Address,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registration_amount: DEFAULT_REGISTRATION_AMOUNT,
            registration_period: DEFAULT_REGISTRATION_PERIOD,
            renewal_policy: RenewalPolicy::Rejected,
            admin: Address::ZERO,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.registration_amount == 0 {
            return Err(RegistryError::InvalidConfig(
                "registration amount must be non-zero".into(),
            ));
        }
        if self.registration_period == 0 {
            return Err(RegistryError::InvalidConfig(
                "registration period must be non-zero".into(),
            ));
        }
        if let RenewalPolicy::GracePeriod { window: 0 } = self.renewal_policy {
            return Err(RegistryError::InvalidConfig(
                "renewal grace window must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Event emitted by a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LabelEvent {
    Registered {
        label: Label,
        holder: Address,
    },
    Transferred {
        label: Label,
        new_holder: Address,
    },
    Renewed {
        label: Label,
        holder: Address,
        expires_at: Timestamp,
    },
    RegistrationAmountChanged {
        previous: Amount,
        current: Amount,
    },
}

/// Outcome of a successful mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub event: LabelEvent,
    /// Amount kept by the registry.
    pub fee_charged: Amount,
    /// Amount returned to `refund_to`.
    pub refund: Amount,
    pub refund_to: Address,
}
