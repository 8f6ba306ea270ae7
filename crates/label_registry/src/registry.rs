//! Label registry state machine
//!
//! Maps labels to holder addresses behind a registration fee and an
//! expiration time. Every call is evaluated against the caller, payment and
//! timestamp carried in its [`CallContext`]; the registry never reads a clock.

use crate::errors::*;
use crate::types::*;
use ebakus_types::{Address, Amount, Label, Timestamp};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// Events kept before the oldest ones are dropped.
pub const MAX_EVENT_LOG: usize = 4_096;

#[derive(Debug, Default)]
struct RegistryState {
    records: HashMap<Label, LabelRecord>,
    config: RegistryConfig,
    /// Fees retained from successful registrations.
    collected_fees: Amount,
    /// Excess payments handed back to callers.
    refunded_total: Amount,
    events: VecDeque<LabelEvent>,
}

impl RegistryState {
    fn emit(&mut self, event: LabelEvent) {
        if self.events.len() == MAX_EVENT_LOG {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Label registry
///
/// All state sits behind one lock and every mutating call validates and
/// writes under the same write guard, so a rejected call leaves no trace.
#[derive(Debug, Default)]
pub struct LabelRegistry {
    state: RwLock<RegistryState>,
}

impl LabelRegistry {
    /// Create a registry with the given settings
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: RwLock::new(RegistryState {
                config,
                ..Default::default()
            }),
        })
    }

    /// Register an available label to `holder`.
    ///
    /// The attached payment must cover the registration amount; any excess
    /// is refunded to the caller.
    pub fn register(&self, label: Label, holder: Address, ctx: &CallContext) -> Result<Receipt> {
        let mut state = self.state.write();

        if let Some(existing) = state.records.get(&label) {
            if existing.is_live(ctx.now) {
                debug!(%label, expires_at = existing.expires_at, "register rejected: label held");
                return Err(RegistryError::AlreadyRegistered {
                    label: label.to_string(),
                    expires_at: existing.expires_at,
                });
            }
        }

        let required = state.config.registration_amount;
        if ctx.value < required {
            debug!(%label, required, provided = ctx.value, "register rejected: insufficient payment");
            return Err(RegistryError::InsufficientPayment {
                required,
                provided: ctx.value,
            });
        }

        let expires_at = ctx
            .now
            .checked_add(state.config.registration_period)
            .ok_or_else(|| {
                RegistryError::InvalidConfig(format!(
                    "expiry overflows for timestamp {}",
                    ctx.now
                ))
            })?;
        let refund = ctx.value - required;

        state.records.insert(
            label,
            LabelRecord {
                label,
                holder,
                registered_at: ctx.now,
                expires_at,
            },
        );
        state.collected_fees = state.collected_fees.saturating_add(required);
        state.refunded_total = state.refunded_total.saturating_add(refund);

        let event = LabelEvent::Registered { label, holder };
        state.emit(event.clone());
        info!(%label, %holder, expires_at, refund, "label registered");

        Ok(Receipt {
            event,
            fee_charged: required,
            refund,
            refund_to: ctx.caller,
        })
    }

    /// Resolve label → holder, only while the record is live.
    pub fn lookup(&self, label: &Label, now: Timestamp) -> Result<Address> {
        let state = self.state.read();
        match state.records.get(label) {
            Some(record) if record.is_live(now) => Ok(record.holder),
            _ => Err(RegistryError::NotFound {
                label: label.to_string(),
            }),
        }
    }

    /// Stored expiry, even when it lies in the past.
    pub fn expires_at(&self, label: &Label) -> Result<Timestamp> {
        let state = self.state.read();
        state
            .records
            .get(label)
            .map(|record| record.expires_at)
            .ok_or_else(|| RegistryError::NotFound {
                label: label.to_string(),
            })
    }

    /// Raw record, live or not.
    pub fn record(&self, label: &Label) -> Option<LabelRecord> {
        self.state.read().records.get(label).cloned()
    }

    /// Hand a live label to `new_holder`. Only the current holder may do this.
    pub fn transfer(
        &self,
        label: Label,
        new_holder: Address,
        ctx: &CallContext,
    ) -> Result<Receipt> {
        let mut state = self.state.write();

        let record = match state.records.get_mut(&label) {
            Some(record) if record.is_live(ctx.now) => record,
            _ => {
                debug!(%label, "transfer rejected: no live record");
                return Err(RegistryError::NotFound {
                    label: label.to_string(),
                });
            }
        };

        if record.holder != ctx.caller {
            debug!(%label, caller = %ctx.caller, "transfer rejected: caller is not holder");
            return Err(RegistryError::Unauthorized {
                caller: ctx.caller.to_string(),
                action: "transfer a label it does not hold",
            });
        }

        record.holder = new_holder;
        let event = LabelEvent::Transferred { label, new_holder };
        state.refunded_total = state.refunded_total.saturating_add(ctx.value);
        state.emit(event.clone());
        info!(%label, %new_holder, "label transferred");

        Ok(Receipt {
            event,
            fee_charged: 0,
            refund: ctx.value,
            refund_to: ctx.caller,
        })
    }

    /// Extend a lapsed registration according to the configured
    /// [`RenewalPolicy`]. A live registration is never renewed.
    pub fn renew(&self, label: Label, ctx: &CallContext) -> Result<Receipt> {
        let mut state = self.state.write();
        let policy = state.config.renewal_policy;
        let period = state.config.registration_period;

        let not_allowed = |reason: &'static str| {
            debug!(%label, reason, "renew rejected");
            RegistryError::RenewalNotAllowed {
                label: label.to_string(),
                reason,
            }
        };

        let Some(record) = state.records.get_mut(&label) else {
            return Err(not_allowed("label was never registered"));
        };

        if record.is_live(ctx.now) {
            return Err(not_allowed("registration has not expired"));
        }

        let window = match policy {
            RenewalPolicy::Rejected => return Err(not_allowed("renewal is disabled")),
            RenewalPolicy::GracePeriod { window } => window,
        };

        if ctx.now >= record.expires_at.saturating_add(window) {
            return Err(not_allowed("grace period has elapsed"));
        }

        if record.holder != ctx.caller {
            debug!(%label, caller = %ctx.caller, "renew rejected: caller is not holder");
            return Err(RegistryError::Unauthorized {
                caller: ctx.caller.to_string(),
                action: "renew a label it does not hold",
            });
        }

        let expires_at = ctx.now.checked_add(period).ok_or_else(|| {
            RegistryError::InvalidConfig(format!("expiry overflows for timestamp {}", ctx.now))
        })?;
        record.registered_at = ctx.now;
        record.expires_at = expires_at;
        let holder = record.holder;

        let event = LabelEvent::Renewed {
            label,
            holder,
            expires_at,
        };
        state.refunded_total = state.refunded_total.saturating_add(ctx.value);
        state.emit(event.clone());
        info!(%label, %holder, expires_at, "label renewed");

        Ok(Receipt {
            event,
            fee_charged: 0,
            refund: ctx.value,
            refund_to: ctx.caller,
        })
    }

    /// Current registration amount.
    pub fn registration_amount(&self) -> Amount {
        self.state.read().config.registration_amount
    }

    /// Seconds a registration stays live.
    pub fn registration_period(&self) -> u64 {
        self.state.read().config.registration_period
    }

    /// How lapsed registrations may be renewed.
    pub fn renewal_policy(&self) -> RenewalPolicy {
        self.state.read().config.renewal_policy
    }

    /// Change the registration amount. Restricted to the configured admin;
    /// a zero admin address disables fee changes altogether.
    pub fn set_registration_amount(&self, caller: Address, amount: Amount) -> Result<LabelEvent> {
        let mut state = self.state.write();

        if state.config.admin.is_zero() || caller != state.config.admin {
            debug!(%caller, "fee change rejected: caller is not admin");
            return Err(RegistryError::Unauthorized {
                caller: caller.to_string(),
                action: "change the registration amount",
            });
        }
        if amount == 0 {
            return Err(RegistryError::InvalidConfig(
                "registration amount must be non-zero".into(),
            ));
        }

        let previous = state.config.registration_amount;
        state.config.registration_amount = amount;
        let event = LabelEvent::RegistrationAmountChanged {
            previous,
            current: amount,
        };
        state.emit(event.clone());
        info!(previous, current = amount, "registration amount changed");
        Ok(event)
    }

    /// Total fees retained by the registry.
    pub fn collected_fees(&self) -> Amount {
        self.state.read().collected_fees
    }

    /// Total excess payments returned to callers.
    pub fn refunded_total(&self) -> Amount {
        self.state.read().refunded_total
    }

    /// Retained events, oldest first. At most [`MAX_EVENT_LOG`] are kept.
    pub fn events(&self) -> Vec<LabelEvent> {
        self.state.read().events.iter().cloned().collect()
    }

    /// Take every retained event, leaving the log empty.
    pub fn drain_events(&self) -> Vec<LabelEvent> {
        self.state.write().events.drain(..).collect()
    }

    /// Number of records ever created (live or expired).
    pub fn record_count(&self) -> usize {
        self.state.read().records.len()
    }

    /// Live labels held by `holder`, in label order.
    pub fn list_holder_labels(&self, holder: &Address, now: Timestamp) -> Vec<Label> {
        let state = self.state.read();
        let mut labels: Vec<Label> = state
            .records
            .values()
            .filter(|record| &record.holder == holder && record.is_live(now))
            .map(|record| record.label)
            .collect();
        labels.sort();
        labels
    }
}
