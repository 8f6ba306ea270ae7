use anyhow::{Context, Result};
use config::{Config, File as ConfigFile};
use ebakus_label_registry::{HolderNaming, RegistryConfig, RenewalPolicy};
use ebakus_types::{Address, Amount};
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "config/registry.toml";
const DEFAULT_REGISTRATION_AMOUNT: &str = "100000000000000000";
const DEFAULT_REGISTRATION_PERIOD_SECS: u64 = 365 * 24 * 60 * 60;
const DEFAULT_CONTRACT_ADDRESS: &str = "0x00000000000000000000000000000000000e0b50";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: Option<PathBuf>,

    // Registry
    pub registration_amount: Amount,
    pub registration_period_secs: u64,
    pub renewal_policy: RenewalPolicy,
    pub admin: Address,

    // Deployment
    pub naming: HolderNaming,
    pub contract_address: Address,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl AppConfig {
    /// Layer the optional TOML file under `EBAKUS_*` environment variables.
    pub fn load(config_path_override: Option<&str>) -> Result<Self> {
        let resolved_path = match config_path_override {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    anyhow::bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path)
            }
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|path| path.exists()),
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(config::Environment::with_prefix("EBAKUS"));
        let config = builder.build()?;

        let registration_amount = get_string_value(
            &config,
            &["registration_amount", "registry.registration_amount"],
        )
        .unwrap_or_else(|| DEFAULT_REGISTRATION_AMOUNT.to_string())
        .parse::<Amount>()
        .context("registration_amount must be an integer amount in the smallest unit")?;

        let registration_period_secs = get_string_value(
            &config,
            &["registration_period_secs", "registry.registration_period_secs"],
        )
        .map(|value| value.parse::<u64>())
        .transpose()
        .context("registration_period_secs must be a whole number of seconds")?
        .unwrap_or(DEFAULT_REGISTRATION_PERIOD_SECS);

        let renewal_mode =
            get_string_value(&config, &["renewal_policy", "registry.renewal_policy"])
                .unwrap_or_else(|| "rejected".to_string());
        let renewal_policy = match renewal_mode.to_lowercase().as_str() {
            "rejected" => RenewalPolicy::Rejected,
            "grace" | "grace_period" => {
                let window = get_string_value(
                    &config,
                    &["renewal_grace_secs", "registry.renewal_grace_secs"],
                )
                .context("renewal_policy = grace requires renewal_grace_secs")?
                .parse::<u64>()
                .context("renewal_grace_secs must be a whole number of seconds")?;
                RenewalPolicy::GracePeriod { window }
            }
            other => anyhow::bail!(
                "unknown renewal_policy '{other}' (expected 'rejected' or 'grace')"
            ),
        };

        let admin = get_string_value(&config, &["admin", "registry.admin"])
            .map(|value| value.parse::<Address>())
            .transpose()
            .context("admin must be a 0x-prefixed 20-byte address")?
            .unwrap_or(Address::ZERO);

        let naming = get_string_value(&config, &["naming", "deploy.naming"])
            .map(|value| value.parse::<HolderNaming>())
            .transpose()?
            .unwrap_or_default();

        let contract_address =
            get_string_value(&config, &["contract_address", "deploy.contract_address"])
                .unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string())
                .parse::<Address>()
                .context("contract_address must be a 0x-prefixed 20-byte address")?;

        Ok(Self {
            config_path: resolved_path,
            registration_amount,
            registration_period_secs,
            renewal_policy,
            admin,
            naming,
            contract_address,
            log_level: get_string_value(&config, &["log_level", "logging.level"])
                .unwrap_or_else(|| "info".to_string()),
            log_format: get_string_value(&config, &["log_format", "logging.format"])
                .unwrap_or_else(|| "pretty".to_string()),
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.registry_config()
            .validate()
            .context("invalid registry settings")?;
        if !matches!(self.log_format.as_str(), "pretty" | "compact") {
            anyhow::bail!(
                "log_format must be 'pretty' or 'compact', got '{}'",
                self.log_format
            );
        }
        if self.contract_address.is_zero() {
            anyhow::bail!("contract_address must not be the zero address");
        }
        Ok(())
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            registration_amount: self.registration_amount,
            registration_period: self.registration_period_secs,
            renewal_policy: self.renewal_policy,
            admin: self.admin,
        }
    }
}

fn get_string_value(config: &Config, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        config
            .get_string(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
