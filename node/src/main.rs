use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use ebakus_label_registry::{
    interface_description, publish_interface, DirectoryService, HolderNaming, InMemoryDirectory,
    LabelRegistry, DIRECTORY_ADDRESS,
};
use ebakus_types::Address;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod settings;
mod smoke;
mod version;

use settings::AppConfig;
use version::{git_commit_hash, REGISTRY_VERSION};

fn cli() -> Command {
    Command::new("ebakus-registry-node")
        .version(REGISTRY_VERSION)
        .about("Ebakus label registry: deployment and development tooling")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Override the log level")
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["pretty", "compact"])
                .help("Select log output format")
                .global(true),
        )
        .arg(
            Arg::new("naming")
                .long("naming")
                .value_name("NAMING")
                .value_parser(["owner", "target"])
                .help("Field naming exposed to clients (owner or target)")
                .global(true),
        )
        .subcommand(
            Command::new("interface").about("Print the registry interface description as JSON"),
        )
        .subcommand(
            Command::new("deploy")
                .about("Create the registry and publish its interface to the directory")
                .arg(
                    Arg::new("contract")
                        .long("contract")
                        .value_name("ADDRESS")
                        .help("Address the registry is deployed at"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("FILE")
                        .help("Write the published interface to FILE instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("smoke")
                .about("Run the development call sequence against an in-process registry")
                .arg(
                    Arg::new("buyer")
                        .long("buyer")
                        .value_name("ADDRESS")
                        .default_value("0x0000000000000000000000000000000000000001")
                        .help("Account paying for the test registration"),
                ),
        )
        .subcommand(
            Command::new("show-config")
                .about("Print the resolved configuration and exit")
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .action(ArgAction::SetTrue)
                        .help("Only validate, print nothing"),
                ),
        )
}

fn load_config_with_overrides(matches: &clap::ArgMatches) -> Result<AppConfig> {
    let config_path = matches
        .get_one::<String>("config")
        .map(|value| value.as_str());
    let mut config = AppConfig::load(config_path)?;
    apply_overrides(matches, &mut config)?;
    config.validate()?;
    Ok(config)
}

fn apply_overrides(matches: &clap::ArgMatches, config: &mut AppConfig) -> Result<()> {
    if let Some(log_level) = matches.get_one::<String>("log-level") {
        config.log_level = log_level.clone();
    }

    if let Some(log_format) = matches.get_one::<String>("log-format") {
        config.log_format = log_format.clone();
    }

    if let Some(naming) = matches.get_one::<String>("naming") {
        config.naming = naming.parse::<HolderNaming>()?;
    }

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "compact" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?;
    }

    Ok(())
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the UNIX epoch")?
        .as_secs())
}

/// Publish the interface for `contract` and return the description the
/// directory stored, written to `out` when given.
async fn deploy(config: &AppConfig, contract: Address, out: Option<&Path>) -> Result<String> {
    let registry = LabelRegistry::new(config.registry_config())?;
    let directory = InMemoryDirectory::new();
    publish_interface(&directory, contract, config.naming).await?;

    let stored = directory
        .abi_for_address(contract)
        .await?
        .context("directory lost the published interface")?;
    let abi: serde_json::Value = serde_json::from_str(&stored)?;
    let pretty = serde_json::to_string_pretty(&abi)?;

    if let Some(path) = out {
        std::fs::write(path, &pretty)
            .with_context(|| format!("failed to write interface to {}", path.display()))?;
    }

    info!(
        %contract,
        directory = %DIRECTORY_ADDRESS,
        naming = %config.naming,
        registration_amount = %registry.registration_amount(),
        registration_period = registry.registration_period(),
        bytes = stored.len(),
        out = ?out,
        "registry deployed"
    );
    Ok(pretty)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let (command, sub_matches) = matches
        .subcommand()
        .context("a subcommand is required")?;

    let config = load_config_with_overrides(sub_matches)?;
    init_logging(&config)?;
    info!(
        version = REGISTRY_VERSION,
        commit = git_commit_hash(),
        config = ?config.config_path,
        "starting"
    );

    match command {
        "interface" => {
            let abi = interface_description(config.naming);
            println!("{}", serde_json::to_string_pretty(&abi)?);
        }
        "deploy" => {
            let contract = match sub_matches.get_one::<String>("contract") {
                Some(raw) => raw
                    .parse::<Address>()
                    .context("--contract must be a 0x-prefixed 20-byte address")?,
                None => config.contract_address,
            };
            let out = sub_matches.get_one::<String>("out").map(Path::new);
            let description = deploy(&config, contract, out).await?;
            match out {
                Some(_) => println!("{contract}"),
                None => println!("{description}"),
            }
        }
        "smoke" => {
            let buyer = sub_matches
                .get_one::<String>("buyer")
                .context("--buyer has no value")?
                .parse::<Address>()
                .context("--buyer must be a 0x-prefixed 20-byte address")?;
            let registry = LabelRegistry::new(config.registry_config())?;
            let directory = InMemoryDirectory::new();
            publish_interface(&directory, config.contract_address, config.naming).await?;

            let report = smoke::run(&registry, config.naming, buyer, unix_now()?)?;
            if !report.is_success() {
                for failure in &report.failures {
                    warn!(%failure, "smoke step failed");
                }
                anyhow::bail!("{} smoke step(s) failed", report.failures.len());
            }
            info!(steps = report.passed.len(), "smoke run passed");
        }
        "show-config" => {
            if !sub_matches.get_flag("quiet") {
                println!("{config:#?}");
            }
        }
        other => anyhow::bail!("unknown subcommand '{other}'"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn naming_override_applies() {
        let matches = cli()
            .try_get_matches_from(["ebakus-registry-node", "--naming", "target", "interface"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let mut config = AppConfig::load(None).unwrap();
        apply_overrides(sub, &mut config).unwrap();
        assert_eq!(config.naming, HolderNaming::Target);
    }

    #[test]
    fn smoke_buyer_defaults_to_first_account() {
        let matches = cli()
            .try_get_matches_from(["ebakus-registry-node", "smoke"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let buyer: Address = sub.get_one::<String>("buyer").unwrap().parse().unwrap();
        let mut expected = [0u8; 20];
        expected[19] = 1;
        assert_eq!(buyer, Address::new(expected));
    }

    #[tokio::test]
    async fn deploy_writes_stored_interface() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("registry.abi.json");
        let mut config = AppConfig::load(None).unwrap();
        config.naming = HolderNaming::Target;
        let contract = Address::new([0x42; 20]);

        let description = deploy(&config, contract, Some(&out)).await.unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, description);
        let abi: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(abi, interface_description(HolderNaming::Target));
    }

    #[tokio::test]
    async fn deploy_without_out_returns_description() {
        let config = AppConfig::load(None).unwrap();
        let description = deploy(&config, config.contract_address, None)
            .await
            .unwrap();
        assert!(description.contains("\"register\""));
        assert!(description.contains("\"owner\""));
    }
}
