use std::{fmt, path::PathBuf, str::FromStr};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use clap::Parser;
use thiserror::Error;
use url::Url;

use crate::{
    activity::DEFAULT_WIDTH,
    chain::{
        Network, NetworkId, NetworkRegistry, ARBITRUM_SEPOLIA_CHAIN_ID, BASE_SEPOLIA_CHAIN_ID,
        L2_STANDARD_BRIDGE, SEPOLIA_CHAIN_ID,
    },
};

#[derive(Parser, Debug)]
#[clap(about = "Automated Sepolia/T1 and L2 testnet ETH bridging")]
pub struct Args {
    /// Dotenv file with the wallet key and endpoints. Missing files are ignored.
    #[clap(long, default_value = ".env")]
    pub env_file: PathBuf,

    #[clap(long, short, default_value = "warn")]
    pub log_level: LogLevel,

    /// Write tracing output here instead of stderr.
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Wrap width of the transaction log.
    #[clap(long, default_value_t = DEFAULT_WIDTH)]
    pub log_width: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, clap::ValueEnum)]
pub enum LogLevel {
    Warn,
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LogLevel::Warn => "warn",
                LogLevel::Info => "info",
                LogLevel::Debug => "debug",
                LogLevel::Trace => "trace",
            }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set in your .env file.")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Startup configuration read from the environment.
pub struct Config {
    pub signer: PrivateKeySigner,
    pub registry: NetworkRegistry,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("wallet", &self.signer.address())
            .field("registry", &self.registry)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads every variable through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &'static str| lookup(var).filter(|value| !value.trim().is_empty());
        let require = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let signer: PrivateKeySigner = parse("PRIVATE_KEY", &require("PRIVATE_KEY")?)?;

        let sepolia_rpc = parse_url("RPC_URL_SEPOLIA", &require("RPC_URL_SEPOLIA")?)?;
        let t1_rpc = parse_url("RPC_URL_T1", &require("RPC_URL_T1")?)?;
        let t1_chain_id: u64 = parse("T1_CHAIN_ID", &require("T1_CHAIN_ID")?)?;
        let l1_bridge: Address = parse("T1_L1_BRIDGE_CONTRACT", &require("T1_L1_BRIDGE_CONTRACT")?)?;
        let l2_bridge: Address = parse("T1_L2_BRIDGE_CONTRACT", &require("T1_L2_BRIDGE_CONTRACT")?)?;

        let base_rpc = get("RPC_URL_BASE_SEPOLIA")
            .map(|url| parse_url("RPC_URL_BASE_SEPOLIA", &url))
            .transpose()?;
        let arbitrum_rpc = get("RPC_URL_ARBITRUM_SEPOLIA")
            .map(|url| parse_url("RPC_URL_ARBITRUM_SEPOLIA", &url))
            .transpose()?;

        let registry = NetworkRegistry::new(
            Network {
                id: NetworkId::Sepolia,
                rpc_url: Some(sepolia_rpc),
                chain_id: SEPOLIA_CHAIN_ID,
                bridge_contract: l1_bridge,
            },
            Network {
                id: NetworkId::T1Devnet,
                rpc_url: Some(t1_rpc),
                chain_id: t1_chain_id,
                bridge_contract: l2_bridge,
            },
            Network {
                id: NetworkId::BaseSepolia,
                rpc_url: base_rpc,
                chain_id: BASE_SEPOLIA_CHAIN_ID,
                bridge_contract: L2_STANDARD_BRIDGE,
            },
            Network {
                id: NetworkId::ArbitrumSepolia,
                rpc_url: arbitrum_rpc,
                chain_id: ARBITRUM_SEPOLIA_CHAIN_ID,
                bridge_contract: L2_STANDARD_BRIDGE,
            },
        );

        Ok(Self { signer, registry })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        var,
        reason: err.to_string(),
    })
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    parse(var, value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("PRIVATE_KEY", KEY.to_owned()),
            ("RPC_URL_SEPOLIA", "https://sepolia.example.org".to_owned()),
            ("RPC_URL_T1", "https://rpc.t1.example.org".to_owned()),
            ("T1_CHAIN_ID", "299792".to_owned()),
            (
                "T1_L1_BRIDGE_CONTRACT",
                "0xAFdF5cb097D6FB2EB8B1FFbAB180e667458e18F4".to_owned(),
            ),
            (
                "T1_L2_BRIDGE_CONTRACT",
                "0x627B3692969b7330b8Faed2A8836A41EB4aC1918".to_owned(),
            ),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|var| env.get(var).cloned())
    }

    #[test]
    fn required_only_leaves_l2_networks_display_only() {
        let config = load(&env()).unwrap();
        let t1 = config.registry.get(NetworkId::T1Devnet);
        assert_eq!(t1.chain_id, 299_792);
        assert_eq!(
            t1.bridge_contract,
            "0x627B3692969b7330b8Faed2A8836A41EB4aC1918".parse::<Address>().unwrap()
        );
        assert_eq!(config.registry.get(NetworkId::Sepolia).chain_id, SEPOLIA_CHAIN_ID);
        assert!(config.registry.get(NetworkId::BaseSepolia).rpc_url.is_none());
        assert!(config.registry.get(NetworkId::ArbitrumSepolia).rpc_url.is_none());
        // well-known anvil key #1
        assert_eq!(
            config.signer.address(),
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn optional_endpoints_are_picked_up() {
        let mut env = env();
        env.insert("RPC_URL_BASE_SEPOLIA", "https://base.example.org".to_owned());
        let config = load(&env).unwrap();
        let base = config.registry.get(NetworkId::BaseSepolia);
        assert_eq!(base.rpc_url.as_ref().unwrap().as_str(), "https://base.example.org/");
        assert_eq!(base.bridge_contract, L2_STANDARD_BRIDGE);
    }

    #[test]
    fn each_required_variable_is_enforced() {
        for var in [
            "PRIVATE_KEY",
            "RPC_URL_SEPOLIA",
            "RPC_URL_T1",
            "T1_CHAIN_ID",
            "T1_L1_BRIDGE_CONTRACT",
            "T1_L2_BRIDGE_CONTRACT",
        ] {
            let mut env = env();
            env.remove(var);
            assert_eq!(load(&env).unwrap_err(), ConfigError::Missing(var));

            env.insert(var, "  ".to_owned());
            assert_eq!(load(&env).unwrap_err(), ConfigError::Missing(var));
        }
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let mut env = env();
        env.insert("T1_CHAIN_ID", "t1".to_owned());
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { var: "T1_CHAIN_ID", .. }
        ));

        let mut env = self::env();
        env.insert("RPC_URL_ARBITRUM_SEPOLIA", "not a url".to_owned());
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { var: "RPC_URL_ARBITRUM_SEPOLIA", .. }
        ));
    }

    #[test]
    fn missing_message_matches_startup_output() {
        assert_eq!(
            ConfigError::Missing("PRIVATE_KEY").to_string(),
            "PRIVATE_KEY is not set in your .env file."
        );
    }
}
