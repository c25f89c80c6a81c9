use serde::{Deserialize, Serialize};
use std::path::Path;

use strand_types::constants::{
    DEFAULT_EPOCH_LENGTH, DEFAULT_LIMIT_DURATION, DEFAULT_REWARDS_DURATION,
};
use strand_types::primitives::{Address, ChainId};

use crate::error::NodeError;

/// Configuration for one chain instance.
///
/// Token amounts in the file are denominated in whole tokens; the runtime
/// scales them to 18-decimal base units on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// This instance's chain id.
    pub chain_id: ChainId,
    /// Chain holding the authoritative gauge and staking ledgers.
    #[serde(default = "default_home_chain")]
    pub home_chain: ChainId,
    pub relay: RelayConfig,
    /// Present only on the home chain.
    #[serde(default)]
    pub gauge: Option<GaugeConfig>,
    /// Present only on the home chain.
    #[serde(default)]
    pub staking: Option<StakingConfig>,
    pub token: TokenConfig,
    pub logging: LoggingConfig,
}

fn default_home_chain() -> ChainId {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Hex-encoded 20-byte custody address of the chain-local relay.
    pub address: String,
    #[serde(default = "default_base_fee")]
    pub base_fee: u64,
    #[serde(default = "default_fee_per_byte")]
    pub fee_per_byte: u64,
    /// Bridge mint/burn allowance, in whole tokens.
    pub limit_tokens: u64,
    /// Replenish window for the allowance, in seconds.
    #[serde(default = "default_limit_duration")]
    pub limit_duration: u64,
}

fn default_base_fee() -> u64 {
    1_000
}

fn default_fee_per_byte() -> u64 {
    10
}

fn default_limit_duration() -> u64 {
    DEFAULT_LIMIT_DURATION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeConfig {
    #[serde(default = "default_epoch_length")]
    pub epoch_length: u64,
    /// Per-epoch reward cap, in whole tokens.
    pub total_reward_tokens: u64,
}

fn default_epoch_length() -> u64 {
    DEFAULT_EPOCH_LENGTH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Hex-encoded 20-byte vault address holding staked principal and rewards.
    pub vault: String,
    #[serde(default = "default_rewards_duration")]
    pub rewards_duration: u64,
}

fn default_rewards_duration() -> u64 {
    DEFAULT_REWARDS_DURATION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Remaining emission headroom for reward minting, in whole tokens.
    pub supply_cap_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            home_chain: 1,
            relay: RelayConfig {
                address: hex::encode([0xEE; 20]),
                base_fee: default_base_fee(),
                fee_per_byte: default_fee_per_byte(),
                limit_tokens: 10_000,
                limit_duration: default_limit_duration(),
            },
            gauge: Some(GaugeConfig {
                epoch_length: default_epoch_length(),
                total_reward_tokens: 1_000,
            }),
            staking: Some(StakingConfig {
                vault: hex::encode([0xFF; 20]),
                rewards_duration: default_rewards_duration(),
            }),
            token: TokenConfig {
                supply_cap_tokens: 1_000_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, NodeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path, e),
        })?;
        let config: NodeConfig = toml::from_str(&contents).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to parse config file '{}': {}", path, e),
        })?;
        Ok(config)
    }

    /// Initialize a default configuration file in the given directory.
    pub fn init(dir: &str) -> Result<(), NodeError> {
        let dir_path = Path::new(dir);
        if !dir_path.exists() {
            std::fs::create_dir_all(dir_path)?;
        }

        let config = NodeConfig::default();
        let toml_str = toml::to_string_pretty(&config).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to serialize default config: {}", e),
        })?;

        let config_path = dir_path.join("strand.toml");
        std::fs::write(&config_path, toml_str)?;

        Ok(())
    }
}

/// Parse a hex-encoded 20-byte address from a config field.
pub fn parse_address(field: &str, value: &str) -> Result<Address, NodeError> {
    let bytes = hex::decode(value.trim_start_matches("0x")).map_err(|e| NodeError::ConfigError {
        reason: format!("'{}' is not valid hex: {}", field, e),
    })?;
    let address: Address = bytes.try_into().map_err(|_| NodeError::ConfigError {
        reason: format!("'{}' must be 20 bytes", field),
    })?;
    Ok(address)
}
