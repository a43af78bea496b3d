// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::locate::{find_in_ancestors, ConfigSearch};
use crate::network::{
    NetworkConfig, DEFAULT_ACL_ADDRESS, DEFAULT_CHAIN_ID, DEFAULT_GATEWAY_URL, DEFAULT_RPC_URL,
};
use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use std::{env, path::PathBuf};
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Variables exposed to browser bundles. Loaded first so that the server side names win.
const PUBLIC_ENV_KEYS: &[(&str, &str)] = &[
    ("NEXT_PUBLIC_RPC_URL", "rpc_url"),
    ("NEXT_PUBLIC_CONTRACT_ADDRESS", "contract_address"),
];

const ENV_KEYS: &[(&str, &str)] = &[
    ("RPC_URL", "rpc_url"),
    ("CONTRACT_ADDRESS", "contract_address"),
    ("NETWORK_ID", "network_id"),
    ("GATEWAY_URL", "gateway_url"),
    ("ACL_ADDRESS", "acl_address"),
    ("PRIVATE_KEY", "private_key"),
];

/// Client configuration after all layers have been merged
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FhevmConfig {
    /// Chain id of the FHEVM network
    pub network_id: u64,
    /// JSON-RPC endpoint of the chain
    pub rpc_url: String,
    /// Decryption gateway base URL
    pub gateway_url: String,
    /// Address of the ACL contract on the network
    pub acl_address: String,
    /// Default contract the client talks to
    pub contract_address: Option<String>,
    /// Hex encoded private key used to sign transactions and authorizations
    pub private_key: Option<String>,
    /// Timeout applied to every gateway request
    pub request_timeout_ms: u64,
    /// Upper bound on how long to wait for a signature. Unbounded when unset.
    pub signature_timeout_ms: Option<u64>,
    /// Where session public keys are persisted. Defaults to `~/.local/share/fhevm/keys`
    pub key_dir: Option<PathBuf>,
    /// Open Telemetry collector grpc endpoint. Eg. http://localhost:4317
    pub otel: Option<String>,
    /// The file this configuration was read from, if any
    #[serde(skip)]
    found_config_file: Option<PathBuf>,
}

impl Default for FhevmConfig {
    fn default() -> Self {
        Self {
            network_id: DEFAULT_CHAIN_ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            acl_address: DEFAULT_ACL_ADDRESS.to_string(),
            contract_address: None,
            private_key: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            signature_timeout_ms: None,
            key_dir: None,
            otel: None,
            found_config_file: None,
        }
    }
}

impl fmt::Debug for FhevmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FhevmConfig")
            .field("network_id", &self.network_id)
            .field("rpc_url", &self.rpc_url)
            .field("gateway_url", &self.gateway_url)
            .field("acl_address", &self.acl_address)
            .field("contract_address", &self.contract_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("signature_timeout_ms", &self.signature_timeout_ms)
            .field("key_dir", &self.key_dir)
            .field("otel", &self.otel)
            .field("found_config_file", &self.found_config_file)
            .finish()
    }
}

impl FhevmConfig {
    /// The validated network section
    pub fn network(&self) -> Result<NetworkConfig> {
        let acl_address: Address = self
            .acl_address
            .parse()
            .context(format!("ACL_ADDRESS '{}' is not a valid address", self.acl_address))?;
        let network = NetworkConfig::new(
            self.network_id,
            self.rpc_url.clone(),
            self.gateway_url.clone(),
            acl_address,
        );
        network.validate()?;
        Ok(network)
    }

    /// The configured contract address
    pub fn contract_address(&self) -> Result<Address> {
        let Some(address) = self.contract_address.as_deref().filter(|a| !a.is_empty()) else {
            bail!("No contract address configured. Set NEXT_PUBLIC_CONTRACT_ADDRESS or pass one explicitly.");
        };
        address
            .parse()
            .context(format!("Contract address '{}' is not a valid address", address))
    }

    /// The configured private key
    pub fn private_key(&self) -> Result<&str> {
        match self.private_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => bail!("PRIVATE_KEY is not set"),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn signature_timeout(&self) -> Option<Duration> {
        self.signature_timeout_ms.map(Duration::from_millis)
    }

    pub fn key_dir(&self) -> Option<PathBuf> {
        self.key_dir
            .clone()
            .or_else(|| OsDirs::data_dir().map(|dir| dir.join("keys")))
    }

    pub fn otel(&self) -> Option<String> {
        self.otel.clone()
    }

    pub fn config_file(&self) -> Option<&PathBuf> {
        self.found_config_file.as_ref()
    }
}

/// Values passed from the cli. Unset values leave the lower layers untouched.
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otel: Option<String>,
}

fn env_layer(keys: &'static [(&'static str, &'static str)]) -> Env {
    Env::raw().filter_map(move |key| {
        keys.iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, field)| (*field).into())
    })
}

/// Load configuration: defaults, then the yaml file, then the environment, then cli overrides.
///
/// An explicitly requested file must exist. When no file is requested the nearest
/// `fhevm.config.yaml` from the cwd upwards is used, falling back to the OS config dir; a missing
/// file there is not an error.
pub fn load_config(config_file: Option<String>, overrides: ConfigOverrides) -> Result<FhevmConfig> {
    let explicit = config_file.map(PathBuf::from);
    let search = ConfigSearch::new(env::current_dir()?, OsDirs::config_dir());
    let path = search.resolve(find_in_ancestors, explicit.clone());

    if explicit.is_some() && !path.exists() {
        bail!("Configuration file not found: {}", path.display());
    }

    load_config_from(path.exists().then_some(path), overrides)
}

/// Load configuration from a known file (or none at all)
pub fn load_config_from(
    path: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> Result<FhevmConfig> {
    let mut figment = Figment::from(Serialized::defaults(FhevmConfig::default()));

    match &path {
        Some(path) => figment = figment.merge(Yaml::file(path)),
        None => debug!("No configuration file found, using defaults and environment"),
    }

    let mut config: FhevmConfig = figment
        .merge(env_layer(PUBLIC_ENV_KEYS))
        .merge(env_layer(ENV_KEYS))
        .merge(Serialized::defaults(overrides))
        .extract()
        .context("Could not parse configuration")?;

    config.found_config_file = path;
    Ok(config)
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_default().join("fhevm")
    }

    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("fhevm"))
    }
}
