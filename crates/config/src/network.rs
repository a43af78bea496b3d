// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{address, Address};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;

pub const DEFAULT_CHAIN_ID: u64 = 8009;
pub const DEFAULT_RPC_URL: &str = "https://devnet.zama.ai";
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.devnet.zama.ai";
pub const DEFAULT_ACL_ADDRESS: Address = address!("2Fb4341027eb1d2aD8B5D9708187df8633cAFA92");

/// Everything needed to build a crypto instance for one network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub gateway_url: String,
    pub acl_address: Address,
}

impl NetworkConfig {
    pub fn new(
        chain_id: u64,
        rpc_url: impl Into<String>,
        gateway_url: impl Into<String>,
        acl_address: Address,
    ) -> Self {
        Self {
            chain_id,
            rpc_url: rpc_url.into(),
            gateway_url: gateway_url.into(),
            acl_address,
        }
    }

    pub fn rpc(&self) -> Result<Endpoint> {
        Endpoint::rpc(&self.rpc_url)
            .map_err(|e| anyhow!("Failed to parse RPC URL for chain {}: {}", self.chain_id, e))
    }

    pub fn gateway(&self) -> Result<Endpoint> {
        Endpoint::gateway(&self.gateway_url).map_err(|e| {
            anyhow!(
                "Failed to parse gateway URL for chain {}: {}",
                self.chain_id,
                e
            )
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.rpc()?;
        self.gateway()?;
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_CHAIN_ID,
            DEFAULT_RPC_URL,
            DEFAULT_GATEWAY_URL,
            DEFAULT_ACL_ADDRESS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_endpoint_is_parsed() -> Result<()> {
        let mut network = NetworkConfig::default();
        network.rpc_url = "ws://localhost:8545".to_string();
        assert!(network.rpc()?.scheme().is_websocket());
        assert_eq!(network.gateway()?.url().as_str(), "https://gateway.devnet.zama.ai/");
        Ok(())
    }

    #[test]
    fn test_validate_names_the_chain() {
        let mut network = NetworkConfig::default();
        network.rpc_url = "nope".to_string();
        let err = network.validate().unwrap_err();
        assert!(err.to_string().contains("chain 8009"));
    }
}
