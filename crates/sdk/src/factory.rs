// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use async_trait::async_trait;
use fhevm_config::NetworkConfig;
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::Result;
use crate::gateway::GatewayClient;
use crate::instance::FheInstance;
use crate::retry::{retry, RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS};

/// Builds the encryption context for a network
#[async_trait]
pub trait InstanceFactory: Send + Sync + 'static {
    async fn create(&self, network: &NetworkConfig) -> Result<FheInstance>;
}

/// Fetches the network public key from the gateway
#[derive(Debug, Clone)]
pub struct GatewayInstanceFactory {
    timeout: Duration,
    max_attempts: u32,
    base_delay_ms: u64,
}

impl GatewayInstanceFactory {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_delay_ms: RETRY_BASE_DELAY_MS,
        }
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay_ms: u64) -> Self {
        self.max_attempts = max_attempts;
        self.base_delay_ms = base_delay_ms;
        self
    }
}

#[async_trait]
impl InstanceFactory for GatewayInstanceFactory {
    #[instrument(skip_all, fields(chain_id = network.chain_id))]
    async fn create(&self, network: &NetworkConfig) -> Result<FheInstance> {
        let gateway = GatewayClient::for_network(network, self.timeout)?;

        let key_info = retry(
            || gateway.fetch_key_info(),
            self.max_attempts,
            self.base_delay_ms,
        )
        .await?;

        let public_key = retry(
            || gateway.fetch_bytes(&key_info.public_key_url),
            self.max_attempts,
            self.base_delay_ms,
        )
        .await?;

        let instance = FheInstance::from_public_key_bytes(
            network,
            key_info.key_id.clone(),
            &key_info.params,
            &public_key,
        )?;

        info!(
            "Loaded network key {} (degree {})",
            key_info.key_id, key_info.params.degree
        );
        Ok(instance)
    }
}
