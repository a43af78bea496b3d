// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Bytes, U256};
use alloy::signers::Signer;
use fhevm_config::NetworkConfig;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument};

use crate::authorization::{create_authorization, PublicKeyStore};
use crate::cache::InstanceCache;
use crate::error::{Result, SdkError};
use crate::factory::GatewayInstanceFactory;
use crate::gateway::{DecryptionRequest, GatewayClient};
use crate::input::EncryptedInput;
use crate::instance::FheInstance;
use crate::types::{DecryptTarget, EncryptedPayload, FheType};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Ready,
}

pub struct FhevmClientBuilder {
    network: NetworkConfig,
    cache: Option<Arc<InstanceCache>>,
    key_store: Option<Arc<PublicKeyStore>>,
    request_timeout: Duration,
    signature_timeout: Option<Duration>,
}

impl FhevmClientBuilder {
    pub fn new(network: NetworkConfig) -> Self {
        Self {
            network,
            cache: None,
            key_store: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            signature_timeout: None,
        }
    }

    /// Share an instance cache between clients (default: a private cache backed by the gateway)
    pub fn with_cache(mut self, cache: Arc<InstanceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Where session public keys are remembered (default: in memory)
    pub fn with_key_store(mut self, key_store: Arc<PublicKeyStore>) -> Self {
        self.key_store = Some(key_store);
        self
    }

    /// Bound on every gateway request (default: 30s)
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Bound on every signing prompt (default: none)
    pub fn with_signature_timeout(mut self, signature_timeout: Option<Duration>) -> Self {
        self.signature_timeout = signature_timeout;
        self
    }

    pub fn build(self) -> Result<FhevmClient> {
        let gateway = GatewayClient::for_network(&self.network, self.request_timeout)?;
        let request_timeout = self.request_timeout;
        let cache = self.cache.unwrap_or_else(|| {
            InstanceCache::shared(Arc::new(GatewayInstanceFactory::new(request_timeout)))
        });

        Ok(FhevmClient {
            network: self.network,
            cache,
            gateway,
            keys: self.key_store.unwrap_or_default(),
            signature_timeout: self.signature_timeout,
            instance: OnceLock::new(),
        })
    }
}

/// Entry point for encrypting inputs and requesting decryptions on one network.
///
/// Encryption needs [`FhevmClient::initialize`] to have succeeded. Decryption only talks to the
/// gateway and works in any state.
#[derive(Debug)]
pub struct FhevmClient {
    network: NetworkConfig,
    cache: Arc<InstanceCache>,
    gateway: GatewayClient,
    keys: Arc<PublicKeyStore>,
    signature_timeout: Option<Duration>,
    instance: OnceLock<Arc<FheInstance>>,
}

impl FhevmClient {
    pub fn builder(network: NetworkConfig) -> FhevmClientBuilder {
        FhevmClientBuilder::new(network)
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn cache(&self) -> &Arc<InstanceCache> {
        &self.cache
    }

    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    pub fn state(&self) -> ClientState {
        match self.instance.get() {
            Some(_) => ClientState::Ready,
            None => ClientState::Uninitialized,
        }
    }

    /// True when the cache no longer holds the instance this client was initialized with,
    /// e.g. after `clear`. Build a new client to pick up a fresh instance.
    pub fn is_stale(&self) -> bool {
        match self.instance.get() {
            Some(current) => !self
                .cache
                .get(self.network.chain_id)
                .is_some_and(|cached| Arc::ptr_eq(&cached, current)),
            None => false,
        }
    }

    /// Load the network encryption context. Calling it again is a no-op.
    #[instrument(skip_all, fields(chain_id = self.network.chain_id))]
    pub async fn initialize(&self) -> Result<()> {
        if self.instance.get().is_some() {
            return Ok(());
        }

        let instance = self.cache.get_or_create(&self.network).await?;
        // A concurrent initialize got the same Arc from the cache
        let _ = self.instance.set(instance);
        info!("Client ready");
        Ok(())
    }

    pub fn instance(&self) -> Result<Arc<FheInstance>> {
        self.instance.get().cloned().ok_or(SdkError::Uninitialized)
    }

    /// Encrypt a single value for use as a contract input
    pub fn encrypt(&self, value: U256, ty: FheType) -> Result<EncryptedPayload> {
        ty.check(value)?;
        self.instance()?.encrypt_value(value, ty)
    }

    /// Start an input that packs several values into one payload
    pub fn create_encrypted_input(&self) -> Result<EncryptedInput> {
        Ok(EncryptedInput::new(self.instance()?))
    }

    /// Decrypt a handle the signer is allowed to read. Not retried: every attempt asks the
    /// wallet to sign again.
    #[instrument(skip_all, fields(handle = %target.handle))]
    pub async fn decrypt<S>(&self, target: DecryptTarget, signer: &S) -> Result<U256>
    where
        S: Signer + Send + Sync + ?Sized,
    {
        let public_key = self
            .with_signature_timeout(self.keys.get_or_generate(signer))
            .await?;

        let signature = self
            .with_signature_timeout(create_authorization(
                signer,
                self.network.chain_id,
                target.contract_address,
                target.handle,
                &public_key,
            ))
            .await?;

        let request = DecryptionRequest {
            contract_address: target.contract_address,
            handle: target.handle,
            user_address: Some(signer.address()),
            signature: Some(Bytes::from(signature.as_bytes().to_vec())),
            public_key: Some(public_key.0),
        };

        self.gateway.decrypt(&request).await
    }

    /// Decrypt a handle that was made publicly decryptable
    #[instrument(skip_all, fields(handle = %target.handle))]
    pub async fn public_decrypt(&self, target: DecryptTarget) -> Result<U256> {
        let request = DecryptionRequest::public(target.contract_address, target.handle);
        self.gateway.public_decrypt(&request).await
    }

    async fn with_signature_timeout<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.signature_timeout {
            Some(limit) => timeout(limit, fut).await.map_err(|_| {
                SdkError::Timeout(format!("signature request exceeded {:?}", limit))
            })?,
            None => fut.await,
        }
    }
}
