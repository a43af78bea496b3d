// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod helpers;

use alloy::primitives::U256;
use anyhow::Result;
use fhe::bfv::{Ciphertext, Encoding};
use fhe_traits::{DeserializeParametrized, FheDecoder, FheDecrypter};
use fhevm_sdk::instance::unpack_limbs;
use fhevm_sdk::{
    FheType, FhevmClient, GatewayInstanceFactory, InstanceCache, InstanceFactory, SdkError,
};
use helpers::{network_with_gateway, start_gateway, MockGateway};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn factory() -> GatewayInstanceFactory {
    GatewayInstanceFactory::new(Duration::from_secs(5)).with_retry(3, 10)
}

#[actix_web::test]
async fn test_loads_network_key_and_encrypts() -> Result<()> {
    let (gateway, sk) = MockGateway::returning("0").with_network_key();
    let (url, _gateway) = start_gateway(gateway).await?;

    let client = FhevmClient::builder(network_with_gateway(8009, &url))
        .with_cache(InstanceCache::shared(Arc::new(factory())))
        .build()?;
    client.initialize().await?;

    let instance = client.instance()?;
    assert_eq!(instance.key_id(), "test-key");

    let mut input = client.create_encrypted_input()?;
    input.add32(42)?.add64(7)?;
    let payload = input.encrypt()?;
    assert_eq!(payload.handles.len(), 2);

    // the gateway holds the secret key matching the served public key
    let ct = Ciphertext::from_bytes(&payload.data, instance.params())?;
    let limbs = Vec::<u64>::try_decode(&sk.try_decrypt(&ct)?, Encoding::poly())?;
    let values = unpack_limbs(&limbs, &[FheType::Uint32, FheType::Uint64])?;
    assert_eq!(values, vec![U256::from(42), U256::from(7)]);
    Ok(())
}

#[actix_web::test]
async fn test_transient_key_errors_are_retried() -> Result<()> {
    let (mut gateway, _sk) = MockGateway::returning("0").with_network_key();
    gateway.keyurl_failures = 2;
    gateway.keyurl_status = 503;
    let (url, gateway) = start_gateway(gateway).await?;

    let instance = factory().create(&network_with_gateway(8009, &url)).await?;
    assert_eq!(instance.chain_id(), 8009);
    assert_eq!(gateway.keyurl_calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[actix_web::test]
async fn test_missing_key_is_terminal() -> Result<()> {
    let (mut gateway, _sk) = MockGateway::returning("0").with_network_key();
    gateway.keyurl_failures = usize::MAX;
    gateway.keyurl_status = 404;
    let (url, gateway) = start_gateway(gateway).await?;

    let cache = InstanceCache::new(Arc::new(factory()));
    let err = cache
        .get_or_create(&network_with_gateway(8009, &url))
        .await
        .unwrap_err();

    assert!(matches!(err, SdkError::Initialization(_)));
    assert!(err.to_string().contains("404"));
    assert_eq!(gateway.keyurl_calls.load(Ordering::SeqCst), 1);
    assert!(!cache.has(8009));
    Ok(())
}

#[actix_web::test]
async fn test_failed_initialize_leaves_client_uninitialized() -> Result<()> {
    let (mut gateway, _sk) = MockGateway::returning("0").with_network_key();
    gateway.public_key = vec![1, 2, 3];
    let (url, _gateway) = start_gateway(gateway).await?;

    let client = FhevmClient::builder(network_with_gateway(8009, &url))
        .with_cache(InstanceCache::shared(Arc::new(factory())))
        .build()?;

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(err, SdkError::Initialization(_)));
    assert_eq!(client.state(), fhevm_sdk::ClientState::Uninitialized);
    assert!(matches!(
        client.encrypt(U256::from(1), FheType::Uint8),
        Err(SdkError::Uninitialized)
    ));
    Ok(())
}
