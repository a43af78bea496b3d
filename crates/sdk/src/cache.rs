// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use fhevm_config::NetworkConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{Result, SdkError};
use crate::factory::InstanceFactory;
use crate::instance::FheInstance;

type Slot = Arc<OnceCell<Arc<FheInstance>>>;

/// One [`FheInstance`] per chain id, shared by every client holding the cache.
///
/// Construction is single flight: concurrent callers for the same chain id wait on one
/// construction and all receive the same `Arc`. A failed construction leaves nothing behind.
pub struct InstanceCache {
    factory: Arc<dyn InstanceFactory>,
    slots: Mutex<HashMap<u64, Slot>>,
}

impl InstanceCache {
    pub fn new(factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            factory,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn shared(factory: Arc<dyn InstanceFactory>) -> Arc<Self> {
        Arc::new(Self::new(factory))
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<u64, Slot>> {
        // Slots are only inserted or removed under the lock, a panic cannot leave the map torn
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub async fn get_or_create(&self, network: &NetworkConfig) -> Result<Arc<FheInstance>> {
        let chain_id = network.chain_id;
        let slot = self.slots().entry(chain_id).or_default().clone();

        let instance = slot
            .get_or_try_init(|| async {
                info!("Creating FHE instance for chain {}", chain_id);
                let instance = self.factory.create(network).await.map_err(|e| match e {
                    SdkError::Initialization(_) => e,
                    other => SdkError::Initialization(other.to_string()),
                })?;
                Ok::<_, SdkError>(Arc::new(instance))
            })
            .await?;

        Ok(instance.clone())
    }

    /// Cached instance without creating one
    pub fn get(&self, chain_id: u64) -> Option<Arc<FheInstance>> {
        self.slots()
            .get(&chain_id)
            .and_then(|slot| slot.get().cloned())
    }

    /// Drop one entry, or every entry when `chain_id` is `None`
    pub fn clear(&self, chain_id: Option<u64>) {
        let mut slots = self.slots();
        match chain_id {
            Some(id) => {
                slots.remove(&id);
                debug!("Cleared FHE instance for chain {}", id);
            }
            None => {
                slots.clear();
                debug!("Cleared all FHE instances");
            }
        }
    }

    pub fn has(&self, chain_id: u64) -> bool {
        self.slots()
            .get(&chain_id)
            .is_some_and(|slot| slot.initialized())
    }

    /// Chain ids with a ready instance, ascending
    pub fn cached_chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .slots()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl core::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("chain_ids", &self.cached_chain_ids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::FheParams;
    use async_trait::async_trait;
    use fhe::bfv::{PublicKey, SecretKey};
    use rand::rngs::OsRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingFactory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InstanceFactory for FailingFactory {
        async fn create(&self, network: &NetworkConfig) -> Result<FheInstance> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(SdkError::Timeout("key download".to_string()));
            }
            let params = FheParams::insecure_512().build()?;
            let sk = SecretKey::random(&params, &mut OsRng);
            let pk = PublicKey::new(&sk, &mut OsRng);
            Ok(FheInstance::new(network, "key", params, pk))
        }
    }

    #[tokio::test]
    async fn test_failed_construction_is_not_cached() {
        let factory = Arc::new(FailingFactory {
            calls: AtomicUsize::new(0),
        });
        let cache = InstanceCache::new(factory.clone());
        let network = NetworkConfig::default();

        let err = cache.get_or_create(&network).await.unwrap_err();
        assert!(matches!(err, SdkError::Initialization(_)));
        assert!(!cache.has(network.chain_id));
        assert!(cache.cached_chain_ids().is_empty());

        cache.get_or_create(&network).await.unwrap();
        assert!(cache.has(network.chain_id));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 2);
    }
}
