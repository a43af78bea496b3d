// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::U256;
use std::sync::Arc;

use crate::error::{Result, SdkError};
use crate::instance::{FheInstance, MAX_VALUES_PER_INPUT};
use crate::types::{EncryptedPayload, FheType};

/// Collects several values that are encrypted together into a single payload
#[derive(Debug, Clone)]
pub struct EncryptedInput {
    instance: Arc<FheInstance>,
    values: Vec<(U256, FheType)>,
}

impl EncryptedInput {
    pub fn new(instance: Arc<FheInstance>) -> Self {
        Self {
            instance,
            values: Vec::new(),
        }
    }

    /// Add a value of the given type. Fails if the value does not fit the type or the input is
    /// full.
    pub fn add(&mut self, value: U256, ty: FheType) -> Result<&mut Self> {
        ty.check(value)?;
        if self.values.len() >= MAX_VALUES_PER_INPUT {
            return Err(SdkError::validation(format!(
                "an input holds at most {} values",
                MAX_VALUES_PER_INPUT
            )));
        }
        self.values.push((value, ty));
        Ok(self)
    }

    pub fn add8(&mut self, value: u8) -> Result<&mut Self> {
        self.add(U256::from(value), FheType::Uint8)
    }

    pub fn add16(&mut self, value: u16) -> Result<&mut Self> {
        self.add(U256::from(value), FheType::Uint16)
    }

    pub fn add32(&mut self, value: u32) -> Result<&mut Self> {
        self.add(U256::from(value), FheType::Uint32)
    }

    pub fn add64(&mut self, value: u64) -> Result<&mut Self> {
        self.add(U256::from(value), FheType::Uint64)
    }

    pub fn add128(&mut self, value: u128) -> Result<&mut Self> {
        self.add(U256::from(value), FheType::Uint128)
    }

    pub fn add256(&mut self, value: U256) -> Result<&mut Self> {
        self.add(value, FheType::Uint256)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn types(&self) -> Vec<FheType> {
        self.values.iter().map(|(_, ty)| *ty).collect()
    }

    /// Encrypt everything added so far. The builder can be reused afterwards.
    pub fn encrypt(&self) -> Result<EncryptedPayload> {
        self.instance.encrypt(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::FheParams;
    use fhe::bfv::{PublicKey, SecretKey};
    use fhevm_config::NetworkConfig;
    use rand::rngs::OsRng;

    fn input() -> EncryptedInput {
        let params = FheParams::insecure_512().build().unwrap();
        let sk = SecretKey::random(&params, &mut OsRng);
        let pk = PublicKey::new(&sk, &mut OsRng);
        let instance = FheInstance::new(&NetworkConfig::default(), "test", params, pk);
        EncryptedInput::new(Arc::new(instance))
    }

    #[test]
    fn test_builder_packs_all_values() {
        let mut input = input();
        input
            .add8(1)
            .unwrap()
            .add32(42)
            .unwrap()
            .add128(u128::MAX)
            .unwrap();

        assert_eq!(
            input.types(),
            vec![FheType::Uint8, FheType::Uint32, FheType::Uint128]
        );

        let payload = input.encrypt().unwrap();
        assert_eq!(payload.handles.len(), 3);
        assert_eq!(payload.proof[0], 3);
    }

    #[test]
    fn test_add_validates_bounds() {
        let mut input = input();
        let err = input.add(U256::from(70_000u64), FheType::Uint16).unwrap_err();
        assert!(err.to_string().contains("uint16"));
        assert!(input.is_empty());
    }

    #[test]
    fn test_input_is_capped() {
        let mut input = input();
        for _ in 0..MAX_VALUES_PER_INPUT {
            input.add8(1).unwrap();
        }
        assert!(input.add8(1).is_err());
        assert_eq!(input.len(), MAX_VALUES_PER_INPUT);
    }
}
