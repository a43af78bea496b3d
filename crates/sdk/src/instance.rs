// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use core::fmt;
use fhe::bfv::{BfvParameters, BfvParametersBuilder, Encoding, Plaintext, PublicKey};
use fhe_traits::{DeserializeParametrized, FheEncoder, FheEncrypter, Serialize as FheSerialize};
use fhevm_config::NetworkConfig;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, SdkError};
use crate::types::{EncryptedPayload, FheType, LIMB_BITS};

/// Handles are limited to a one byte index
pub const MAX_VALUES_PER_INPUT: usize = 255;
pub const HANDLE_VERSION: u8 = 0;

const LIMB_MASK: u64 = (1 << LIMB_BITS) - 1;
const LIMBS_PER_WORD: usize = 64 / LIMB_BITS;

/// BFV parameters published by the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FheParams {
    pub degree: usize,
    pub plaintext_modulus: u64,
    pub moduli: Vec<u64>,
}

impl FheParams {
    /// Small parameter set for local development and tests. DO NOT USE IN PRODUCTION
    pub fn insecure_512() -> Self {
        Self {
            degree: 512,
            plaintext_modulus: 0xffffee001,
            moduli: vec![0x7fffffffe0001],
        }
    }

    pub fn build(&self) -> Result<Arc<BfvParameters>> {
        if self.plaintext_modulus <= 1 << LIMB_BITS {
            return Err(SdkError::Initialization(format!(
                "plaintext modulus {} is too small, it must exceed 2^{}",
                self.plaintext_modulus, LIMB_BITS
            )));
        }

        BfvParametersBuilder::new()
            .set_degree(self.degree)
            .set_plaintext_modulus(self.plaintext_modulus)
            .set_moduli(&self.moduli)
            .build_arc()
            .map_err(|e| SdkError::Initialization(format!("invalid BFV parameters: {}", e)))
    }
}

/// Per-network encryption context: the network public key and everything needed to derive
/// handles for the ciphertexts it produces. Immutable once built.
pub struct FheInstance {
    chain_id: u64,
    acl_address: Address,
    rpc_url: String,
    key_id: String,
    params: Arc<BfvParameters>,
    public_key: PublicKey,
}

impl FheInstance {
    pub fn new(
        network: &NetworkConfig,
        key_id: impl Into<String>,
        params: Arc<BfvParameters>,
        public_key: PublicKey,
    ) -> Self {
        Self {
            chain_id: network.chain_id,
            acl_address: network.acl_address,
            rpc_url: network.rpc_url.clone(),
            key_id: key_id.into(),
            params,
            public_key,
        }
    }

    /// Build an instance from a serialized network public key
    pub fn from_public_key_bytes(
        network: &NetworkConfig,
        key_id: impl Into<String>,
        params: &FheParams,
        public_key: &[u8],
    ) -> Result<Self> {
        let params = params.build()?;
        let public_key = PublicKey::from_bytes(public_key, &params).map_err(|e| {
            SdkError::Initialization(format!("Error deserializing public key: {}", e))
        })?;
        Ok(Self::new(network, key_id, params, public_key))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn acl_address(&self) -> Address {
        self.acl_address
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn params(&self) -> &Arc<BfvParameters> {
        &self.params
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Encrypt a single value
    pub fn encrypt_value(&self, value: U256, ty: FheType) -> Result<EncryptedPayload> {
        self.encrypt(&[(value, ty)])
    }

    /// Pack all values into one ciphertext and derive one handle per value
    pub fn encrypt(&self, values: &[(U256, FheType)]) -> Result<EncryptedPayload> {
        if values.is_empty() {
            return Err(SdkError::validation("nothing to encrypt"));
        }
        if values.len() > MAX_VALUES_PER_INPUT {
            return Err(SdkError::validation(format!(
                "too many values in one input: {} (maximum {})",
                values.len(),
                MAX_VALUES_PER_INPUT
            )));
        }
        for (value, ty) in values {
            ty.check(*value)?;
        }

        let limbs = pack_limbs(values);
        if limbs.len() > self.params.degree() {
            return Err(SdkError::validation(format!(
                "input needs {} plaintext slots but the network supports {}",
                limbs.len(),
                self.params.degree()
            )));
        }

        let plaintext = Plaintext::try_encode(&limbs, Encoding::poly(), &self.params)
            .map_err(|e| SdkError::Encryption(format!("Error encoding plaintext: {}", e)))?;

        let ciphertext = self
            .public_key
            .try_encrypt(&plaintext, &mut thread_rng())
            .map_err(|e| SdkError::Encryption(format!("Error encrypting data: {}", e)))?;

        let data = ciphertext.to_bytes();
        let digest = keccak256(&data);
        let handles: Vec<B256> = values
            .iter()
            .enumerate()
            .map(|(index, (_, ty))| self.derive_handle(digest, index as u8, *ty))
            .collect();
        let proof = build_proof(&handles, &data);

        debug!(
            chain_id = self.chain_id,
            values = values.len(),
            ciphertext_bytes = data.len(),
            "encrypted input"
        );

        Ok(EncryptedPayload {
            data: Bytes::from(data),
            handles,
            proof,
        })
    }

    /// Handle layout: hash of the ciphertext binding, then index, chain id, type and version in
    /// the trailing bytes.
    fn derive_handle(&self, ciphertext_digest: B256, index: u8, ty: FheType) -> B256 {
        let chain_id = self.chain_id.to_be_bytes();

        let mut preimage = Vec::with_capacity(32 + 20 + 8 + 1);
        preimage.extend_from_slice(ciphertext_digest.as_slice());
        preimage.extend_from_slice(self.acl_address.as_slice());
        preimage.extend_from_slice(&chain_id);
        preimage.push(index);

        let mut handle = keccak256(&preimage).0;
        handle[21] = index;
        handle[22..30].copy_from_slice(&chain_id);
        handle[30] = ty.handle_code();
        handle[31] = HANDLE_VERSION;
        B256::from(handle)
    }
}

impl fmt::Debug for FheInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FheInstance")
            .field("chain_id", &self.chain_id)
            .field("acl_address", &self.acl_address)
            .field("rpc_url", &self.rpc_url)
            .field("key_id", &self.key_id)
            .field("degree", &self.params.degree())
            .finish_non_exhaustive()
    }
}

/// Split values into little endian 16 bit limbs, concatenated in order
pub fn pack_limbs(values: &[(U256, FheType)]) -> Vec<u64> {
    let mut limbs = Vec::with_capacity(values.iter().map(|(_, ty)| ty.limbs()).sum());
    for (value, ty) in values {
        let words = value.as_limbs();
        for i in 0..ty.limbs() {
            let word = words[i / LIMBS_PER_WORD];
            let shift = (i % LIMBS_PER_WORD) * LIMB_BITS;
            limbs.push((word >> shift) & LIMB_MASK);
        }
    }
    limbs
}

/// Inverse of [`pack_limbs`]
pub fn unpack_limbs(limbs: &[u64], types: &[FheType]) -> Result<Vec<U256>> {
    let needed: usize = types.iter().map(|ty| ty.limbs()).sum();
    if limbs.len() < needed {
        return Err(SdkError::validation(format!(
            "expected at least {} limbs, got {}",
            needed,
            limbs.len()
        )));
    }

    let mut offset = 0;
    let mut values = Vec::with_capacity(types.len());
    for ty in types {
        let mut value = U256::ZERO;
        for (i, limb) in limbs[offset..offset + ty.limbs()].iter().enumerate() {
            value |= U256::from(limb & LIMB_MASK) << (i * LIMB_BITS);
        }
        offset += ty.limbs();
        values.push(value);
    }
    Ok(values)
}

/// `numHandles ‖ handles ‖ sha256(ciphertext)`
fn build_proof(handles: &[B256], ciphertext: &[u8]) -> Bytes {
    let mut proof = Vec::with_capacity(1 + handles.len() * 32 + 32);
    proof.push(handles.len() as u8);
    for handle in handles {
        proof.extend_from_slice(handle.as_slice());
    }
    proof.extend_from_slice(&Sha256::digest(ciphertext));
    Bytes::from(proof)
}
