// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Bytes, B256, U256};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, SdkError};
use crate::formatters::hexf;

/// Width of a plaintext limb. The network plaintext modulus must exceed `2^LIMB_BITS`.
pub const LIMB_BITS: usize = 16;

/// Encrypted integer types supported by the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FheType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Uint256,
}

impl FheType {
    pub const ALL: [FheType; 6] = [
        FheType::Uint8,
        FheType::Uint16,
        FheType::Uint32,
        FheType::Uint64,
        FheType::Uint128,
        FheType::Uint256,
    ];

    pub fn bits(&self) -> usize {
        match self {
            FheType::Uint8 => 8,
            FheType::Uint16 => 16,
            FheType::Uint32 => 32,
            FheType::Uint64 => 64,
            FheType::Uint128 => 128,
            FheType::Uint256 => 256,
        }
    }

    /// Largest value representable by the type: `2^bits - 1`
    pub fn max_value(&self) -> U256 {
        U256::MAX >> (256 - self.bits())
    }

    /// Type code stored in byte 30 of a handle
    pub fn handle_code(&self) -> u8 {
        match self {
            FheType::Uint8 => 2,
            FheType::Uint16 => 3,
            FheType::Uint32 => 4,
            FheType::Uint64 => 5,
            FheType::Uint128 => 6,
            FheType::Uint256 => 8,
        }
    }

    pub fn from_handle_code(code: u8) -> Option<Self> {
        FheType::ALL.into_iter().find(|ty| ty.handle_code() == code)
    }

    /// Number of plaintext limbs a value of this type occupies
    pub fn limbs(&self) -> usize {
        (self.bits() / LIMB_BITS).max(1)
    }

    /// Check that `value` fits the type
    pub fn check(&self, value: U256) -> Result<()> {
        let max = self.max_value();
        if value > max {
            return Err(SdkError::validation(format!(
                "value {} exceeds {} maximum of {}",
                value, self, max
            )));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FheType::Uint8 => "uint8",
            FheType::Uint16 => "uint16",
            FheType::Uint32 => "uint32",
            FheType::Uint64 => "uint64",
            FheType::Uint128 => "uint128",
            FheType::Uint256 => "uint256",
        }
    }
}

impl fmt::Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FheType {
    type Err = SdkError;

    /// Accepts `uint32`, `u32` and `euint32`, case insensitive
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let bare = normalized
            .strip_prefix("euint")
            .or_else(|| normalized.strip_prefix("uint"))
            .or_else(|| normalized.strip_prefix('u'));

        bare.and_then(|bits| bits.parse::<usize>().ok())
            .and_then(|bits| FheType::ALL.into_iter().find(|ty| ty.bits() == bits))
            .ok_or_else(|| {
                SdkError::validation(format!(
                    "unsupported type '{}'. Expected one of uint8, uint16, uint32, uint64, uint128, uint256",
                    s
                ))
            })
    }
}

/// Parse a clear integer given as decimal or `0x` prefixed hex. Negative values are rejected.
pub fn parse_clear_value(input: &str) -> Result<U256> {
    let input = input.trim();
    if input.starts_with('-') {
        return Err(SdkError::validation(format!(
            "value must be non-negative, got {}",
            input
        )));
    }
    U256::from_str(input).map_err(|e| {
        SdkError::validation(format!("'{}' is not a valid unsigned integer: {}", input, e))
    })
}

/// Output of an encryption call, ready to be passed to a contract
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    /// Serialized ciphertext
    pub data: Bytes,
    /// One handle per encrypted value, in insertion order
    pub handles: Vec<B256>,
    /// Input proof binding the handles to the ciphertext
    pub proof: Bytes,
}

impl fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Hex<'a>(&'a [u8]);
        impl fmt::Debug for Hex<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                hexf(self.0, f)
            }
        }

        f.debug_struct("EncryptedPayload")
            .field("data", &Hex(&self.data))
            .field("handles", &self.handles)
            .field("proof", &Hex(&self.proof))
            .finish()
    }
}

/// Identifies a ciphertext to decrypt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptTarget {
    pub contract_address: Address,
    pub handle: B256,
}

impl DecryptTarget {
    pub fn new(contract_address: Address, handle: B256) -> Self {
        Self {
            contract_address,
            handle,
        }
    }
}
