// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use fhevm_config::FhevmConfig;
use fhevm_sdk::{FhevmClient, PublicKeyStore};
use std::sync::Arc;
use zeroize::{Zeroize, Zeroizing};

pub mod prompt_password;
pub mod telemetry;

/// Parse to a Zeroizing String
pub fn parse_zeroizing(s: &str) -> Result<Zeroizing<String>> {
    Ok(Zeroizing::new(s.to_string()))
}

/// Normalize a private key to the form 0x12435687abcdef...
pub fn ensure_hex_zeroizing(s: &str) -> Result<Zeroizing<String>> {
    let s = s.trim();
    let digits = s.strip_prefix("0x").unwrap_or(s);
    ensure_hex(digits)?;
    parse_zeroizing(&format!("0x{}", digits))
}

/// Ensure a 32 byte hexadecimal key
fn ensure_hex(digits: &str) -> Result<()> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("private key must only contain hex characters [0-9a-fA-F]");
    }
    if digits.len() != 64 {
        bail!("private key must be 32 bytes (64 hex characters)");
    }
    hex::decode(digits)?.zeroize();
    Ok(())
}

pub fn signer_from_key(key: &Zeroizing<String>) -> Result<PrivateKeySigner> {
    key.parse::<PrivateKeySigner>()
        .context("Could not build a signer from the private key")
}

/// The key given on the command line, else PRIVATE_KEY from the environment or config file,
/// else ask for it
pub fn resolve_private_key(
    given: Option<Zeroizing<String>>,
    config: &FhevmConfig,
) -> Result<Zeroizing<String>> {
    if let Some(key) = given {
        return Ok(key);
    }
    if let Ok(key) = config.private_key() {
        return ensure_hex_zeroizing(key).context("PRIVATE_KEY is not a valid private key");
    }
    prompt_password::prompt_private_key()
}

/// Client for the configured network. Session keys are kept in the configured key directory.
pub fn build_client(config: &FhevmConfig) -> Result<FhevmClient> {
    let keys = match config.key_dir() {
        Some(dir) => PublicKeyStore::persistent(dir),
        None => PublicKeyStore::in_memory(),
    };

    let client = FhevmClient::builder(config.network()?)
        .with_request_timeout(config.request_timeout())
        .with_signature_timeout(config.signature_timeout())
        .with_key_store(Arc::new(keys))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_key_is_normalized() -> Result<()> {
        assert_eq!(*ensure_hex_zeroizing(KEY)?, format!("0x{}", KEY));
        assert_eq!(*ensure_hex_zeroizing(&format!("0x{}", KEY))?, format!("0x{}", KEY));
        Ok(())
    }

    #[test]
    fn test_bad_keys_are_rejected() {
        assert!(ensure_hex_zeroizing("0x1234").is_err());
        assert!(ensure_hex_zeroizing(&"z".repeat(64)).is_err());
    }

    #[test]
    fn test_key_precedence() -> Result<()> {
        let mut config = FhevmConfig::default();
        config.private_key = Some(KEY.to_string());
        let key = resolve_private_key(None, &config)?;
        let signer = signer_from_key(&key)?;
        assert_eq!(
            signer.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );

        let given = ensure_hex_zeroizing(&"11".repeat(32))?;
        assert_eq!(*resolve_private_key(Some(given), &config)?, format!("0x{}", "11".repeat(32)));
        Ok(())
    }
}
