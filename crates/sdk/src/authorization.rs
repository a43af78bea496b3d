// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Signatures that authorize the gateway to decrypt a handle for a user.
//!
//! A decryption request carries two signatures made by the user's wallet:
//!
//! * a session public key, an EIP-191 signature over `"FHEVM public key for <address>"`, and
//! * an EIP-712 [`Authorization`] binding that session key to one handle on one contract.
//!
//! The session public key is an opaque identifier derived from a signature. It is NOT an
//! encryption key and gives the request no confidentiality; the gateway only uses it to tie the
//! authorization to the session.

use alloy::primitives::{Address, Bytes, Signature, B256, U256};
use alloy::signers::Signer;
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use core::fmt;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{Result, SdkError};
use crate::formatters::hexf;

pub const AUTHORIZATION_DOMAIN_NAME: &str = "Authorization";
pub const AUTHORIZATION_DOMAIN_VERSION: &str = "1";

sol! {
    /// EIP-712 payload signed by the user to allow decryption of `handle`
    #[derive(Debug, PartialEq, Eq)]
    struct Authorization {
        bytes publicKey;
        uint256 handle;
    }
}

/// Opaque per-session identifier sent alongside decryption requests
#[derive(Clone, PartialEq, Eq)]
pub struct SessionPublicKey(pub Bytes);

impl SessionPublicKey {
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl fmt::Debug for SessionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionPublicKey(")?;
        hexf(&self.0, f)?;
        f.write_str(")")
    }
}

pub fn public_key_message(address: Address) -> String {
    format!("FHEVM public key for {}", address)
}

pub fn authorization_domain(chain_id: u64, contract: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(AUTHORIZATION_DOMAIN_NAME)),
        Some(Cow::Borrowed(AUTHORIZATION_DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(contract),
        None,
    )
}

/// EIP-712 signing hash of the authorization for `handle`
pub fn authorization_hash(
    chain_id: u64,
    contract: Address,
    handle: B256,
    public_key: &SessionPublicKey,
) -> B256 {
    let message = Authorization {
        publicKey: public_key.0.clone(),
        handle: U256::from_be_bytes(handle.0),
    };
    message.eip712_signing_hash(&authorization_domain(chain_id, contract))
}

/// Ask the signer for the session public key
pub async fn generate_public_key<S>(signer: &S) -> Result<SessionPublicKey>
where
    S: Signer + Send + Sync + ?Sized,
{
    let message = public_key_message(signer.address());
    let signature = signer
        .sign_message(message.as_bytes())
        .await
        .map_err(|e| SdkError::Signing(format!("Failed to sign public key message: {}", e)))?;

    Ok(SessionPublicKey(Bytes::from(signature.as_bytes().to_vec())))
}

/// Sign the EIP-712 authorization allowing the gateway to decrypt `handle` for the signer
pub async fn create_authorization<S>(
    signer: &S,
    chain_id: u64,
    contract: Address,
    handle: B256,
    public_key: &SessionPublicKey,
) -> Result<Signature>
where
    S: Signer + Send + Sync + ?Sized,
{
    let hash = authorization_hash(chain_id, contract, handle, public_key);
    signer
        .sign_hash(&hash)
        .await
        .map_err(|e| SdkError::Signing(format!("Failed to sign authorization: {}", e)))
}

/// Recover who signed an authorization
pub fn recover_authorizer(
    signature: &Signature,
    chain_id: u64,
    contract: Address,
    handle: B256,
    public_key: &SessionPublicKey,
) -> Result<Address> {
    let hash = authorization_hash(chain_id, contract, handle, public_key);
    signature
        .recover_address_from_prehash(&hash)
        .map_err(|e| SdkError::Signing(format!("Failed to recover signer address: {}", e)))
}

type KeySlot = Arc<OnceCell<SessionPublicKey>>;

/// Remembers session public keys per address so the wallet is asked once per session.
/// With a key directory the keys also survive restarts. Disk access is best effort.
///
/// Concurrent requests for the same address share one signature prompt.
#[derive(Debug, Default)]
pub struct PublicKeyStore {
    dir: Option<PathBuf>,
    keys: Mutex<HashMap<Address, KeySlot>>,
}

impl PublicKeyStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            keys: Mutex::default(),
        }
    }

    fn key_path(&self, address: Address) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.pubkey", hex::encode(address))))
    }

    fn keys(&self) -> MutexGuard<'_, HashMap<Address, KeySlot>> {
        match self.keys.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, address: Address) -> Option<SessionPublicKey> {
        self.keys()
            .get(&address)
            .and_then(|slot| slot.get().cloned())
    }

    /// Forget the key for `address`, in memory and on disk
    pub async fn remove(&self, address: Address) {
        self.keys().remove(&address);
        if let Some(path) = self.key_path(address) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove session key {}: {}", path.display(), e);
                }
            }
        }
    }

    async fn load(&self, address: Address) -> Option<SessionPublicKey> {
        let path = self.key_path(address)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read session key {}: {}", path.display(), e);
                return None;
            }
        };
        match hex::decode(contents.trim().trim_start_matches("0x")) {
            Ok(bytes) if !bytes.is_empty() => Some(SessionPublicKey(Bytes::from(bytes))),
            _ => {
                warn!("Ignoring malformed session key {}", path.display());
                None
            }
        }
    }

    async fn store(&self, address: Address, key: &SessionPublicKey) {
        let Some(path) = self.key_path(address) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!("Could not create key directory {}: {}", parent.display(), e);
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&path, hex::encode(&key.0)).await {
            warn!("Could not persist session key {}: {}", path.display(), e);
        }
    }

    /// Session key for the signer, generating and remembering it on first use. A failed
    /// signature leaves nothing behind.
    pub async fn get_or_generate<S>(&self, signer: &S) -> Result<SessionPublicKey>
    where
        S: Signer + Send + Sync + ?Sized,
    {
        let address = signer.address();
        let slot = self.keys().entry(address).or_default().clone();

        let key = slot
            .get_or_try_init(|| async {
                if let Some(key) = self.load(address).await {
                    debug!("Loaded session key for {}", address);
                    return Ok(key);
                }
                let key = generate_public_key(signer).await?;
                self.store(address, &key).await;
                Ok::<_, SdkError>(key)
            })
            .await?;

        Ok(key.clone())
    }
}
