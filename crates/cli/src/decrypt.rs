// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, B256};
use anyhow::Result;
use fhevm_config::FhevmConfig;
use fhevm_sdk::{DecryptTarget, FheType};
use tracing::info;
use zeroize::Zeroizing;

use crate::helpers::{build_client, resolve_private_key, signer_from_key};

pub async fn execute(
    config: &FhevmConfig,
    handle: B256,
    contract: Option<Address>,
    key: Option<Zeroizing<String>>,
    public: bool,
) -> Result<()> {
    let contract = match contract {
        Some(contract) => contract,
        None => config.contract_address()?,
    };

    if let Some(ty) = FheType::from_handle_code(handle[30]) {
        info!("Handle holds an encrypted {}", ty);
    }

    let client = build_client(config)?;
    let target = DecryptTarget::new(contract, handle);

    let value = if public {
        client.public_decrypt(target).await?
    } else {
        let key = resolve_private_key(key, config)?;
        let signer = signer_from_key(&key)?;
        client.decrypt(target, &signer).await?
    };

    println!("{}", value);
    Ok(())
}
