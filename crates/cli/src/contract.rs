// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use anyhow::Result;
use fhevm_config::FhevmConfig;
use fhevm_sdk::contract::{format_value, load_abi, royalty_registry_abi};
use fhevm_sdk::{parse_clear_value, DynamicContract};
use std::path::PathBuf;
use zeroize::Zeroizing;

use crate::helpers::{resolve_private_key, signer_from_key};

#[derive(Debug)]
pub struct ContractCall {
    pub address: Address,
    pub method: String,
    pub args: Vec<String>,
    pub abi: Option<PathBuf>,
    pub read: bool,
    pub value: Option<String>,
}

pub async fn execute(
    config: &FhevmConfig,
    call: ContractCall,
    key: Option<Zeroizing<String>>,
) -> Result<()> {
    let abi = match &call.abi {
        Some(path) => load_abi(path).await?,
        None => royalty_registry_abi()?,
    };
    let rpc = config.network()?.rpc()?;
    let rpc_url = rpc.url().as_str();

    if call.read {
        let contract = DynamicContract::read_only(rpc_url, call.address, abi).await?;
        for output in contract.read(&call.method, &call.args).await? {
            println!("{}", format_value(&output));
        }
        return Ok(());
    }

    let value = call
        .value
        .as_deref()
        .map(parse_clear_value)
        .transpose()?
        .unwrap_or_default();

    let key = resolve_private_key(key, config)?;
    let signer = signer_from_key(&key)?;
    let contract = DynamicContract::new(rpc_url, signer, call.address, abi).await?;
    let tx_hash = contract
        .send_with_value(&call.method, &call.args, value)
        .await?;

    println!("{}", tx_hash);
    Ok(())
}
