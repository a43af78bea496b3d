// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use fhevm_config::FhevmConfig;
use fhevm_sdk::{parse_clear_value, EncryptedPayload, FheType};
use serde::Serialize;

use crate::helpers::build_client;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncryptOutput<'a> {
    chain_id: u64,
    #[serde(rename = "type")]
    ty: FheType,
    #[serde(flatten)]
    payload: &'a EncryptedPayload,
}

pub async fn execute(config: &FhevmConfig, value: &str, ty: FheType) -> Result<()> {
    let value = parse_clear_value(value)?;
    ty.check(value)?;

    let client = build_client(config)?;
    client.initialize().await?;
    let payload = client.encrypt(value, ty)?;

    let output = EncryptOutput {
        chain_id: client.network().chain_id,
        ty,
        payload: &payload,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
