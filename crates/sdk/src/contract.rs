// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    contract::{ContractInstance, Interface},
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::{Function, JsonAbi},
    network::EthereumWallet,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use std::marker::PhantomData;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::{Result, SdkError};

const ROYALTY_REGISTRY_ABI: &str = include_str!("../abi/RoyaltyRegistry.json");

/// ABI of the music royalty registry contract
pub fn royalty_registry_abi() -> Result<JsonAbi> {
    parse_abi(ROYALTY_REGISTRY_ABI)
}

/// Parse either a bare ABI array or a build artifact with an `abi` field
pub fn parse_abi(json: &str) -> Result<JsonAbi> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| SdkError::Contract(format!("ABI is not valid JSON: {}", e)))?;
    let abi = match value {
        serde_json::Value::Object(mut artifact) => artifact
            .remove("abi")
            .ok_or_else(|| SdkError::Contract("artifact has no `abi` field".to_string()))?,
        other => other,
    };
    serde_json::from_value(abi).map_err(|e| SdkError::Contract(format!("invalid ABI: {}", e)))
}

pub async fn load_abi(path: impl AsRef<Path>) -> Result<JsonAbi> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        SdkError::Contract(format!("could not read ABI {}: {}", path.display(), e))
    })?;
    parse_abi(&json)
}

/// Pick the overload of `method` that takes `arg_count` arguments
pub fn resolve_function<'a>(abi: &'a JsonAbi, method: &str, arg_count: usize) -> Result<&'a Function> {
    let overloads = abi
        .function(method)
        .ok_or_else(|| SdkError::Contract(format!("method '{}' not found in ABI", method)))?;

    overloads
        .iter()
        .find(|f| f.inputs.len() == arg_count)
        .ok_or_else(|| {
            let arities: Vec<String> = overloads.iter().map(|f| f.inputs.len().to_string()).collect();
            SdkError::Contract(format!(
                "method '{}' takes {} argument(s), got {}",
                method,
                arities.join(" or "),
                arg_count
            ))
        })
}

/// Convert string arguments to the types the function declares
pub fn coerce_args(function: &Function, args: &[String]) -> Result<Vec<DynSolValue>> {
    function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param.resolve().map_err(|e| {
                SdkError::Contract(format!("unsupported parameter type {}: {}", param.ty, e))
            })?;
            ty.coerce_str(arg).map_err(|e| {
                SdkError::validation(format!(
                    "argument '{}' is not a valid {} for {}: {}",
                    arg,
                    param.ty,
                    if param.name.is_empty() { "parameter" } else { &param.name },
                    e
                ))
            })
        })
        .collect()
}

/// Render a decoded value for display
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        DynSolValue::Address(address) => address.to_checksum(None),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => format!(
            "[{}]",
            items.iter().map(format_value).collect::<Vec<_>>().join(", ")
        ),
        DynSolValue::Tuple(items) => format!(
            "({})",
            items.iter().map(format_value).collect::<Vec<_>>().join(", ")
        ),
        other => format!("{:?}", other),
    }
}

pub trait Access: Send + Sync {}

/// Marker for a contract that can only be read
#[derive(Clone, Debug)]
pub struct ReadOnly;
impl Access for ReadOnly {}

/// Marker for a contract that can also send transactions
#[derive(Clone, Debug)]
pub struct ReadWrite;
impl Access for ReadWrite {}

/// Contract described only by its JSON ABI
#[derive(Clone)]
pub struct DynamicContract<T: Access> {
    address: Address,
    provider: DynProvider,
    abi: JsonAbi,
    _marker: PhantomData<T>,
}

impl DynamicContract<ReadOnly> {
    pub async fn read_only(rpc_url: &str, address: Address, abi: JsonAbi) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| SdkError::Contract(format!("could not connect to {}: {}", rpc_url, e)))?
            .erased();

        Ok(Self {
            address,
            provider,
            abi,
            _marker: PhantomData,
        })
    }
}

impl DynamicContract<ReadWrite> {
    pub async fn new(
        rpc_url: &str,
        signer: PrivateKeySigner,
        address: Address,
        abi: JsonAbi,
    ) -> Result<Self> {
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(rpc_url)
            .await
            .map_err(|e| SdkError::Contract(format!("could not connect to {}: {}", rpc_url, e)))?
            .erased();

        Ok(Self {
            address,
            provider,
            abi,
            _marker: PhantomData,
        })
    }

    /// Send a transaction and wait for its receipt
    pub async fn send(&self, method: &str, args: &[String]) -> Result<TxHash> {
        self.send_with_value(method, args, U256::ZERO).await
    }

    #[instrument(skip_all, fields(contract = %self.address, method = %method))]
    pub async fn send_with_value(
        &self,
        method: &str,
        args: &[String],
        value: U256,
    ) -> Result<TxHash> {
        let (function, values) = self.prepare(method, args)?;
        let instance = self.instance();
        let call = instance
            .function_from_selector(&function.selector(), &values)
            .map_err(|e| SdkError::Contract(e.to_string()))?
            .value(value);

        let pending = call
            .send()
            .await
            .map_err(|e| SdkError::Contract(format!("{} failed: {}", method, e)))?;
        debug!("Submitted {}: {}", method, pending.tx_hash());

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| SdkError::Contract(format!("{} was not mined: {}", method, e)))?;

        if !receipt.status() {
            return Err(SdkError::Contract(format!(
                "{} reverted in transaction {}",
                method, receipt.transaction_hash
            )));
        }

        info!("{} mined in {}", method, receipt.transaction_hash);
        Ok(receipt.transaction_hash)
    }
}

impl<T: Access> DynamicContract<T> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    fn instance(&self) -> ContractInstance<DynProvider> {
        ContractInstance::new(
            self.address,
            self.provider.clone(),
            Interface::new(self.abi.clone()),
        )
    }

    fn prepare(&self, method: &str, args: &[String]) -> Result<(Function, Vec<DynSolValue>)> {
        let function = resolve_function(&self.abi, method, args.len())?;
        let values = coerce_args(function, args)?;
        Ok((function.clone(), values))
    }

    /// Call a method without sending a transaction
    #[instrument(skip_all, fields(contract = %self.address, method = %method))]
    pub async fn read(&self, method: &str, args: &[String]) -> Result<Vec<DynSolValue>> {
        let (function, values) = self.prepare(method, args)?;
        let instance = self.instance();
        instance
            .function_from_selector(&function.selector(), &values)
            .map_err(|e| SdkError::Contract(e.to_string()))?
            .call()
            .await
            .map_err(|e| SdkError::Contract(format!("{} call failed: {}", method, e)))
    }
}
