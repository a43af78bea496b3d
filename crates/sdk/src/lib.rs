// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod authorization;
mod cache;
mod client;
pub mod contract;
mod error;
mod factory;
pub mod formatters;
pub mod gateway;
mod input;
pub mod instance;
pub mod retry;
mod types;

pub use authorization::{PublicKeyStore, SessionPublicKey};
pub use cache::InstanceCache;
pub use client::{ClientState, FhevmClient, FhevmClientBuilder, DEFAULT_REQUEST_TIMEOUT};
pub use contract::{DynamicContract, ReadOnly, ReadWrite};
pub use error::{Result, SdkError};
pub use factory::{GatewayInstanceFactory, InstanceFactory};
pub use gateway::GatewayClient;
pub use input::EncryptedInput;
pub use instance::{FheInstance, FheParams};
pub use types::*;

pub use fhevm_config::NetworkConfig;
