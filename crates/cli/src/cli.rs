// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use crate::helpers::ensure_hex_zeroizing;
use crate::helpers::telemetry::setup_tracing;
use crate::{contract, decrypt, encrypt};
use alloy::primitives::{Address, B256};
use anyhow::Result;
use clap::{command, ArgAction, Args, Parser, Subcommand};
use fhevm_config::validation::ValidUrl;
use fhevm_config::{load_config, ConfigOverrides, FhevmConfig};
use fhevm_sdk::FheType;
use tracing::{info, instrument, warn, Level};
use zeroize::Zeroizing;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "fhevm")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Encrypt inputs, decrypt handles and call contracts on an FHEVM network", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `fhevm -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Set the Open Telemetry collector grpc endpoint. Eg. http://localhost:4317
    #[arg(long = "otel", global = true)]
    pub otel: Option<ValidUrl>,
}

/// Network selection shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Chain id of the network
    #[arg(long = "network", short = 'n')]
    pub network: Option<u64>,

    /// JSON-RPC endpoint
    #[arg(long = "rpc")]
    pub rpc: Option<ValidUrl>,

    /// Decryption gateway endpoint
    #[arg(long = "gateway")]
    pub gateway: Option<ValidUrl>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        let network = self.command.network_args();
        ConfigOverrides {
            network_id: network.network,
            rpc_url: network.rpc.clone().map(Into::into),
            gateway_url: network.gateway.clone().map(Into::into),
            otel: self.otel.clone().map(Into::into),
        }
    }

    pub fn load_config(&self) -> Result<FhevmConfig> {
        load_config(self.config.clone(), self.overrides())
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = self.load_config()?;

        let provider = setup_tracing(config.otel(), self.log_level())?;
        info!("Config loaded from: {:?}", config.config_file());

        let result = self.run(&config).await;

        // Flush spans still queued in the batch exporter
        if let Some(provider) = provider {
            if let Err(e) = provider.shutdown() {
                warn!("Failed to shut down tracer provider: {}", e);
            }
        }

        result
    }

    async fn run(self, config: &FhevmConfig) -> Result<()> {
        match self.command {
            Commands::Encrypt { value, ty, .. } => encrypt::execute(config, &value, ty).await?,
            Commands::Decrypt {
                handle,
                contract,
                key,
                public,
                ..
            } => decrypt::execute(config, handle, contract, key, public).await?,
            Commands::Contract {
                address,
                method,
                args,
                abi,
                read,
                key,
                value,
                ..
            } => {
                contract::execute(
                    config,
                    contract::ContractCall {
                        address,
                        method,
                        args,
                        abi,
                        read,
                        value,
                    },
                    key,
                )
                .await?
            }
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt a value and print the payload to pass to a contract
    Encrypt {
        /// The clear value, decimal or 0x prefixed hex
        value: String,

        /// Encrypted type: uint8, uint16, uint32, uint64, uint128 or uint256
        #[arg(long = "type", short = 't', default_value = "uint32")]
        ty: FheType,

        #[command(flatten)]
        network: NetworkArgs,
    },

    /// Decrypt a handle through the gateway
    Decrypt {
        /// The 32 byte handle
        handle: B256,

        /// Contract holding the handle. Defaults to the configured contract address
        #[arg(long)]
        contract: Option<Address>,

        /// Private key authorizing the decryption. Defaults to PRIVATE_KEY, else you are asked
        #[arg(long, value_parser = ensure_hex_zeroizing)]
        key: Option<Zeroizing<String>>,

        /// Request public decryption, no key needed
        #[arg(long, conflicts_with = "key")]
        public: bool,

        #[command(flatten)]
        network: NetworkArgs,
    },

    /// Call a contract method
    Contract {
        /// Contract address
        address: Address,

        /// Method name
        method: String,

        /// Method arguments in ABI order
        #[arg(long, num_args = 1..)]
        args: Vec<String>,

        /// JSON ABI file, either a bare ABI or a build artifact. Defaults to the royalty registry
        #[arg(long)]
        abi: Option<PathBuf>,

        /// Call without sending a transaction
        #[arg(long)]
        read: bool,

        /// Private key sending the transaction. Defaults to PRIVATE_KEY, else you are asked
        #[arg(long, value_parser = ensure_hex_zeroizing, conflicts_with = "read")]
        key: Option<Zeroizing<String>>,

        /// Wei to send along with the transaction
        #[arg(long, conflicts_with = "read")]
        value: Option<String>,

        #[command(flatten)]
        network: NetworkArgs,
    },
}

impl Commands {
    pub fn network_args(&self) -> &NetworkArgs {
        match self {
            Commands::Encrypt { network, .. }
            | Commands::Decrypt { network, .. }
            | Commands::Contract { network, .. } => network,
        }
    }
}
