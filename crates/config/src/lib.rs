// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod endpoint;
mod fhevm_config;
pub mod locate;
pub mod network;
pub mod validation;

pub use endpoint::*;
pub use fhevm_config::*;
pub use network::*;
