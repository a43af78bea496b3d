// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Client is not initialized. Call `initialize()` first.")]
    Uninitialized,

    #[error("Failed to initialize FHE instance: {0}")]
    Initialization(String),

    #[error("Gateway request failed: {status} {status_text}")]
    Gateway {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("Contract call failed: {0}")]
    Contract(String),
}

impl SdkError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SdkError::Validation(msg.into())
    }

    /// Whether repeating the same operation may succeed. Transport failures, timeouts, throttling
    /// and server side gateway errors are transient; everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            SdkError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SdkError::Timeout(_) => true,
            SdkError::Gateway { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result that returns a type T or an SdkError
pub type Result<T> = std::result::Result<T, SdkError>;
