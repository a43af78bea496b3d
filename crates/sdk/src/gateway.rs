// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Bytes, B256, U256};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use tracing::{debug, instrument};

use crate::error::{Result, SdkError};
use crate::instance::FheParams;
use fhevm_config::NetworkConfig;

pub const KEY_URL_ROUTE: &str = "keyurl";
pub const DECRYPT_ROUTE: &str = "decrypt";
pub const PUBLIC_DECRYPT_ROUTE: &str = "public-decrypt";

/// Body of a decryption request. The user fields are only set for authorized decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionRequest {
    pub contract_address: Address,
    pub handle: B256,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signature: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub public_key: Option<Bytes>,
}

impl DecryptionRequest {
    pub fn public(contract_address: Address, handle: B256) -> Self {
        Self {
            contract_address,
            handle,
            user_address: None,
            signature: None,
            public_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptionResponse {
    pub value: String,
}

/// Network key descriptor served at `/keyurl`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub key_id: String,
    pub public_key_url: String,
    pub params: FheParams,
}

/// Thin HTTP client for the decryption gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    client: Client,
}

impl GatewayClient {
    pub fn new(gateway_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: gateway_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Client for the gateway of a validated network
    pub fn for_network(network: &NetworkConfig, timeout: Duration) -> Result<Self> {
        network
            .validate()
            .map_err(|e| SdkError::Configuration(format!("{:#}", e)))?;
        let endpoint = network
            .gateway()
            .map_err(|e| SdkError::Configuration(format!("{:#}", e)))?;
        Self::new(endpoint.url().as_str(), timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn route(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    #[instrument(skip_all, fields(handle = %request.handle))]
    pub async fn decrypt(&self, request: &DecryptionRequest) -> Result<U256> {
        self.post_decrypt(DECRYPT_ROUTE, request).await
    }

    #[instrument(skip_all, fields(handle = %request.handle))]
    pub async fn public_decrypt(&self, request: &DecryptionRequest) -> Result<U256> {
        self.post_decrypt(PUBLIC_DECRYPT_ROUTE, request).await
    }

    pub async fn fetch_key_info(&self) -> Result<KeyInfo> {
        let response = self
            .client
            .get(self.route(KEY_URL_ROUTE))
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        response
            .json::<KeyInfo>()
            .await
            .map_err(|e| SdkError::InvalidResponse(format!("malformed key info: {}", e)))
    }

    /// Download raw bytes, e.g. the serialized network public key
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await.map_err(map_transport)?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await.map_err(map_transport)?;
        debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    async fn post_decrypt(&self, route: &str, request: &DecryptionRequest) -> Result<U256> {
        let url = self.route(route);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;

        let body: DecryptionResponse = response
            .json()
            .await
            .map_err(|e| SdkError::InvalidResponse(format!("malformed decryption response: {}", e)))?;

        parse_decrypted_value(&body.value)
    }
}

/// Gateway values come back as decimal or `0x` prefixed hex strings
pub fn parse_decrypted_value(value: &str) -> Result<U256> {
    U256::from_str(value.trim()).map_err(|e| {
        SdkError::InvalidResponse(format!("'{}' is not an unsigned integer: {}", value, e))
    })
}

fn map_transport(err: reqwest::Error) -> SdkError {
    if err.is_timeout() {
        SdkError::Timeout(format!("gateway request timed out: {}", err))
    } else {
        SdkError::Http(err)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SdkError::Gateway {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = DecryptionRequest {
            contract_address: address!("00000000000000000000000000000000000000aa"),
            handle: B256::repeat_byte(1),
            user_address: Some(address!("00000000000000000000000000000000000000bb")),
            signature: Some(Bytes::from(vec![1, 2])),
            public_key: None,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("contractAddress").is_some());
        assert!(json.get("userAddress").is_some());
        assert_eq!(json["signature"], "0x0102");
        assert!(json.get("publicKey").is_none());
    }

    #[test]
    fn test_public_request_has_no_user_fields() {
        let request = DecryptionRequest::public(Address::ZERO, B256::ZERO);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_decrypted_value() {
        assert_eq!(parse_decrypted_value("42").unwrap(), U256::from(42));
        assert_eq!(parse_decrypted_value("0xff").unwrap(), U256::from(255));
        assert!(matches!(
            parse_decrypted_value("nope"),
            Err(SdkError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_key_info_shape() {
        let info: KeyInfo = serde_json::from_str(
            r#"{"keyId":"k1","publicKeyUrl":"http://localhost/pk","params":{"degree":512,"plaintextModulus":68719403009,"moduli":[2251799813554177]}}"#,
        )
        .unwrap();
        assert_eq!(info.key_id, "k1");
        assert_eq!(info.params, FheParams::insecure_512());
    }

    #[test]
    fn test_for_network_uses_the_gateway_endpoint() {
        let network = NetworkConfig {
            gateway_url: "http://127.0.0.1:7077".to_string(),
            ..NetworkConfig::default()
        };
        let client = GatewayClient::for_network(&network, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:7077");
        assert_eq!(
            client.route(PUBLIC_DECRYPT_ROUTE),
            "http://127.0.0.1:7077/public-decrypt"
        );

        let network = NetworkConfig {
            gateway_url: "ws://127.0.0.1:7077".to_string(),
            ..NetworkConfig::default()
        };
        assert!(matches!(
            GatewayClient::for_network(&network, Duration::from_secs(1)),
            Err(SdkError::Configuration(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = GatewayClient::new("http://localhost:7077/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.route(DECRYPT_ROUTE), "http://localhost:7077/decrypt");
    }
}
