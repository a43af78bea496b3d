// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Context, Result};
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Ws,
    Wss,
}

impl Scheme {
    pub fn is_websocket(&self) -> bool {
        matches!(self, Scheme::Ws | Scheme::Wss)
    }
}

/// A validated network endpoint. Chain RPC endpoints may use any of http(s)/ws(s); gateway
/// endpoints are plain http(s).
#[derive(Clone, Debug)]
pub struct Endpoint {
    scheme: Scheme,
    url: Url,
}

impl Endpoint {
    /// Parse a chain RPC endpoint
    pub fn rpc(url: &str) -> Result<Self> {
        Self::parse(url)
    }

    /// Parse a gateway endpoint. Only http(s) is accepted.
    pub fn gateway(url: &str) -> Result<Self> {
        let endpoint = Self::parse(url)?;
        if endpoint.scheme.is_websocket() {
            bail!("Gateway URL must use http:// or https://, got '{}'", url);
        }
        Ok(endpoint)
    }

    fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).context(format!("Invalid URL format: '{}'", url))?;
        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            "ws" => Scheme::Ws,
            "wss" => Scheme::Wss,
            _ => bail!("Invalid protocol. Expected: http://, https://, ws://, wss://"),
        };

        if parsed.host_str().is_none() {
            bail!("URL must contain a host");
        }

        Ok(Endpoint {
            scheme,
            url: parsed,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}
