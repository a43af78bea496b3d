// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

#![allow(dead_code)]

use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use async_trait::async_trait;
use fhe::bfv::{PublicKey, SecretKey};
use fhe_traits::Serialize as FheSerialize;
use fhevm_sdk::{FheInstance, FheParams, InstanceFactory, NetworkConfig, Result};
use rand::rngs::OsRng;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Builds instances locally and counts how often it is asked to
#[derive(Default)]
pub struct CountingFactory {
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl CountingFactory {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstanceFactory for CountingFactory {
    async fn create(&self, network: &NetworkConfig) -> Result<FheInstance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let params = FheParams::insecure_512().build()?;
        let sk = SecretKey::random(&params, &mut OsRng);
        let pk = PublicKey::new(&sk, &mut OsRng);
        Ok(FheInstance::new(network, "local", params, pk))
    }
}

pub fn network(chain_id: u64) -> NetworkConfig {
    NetworkConfig {
        chain_id,
        ..NetworkConfig::default()
    }
}

/// In-process stand-in for the decryption gateway
pub struct MockGateway {
    /// Status returned by the decrypt routes, 200 when unset
    pub decrypt_status: Option<u16>,
    pub value: String,
    pub decrypt_calls: AtomicUsize,
    pub public_decrypt_calls: AtomicUsize,
    pub requests: Mutex<Vec<Value>>,
    /// Key material served at `/keyurl` and `/pk`
    pub params: FheParams,
    pub public_key: Vec<u8>,
    /// Status returned by `/keyurl` for its first `keyurl_failures` requests
    pub keyurl_failures: usize,
    pub keyurl_status: u16,
    pub keyurl_calls: AtomicUsize,
}

impl MockGateway {
    pub fn returning(value: &str) -> Self {
        Self {
            decrypt_status: None,
            value: value.to_string(),
            decrypt_calls: AtomicUsize::new(0),
            public_decrypt_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            params: FheParams::insecure_512(),
            public_key: Vec::new(),
            keyurl_failures: 0,
            keyurl_status: 503,
            keyurl_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            decrypt_status: Some(status),
            ..Self::returning("0")
        }
    }

    /// Serve a freshly generated network key and return its secret half
    pub fn with_network_key(mut self) -> (Self, SecretKey) {
        let params = self.params.build().unwrap();
        let sk = SecretKey::random(&params, &mut OsRng);
        let pk = PublicKey::new(&sk, &mut OsRng);
        self.public_key = pk.to_bytes();
        (self, sk)
    }

    pub fn last_request(&self) -> Option<Value> {
        self.requests.lock().unwrap().last().cloned()
    }
}

fn decrypt_response(state: &MockGateway, body: Value) -> HttpResponse {
    state.requests.lock().unwrap().push(body);
    match state.decrypt_status {
        Some(status) => HttpResponse::build(StatusCode::from_u16(status).unwrap())
            .body("gateway unavailable"),
        None => HttpResponse::Ok().json(json!({ "value": state.value })),
    }
}

async fn decrypt(state: web::Data<MockGateway>, body: web::Json<Value>) -> HttpResponse {
    state.decrypt_calls.fetch_add(1, Ordering::SeqCst);
    decrypt_response(&state, body.into_inner())
}

async fn public_decrypt(state: web::Data<MockGateway>, body: web::Json<Value>) -> HttpResponse {
    state.public_decrypt_calls.fetch_add(1, Ordering::SeqCst);
    decrypt_response(&state, body.into_inner())
}

async fn key_url(state: web::Data<MockGateway>, req: HttpRequest) -> HttpResponse {
    let call = state.keyurl_calls.fetch_add(1, Ordering::SeqCst);
    if call < state.keyurl_failures {
        return HttpResponse::build(StatusCode::from_u16(state.keyurl_status).unwrap()).finish();
    }
    let host = req.connection_info().host().to_string();
    HttpResponse::Ok().json(json!({
        "keyId": "test-key",
        "publicKeyUrl": format!("http://{}/pk", host),
        "params": state.params,
    }))
}

async fn public_key(state: web::Data<MockGateway>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/octet-stream")
        .body(state.public_key.clone())
}

/// Start the mock on a free local port and return its base url
pub async fn start_gateway(gateway: MockGateway) -> anyhow::Result<(String, Arc<MockGateway>)> {
    let state = Arc::new(gateway);
    let data = web::Data::from(state.clone());

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/decrypt", web::post().to(decrypt))
            .route("/public-decrypt", web::post().to(public_decrypt))
            .route("/keyurl", web::get().to(key_url))
            .route("/pk", web::get().to(public_key))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))?;

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    Ok((format!("http://{}", addr), state))
}

pub fn network_with_gateway(chain_id: u64, gateway_url: &str) -> NetworkConfig {
    NetworkConfig {
        chain_id,
        gateway_url: gateway_url.to_string(),
        ..NetworkConfig::default()
    }
}
