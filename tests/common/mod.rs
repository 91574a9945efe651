//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use guarded_backend::config::AppConfig;
use guarded_backend::http::{AppState, HttpServer};
use guarded_backend::lifecycle::Shutdown;
use serde_json::Value;
use tokio::net::TcpListener;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Default config with a fixed secret.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.secret = Some(TEST_SECRET.to_string());
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// A backend running on an ephemeral port. Shuts down on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn start(config: AppConfig) -> Self {
        let state = AppState::from_config(&config).expect("state");
        Self::start_with_state(config, state).await
    }

    pub async fn start_with_state(config: AppConfig, state: AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        let server = HttpServer::with_state(config, state);

        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();

        Self {
            addr,
            client,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Log in and return the issued token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let res = self
            .client
            .post(self.url("/api/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200, "login as {username} failed");

        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn get_time(&self, token: &str) -> reqwest::Response {
        self.client
            .get(self.url("/api/time"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Read the `message` field of an error body.
pub async fn message(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["message"].as_str().unwrap_or_default().to_string()
}
