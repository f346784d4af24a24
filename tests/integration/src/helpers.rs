//! Test helpers for integration tests
//!
//! Spawning servers on ephemeral ports and making authenticated requests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use social_common::AppConfig;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the REST API against the configured database
    pub async fn start() -> Result<Self> {
        let state = social_api::create_app_state(test_config()?).await?;
        let app = social_api::create_app(state)?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            social_api::server::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url(), path)
    }

    /// GET a path outside `/api/v1`
    pub async fn get_raw(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    pub async fn post_auth<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    /// POST without a body
    pub async fn post_empty_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.post(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn put_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.put(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(token).send().await?)
    }
}

pub type GatewayClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Gateway server instance sharing the configured database
pub struct TestGateway {
    pub addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl TestGateway {
    pub async fn start() -> Result<Self> {
        let state = social_gateway::create_gateway_state(test_config()?).await?;
        let app = social_gateway::create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            social_gateway::server::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Connect, read HELLO, identify and return the socket with its READY payload
    pub async fn identify(&self, token: &str) -> Result<(GatewayClient, Value)> {
        let (mut socket, _) = connect_async(format!("ws://{}/gateway", self.addr)).await?;

        let hello = next_json(&mut socket).await?;
        anyhow::ensure!(hello["op"] == 10, "expected HELLO, got {hello}");

        let identify = json!({ "op": 2, "d": { "token": token } });
        socket.send(Message::Text(identify.to_string())).await?;

        let ready = next_json(&mut socket).await?;
        anyhow::ensure!(ready["t"] == "READY", "expected READY, got {ready}");

        Ok((socket, ready["d"].clone()))
    }
}

/// Next text frame as JSON, failing after five seconds
pub async fn next_json(socket: &mut GatewayClient) -> Result<Value> {
    let deadline = Duration::from_secs(5);
    loop {
        let frame = tokio::time::timeout(deadline, socket.next())
            .await?
            .ok_or_else(|| anyhow::anyhow!("socket closed"))??;
        if let Message::Text(text) = frame {
            return Ok(serde_json::from_str(&text)?);
        }
    }
}

/// Load configuration from the environment (and `.env`)
pub fn test_config() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

/// Whether a database is available for end-to-end tests
pub async fn check_test_env() -> bool {
    dotenvy::dotenv().ok();

    for var in ["DATABASE_URL", "JWT_SECRET"] {
        if std::env::var(var).is_err() {
            eprintln!("Skipping test: {var} not set");
            return false;
        }
    }

    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}

/// Error code from a `{"error": {"code": ...}}` body
pub async fn error_code(response: Response) -> Result<String> {
    let body: Value = response.json().await?;
    body["error"]["code"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("no error code in {body}"))
}
