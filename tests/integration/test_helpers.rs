//! Shared helpers for integration tests.
//!
//! Spawns the real gateway on an ephemeral port and signs requests the
//! way the platform does, so every test exercises the full axum path.

use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use helpdesk_gateway::webhook::dispatcher::{serve, Dispatcher, WebhookSettings};
use helpdesk_gateway::webhook::routes::RouteTable;
use helpdesk_gateway::webhook::signature::{
    SignatureValidator, SIGNATURE_HEADER, TIMESTAMP_HEADER, TRUSTED_CLIENT_CN,
};

/// Signing secret shared by the spawned gateway and the test client.
pub const SECRET: &str = "fake_secret";

/// Base webhook path of the spawned gateway.
pub const BASE_PATH: &str = "/slack";

/// Identity header name used by tests that enforce mutual TLS.
pub const DN_HEADER: &str = "x-client-dn";

/// Spawn a gateway over the given table on an ephemeral port.
///
/// Returns the base URL and a token; cancel the token to shut the
/// server down.
pub async fn spawn_gateway(
    table: RouteTable,
    identity_header: Option<String>,
) -> (String, CancellationToken) {
    // Bind a throwaway listener to discover a free port, then hand the
    // port to `serve` (which binds it again).
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let settings = WebhookSettings {
        base_path: BASE_PATH.to_owned(),
        signing_secret: SECRET.to_owned(),
        identity_header,
    };
    let router = Dispatcher::new(settings, table).into_router();

    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    tokio::spawn(async move {
        let _ = serve(router, addr, server_ct).await;
    });

    wait_ready(addr).await;
    (format!("http://{addr}"), ct)
}

async fn wait_ready(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("gateway did not come up on {addr}");
}

/// Current Unix seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Sign a body with the shared test secret.
pub fn sign(timestamp: i64, body: &str) -> String {
    SignatureValidator::new(SECRET, None).sign(timestamp, body.as_bytes())
}

/// POST a correctly signed request.
pub async fn post_signed(
    base_url: &str,
    path: &str,
    body: &str,
    content_type: &str,
) -> reqwest::Response {
    let timestamp = now();
    reqwest::Client::new()
        .post(format!("{base_url}{path}"))
        .header("Content-Type", content_type)
        .header(TIMESTAMP_HEADER, timestamp.to_string())
        .header(SIGNATURE_HEADER, sign(timestamp, body))
        .header(DN_HEADER, format!("CN={TRUSTED_CLIENT_CN},O=Slack Technologies"))
        .body(body.to_owned())
        .send()
        .await
        .expect("request sends")
}

/// POST a form-encoded, correctly signed request.
pub async fn post_signed_form(base_url: &str, path: &str, body: &str) -> reqwest::Response {
    post_signed(base_url, path, body, "application/x-www-form-urlencoded").await
}

/// POST a JSON, correctly signed request.
pub async fn post_signed_json(base_url: &str, path: &str, body: &str) -> reqwest::Response {
    post_signed(base_url, path, body, "application/json").await
}

/// Encode a JSON value as a `payload=` form body.
pub fn form_payload(json: &serde_json::Value) -> String {
    let encoded: String = form_urlencoded::byte_serialize(json.to_string().as_bytes()).collect();
    format!("payload={encoded}")
}
