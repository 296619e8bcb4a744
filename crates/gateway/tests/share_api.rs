//! Integration test: boots the full gateway router on an ephemeral port and
//! drives it the way the two browsers do, over HTTP and the status socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

use pb_domain::config::Config;
use pb_domain::error::Error;
use pb_gateway::state::AppState;
use pb_gateway::{bootstrap, server};
use pb_sessions::{LifecycleManager, SessionStore};

struct TestServer {
    addr: SocketAddr,
    http: reqwest::Client,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }

    async fn initiate(&self) -> Value {
        let resp = self
            .http
            .post(self.url("/v1/share/initiate"))
            .header("User-Agent", "Mozilla/5.0 (test)")
            .json(&json!({
                "fileMetadata": { "name": "a.txt", "size": 10, "type": "text/plain" }
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }
}

async fn start(mut config: Config) -> TestServer {
    config.share.frontend_url = "https://share.example".into();
    let state = bootstrap::build_app_state(Arc::new(config)).unwrap();
    start_with(state).await
}

async fn start_with(state: AppState) -> TestServer {
    let app = server::build_app(state).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(server::serve(listener, app, async {
        let _ = rx.await;
    }));

    TestServer {
        addr,
        http: reqwest::Client::new(),
        _shutdown: tx,
    }
}

#[tokio::test]
async fn healthcheck_reports_ok() {
    let srv = start(Config::default()).await;
    let body: Value = srv
        .http
        .get(srv.url("/v1/healthcheck"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn full_share_flow_over_http() {
    let srv = start(Config::default()).await;

    let summary = srv.initiate().await;
    let id = summary["sessionId"].as_str().unwrap().to_owned();
    assert_eq!(id.len(), 16);
    assert_eq!(summary["torrentInfoHash"].as_str().unwrap().len(), 40);
    assert_eq!(
        summary["shareableLink"],
        format!("https://share.example/receive/{id}")
    );

    let resp = srv
        .http
        .post(srv.url("/v1/share/update-torrent"))
        .json(&json!({
            "sessionId": id,
            "torrentInfoHash": "abcd1234",
            "magnetUri": "magnet:?xt=urn:btih:abcd1234",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "success": true }));

    let resp = srv
        .http
        .post(srv.url("/v1/share/update-status"))
        .json(&json!({ "sessionId": id, "status": "connected", "peers": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let view: Value = srv
        .http
        .get(srv.url(&format!("/v1/share/session/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["status"], "connected");
    assert_eq!(view["peers"], 1);
    assert_eq!(view["torrentInfoHash"], "abcd1234");
    assert_eq!(view["magnetUri"], "magnet:?xt=urn:btih:abcd1234");
    assert_eq!(view["fileMetadata"]["type"], "text/plain");
    assert!(view.get("privateKey").is_none());
}

#[tokio::test]
async fn unknown_session_is_404() {
    let srv = start(Config::default()).await;

    let resp = srv
        .http
        .get(srv.url("/v1/share/session/nonexistent"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.json::<Value>().await.unwrap()["error"], "Session not found");

    let resp = srv
        .http
        .post(srv.url("/v1/share/update-status"))
        .json(&json!({ "sessionId": "nonexistent", "status": "ready" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

/// Store that fails every call.
struct DownStore;

#[async_trait::async_trait]
impl SessionStore for DownStore {
    async fn put(&self, _: &str, _: String, _: Duration) -> pb_domain::error::Result<()> {
        Err(Error::StorageUnavailable("down".into()))
    }

    async fn get(&self, _: &str) -> pb_domain::error::Result<Option<String>> {
        Err(Error::StorageUnavailable("down".into()))
    }

    fn backend(&self) -> &'static str {
        "down"
    }
}

#[tokio::test]
async fn store_outage_is_503_not_404() {
    let config = Arc::new(Config::default());
    let store: Arc<dyn SessionStore> = Arc::new(DownStore);
    let sessions = Arc::new(LifecycleManager::new(config.share.clone(), store.clone()));
    let srv = start_with(AppState {
        config,
        sessions,
        store,
    })
    .await;

    let resp = srv
        .http
        .get(srv.url("/v1/share/session/0123456789abcdef"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    assert!(resp.json::<Value>().await.unwrap()["error"].is_string());

    let resp = srv
        .http
        .post(srv.url("/v1/share/initiate"))
        .json(&json!({
            "fileMetadata": { "name": "a.txt", "size": 10, "type": "text/plain" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);

    let resp = srv
        .http
        .post(srv.url("/v1/share/update-status"))
        .json(&json!({ "sessionId": "0123456789abcdef", "status": "ready" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn malformed_bodies_are_400() {
    let srv = start(Config::default()).await;

    let resp = srv
        .http
        .post(srv.url("/v1/share/initiate"))
        .json(&json!({ "fileMetadata": { "name": "", "size": 10, "type": "text/plain" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = srv
        .http
        .post(srv.url("/v1/share/update-status"))
        .json(&json!({ "sessionId": "abc", "status": "paused" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.json::<Value>().await.unwrap()["error"].is_string());
}

#[tokio::test]
async fn status_socket_streams_then_reports_expiry() {
    let mut config = Config::default();
    config.share.session_ttl_secs = 1;
    config.share.status_poll_ms = 100;
    let srv = start(config).await;

    let summary = srv.initiate().await;
    let id = summary["sessionId"].as_str().unwrap().to_owned();

    let (mut ws, _) = tokio_tungstenite::connect_async(srv.ws_url(&format!("/v1/share/status/{id}")))
        .await
        .unwrap();

    let first = next_json(&mut ws).await;
    assert_eq!(first, json!({ "status": "initiated", "peers": 0, "progress": 0 }));

    // Keep reading until the TTL runs out.
    let expired = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let frame = next_json(&mut ws).await;
            if frame["status"] == "expired" {
                return frame;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(expired, json!({ "status": "expired" }));

    // The gateway closes the socket after the expiry frame.
    let rest = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .unwrap();
    assert!(matches!(rest, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}

async fn next_json<S>(ws: &mut S) -> Value
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
