// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking the Kubernetes API and the token endpoint.

use crate::error::{Result as SyncResult, TokenSyncError};
use crate::kubernetes::SecretStore;
use async_trait::async_trait;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use http::{header, HeaderMap, Method, Request, Response, StatusCode, Uri};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::client::Body;
use kube::Client;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::net::TcpListener;
use tower::Service;

/// A request seen by one of the mocks
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
    pub received_at: Instant,
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    hang: bool,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            hang: false,
        }
    }

    /// Record requests but never answer them
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PATCH requests matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Longest prefix wins, so /api/v1/namespaces does not shadow nested paths
        responses
            .iter()
            .filter(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .max_by_key(|((_, p), _)| p.len())
            .map(|(_, resp)| resp.clone())
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let content_type = req
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();
        let hang = self.hang;

        Box::pin(async move {
            let body = req.into_body().collect().await?.to_bytes();
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                content_type,
                body: String::from_utf8_lossy(&body).into_owned(),
                received_at: Instant::now(),
            });

            if hang {
                std::future::pending::<()>().await;
            }

            let (status, body) = response.unwrap_or_else(|| {
                // Default 404 for unmatched requests
                (404, not_found_json("resource", "unknown"))
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace list JSON response
pub fn namespace_list_json(names: &[&str]) -> String {
    let items: Vec<_> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": { "name": name, "uid": format!("uid-{}", name) }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "NamespaceList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

/// Create a mock secret JSON response holding `key: value`
pub fn secret_json(namespace: &str, name: &str, key: &str, value: &str) -> String {
    let secret = Secret {
        metadata: kube::api::ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            key.to_string(),
            ByteString(value.as_bytes().to_vec()),
        )])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    };
    serde_json::to_string(&secret).unwrap()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Create a Kubernetes Status failure body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// A throwaway token endpoint serving scripted responses.
///
/// The nth request gets the nth scripted response; the last one repeats.
pub struct TokenServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[derive(Clone)]
struct TokenEndpoint {
    script: Arc<Vec<(u16, String)>>,
    served: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    hang: bool,
}

impl TokenServer {
    pub async fn start(script: Vec<(u16, &str)>) -> Self {
        assert!(!script.is_empty(), "token server needs at least one response");
        let script = script
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();
        Self::serve(script, false).await
    }

    /// An endpoint that accepts every request and never answers
    pub async fn hanging() -> Self {
        Self::serve(Vec::new(), true).await
    }

    async fn serve(script: Vec<(u16, String)>, hang: bool) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let endpoint = TokenEndpoint {
            script: Arc::new(script),
            served: Arc::new(AtomicUsize::new(0)),
            requests: requests.clone(),
            hang,
        };

        let app = Router::new()
            .route(TOKEN_PATH, post(token_endpoint))
            .with_state(endpoint);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    /// URL of an address nothing listens on
    pub async fn unused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}{}", addr, TOKEN_PATH)
    }

    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, TOKEN_PATH)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

const TOKEN_PATH: &str = "/oauth2/token";

async fn token_endpoint(
    State(endpoint): State<TokenEndpoint>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> axum::response::Response {
    endpoint.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
        received_at: Instant::now(),
    });

    if endpoint.hang {
        std::future::pending::<()>().await;
    }

    let served = endpoint.served.fetch_add(1, Ordering::SeqCst);
    let (status, body) = endpoint.script[served.min(endpoint.script.len() - 1)].clone();
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// In-memory secret store with per-namespace failure injection
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<BTreeMap<(String, String), Secret>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation in `namespace` fails
    pub fn failing_in(mut self, namespace: &str) -> Self {
        self.failing.insert(namespace.to_string());
        self
    }

    pub fn insert(&self, secret: Secret) {
        let key = (
            secret.metadata.namespace.clone().unwrap_or_default(),
            secret.metadata.name.clone().unwrap_or_default(),
        );
        self.secrets.lock().unwrap().insert(key, secret);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn value(&self, namespace: &str, name: &str, key: &str) -> Option<String> {
        self.secret(namespace, name)
            .and_then(|s| s.data)
            .and_then(|d| d.get(key).map(|v| String::from_utf8_lossy(&v.0).into_owned()))
    }

    /// (operation, namespace) pairs in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Namespaces that saw at least one call, in first-call order
    pub fn touched_namespaces(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for (_, namespace) in self.calls() {
            if !seen.contains(&namespace) {
                seen.push(namespace);
            }
        }
        seen
    }

    pub fn write_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|(op, _)| op != "get")
            .count()
    }

    fn record(&self, operation: &'static str, namespace: &str) -> SyncResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), namespace.to_string()));
        if self.failing.contains(namespace) {
            return Err(TokenSyncError::Operation {
                namespace: namespace.to_string(),
                operation,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> SyncResult<Option<Secret>> {
        self.record("get", namespace)?;
        Ok(self.secret(namespace, name))
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> SyncResult<()> {
        self.record("create", namespace)?;
        let name = secret.metadata.name.clone().unwrap_or_default();
        let mut secrets = self.secrets.lock().unwrap();
        let key = (namespace.to_string(), name.clone());
        if secrets.contains_key(&key) {
            return Err(TokenSyncError::Operation {
                namespace: namespace.to_string(),
                operation: "create",
                message: format!("secrets \"{}\" already exists", name),
            });
        }
        secrets.insert(key, secret.clone());
        Ok(())
    }

    async fn patch_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> SyncResult<()> {
        self.record("patch", namespace)?;
        let mut secrets = self.secrets.lock().unwrap();
        let secret = secrets
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| TokenSyncError::Operation {
                namespace: namespace.to_string(),
                operation: "patch",
                message: format!("secrets \"{}\" not found", name),
            })?;
        secret.data.get_or_insert_with(BTreeMap::new).insert(
            key.to_string(),
            ByteString(value.as_bytes().to_vec()),
        );
        Ok(())
    }
}
