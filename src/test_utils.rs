// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory Kubernetes API server that kube clients can talk to.

use crate::types::SveltosCluster;
use http::{Method, Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::Secret;
use kube::client::Body;
use kube::{Client, ResourceExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// Collections the server can list: (plural, apiVersion, list kind)
const COLLECTIONS: &[(&str, &str, &str)] = &[
    ("secrets", "v1", "SecretList"),
    ("sveltosclusters", "lib.projectsveltos.io/v1alpha1", "SveltosClusterList"),
];

#[derive(Default)]
struct State {
    /// Objects keyed by their item path
    objects: BTreeMap<String, Value>,
    /// Injected failures: (method, path prefix, status code)
    failures: Vec<(Method, String, u16)>,
    requests: Vec<(Method, String)>,
    revision: u64,
}

/// A fake API server storing objects as JSON.
///
/// Supports get, list (namespaced and cluster wide), create, replace and delete.
/// Unknown paths answer 404 like a real server would for a missing object.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

pub fn secret_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/secrets/{}", namespace, name)
}

pub fn sveltos_cluster_path(namespace: &str, name: &str) -> String {
    format!(
        "/apis/lib.projectsveltos.io/v1alpha1/namespaces/{}/sveltosclusters/{}",
        namespace, name
    )
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a kube Client backed by this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    pub fn insert_secret(&self, secret: &Secret) {
        let path = secret_path(&secret.namespace().unwrap_or_default(), &secret.name_any());
        self.insert(path, serde_json::to_value(secret).unwrap());
    }

    pub fn insert_sveltos_cluster(&self, cluster: &SveltosCluster) {
        let namespace = cluster.namespace().unwrap_or_default();
        let path = sveltos_cluster_path(&namespace, &cluster.name_any());
        let mut value = serde_json::to_value(cluster).unwrap();
        value["apiVersion"] = json!("lib.projectsveltos.io/v1alpha1");
        value["kind"] = json!("SveltosCluster");
        self.insert(path, value);
    }

    fn insert(&self, path: String, mut value: Value) {
        let mut state = self.state.lock();
        state.revision += 1;
        stamp(&mut value, state.revision, None);
        state.objects.insert(path, value);
    }

    pub fn remove_secret(&self, namespace: &str, name: &str) {
        self.state.lock().objects.remove(&secret_path(namespace, name));
    }

    pub fn sveltos_cluster(&self, namespace: &str, name: &str) -> Option<SveltosCluster> {
        self.state
            .lock()
            .objects
            .get(&sveltos_cluster_path(namespace, name))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    pub fn sveltos_clusters(&self) -> Vec<SveltosCluster> {
        self.state
            .lock()
            .objects
            .iter()
            .filter(|(path, _)| path.contains("/sveltosclusters/"))
            .map(|(_, v)| serde_json::from_value(v.clone()).unwrap())
            .collect()
    }

    /// Answer every `method` request whose path starts with `path_prefix` with `status`
    pub fn fail(&self, method: Method, path_prefix: &str, status: u16) {
        self.state
            .lock()
            .failures
            .push((method, path_prefix.to_string(), status));
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Number of `method` requests received for paths starting with `path_prefix`
    pub fn count(&self, method: Method, path_prefix: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|(m, p)| *m == method && p.starts_with(path_prefix))
            .count()
    }

    fn handle(&self, method: Method, path: &str, body: &[u8]) -> (u16, Value) {
        let mut state = self.state.lock();
        state.requests.push((method.clone(), path.to_string()));

        let injected = state
            .failures
            .iter()
            .find(|(m, p, _)| *m == method && path.starts_with(p.as_str()))
            .map(|(_, _, code)| *code);
        if let Some(code) = injected {
            return (code, status_json(code, "InternalError", "injected failure"));
        }

        match method {
            Method::GET => {
                if let Some(object) = state.objects.get(path) {
                    (200, object.clone())
                } else if let Some(list) = list_collection(&state.objects, path) {
                    (200, list)
                } else {
                    (404, status_json(404, "NotFound", &format!("{} not found", path)))
                }
            }
            Method::POST => {
                let Ok(mut object) = serde_json::from_slice::<Value>(body) else {
                    return (400, status_json(400, "BadRequest", "invalid body"));
                };
                let Some(name) = object["metadata"]["name"].as_str().map(str::to_string) else {
                    return (422, status_json(422, "Invalid", "metadata.name is required"));
                };
                let key = format!("{}/{}", path, name);
                if state.objects.contains_key(&key) {
                    let message = format!("{} already exists", name);
                    return (409, status_json(409, "AlreadyExists", &message));
                }
                state.revision += 1;
                stamp(&mut object, state.revision, None);
                state.objects.insert(key, object.clone());
                (201, object)
            }
            Method::PUT => {
                let Some(existing_uid) = state
                    .objects
                    .get(path)
                    .map(|o| o["metadata"]["uid"].clone())
                else {
                    return (404, status_json(404, "NotFound", &format!("{} not found", path)));
                };
                let Ok(mut object) = serde_json::from_slice::<Value>(body) else {
                    return (400, status_json(400, "BadRequest", "invalid body"));
                };
                state.revision += 1;
                stamp(&mut object, state.revision, Some(existing_uid));
                state.objects.insert(path.to_string(), object.clone());
                (200, object)
            }
            Method::DELETE => match state.objects.remove(path) {
                Some(object) => (200, object),
                None => (404, status_json(404, "NotFound", &format!("{} not found", path))),
            },
            _ => (405, status_json(405, "MethodNotAllowed", "unsupported method")),
        }
    }
}

/// Assign uid and resourceVersion the way the API server would
fn stamp(object: &mut Value, revision: u64, uid: Option<Value>) {
    let metadata = &mut object["metadata"];
    match uid {
        Some(uid) if !uid.is_null() => metadata["uid"] = uid,
        _ => {
            if metadata["uid"].is_null() {
                metadata["uid"] = json!(format!("uid-{}", revision));
            }
        }
    }
    metadata["resourceVersion"] = json!(revision.to_string());
}

/// Build a list response when `path` names a known collection
fn list_collection(objects: &BTreeMap<String, Value>, path: &str) -> Option<Value> {
    let (plural, api_version, kind) = COLLECTIONS
        .iter()
        .find(|(plural, _, _)| path.ends_with(&format!("/{}", plural)))?;

    let items: Vec<Value> = objects
        .iter()
        .filter(|(key, _)| {
            let Some((parent, _)) = key.rsplit_once('/') else {
                return false;
            };
            parent == path || cluster_wide_collection(parent, plural).as_deref() == Some(path)
        })
        .map(|(_, v)| v.clone())
        .collect();

    Some(json!({
        "apiVersion": api_version,
        "kind": kind,
        "metadata": { "resourceVersion": "1" },
        "items": items,
    }))
}

/// `/apis/g/v/namespaces/ns/plural` -> `/apis/g/v/plural`
fn cluster_wide_collection(parent: &str, plural: &str) -> Option<String> {
    let (prefix, rest) = parent.split_once("/namespaces/")?;
    let (_, resource) = rest.split_once('/')?;
    (resource == plural).then(|| format!("{}/{}", prefix, plural))
}

fn status_json(code: u16, reason: &str, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let body = req.into_body().collect().await?.to_bytes();

            let (status, value) = server.handle(method, &path, &body);

            let response = Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&value)?))?;
            Ok(response)
        })
    }
}

/// A Secret labelled the way Claudie labels kubeconfig secrets
pub fn claudie_secret(namespace: &str, name: &str, cluster: &str) -> Secret {
    use crate::constants::labels;

    let mut secret = Secret::default();
    secret.metadata.name = Some(name.to_string());
    secret.metadata.namespace = Some(namespace.to_string());
    secret.metadata.uid = Some(format!("{}-uid", name));
    secret.labels_mut().extend([
        (labels::PART_OF.to_string(), "claudie".to_string()),
        (labels::OUTPUT.to_string(), "kubeconfig".to_string()),
        (labels::CLUSTER.to_string(), cluster.to_string()),
    ]);
    secret
}
