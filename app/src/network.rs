//! REST plumbing: the middleware client characters talk to peers with, and
//! the status surface an operator node exposes.

use crate::storage::{KnownNodes, NodeMetadata};
use hyper::client::HttpConnector;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Client, Method, Request, Response, Server, StatusCode, Uri};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),
    #[error("Invalid peer URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),
    #[error("Unexpected status from peer: {0}")]
    UnexpectedStatus(StatusCode),
    #[error("Undecodable peer response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// HTTP client used for node-to-node REST traffic.
#[derive(Debug, Clone)]
pub struct RestMiddleware {
    client: Client<HttpConnector>,
}

impl RestMiddleware {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub async fn node_status(
        &self,
        host: &str,
        port: u16,
    ) -> Result<serde_json::Value, NetworkError> {
        let uri: Uri = format!("http://{host}:{port}/status").parse()?;
        let response = self.client.get(uri).await?;
        if response.status() != StatusCode::OK {
            return Err(NetworkError::UnexpectedStatus(response.status()));
        }
        let bytes = hyper::body::to_bytes(response.into_body()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Default for RestMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

/// What the status surface reports about the running node.
#[derive(Debug)]
pub struct StatusState {
    pub metadata: NodeMetadata,
    pub known_nodes: Arc<RwLock<KnownNodes>>,
    pub federated_only: bool,
}

async fn handle_request(
    state: Arc<StatusState>,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/status") => {
            let known_nodes = state.known_nodes.read().unwrap().len();
            let body = json!({
                "account": state.metadata.account,
                "role": state.metadata.role,
                "rest_host": state.metadata.rest_host,
                "rest_port": state.metadata.rest_port,
                "federated_only": state.federated_only,
                "known_nodes": known_nodes,
            });
            json_response(StatusCode::OK, &body)
        }
        (&Method::GET, "/public_information") => {
            let body = serde_json::to_value(&state.metadata).unwrap_or_default();
            json_response(StatusCode::OK, &body)
        }
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .unwrap(),
    };
    Ok(response)
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Serve the node status surface until the process exits.
pub async fn run_status_server(state: Arc<StatusState>, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle_request(state.clone(), req)))
        }
    });

    info!("Starting node status server on {addr}");
    if let Err(e) = Server::bind(&addr).serve(make_svc).await {
        error!("Status server error: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NodeStorage;

    fn state() -> Arc<StatusState> {
        let storage = NodeStorage::new(
            std::env::temp_dir().join("node_metadata.json"),
            std::env::temp_dir().join("known_certificates"),
        );
        Arc::new(StatusState {
            metadata: NodeMetadata {
                account: "operator".to_string(),
                role: "ursula".to_string(),
                rest_host: "127.0.0.1".to_string(),
                rest_port: 9151,
                timestamp: 1_700_000_000,
                interface_signature: "00".repeat(32),
            },
            known_nodes: Arc::new(RwLock::new(KnownNodes::new(storage))),
            federated_only: true,
        })
    }

    #[tokio::test]
    async fn status_route_reports_the_node() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/status")
            .body(Body::empty())
            .unwrap();

        let response = handle_request(state(), req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["role"], "ursula");
        assert_eq!(body["known_nodes"], 0);
        assert_eq!(body["federated_only"], true);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/blocks")
            .body(Body::empty())
            .unwrap();

        let response = handle_request(state(), req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
