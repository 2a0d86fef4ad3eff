use hyper::{
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server, StatusCode,
};
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Registry, TextEncoder,
};
use std::convert::Infallible;
use std::net::SocketAddr;

lazy_static! {
    pub static ref REGISTRY: Registry =
        Registry::new_custom(Some("umbra".to_string()), None).expect("metrics registry");
}

lazy_static! {
    pub static ref CHARACTERS_PRODUCED: IntCounterVec = register_int_counter_vec_with_registry!(
        "characters_produced_total",
        "Characters produced from configuration, by role",
        &["role"],
        REGISTRY
    )
    .unwrap();
    pub static ref PROVISIONING_RUNS: IntCounter = register_int_counter_with_registry!(
        "ledger_provisioning_runs_total",
        "Ledger provisioning sequences executed",
        REGISTRY
    )
    .unwrap();
    pub static ref KEYRING_UNLOCKS: IntCounterVec = register_int_counter_vec_with_registry!(
        "keyring_unlocks_total",
        "Keyring unlock attempts, by outcome",
        &["outcome"],
        REGISTRY
    )
    .unwrap();
}

async fn handle_request(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let metric_families = REGISTRY.gather();
            let mut buffer = Vec::new();
            let encoder = TextEncoder::new();
            if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                tracing::error!("Failed to encode metrics: {e}");
                return Ok(Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::empty())
                    .unwrap());
            }
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("content-type", encoder.format_type())
                .body(Body::from(buffer))
                .unwrap())
        }
        (&Method::GET, "/health") => Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("ok"))
            .unwrap()),
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .unwrap()),
    }
}

pub async fn start_server(port_number: Option<u16>) {
    const DEFAULT_PORT: u16 = 9101;

    let port = port_number.unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let make_svc =
        make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(handle_request)) });
    let server = Server::bind(&addr).serve(make_svc);

    tokio::spawn(async move {
        tracing::info!("Starting metrics server on {addr}");
        if let Err(e) = server.await {
            tracing::error!("Metrics server error: {e}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metrics_route_exposes_registered_counters() {
        CHARACTERS_PRODUCED.with_label_values(&["ursula"]).inc();

        let req = Request::builder()
            .method(Method::GET)
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = handle_request(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("umbra_characters_produced_total"));
    }
}
