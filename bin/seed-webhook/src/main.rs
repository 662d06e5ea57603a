use anyhow::Result;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    header::{HeaderValue, CONTENT_TYPE},
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::tokio::TokioIo;
use kplane_admission::{AdmissionMetrics, SeedAdmissionHandler};
use kplane_api::Seed;
use kube::core::admission::AdmissionReview;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod review;
mod tls;
mod topology;

use config::WebhookConfig;
use topology::KubeTopology;

struct WebhookState {
    handler: SeedAdmissionHandler,
    metrics: AdmissionMetrics,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = WebhookConfig::from_env()?;
    init_tracing(config.log_json);

    info!("Starting seed-webhook...");

    let client = kube::Client::try_default().await?;
    let topology = Arc::new(KubeTopology::new(client, config.seed_namespace.clone()));
    info!(namespace = %config.seed_namespace, "Seed topology queries initialized");

    let metrics = AdmissionMetrics::new()?;
    let mut handler = SeedAdmissionHandler::new(topology.clone(), topology, config.query_timeout)
        .with_metrics(metrics.clone());
    if config.single_seed {
        handler = handler.with_single_seed(config.seed_namespace.clone());
        info!("Single seed constraint enabled");
    }
    let state = Arc::new(WebhookState { handler, metrics });

    let acceptor = match (&config.tls_cert, &config.tls_key) {
        (Some(cert), Some(key)) => Some(TlsAcceptor::from(tls::load_server_config(cert, key)?)),
        _ => {
            warn!("TLS not configured, serving plain HTTP");
            None
        }
    };

    let listener = TcpListener::bind(&config.listen).await?;
    info!(
        "Listening on {} ({})",
        config.listen,
        if acceptor.is_some() { "https" } else { "http" }
    );

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        };

        let state = state.clone();
        let acceptor = acceptor.clone();
        tokio::task::spawn(async move {
            match acceptor {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(tls_stream) => serve(tls_stream, state, peer_addr).await,
                    Err(e) => debug!("TLS error from {}: {}", peer_addr, e),
                },
                None => serve(stream, state, peer_addr).await,
            }
        });
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn serve<S>(stream: S, state: Arc<WebhookState>, peer_addr: std::net::SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| handle_request(req, state.clone()));
    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
        debug!("Error serving connection from {}: {}", peer_addr, e);
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<WebhookState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("{} {}", method, path);

    let response = match (method, path.as_str()) {
        (Method::GET, "/healthz") => respond(StatusCode::OK, "text/plain", "OK\n"),
        (Method::GET, "/metrics") => match state.metrics.gather() {
            Ok(text) => respond(StatusCode::OK, "text/plain; version=0.0.4", text),
            Err(e) => {
                warn!("Failed to gather metrics: {}", e);
                respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "Failed to gather metrics\n")
            }
        },
        (Method::POST, "/validate-seed") => {
            let body = req.into_body().collect().await?.to_bytes();
            match serde_json::from_slice::<AdmissionReview<Seed>>(&body) {
                Ok(admission) => {
                    let reviewed = review::review(&state.handler, admission).await;
                    match serde_json::to_vec(&reviewed) {
                        Ok(json) => respond(StatusCode::OK, "application/json", json),
                        Err(e) => respond(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "text/plain",
                            format!("Failed to encode admission review: {}\n", e),
                        ),
                    }
                }
                Err(e) => {
                    debug!("Malformed admission review: {}", e);
                    respond(
                        StatusCode::BAD_REQUEST,
                        "text/plain",
                        format!("Malformed admission review: {}\n", e),
                    )
                }
            }
        }
        _ => respond(StatusCode::NOT_FOUND, "text/plain", "Not Found\n"),
    };

    Ok(response)
}
