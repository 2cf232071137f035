use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{http::HeaderValue, routing, Router};
use folio_core_contact_contracts::ContactFeatureService;
use folio_core_health_contracts::HealthFeatureService;
use folio_shared_contracts::rate_limit::{RateLimitPolicy, RateLimitService};
use folio_utils::Apply;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

mod errors;
mod middlewares;
mod models;
mod routes;

pub const ROOT_MESSAGE: &str = "Server is running!";

#[derive(Debug, Clone)]
pub struct RestServer<Health, Contact, RateLimit> {
    config: RestServerConfig,
    health: Health,
    contact: Contact,
    rate_limit: RateLimit,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub real_ip: Option<RealIpConfig>,
    /// Origins allowed to call the api. Any origin is allowed if empty.
    pub cors_origins: Vec<HeaderValue>,
    /// Request limits, disabled if `None`.
    pub rate_limit: Option<RateLimitRules>,
}

#[derive(Debug, Clone)]
pub struct RealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

#[derive(Debug, Clone)]
pub struct RateLimitRules {
    /// Applies to every route.
    pub general: RateLimitRule,
    /// Applies to contact submissions on top of the general rule.
    pub contact: RateLimitRule,
}

#[derive(Debug, Clone)]
pub struct RateLimitRule {
    pub policy: RateLimitPolicy,
    /// Returned to clients that exceed the limit.
    pub message: String,
}

impl<Health, Contact, RateLimit> RestServer<Health, Contact, RateLimit>
where
    Health: HealthFeatureService,
    Contact: ContactFeatureService,
    RateLimit: RateLimitService,
{
    pub fn new(
        config: RestServerConfig,
        health: Health,
        contact: Contact,
        rate_limit: RateLimit,
    ) -> Self {
        Self {
            config,
            health,
            contact,
            rate_limit,
        }
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let (host, port) = (self.config.host, self.config.port);
        let router = self.router();

        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind to {host}:{port}"))?;
        info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start HTTP server")
    }

    /// Builds the router.
    ///
    /// Requests must carry a [`ConnectInfo<SocketAddr>`](axum::extract::ConnectInfo)
    /// extension to be attributed to a client.
    pub fn router(self) -> Router<()> {
        let rate_limit = Arc::new(self.rate_limit);
        let rules = self.config.rate_limit.map(Arc::new);

        let api = Router::new()
            .merge(routes::health::router(self.health.into()))
            .merge(routes::contact::router(
                self.contact.into(),
                rules
                    .as_ref()
                    .map(|rules| (Arc::clone(&rate_limit), rules.contact.clone())),
            ));

        Router::new()
            .route("/", routing::get(|| async { ROOT_MESSAGE }))
            .nest("/api", api)
            .apply_map(rules.as_ref(), |router, rules| {
                middlewares::rate_limit::add(router, Arc::clone(&rate_limit), rules.general.clone())
            })
            .apply(middlewares::trace::add)
            .apply(middlewares::client_ip::add(self.config.real_ip.map(Into::into)))
            .layer(cors(self.config.cors_origins))
    }
}

fn cors(origins: Vec<HeaderValue>) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down");
}
