use crate::{
    auth::JwtKeys,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::{
        db::postgres::postgres_connection::PgPoolSquad,
        storages::image_storage::S3ImageStorage,
    },
    payments::paystack_client::PaystackClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let image_storage = Arc::new(S3ImageStorage::new(config.storage.clone()).await?);
    info!("Image storage client has been configured");

    let paystack_client = Arc::new(PaystackClient::new(config.paystack.clone())?);
    info!("Paystack client has been configured");

    let jwt_keys = Arc::new(JwtKeys::new(&config.auth.jwt_secret));
    let body_limit_bytes: usize = (config.backend_server.body_limit * 1024 * 1024).try_into()?;

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/profiles",
            routers::profiles::routes(
                Arc::clone(&db_pool),
                Arc::clone(&image_storage),
                Arc::clone(&config),
            ),
        )
        .nest(
            "/api/v1/matching",
            routers::matching::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest(
            "/api/v1/gallery",
            routers::gallery::routes(
                Arc::clone(&db_pool),
                Arc::clone(&image_storage),
                body_limit_bytes,
            ),
        )
        .nest(
            "/api/v1/subscriptions",
            routers::subscriptions::routes(
                Arc::clone(&db_pool),
                Arc::clone(&paystack_client),
                Arc::clone(&config),
            ),
        )
        .nest(
            "/api/v1/payments",
            routers::payments::routes(
                Arc::clone(&db_pool),
                Arc::clone(&paystack_client),
                Arc::clone(&config),
            ),
        )
        .nest(
            "/api/v1/notifications",
            routers::notifications::routes(Arc::clone(&db_pool)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(jwt_keys))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
