//! Membergate server entry point.
//!
//! Startup order: configuration, tracing, database pool and migrations,
//! change listener, adapters, background loops, HTTP server. Ctrl-C or SIGTERM drains the
//! server and stops the background tasks through one `watch` channel.

use std::error::Error;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use membergate::adapters::auth::JwtSessionValidator;
use membergate::adapters::cache::CachedRoleLookup;
use membergate::adapters::conversions::MetaConversionsClient;
use membergate::adapters::http::{api_router, AppOptions, AppPorts, AppState};
use membergate::adapters::outbound::HttpWebhookSender;
use membergate::adapters::postgres::{
    PostgresChatRestrictionStore, PostgresDeliveryLog, PostgresEventBusRepository,
    PostgresOutboundSubscriptionRepository, PostgresProcedures, PostgresTrackingStore,
    PostgresWebhookEndpointRepository, PostgresWebhookEventStore,
};
use membergate::adapters::realtime::{ChangeFeed, PgChangeListener, RealtimeSweeper};
use membergate::application::handlers::outbound::{DispatchOptions, OutboundDispatchLoop};
use membergate::config::AppConfig;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting membergate"
    );

    let pool = connect(&config).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let feed = Arc::new(ChangeFeed::default());
    let listener_task = if config.database.listen_for_changes {
        let listener = PgChangeListener::new(pool.clone(), feed.clone());
        let shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = listener.run(shutdown).await {
                tracing::error!(error = %e, "Change listener stopped");
            }
        }))
    } else {
        None
    };

    let (state, role_cache) = build_state(&config, pool, feed.clone())?;

    let sweeper =
        RealtimeSweeper::new(feed, config.chat.sweep_interval()).with_role_cache(role_cache);
    let sweep_task = {
        let shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move { sweeper.run(shutdown).await }))
    };

    let dispatch_task = config.dispatch.poll_interval().map(|interval| {
        let dispatch_loop = OutboundDispatchLoop::new(state.dispatch.clone(), interval);
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { dispatch_loop.run(shutdown).await })
    });

    let app = api_router(
        state,
        &config.server.cors_origins_list(),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, shutting down background tasks");
    let _ = shutdown_tx.send(true);
    for task in [listener_task, dispatch_task, sweep_task].into_iter().flatten() {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Background task ended abnormally");
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn connect(config: &AppConfig) -> Result<PgPool, BoxError> {
    let db = &config.database;
    let pool = PgPoolOptions::new()
        .min_connections(db.min_connections)
        .max_connections(db.max_connections)
        .acquire_timeout(db.acquire_timeout())
        .idle_timeout(db.idle_timeout())
        .max_lifetime(db.max_lifetime())
        .connect(&db.url)
        .await?;

    if db.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}

fn build_state(
    config: &AppConfig,
    pool: PgPool,
    feed: Arc<ChangeFeed>,
) -> Result<(AppState, Arc<CachedRoleLookup>), BoxError> {
    let procedures = Arc::new(PostgresProcedures::new(pool.clone()));
    let role_cache = Arc::new(CachedRoleLookup::new(
        procedures.clone(),
        config.chat.role_cache_ttl(),
    ));
    let chat_store = Arc::new(PostgresChatRestrictionStore::new(pool.clone()));
    let tracking_store = Arc::new(PostgresTrackingStore::new(pool.clone()));
    let webhook_endpoints = Arc::new(PostgresWebhookEndpointRepository::new(pool.clone()));
    let outbound_subscriptions = Arc::new(PostgresOutboundSubscriptionRepository::new(pool.clone()));

    let webhook_sender = HttpWebhookSender::new(
        config.dispatch.request_timeout(),
        &config.dispatch.user_agent,
    )?;
    let conversions_api = MetaConversionsClient::new(
        config.tracking.api_base_url.clone(),
        config.tracking.api_version.clone(),
        config.tracking.timeout(),
    )?;
    let session_validator = JwtSessionValidator::new(&config.auth.jwt_secret);

    let ports = AppPorts {
        session_validator: Arc::new(session_validator),
        roles: role_cache.clone(),
        role_cache: Some(role_cache.clone()),
        webhook_endpoints,
        webhook_events: Arc::new(PostgresWebhookEventStore::new(pool.clone())),
        canonical_processor: procedures.clone(),
        event_bus: Arc::new(PostgresEventBusRepository::new(pool.clone())),
        outbound_subscriptions,
        deliveries: Arc::new(PostgresDeliveryLog::new(pool)),
        webhook_sender: Arc::new(webhook_sender),
        tracking_configs: tracking_store.clone(),
        tracking_events: tracking_store,
        conversions_api: Arc::new(conversions_api),
        chat_reader: chat_store.clone(),
        chat_moderation: chat_store,
        change_feed: feed,
        cleanup: procedures.clone(),
        referrals: procedures.clone(),
        checkout_links: procedures.clone(),
        auto_status: procedures,
    };

    let options = AppOptions {
        dispatch: DispatchOptions {
            batch_size: config.dispatch.batch_size,
            retry_delay: config.dispatch.retry_delay(),
        },
        chat_debounce: config.chat.debounce(),
    };

    Ok((AppState::new(ports, options), role_cache))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}
