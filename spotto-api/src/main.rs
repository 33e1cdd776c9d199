use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spotto_api::{app, state::{AppState, AuthConfig}, worker};
use spotto_core::config::keys;
use spotto_core::notify::LogSink;
use spotto_core::ConfigService;
use spotto_gacha::{DrawEngine, DrawSelector, ExclusionLedger, RarityRoller, TripPublisher};
use spotto_inventory::{InventoryManager, InventoryRepository, QuotaTracker, RedemptionProtocol};
use spotto_catalog::{CouponRepository, PlaceRepository};
use spotto_store::app_config::{Config, DrawDefaults};
use spotto_store::config_repo::PgConfigStore;
use spotto_store::coupon_repo::PgCouponRepository;
use spotto_store::exclusion_repo::PgExclusionRepository;
use spotto_store::inventory_repo::PgInventoryRepository;
use spotto_store::place_repo::PgPlaceRepository;
use spotto_store::quota_repo::PgQuotaRepository;
use spotto_store::redemption_repo::PgRedemptionRepository;
use spotto_store::session_repo::PgDrawSessionRepository;
use spotto_store::trip_repo::PgTripRepository;
use spotto_store::{DbClient, RedisClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spotto_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    info!("Starting Spotto API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");
    let pool = db.pool.clone();

    let redis = Arc::new(
        RedisClient::new(&config.redis.url)
            .await
            .expect("Failed to connect to Redis"),
    );

    let config_service = Arc::new(ConfigService::new(Arc::new(PgConfigStore::new(pool.clone()))));
    seed_runtime_defaults(&config_service, &config.draw).await;

    let ledger = Arc::new(ExclusionLedger::new(
        Arc::new(PgExclusionRepository::new(pool.clone())),
        config_service.clone(),
    ));
    let places: Arc<dyn PlaceRepository> = Arc::new(PgPlaceRepository::new(pool.clone()));
    let inventory_repo: Arc<dyn InventoryRepository> =
        Arc::new(PgInventoryRepository::new(pool.clone()));
    let coupons: Arc<dyn CouponRepository> = Arc::new(PgCouponRepository::new(pool.clone()));

    let engine = Arc::new(DrawEngine::new(
        DrawSelector::new(places.clone(), ledger.clone()),
        RarityRoller::new(config_service.clone()),
        QuotaTracker::new(Arc::new(PgQuotaRepository::new(pool.clone())), config_service.clone()),
        InventoryManager::new(inventory_repo.clone()),
        TripPublisher::new(Arc::new(PgTripRepository::new(pool.clone()))),
        coupons.clone(),
        Arc::new(PgDrawSessionRepository::new(pool.clone())),
        Arc::new(LogSink),
    ));

    let protocol = Arc::new(RedemptionProtocol::new(
        inventory_repo.clone(),
        Arc::new(PgRedemptionRepository::new(pool.clone())),
        coupons.clone(),
        config_service.clone(),
    ));
    tokio::spawn(worker::start_redemption_sweeper(protocol.clone(), 30));

    let app_state = AppState {
        engine,
        inventory: Arc::new(InventoryManager::new(inventory_repo)),
        protocol,
        quota: Arc::new(QuotaTracker::new(
            Arc::new(PgQuotaRepository::new(pool.clone())),
            config_service.clone(),
        )),
        ledger,
        places,
        coupons,
        config: config_service,
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        default_place_count: config.draw.default_place_count,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Push the file-config defaults into the runtime config store on first
/// boot; later admin writes win.
async fn seed_runtime_defaults(config: &ConfigService, defaults: &DrawDefaults) {
    let seeds = [
        (keys::CATEGORY_QUOTA, keys::DAILY_DRAW_CAP, json!(defaults.daily_draw_cap)),
        (
            keys::CATEGORY_GACHA,
            keys::EXCLUSION_THRESHOLD,
            json!(defaults.exclusion_threshold),
        ),
        (
            keys::CATEGORY_REDEMPTION,
            keys::GRACE_MINUTES,
            json!(defaults.redemption_grace_minutes),
        ),
    ];
    for (category, key, value) in seeds {
        match config.get(category, key).await {
            Ok(None) => {
                if let Err(err) = config.set(category, key, value).await {
                    warn!("failed to seed {}/{}: {}", category, key, err);
                }
            }
            Ok(Some(_)) => {}
            Err(err) => warn!("failed to read {}/{}: {}", category, key, err),
        }
    }
}
