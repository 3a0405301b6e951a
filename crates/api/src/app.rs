use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    AccountStore, DonationService, DonationStore, PhotoStore, ProfileService, ProfileStore,
};
use persistence::repositories::{AccountRepository, DonationRepository, ProfileRepository};
use shared::jwt::JwtError;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{auth, deliveries, donations, health, profiles};
use crate::services::{AuthService, LocalPhotoStore};

/// Storage backends the services run on.
#[derive(Clone)]
pub struct Stores {
    pub donations: Arc<dyn DonationStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub photos: Arc<dyn PhotoStore>,
}

impl Stores {
    /// Postgres repositories plus photos on local disk.
    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        Self {
            donations: Arc::new(DonationRepository::new(pool.clone())),
            profiles: Arc::new(ProfileRepository::new(pool.clone())),
            accounts: Arc::new(AccountRepository::new(pool)),
            photos: Arc::new(LocalPhotoStore::new(
                &config.storage.photo_dir,
                &config.storage.public_base_url,
            )),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub donations: DonationService,
    pub profiles: ProfileService,
    pub auth: AuthService,
    pub store: Arc<dyn DonationStore>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Result<Self, JwtError> {
        let jwt = Arc::new(config.jwt.signing_config()?);

        Ok(Self {
            donations: DonationService::new(stores.donations.clone(), stores.photos),
            profiles: ProfileService::new(stores.profiles.clone()),
            auth: AuthService::new(stores.accounts, stores.profiles, jwt),
            store: stores.donations,
            config: Arc::new(config),
        })
    }
}

pub fn create_app(config: Config, stores: Stores) -> Result<Router, JwtError> {
    let state = AppState::new(config, stores)?;
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Handlers that need a caller take the `CurrentSession` extractor.
    let donation_routes = Router::new()
        .route(
            "/api/v1/donations",
            get(donations::list_donations).post(donations::create_donation),
        )
        .route("/api/v1/donations/:donation_id", get(donations::get_donation))
        .route(
            "/api/v1/donations/:donation_id/accept",
            post(donations::accept_donation),
        )
        .route(
            "/api/v1/donations/:donation_id/complete",
            post(donations::complete_donation),
        )
        .route(
            "/api/v1/donations/:donation_id/cancel",
            post(donations::cancel_donation),
        )
        .route("/api/v1/deliveries", get(deliveries::list_deliveries));

    let profile_routes = Router::new()
        .route(
            "/api/v1/profiles/me",
            get(profiles::get_my_profile).put(profiles::update_my_profile),
        )
        .route("/api/v1/profiles/me/stats", get(profiles::get_my_stats));

    let auth_routes = Router::new()
        .route("/api/v1/auth/signup", post(auth::sign_up))
        .route("/api/v1/auth/signin", post(auth::sign_in))
        .route("/api/v1/auth/signout", post(auth::sign_out));

    let public_routes = Router::new()
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(donation_routes)
        .merge(profile_routes)
        .nest_service("/photos", ServeDir::new(&config.storage.photo_dir))
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state))
}
