//! Thrift marketplace application composition root
//!
//! Composes the members, listings and conversations routers into a single
//! application over either the Postgres store or the in-memory one.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use thrift_auth::{AuthBackend, AuthConfig};
use thrift_common::config::{Config, StoreBackend};
use thrift_conversations::{spawn_pg_listener, ChatConfig, ChangeFeed, ConversationsRepositories};
use thrift_listings::{InMemoryListingRepository, ListingRepository, PgListingRepository};
use thrift_members::{
    CommunityGate, GateConfig, InMemoryMemberRepository, MemberRepository, PgMemberRepository,
};
use thrift_storage::{ObjectStorage, ObjectStorageFactory, StorageConfig};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Everything the domain routers need, already constructed
#[derive(Clone)]
pub struct AppParts {
    pub conversations: ConversationsRepositories,
    pub listings: Arc<dyn ListingRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub gate: Arc<CommunityGate>,
    pub auth: AuthBackend,
    pub chat: ChatConfig,
}

impl AppParts {
    /// Process-local stores sharing one change feed
    pub fn in_memory(
        storage: Arc<dyn ObjectStorage>,
        gate: CommunityGate,
        auth: AuthBackend,
        chat: ChatConfig,
    ) -> Self {
        Self {
            conversations: ConversationsRepositories::in_memory(),
            listings: Arc::new(InMemoryListingRepository::new()),
            members: Arc::new(InMemoryMemberRepository::new()),
            storage,
            gate: Arc::new(gate),
            auth,
            chat,
        }
    }
}

/// Create the main application router with all routes and middleware
pub async fn create_app(config: Config) -> Result<Router, anyhow::Error> {
    let auth = AuthBackend::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    let storage: Arc<dyn ObjectStorage> =
        Arc::from(ObjectStorageFactory::create(StorageConfig::from_env()?).await?);
    let gate = CommunityGate::new(GateConfig::from_env()?);
    let chat = ChatConfig::from_env()?;

    let parts = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL is required when STORE_BACKEND=postgres")
            })?;
            let pool = PgPool::connect(database_url).await?;
            tracing::info!("Database connection established");

            sqlx::migrate!("../../migrations").run(&pool).await?;
            tracing::info!("Database migrations applied");

            let changes = ChangeFeed::default();
            spawn_pg_listener(&pool, changes.clone()).await?;

            AppParts {
                conversations: ConversationsRepositories::postgres(pool.clone(), changes),
                listings: Arc::new(PgListingRepository::new(pool.clone())),
                members: Arc::new(PgMemberRepository::new(pool)),
                storage,
                gate: Arc::new(gate),
                auth,
                chat,
            }
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            AppParts::in_memory(storage, gate, auth, chat)
        }
    };

    Ok(build_router(parts))
}

/// Build the router from constructed parts
pub fn build_router(parts: AppParts) -> Router {
    let members_state = thrift_members::MembersState {
        members: parts.members,
        gate: parts.gate,
        auth: parts.auth.clone(),
    };
    let listings_state = thrift_listings::ListingsState {
        listings: parts.listings.clone(),
        storage: parts.storage,
        auth: parts.auth.clone(),
    };
    let conversations_state = thrift_conversations::ConversationsState::new(
        parts.conversations,
        parts.listings,
        parts.auth,
        &parts.chat,
    );

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(thrift_members::routes().with_state(members_state))
        .merge(thrift_listings::routes().with_state(listings_state))
        .merge(thrift_conversations::routes().with_state(conversations_state))
}

/// CORS layer from a comma-separated origin list; `*` allows any origin
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let origins: Vec<_> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();

    if origins.is_empty() || origins.contains(&"*") {
        return CorsLayer::permissive();
    }

    let allowed = origins.iter().filter_map(|o| o.parse().ok());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
