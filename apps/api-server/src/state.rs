//! Application state - shared across all handlers.

use std::sync::Arc;

use postpilot_core::ports::{
    Clock, GatewayError, GenerationGateway, IdentityTokenDecoder, OAuthClient, PostRepository,
    ProfileRepository, PublishGateway, RateLimiter, SystemClock, TokenService, UserRepository,
};
use postpilot_core::services::{
    AccountService, CredentialService, EditOrchestrator, PublishService, QuotaLedger,
};
use postpilot_infra::{
    HttpGenerationGateway, InMemoryPostRepository, InMemoryProfileRepository,
    InMemoryUserRepository, JwtTokenService, LinkedInIdTokenDecoder, LinkedInOAuthClient,
    LinkedInPublishGateway,
};

#[cfg(feature = "postgres")]
use postpilot_infra::{
    DatabaseConfig, DatabaseConnections, PostgresPostRepository, PostgresProfileRepository,
    PostgresUserRepository,
};

#[cfg(feature = "rate-limit")]
use postpilot_infra::InMemoryRateLimiter;

use crate::config::{AppConfig, EngineConfig};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to build {client} client: {source}")]
    Gateway {
        client: &'static str,
        source: GatewayError,
    },
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<EditOrchestrator>,
    pub publisher: Arc<PublishService>,
    pub credentials: Arc<CredentialService>,
    pub tokens: Arc<dyn TokenService>,
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

/// Persistence backends.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub posts: Arc<dyn PostRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            profiles: Arc::new(InMemoryProfileRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
        }
    }
}

/// External collaborators.
pub struct Gateways {
    pub generator: Arc<dyn GenerationGateway>,
    pub publisher: Arc<dyn PublishGateway>,
    pub oauth: Arc<dyn OAuthClient>,
    pub decoder: Arc<dyn IdentityTokenDecoder>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        #[cfg(feature = "postgres")]
        let (repos, db) = connect_repositories(config.database.as_ref()).await;

        #[cfg(not(feature = "postgres"))]
        let repos = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Repositories::in_memory()
        };

        let generator = HttpGenerationGateway::new(config.generation.clone()).map_err(|source| {
            StartupError::Gateway {
                client: "generation",
                source,
            }
        })?;
        let oauth = LinkedInOAuthClient::new(config.linkedin.clone()).map_err(|source| {
            StartupError::Gateway {
                client: "LinkedIn OAuth",
                source,
            }
        })?;
        let gateways = Gateways {
            generator: Arc::new(generator),
            publisher: Arc::new(LinkedInPublishGateway::new(config.linkedin.api_base.clone())),
            oauth: Arc::new(oauth),
            decoder: Arc::new(LinkedInIdTokenDecoder::new(&config.linkedin.client_id)),
        };

        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.identity.clone()));
        let state = Self::assemble(repos, gateways, tokens, Arc::new(SystemClock), &config.engine);

        #[cfg(feature = "rate-limit")]
        let state = state.with_rate_limiter(Arc::new(InMemoryRateLimiter::new(
            config.rate_limit.clone(),
        )));

        #[cfg(feature = "postgres")]
        let state = Self { db, ..state };

        tracing::info!(
            monthly_credits = config.engine.monthly_credits,
            version_cap = config.engine.version_cap,
            "Application state initialized"
        );
        Ok(state)
    }

    /// Wire the services over the given backends.
    pub fn assemble(
        repos: Repositories,
        gateways: Gateways,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
        engine: &EngineConfig,
    ) -> Self {
        let quota = Arc::new(QuotaLedger::new(
            repos.users.clone(),
            clock.clone(),
            engine.monthly_credits,
        ));

        let accounts = AccountService::new(
            repos.users.clone(),
            repos.profiles.clone(),
            quota.clone(),
            clock.clone(),
        );
        let posts = EditOrchestrator::new(
            repos.posts.clone(),
            repos.profiles.clone(),
            quota,
            gateways.generator,
            clock.clone(),
            engine.version_cap,
        );
        let publisher = PublishService::new(
            repos.users.clone(),
            repos.posts,
            repos.profiles,
            gateways.publisher,
            gateways.decoder,
            clock.clone(),
        );
        let credentials = CredentialService::new(repos.users, gateways.oauth, clock);

        Self {
            accounts: Arc::new(accounts),
            posts: Arc::new(posts),
            publisher: Arc::new(publisher),
            credentials: Arc::new(credentials),
            tokens,
            rate_limiter: None,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}

#[cfg(feature = "postgres")]
async fn connect_repositories(
    config: Option<&DatabaseConfig>,
) -> (Repositories, Option<Arc<DatabaseConnections>>) {
    let Some(config) = config else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return (Repositories::in_memory(), None);
    };

    match DatabaseConnections::init(config).await {
        Ok(connections) => {
            let conn = Arc::new(connections);
            let repos = Repositories {
                users: Arc::new(PostgresUserRepository::new(conn.main.clone())),
                profiles: Arc::new(PostgresProfileRepository::new(conn.main.clone())),
                posts: Arc::new(PostgresPostRepository::new(conn.main.clone())),
            };
            (repos, Some(conn))
        }
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            (Repositories::in_memory(), None)
        }
    }
}
