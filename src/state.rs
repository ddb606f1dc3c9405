use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::{
    DatabaseError, DatabaseManager, DocumentRepository, HandbookRepository, OrganizationRepository,
    SubscriptionRepository, UserRepository,
};
use crate::services::{StripeClient, SupabaseClient};

/// Shared handles cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: PgPool,
    pub supabase: SupabaseClient,
    pub stripe: StripeClient,
    /// Client for `/api/proxy`; leaves bodies compressed so they relay untouched
    pub proxy_http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, DatabaseError> {
        let db = DatabaseManager::connect_lazy(&config.database)?;
        Ok(Self::with_pool(config, db))
    }

    pub fn with_pool(config: AppConfig, db: PgPool) -> Self {
        let user_agent = concat!("handbok/", env!("CARGO_PKG_VERSION"));
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let proxy_http = reqwest::Client::builder()
            .no_gzip()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            supabase: SupabaseClient::new(http.clone(), config.supabase.clone()),
            stripe: StripeClient::new(http, config.stripe.clone()),
            config: Arc::new(config),
            db,
            proxy_http,
        }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.db.clone())
    }

    pub fn organizations(&self) -> OrganizationRepository {
        OrganizationRepository::new(self.db.clone())
    }

    pub fn handbooks(&self) -> HandbookRepository {
        HandbookRepository::new(self.db.clone())
    }

    pub fn subscriptions(&self) -> SubscriptionRepository {
        SubscriptionRepository::new(self.db.clone())
    }

    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.db.clone())
    }
}
