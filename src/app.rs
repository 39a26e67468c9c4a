use std::sync::Arc;
use tracing::info;

use crate::catalog::CatalogService;
use crate::config::Config;
use crate::credentials::InMemoryUserStore;
use crate::gateway::AuthGateway;
use crate::guard::{Route, RouteGuard};
use crate::remote::{ApiClient, RemoteAuth, RemoteCatalog};
use crate::session::SessionState;
use crate::storage::Storage;

/// Everything a surface needs, built once per process
pub struct App {
    pub config: Config,
    pub storage: Storage,
    pub session: SessionState,
    pub auth: AuthGateway,
    pub catalog: CatalogService,
    pub guard: RouteGuard,
}

impl App {
    pub fn open(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = Storage::open(config.data_dir.join("db"))?;
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: Config, storage: Storage) -> Result<Self, Box<dyn std::error::Error>> {
        let session = SessionState::new(storage.clone());

        let client = if config.offline {
            info!("offline mode: remote API disabled");
            None
        } else {
            info!("remote API at {}", config.api_base_url);
            Some(Arc::new(ApiClient::new(&config, session.clone())?))
        };
        let remote_auth = client.clone().map(|c| c as Arc<dyn RemoteAuth>);
        let remote_catalog = client.map(|c| c as Arc<dyn RemoteCatalog>);

        // Credential store lives for the process only
        let users = Arc::new(InMemoryUserStore::seeded());
        let auth = AuthGateway::new(remote_auth, users, session.clone());
        let catalog = CatalogService::new(remote_catalog, storage.clone(), session.clone());
        let guard = RouteGuard::new(session.clone());

        Ok(Self {
            config,
            storage,
            session,
            auth,
            catalog,
            guard,
        })
    }

    /// Where a navigation to `route` actually lands
    pub fn navigate(&self, route: Route) -> Route {
        self.guard.resolve(route)
    }
}
