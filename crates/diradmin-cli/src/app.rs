//! Wiring shared by every command: config, token store, API client,
//! session manager and route guard.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use diradmin_core::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore};
use diradmin_core::{
    ApiClient, Config, GuardDecision, Route, RouteGuard, SessionContext, SessionManager,
    SessionStatus, TokenStore,
};

use crate::StoreKind;

pub struct App {
    pub config: Config,
    pub session: SessionManager,
    pub json: bool,
    guard: RouteGuard,
}

impl App {
    pub fn new(api_url: Option<&str>, store: StoreKind, json: bool) -> Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        });

        let store: Arc<dyn TokenStore> = match store {
            StoreKind::File => Arc::new(FileTokenStore::new(config.data_dir()?)),
            StoreKind::Keyring => Arc::new(KeyringTokenStore),
            StoreKind::Memory => Arc::new(MemoryTokenStore::new()),
        };

        let base_url = api_url
            .map(str::to_string)
            .unwrap_or_else(|| config.api_url());
        debug!(base_url = %base_url, "Using backend");

        let context = SessionContext::new(store);
        let api = ApiClient::new(&base_url, context.clone())
            .context("Failed to create HTTP client")?;
        let session = SessionManager::new(api);
        let guard = RouteGuard::new(context.subscribe());

        Ok(Self {
            config,
            session,
            json,
            guard,
        })
    }

    pub fn api(&self) -> &ApiClient {
        self.session.api()
    }

    /// Validate any stored tokens before the command runs
    pub async fn initialize(&self) -> SessionStatus {
        self.session.initialize().await
    }

    pub async fn decide(&mut self, route: &Route) -> GuardDecision {
        self.guard.resolve(route).await
    }

    /// Run the guard for the route a command belongs to
    pub async fn authorize(&mut self, route: Route) -> Result<()> {
        match self.decide(&route).await {
            GuardDecision::Render => Ok(()),
            GuardDecision::Redirect(Route::Login) => {
                bail!("Not logged in. Run `diradmin login`.")
            }
            GuardDecision::Redirect(other) => bail!("Redirected to {}", other),
            GuardDecision::Wait => bail!("Session is still loading"),
        }
    }

    pub fn save_config(&self) {
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diradmin_core::auth::AdminPage;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/user/auth/login/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/profile/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "username": "admin",
                "first_name": "Amina",
                "last_name": "Noori",
                "is_active": true
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_authorize_without_session_asks_for_login() {
        let server = MockServer::start().await;
        let mut app = App::new(Some(&server.uri()), StoreKind::Memory, false).unwrap();

        assert_eq!(app.initialize().await, SessionStatus::Unauthenticated);
        let err = app
            .authorize(Route::Admin(AdminPage::Users))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not logged in. Run `diradmin login`.");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authorize_after_login() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        let mut app = App::new(Some(&server.uri()), StoreKind::Memory, false).unwrap();
        app.initialize().await;

        app.session.login("admin", "secret").await.unwrap();
        app.authorize(Route::Admin(AdminPage::Users)).await.unwrap();

        // The login page sends an authenticated user to the dashboard
        let err = app.authorize(Route::Login).await.unwrap_err();
        assert_eq!(err.to_string(), "Redirected to /admin");
    }

    #[tokio::test]
    async fn test_authorize_after_logout() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        let mut app = App::new(Some(&server.uri()), StoreKind::Memory, false).unwrap();
        app.initialize().await;

        app.session.login("admin", "secret").await.unwrap();
        app.session.logout();
        assert!(app.authorize(Route::Admin(AdminPage::Events)).await.is_err());
    }
}
