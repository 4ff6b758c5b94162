//! Shared application state

use std::sync::Arc;

use super::notify::Notifier;
use super::registry::ConnectionRegistry;
use super::session::SessionContext;
use crate::auth::{Authenticator, IdentityResolver, TokenService};
use crate::config::Settings;
use crate::store::{StatsProvider, Store};

/// State shared by the REST handlers and WebSocket sessions
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<Store>,
    pub auth: Arc<Authenticator>,
    pub registry: Arc<ConnectionRegistry>,
    pub notifier: Notifier,
    pub session: SessionContext,
}

impl AppState {
    /// Wire the registry, emitters and token service around a store
    pub fn new(settings: Settings, store: Arc<Store>) -> Self {
        let tokens = TokenService::with_ttl(&settings.jwt_secret, settings.access_token_ttl_seconds());
        let auth = Arc::new(Authenticator::new(tokens, store.clone()));
        let registry = Arc::new(ConnectionRegistry::new(settings.realtime.send_timeout));
        let notifier = Notifier::new(registry.clone());

        let identity: Arc<dyn IdentityResolver> = auth.clone();
        let stats: Arc<dyn StatsProvider> = store.clone();
        let session = SessionContext::new(registry.clone(), identity, stats, &settings.realtime);

        Self {
            settings,
            store,
            auth,
            registry,
            notifier,
            session,
        }
    }
}
