//! Application state shared across the presentation layer.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::cart::CartStore;
use crate::catalog::Catalog;
use crate::checkout::CheckoutFlow;
use crate::config::StorefrontConfig;
use crate::orders::OrderBackend;
use crate::services::auth::{AuthBackend, AuthService};
use crate::session::persist::SessionStorage;
use crate::session::AuthStore;

/// Application state owning the stores and collaborator handles.
///
/// This struct is cheaply cloneable via `Arc` and is the single owner of all
/// mutable session state; there is no ambient global store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    cart: Arc<CartStore>,
    auth: Arc<AuthStore>,
    checkout: CheckoutFlow,
    auth_service: AuthService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The session store is loaded from `storage` immediately; the cart
    /// starts empty. Call [`Self::start`] afterwards to wire the
    /// asynchronous identity feed.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Catalog,
        storage: Arc<dyn SessionStorage>,
        auth_backend: Arc<dyn AuthBackend>,
        order_backend: Arc<dyn OrderBackend>,
    ) -> Self {
        let cart = Arc::new(CartStore::new());
        let auth = Arc::new(AuthStore::load(storage));
        let checkout = CheckoutFlow::new(Arc::clone(&cart), Arc::clone(&auth), order_backend);
        let auth_service = AuthService::new(Arc::clone(&auth), auth_backend);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                cart,
                auth,
                checkout,
                auth_service,
            }),
        }
    }

    /// Wire the asynchronous identity feed: spawn the session event listener
    /// and consume any sign-in redirect completed before startup.
    ///
    /// Returns the listener task handle; it runs for the rest of the process
    /// lifetime.
    pub async fn start(&self) -> JoinHandle<()> {
        let listener = self.inner.auth_service.spawn_session_listener();

        if let Err(e) = self.inner.auth_service.consume_redirect_result().await {
            warn!(error = %e, "could not consume redirect sign-in result");
        }

        listener
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    /// Get a reference to the checkout workflow.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutFlow {
        &self.inner.checkout
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth_service(&self) -> &AuthService {
        &self.inner.auth_service
    }
}
